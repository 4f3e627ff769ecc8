//! Wire types exchanged between an embedded renderer, the host UI, and the
//! certificate session controller.
//!
//! The controller itself lives in the `certgate` crate. This crate only holds
//! the serde shapes so that renderer adapters, scripted replays and the
//! controller agree on one JSON format:
//!
//! - [`RendererEvent`] - signals emitted by the renderer (`type`-tagged)
//! - [`HostCommand`] - actions the host UI triggers (`type`-tagged)
//! - [`Dismissal`] - how a confirmation prompt was closed (`via`-tagged)

pub mod host;
pub mod renderer;

pub use host::{Dismissal, HostCommand};
pub use renderer::{HttpErrorEvent, LoadFinishedEvent, RendererEvent};
