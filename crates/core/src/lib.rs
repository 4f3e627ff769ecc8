//! certgate: client certificate selection and recovery for embedded web renderers.
//!
//! An embedded renderer may ask the host for a TLS client certificate
//! mid-handshake, the user picks one out of band from the platform store, and
//! the server may later reject the request with a 403. This crate coordinates
//! those three loosely ordered signals for one renderer session:
//!
//! - [`SessionController`] owns the session, runs the certificate state
//!   machine and executes recovery decisions
//! - [`RecoveryPolicy`] / [`classify`] decide whether an HTTP failure is a
//!   rejected certificate from a host known to require one
//! - [`CertificateStoreBridge`] is the one-way command interface to the
//!   platform store; [`KeychainBridge`] implements it over a
//!   [`KeychainPlatform`] with a remembered alias
//! - [`HostPrompt`] surfaces the informational prompt; its [`DismissHandle`]
//!   always fires exactly once
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use certgate::{AutoDismiss, ControllerConfig, SessionController, SessionHandle};
//!
//! let config = ControllerConfig::with_hosts(["tempusnu.se"]);
//! let controller = SessionController::new(&config, Arc::new(bridge), Arc::new(AutoDismiss))?
//!     .with_session(SessionHandle::new("https://tempusnu.se"));
//! let (handle, _task) = controller.spawn();
//!
//! handle.open();
//! handle.http_error(HttpErrorEvent::new(403, "https://tempusnu.se/secure"));
//! ```

pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod keychain;
pub mod pattern;
pub mod policy;
pub mod prompt;
pub mod session;

pub use bridge::CertificateStoreBridge;
pub use config::{ControllerConfig, DEFAULT_NOTICE_CAPACITY, PromptConfig};
pub use controller::{ControllerEvent, ControllerHandle, ControllerSnapshot, ControllerStats, SessionController};
pub use error::{Error, Result};
pub use events::{ControllerNotice, NoticeStream, NoticeWaiter};
pub use keychain::{
	AliasReply, AliasStore, CertificateAnswer, ClientIdentity, FileAliasStore, KeychainBridge, KeychainPlatform,
	MemoryAliasStore,
};
pub use pattern::{HostPattern, HostPatternSet};
pub use policy::{CERTIFICATE_FAILURE_STATUS, RecoveryDecision, RecoveryPolicy, classify};
pub use prompt::{AutoDismiss, ConfirmationPrompt, DismissHandle, Dismissal, HostPrompt, PromptId};
pub use session::{SessionHandle, SessionId, SessionState, Transition};

// Re-export wire types for renderer adapters
pub use certgate_protocol;
pub use certgate_protocol::{HostCommand, HttpErrorEvent, LoadFinishedEvent, RendererEvent};
