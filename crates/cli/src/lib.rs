//! Command-line front end for certgate: classify single HTTP errors, replay
//! recorded renderer sessions against a simulated keychain, and forget the
//! remembered certificate alias.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod script;
pub mod simulator;
