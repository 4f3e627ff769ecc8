//! Error types for the certificate session controller.
//!
//! Controller operations (`open`, `clear`, event callbacks) never fail: missing
//! sessions, unclassified responses and bridge rejections are handled by
//! logging and no-ops. Errors only surface from configuration, persistence and
//! waiting on controller notices.

use thiserror::Error;

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or observing a controller.
#[derive(Debug, Error)]
pub enum Error {
	/// A host pattern could not be used for matching.
	#[error("Invalid host pattern '{pattern}': {reason}")]
	InvalidHostPattern { pattern: String, reason: String },

	/// Configuration was readable but semantically invalid.
	#[error("Configuration error: {0}")]
	Config(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Timeout waiting for a controller notice.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// Notice channel closed before a matching notice arrived.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// The controller task has stopped and no longer accepts events.
	#[error("Controller closed")]
	ControllerClosed,
}

impl Error {
	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}

	pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
		Error::InvalidHostPattern {
			pattern: pattern.to_string(),
			reason: reason.into(),
		}
	}
}
