use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("script {path} line {line}: {message}")]
	Script {
		path: PathBuf,
		line: usize,
		message: String,
	},

	#[error("no data directory available; pass --alias-file")]
	NoDataDir,

	#[error(transparent)]
	Certgate(#[from] certgate::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::InvalidInput(_) | CliError::NoDataDir => (ErrorCode::InvalidInput, None),
			CliError::Script { path, line, .. } => (
				ErrorCode::InvalidScript,
				Some(serde_json::json!({ "path": path, "line": line })),
			),
			CliError::Certgate(err) => match err {
				certgate::Error::InvalidHostPattern { pattern, .. } => (
					ErrorCode::InvalidConfig,
					Some(serde_json::json!({ "pattern": pattern })),
				),
				certgate::Error::Config(_) | certgate::Error::Json(_) => (ErrorCode::InvalidConfig, None),
				certgate::Error::Io(_) => (ErrorCode::IoError, None),
				certgate::Error::Timeout(_) => (ErrorCode::Timeout, None),
				certgate::Error::ChannelClosed | certgate::Error::ControllerClosed => {
					(ErrorCode::InternalError, None)
				}
			},
			CliError::Io(_) => (ErrorCode::IoError, None),
			CliError::Json(_) => (ErrorCode::InvalidInput, None),
			CliError::Anyhow(_) => (ErrorCode::InternalError, None),
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bad_pattern_maps_to_config_error() {
		let err = CliError::from(certgate::HostPattern::new("").unwrap_err());
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::InvalidConfig);
		assert_eq!(cmd.details, Some(serde_json::json!({ "pattern": "" })));
	}

	#[test]
	fn script_error_carries_location() {
		let err = CliError::Script {
			path: PathBuf::from("flow.ndjson"),
			line: 3,
			message: "unknown step".into(),
		};
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::InvalidScript);
		assert_eq!(cmd.message, "script flow.ndjson line 3: unknown step");
	}
}
