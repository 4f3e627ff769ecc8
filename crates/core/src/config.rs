//! Controller configuration loaded from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pattern::HostPatternSet;
use crate::policy::RecoveryPolicy;
use crate::prompt::ConfirmationPrompt;

/// Default capacity of the controller notice channel.
pub const DEFAULT_NOTICE_CAPACITY: usize = 256;

/// Text shown when a trusted host rejects the client certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptConfig {
	pub title: String,
	pub message: String,
	pub buttons: Vec<String>,
	pub cancelable: bool,
}

impl Default for PromptConfig {
	fn default() -> Self {
		Self {
			title: "Certificate rejected".to_string(),
			message: "The server did not accept the selected client certificate. \
			          The selection has been cleared; choose a certificate and reload to try again."
				.to_string(),
			buttons: vec!["Ok".to_string()],
			cancelable: true,
		}
	}
}

impl PromptConfig {
	pub(crate) fn to_prompt(&self, id: u64) -> ConfirmationPrompt {
		ConfirmationPrompt {
			id,
			title: self.title.clone(),
			message: self.message.clone(),
			buttons: self.buttons.clone(),
			cancelable: self.cancelable,
		}
	}
}

/// Settings for a [`SessionController`](crate::SessionController).
///
/// ```json
/// {
///   "hostPatterns": ["tempusnu.se"],
///   "autoOpenSelector": false,
///   "prompt": { "title": "Error", "buttons": ["Ok"] }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfig {
	/// Hosts known to require client-certificate authentication.
	#[serde(default)]
	pub host_patterns: Vec<String>,
	/// Open the selector as soon as the renderer asks for a certificate.
	#[serde(default)]
	pub auto_open_selector: bool,
	#[serde(default)]
	pub prompt: PromptConfig,
	#[serde(default = "default_notice_capacity")]
	pub notice_capacity: usize,
}

fn default_notice_capacity() -> usize {
	DEFAULT_NOTICE_CAPACITY
}

impl Default for ControllerConfig {
	fn default() -> Self {
		Self {
			host_patterns: Vec::new(),
			auto_open_selector: false,
			prompt: PromptConfig::default(),
			notice_capacity: DEFAULT_NOTICE_CAPACITY,
		}
	}
}

impl ControllerConfig {
	/// Creates a config trusting `patterns`, everything else defaulted.
	pub fn with_hosts<I, S>(patterns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			host_patterns: patterns.into_iter().map(Into::into).collect(),
			..Self::default()
		}
	}

	/// Parses a config from JSON text and validates it.
	pub fn from_json_str(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Loads and validates a config file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)?;
		Self::from_json_str(&content)
	}

	/// Appends patterns (e.g. from command-line flags), skipping duplicates.
	pub fn merge_hosts<I, S>(&mut self, patterns: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for pattern in patterns {
			let pattern = pattern.into();
			if !self.host_patterns.contains(&pattern) {
				self.host_patterns.push(pattern);
			}
		}
	}

	/// Checks patterns compile and the prompt is presentable.
	pub fn validate(&self) -> Result<()> {
		self.host_pattern_set()?;
		if self.notice_capacity == 0 {
			return Err(Error::Config("noticeCapacity must be greater than zero".to_string()));
		}
		if self.prompt.buttons.is_empty() && !self.prompt.cancelable {
			return Err(Error::Config(
				"prompt needs at least one button or must be cancelable".to_string(),
			));
		}
		Ok(())
	}

	pub fn host_pattern_set(&self) -> Result<HostPatternSet> {
		HostPatternSet::parse(&self.host_patterns)
	}

	/// Builds the recovery policy described by this config.
	pub fn policy(&self) -> Result<RecoveryPolicy> {
		Ok(RecoveryPolicy::new(self.host_pattern_set()?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn empty_object_uses_defaults() {
		let config = ControllerConfig::from_json_str("{}").unwrap();
		assert_eq!(config, ControllerConfig::default());
		assert!(!config.auto_open_selector);
		assert_eq!(config.notice_capacity, DEFAULT_NOTICE_CAPACITY);
	}

	#[test]
	fn parses_camel_case_fields() {
		let config = ControllerConfig::from_json_str(
			r#"{"hostPatterns":["tempusnu.se"],"autoOpenSelector":true,"prompt":{"title":"Error"}}"#,
		)
		.unwrap();
		assert_eq!(config.host_patterns, vec!["tempusnu.se"]);
		assert!(config.auto_open_selector);
		assert_eq!(config.prompt.title, "Error");
		assert_eq!(config.prompt.buttons, vec!["Ok"]);
	}

	#[test]
	fn invalid_pattern_fails_validation() {
		let err = ControllerConfig::from_json_str(r#"{"hostPatterns":[""]}"#).unwrap_err();
		assert!(matches!(err, Error::InvalidHostPattern { .. }));
	}

	#[test]
	fn prompt_without_way_out_is_rejected() {
		let err = ControllerConfig::from_json_str(r#"{"prompt":{"buttons":[],"cancelable":false}}"#).unwrap_err();
		assert!(matches!(err, Error::Config(_)));
	}

	#[test]
	fn merge_hosts_skips_duplicates() {
		let mut config = ControllerConfig::with_hosts(["tempusnu.se"]);
		config.merge_hosts(["tempusnu.se", "malmo.se"]);
		assert_eq!(config.host_patterns, vec!["tempusnu.se", "malmo.se"]);
	}

	#[test]
	fn load_reads_file() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("certgate.json");
		fs::write(&path, r#"{"hostPatterns":["tempusnu.se"]}"#).unwrap();

		let config = ControllerConfig::load(&path).unwrap();
		assert!(config.policy().unwrap().trusted_hosts().matches_url("https://tempusnu.se/x"));
	}

	#[test]
	fn load_missing_file_is_io_error() {
		let tmp = TempDir::new().unwrap();
		let err = ControllerConfig::load(&tmp.path().join("missing.json")).unwrap_err();
		assert!(matches!(err, Error::Io(_)));
	}
}
