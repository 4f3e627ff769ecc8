use certgate::{HttpErrorEvent, RecoveryDecision};
use serde::Serialize;
use tracing::info;

use crate::cli::HostArgs;
use crate::commands::load_config;
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyOutput {
	pub status_code: u16,
	pub url: String,
	/// Pattern that matched the URL's host, if any.
	pub matched_pattern: Option<String>,
	pub decision: RecoveryDecision,
}

pub fn execute(status: u16, url: &str, hosts: &HostArgs) -> Result<ClassifyOutput> {
	let config = load_config(hosts)?;
	let policy = config.policy()?;
	let event = HttpErrorEvent::new(status, url);

	let decision = policy.classify(&event);
	let matched_pattern = policy
		.trusted_hosts()
		.find_match(url)
		.map(|pattern| pattern.as_str().to_string());

	info!(
		status,
		url,
		certificate_failure = decision.is_certificate_failure,
		"classified HTTP error"
	);

	Ok(ClassifyOutput {
		status_code: status,
		url: url.to_string(),
		matched_pattern,
		decision,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hosts(patterns: &[&str]) -> HostArgs {
		HostArgs {
			config: None,
			hosts: patterns.iter().map(|p| p.to_string()).collect(),
		}
	}

	#[test]
	fn forbidden_on_trusted_host_is_certificate_failure() {
		let out = execute(403, "https://tempusnu.se/secure", &hosts(&["tempusnu.se"])).unwrap();
		assert_eq!(out.decision, RecoveryDecision::CERTIFICATE_FAILURE);
		assert_eq!(out.matched_pattern.as_deref(), Some("tempusnu.se"));
	}

	#[test]
	fn matched_host_with_other_status_is_noop() {
		let out = execute(404, "https://tempusnu.se/missing", &hosts(&["tempusnu.se"])).unwrap();
		assert!(out.decision.is_noop());
		assert_eq!(out.matched_pattern.as_deref(), Some("tempusnu.se"));
	}

	#[test]
	fn no_hosts_never_fails_certificate() {
		let out = execute(403, "https://tempusnu.se/secure", &hosts(&[])).unwrap();
		assert!(out.decision.is_noop());
		assert!(out.matched_pattern.is_none());
	}
}
