//! Recovery policy mapping HTTP failures to credential cleanup decisions.

use certgate_protocol::HttpErrorEvent;
use serde::Serialize;

use crate::pattern::HostPatternSet;

/// Status code servers answer with when a client certificate is missing or refused.
pub const CERTIFICATE_FAILURE_STATUS: u16 = 403;

/// Outcome of classifying one [`HttpErrorEvent`].
///
/// Computed fresh per event and never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryDecision {
	pub is_certificate_failure: bool,
	pub should_clear_credentials: bool,
	pub should_prompt_user: bool,
}

impl RecoveryDecision {
	/// Decision for responses unrelated to client certificates.
	pub const NONE: Self = Self {
		is_certificate_failure: false,
		should_clear_credentials: false,
		should_prompt_user: false,
	};

	/// Decision for a rejected client certificate.
	pub const CERTIFICATE_FAILURE: Self = Self {
		is_certificate_failure: true,
		should_clear_credentials: true,
		should_prompt_user: true,
	};

	/// Returns `true` if executing this decision has no effect.
	pub fn is_noop(&self) -> bool {
		!self.should_clear_credentials && !self.should_prompt_user
	}
}

/// Classifies an HTTP failure against the hosts known to require client certificates.
///
/// A 403 alone is ambiguous (authorization rather than authentication), so it
/// only counts as a certificate failure when the URL's host matches one of
/// `trusted_hosts`. This keeps unrelated 403s from third-party sub-resources
/// from purging valid credentials.
pub fn classify(event: &HttpErrorEvent, trusted_hosts: &HostPatternSet) -> RecoveryDecision {
	if event.status_code != CERTIFICATE_FAILURE_STATUS {
		return RecoveryDecision::NONE;
	}
	match trusted_hosts.find_match(&event.url) {
		Some(pattern) => {
			tracing::trace!(url = %event.url, pattern = %pattern, "403 from client-certificate host");
			RecoveryDecision::CERTIFICATE_FAILURE
		}
		None => RecoveryDecision::NONE,
	}
}

/// Owns the configured host patterns and applies [`classify`].
#[derive(Debug, Clone, Default)]
pub struct RecoveryPolicy {
	trusted_hosts: HostPatternSet,
}

impl RecoveryPolicy {
	pub fn new(trusted_hosts: HostPatternSet) -> Self {
		Self { trusted_hosts }
	}

	pub fn classify(&self, event: &HttpErrorEvent) -> RecoveryDecision {
		classify(event, &self.trusted_hosts)
	}

	pub fn trusted_hosts(&self) -> &HostPatternSet {
		&self.trusted_hosts
	}
}
