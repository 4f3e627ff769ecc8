//! Host patterns identifying origins that authenticate with client certificates.

use url::{Host, Url};

use crate::error::{Error, Result};

const GLOB_META: &[char] = &['*', '?', '['];

/// Compiled host pattern.
///
/// A plain pattern (`tempusnu.se`) matches that host and any of its
/// subdomains. A pattern containing glob metacharacters (`auth-*.example.org`)
/// is matched as a glob against the whole host. Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct HostPattern {
	source: String,
	kind: PatternKind,
}

#[derive(Debug, Clone)]
enum PatternKind {
	Domain(String),
	Glob(glob::Pattern),
}

impl HostPattern {
	/// Compiles a host pattern.
	///
	/// Plain patterns go through the same host parser as URLs, so Unicode
	/// names compare in their `xn--` form and IPv6 literals keep brackets.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidHostPattern`] for empty patterns, patterns that
	/// contain a scheme, path or port, non-ASCII globs, or malformed hosts and globs.
	pub fn new(pattern: &str) -> Result<Self> {
		let normalized = pattern.trim().trim_end_matches('.').to_lowercase();
		if normalized.is_empty() {
			return Err(Error::invalid_pattern(pattern, "pattern is empty"));
		}
		if normalized.contains("://") || normalized.contains('/') {
			return Err(Error::invalid_pattern(pattern, "expected a host, not a URL"));
		}

		let is_ipv6 = normalized.starts_with('[') && normalized.ends_with(']');
		if !is_ipv6 && normalized.contains(':') {
			return Err(Error::invalid_pattern(pattern, "ports are not part of a host pattern"));
		}

		let kind = if !is_ipv6 && normalized.contains(GLOB_META) {
			if !normalized.is_ascii() {
				return Err(Error::invalid_pattern(pattern, "glob patterns must use the ASCII (xn--) host form"));
			}
			let glob = glob::Pattern::new(&normalized).map_err(|e| Error::invalid_pattern(pattern, e.msg))?;
			PatternKind::Glob(glob)
		} else {
			let host = Host::parse(normalized.trim_start_matches('.'))
				.map_err(|e| Error::invalid_pattern(pattern, e.to_string()))?;
			PatternKind::Domain(host.to_string())
		};

		Ok(Self {
			source: pattern.trim().to_string(),
			kind,
		})
	}

	/// Returns `true` if `host` matches this pattern.
	pub fn matches_host(&self, host: &str) -> bool {
		let host = host.trim_end_matches('.').to_ascii_lowercase();
		match &self.kind {
			PatternKind::Domain(domain) => {
				host == *domain || host.strip_suffix(domain.as_str()).is_some_and(|prefix| prefix.ends_with('.'))
			}
			PatternKind::Glob(glob) => glob.matches(&host),
		}
	}

	/// Returns `true` if the host of `url` matches this pattern.
	///
	/// URLs that fail to parse or carry no host never match.
	pub fn matches_url(&self, url: &str) -> bool {
		host_of(url).is_some_and(|host| self.matches_host(&host))
	}

	/// Returns the pattern as configured.
	pub fn as_str(&self) -> &str {
		&self.source
	}
}

impl std::fmt::Display for HostPattern {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.source)
	}
}

/// Ordered set of [`HostPattern`]s; a URL matches if any pattern does.
#[derive(Debug, Clone, Default)]
pub struct HostPatternSet {
	patterns: Vec<HostPattern>,
}

impl HostPatternSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Compiles every pattern, failing on the first invalid one.
	pub fn parse<I, S>(patterns: I) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let patterns = patterns
			.into_iter()
			.map(|p| HostPattern::new(p.as_ref()))
			.collect::<Result<Vec<_>>>()?;
		Ok(Self { patterns })
	}

	pub fn push(&mut self, pattern: HostPattern) {
		self.patterns.push(pattern);
	}

	/// Returns the first pattern matching the host of `url`.
	pub fn find_match(&self, url: &str) -> Option<&HostPattern> {
		let host = host_of(url)?;
		self.patterns.iter().find(|p| p.matches_host(&host))
	}

	pub fn matches_url(&self, url: &str) -> bool {
		self.find_match(url).is_some()
	}

	pub fn is_empty(&self) -> bool {
		self.patterns.is_empty()
	}

	pub fn len(&self) -> usize {
		self.patterns.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &HostPattern> {
		self.patterns.iter()
	}
}

impl FromIterator<HostPattern> for HostPatternSet {
	fn from_iter<I: IntoIterator<Item = HostPattern>>(iter: I) -> Self {
		Self {
			patterns: iter.into_iter().collect(),
		}
	}
}

fn host_of(url: &str) -> Option<String> {
	let parsed = Url::parse(url).ok()?;
	parsed.host_str().map(|h| h.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn domain_matches_exact_host_and_subdomains() {
		let pattern = HostPattern::new("tempusnu.se").unwrap();
		assert!(pattern.matches_url("https://tempusnu.se/secure"));
		assert!(pattern.matches_url("https://auth.tempusnu.se/login"));
		assert!(pattern.matches_url("https://TEMPUSNU.SE:8443/"));
		assert!(!pattern.matches_url("https://nottempusnu.se/"));
		assert!(!pattern.matches_url("https://tempusnu.se.evil.example/"));
	}

	#[test]
	fn domain_ignores_url_path_and_query() {
		let pattern = HostPattern::new("tempusnu.se").unwrap();
		assert!(!pattern.matches_url("https://other.example/tempusnu.se"));
		assert!(!pattern.matches_url("https://other.example/?next=tempusnu.se"));
	}

	#[test]
	fn glob_matches_whole_host() {
		let pattern = HostPattern::new("auth-*.example.org").unwrap();
		assert!(pattern.matches_url("https://auth-eu.example.org/x"));
		assert!(!pattern.matches_url("https://www.example.org/x"));
	}

	#[test]
	fn unparseable_or_hostless_urls_never_match() {
		let pattern = HostPattern::new("tempusnu.se").unwrap();
		assert!(!pattern.matches_url("not a url"));
		assert!(!pattern.matches_url("about:blank"));
		assert!(!pattern.matches_url("data:text/html,tempusnu.se"));
	}

	#[test]
	fn empty_and_url_patterns_are_rejected() {
		assert!(matches!(HostPattern::new("   "), Err(Error::InvalidHostPattern { .. })));
		assert!(matches!(
			HostPattern::new("https://tempusnu.se"),
			Err(Error::InvalidHostPattern { .. })
		));
	}

	#[test]
	fn leading_dot_is_treated_as_domain() {
		let pattern = HostPattern::new(".malmo.se").unwrap();
		assert!(pattern.matches_url("https://malmo.se/"));
		assert!(pattern.matches_url("https://id.malmo.se/"));
	}

	#[test]
	fn unicode_pattern_matches_punycode_host() {
		let pattern = HostPattern::new("Malmö.se").unwrap();
		assert!(pattern.matches_url("https://malmö.se/secure"));
		assert!(pattern.matches_url("https://id.MALMÖ.se/"));
		assert!(!pattern.matches_url("https://malmo.se/"));
	}

	#[test]
	fn port_patterns_are_rejected() {
		assert!(matches!(
			HostPattern::new("tempusnu.se:8443"),
			Err(Error::InvalidHostPattern { .. })
		));
		assert!(matches!(
			HostPatternSet::parse(["tempusnu.se", "*.corp.example:443"]),
			Err(Error::InvalidHostPattern { .. })
		));
	}

	#[test]
	fn ipv6_literal_is_a_host() {
		let pattern = HostPattern::new("[::1]").unwrap();
		assert!(pattern.matches_url("https://[::1]:8443/secure"));
		assert!(!pattern.matches_url("https://[::2]/"));
	}

	#[test]
	fn non_ascii_glob_is_rejected() {
		assert!(matches!(HostPattern::new("*.malmö.se"), Err(Error::InvalidHostPattern { .. })));
	}

	#[test]
	fn set_returns_first_match() {
		let set = HostPatternSet::parse(["malmo.se", "tempusnu.se"]).unwrap();
		assert_eq!(set.len(), 2);
		assert_eq!(set.find_match("https://tempusnu.se/a").map(HostPattern::as_str), Some("tempusnu.se"));
		assert!(set.find_match("https://other.example/x").is_none());
	}

	#[test]
	fn empty_set_matches_nothing() {
		let set = HostPatternSet::new();
		assert!(set.is_empty());
		assert!(!set.matches_url("https://tempusnu.se/"));
	}
}
