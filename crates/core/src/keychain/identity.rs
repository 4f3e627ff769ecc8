use std::sync::Arc;

/// Client identity resolved from the platform keychain.
///
/// Only the alias and public certificate chain are held here; the private
/// key stays inside the platform and is referenced by alias.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
	alias: Arc<str>,
	chain: Arc<[Vec<u8>]>,
}

impl ClientIdentity {
	/// Creates an identity from its alias and DER-encoded certificate chain, leaf first.
	pub fn new(alias: impl AsRef<str>, chain: Vec<Vec<u8>>) -> Self {
		Self {
			alias: Arc::from(alias.as_ref()),
			chain: Arc::from(chain),
		}
	}

	pub fn alias(&self) -> &str {
		&self.alias
	}

	/// DER certificates, leaf first.
	pub fn certificate_chain(&self) -> &[Vec<u8>] {
		&self.chain
	}
}

impl std::fmt::Debug for ClientIdentity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientIdentity")
			.field("alias", &self.alias)
			.field("certificates", &self.chain.len())
			.finish()
	}
}
