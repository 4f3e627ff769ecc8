//! [`CertificateStoreBridge`] backed by a platform keychain.
//!
//! Keeps the identity chosen for the renderer and remembers its alias so a
//! later session can reuse it without showing the picker again. Whenever the
//! installed identity changes, the platform's cached client-certificate
//! preferences are cleared and the renderer reloads, so the next handshake
//! asks for a certificate again and receives the new one.
//!
//! Every method runs synchronously on the caller's thread, which for
//! [`SessionController`](crate::SessionController) is its inbox task. The
//! alias store is read once and then cached, so a `clear()` with nothing to
//! forget touches no storage; writes still happen inline on identity changes.

mod alias_store;
mod identity;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

pub use self::alias_store::{AliasStore, FileAliasStore, MemoryAliasStore};
pub use self::identity::ClientIdentity;
use crate::bridge::CertificateStoreBridge;
use crate::session::{SessionHandle, SessionId};

/// Platform services the keychain bridge drives.
pub trait KeychainPlatform: Send + Sync {
	/// Resolves an alias to an identity; `None` if it is gone or access was denied.
	fn lookup_identity(&self, alias: &str) -> Option<ClientIdentity>;

	/// Shows the platform alias picker. The platform answers later through `reply`.
	fn request_alias(&self, session: &SessionHandle, reply: AliasReply);

	/// Drops any client-certificate decision the renderer cached for its handshakes.
	fn clear_client_cert_preferences(&self, session: &SessionHandle);

	/// Reloads the renderer's current page.
	fn reload(&self, session: &SessionHandle);
}

/// Answer to a renderer's client-certificate request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateAnswer {
	/// Present this identity in the ongoing handshake.
	Proceed(ClientIdentity),
	/// No identity yet; one is being resolved and the renderer will reload.
	Pending,
}

type ChoiceFn = Box<dyn FnOnce(Option<String>) + Send>;

/// Completion callback for [`KeychainPlatform::request_alias`].
pub struct AliasReply {
	session: SessionId,
	on_choice: ChoiceFn,
}

impl AliasReply {
	fn new(session: SessionId, on_choice: ChoiceFn) -> Self {
		Self { session, on_choice }
	}

	pub fn session(&self) -> SessionId {
		self.session
	}

	/// Reports the alias the user picked, or `None` if the picker was cancelled.
	pub fn choose(self, alias: Option<String>) {
		(self.on_choice)(alias);
	}

	pub fn cancel(self) {
		self.choose(None);
	}
}

impl std::fmt::Debug for AliasReply {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AliasReply").field("session", &self.session).finish()
	}
}

struct Inner<P, S> {
	platform: P,
	store: S,
	installed: Mutex<Option<ClientIdentity>>,
	/// Last alias read from or written to `store`; `None` until first read.
	remembered: Mutex<Option<Option<String>>>,
}

/// Keychain-backed certificate store bridge.
pub struct KeychainBridge<P, S> {
	inner: Arc<Inner<P, S>>,
}

impl<P, S> Clone for KeychainBridge<P, S> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<P, S> KeychainBridge<P, S>
where
	P: KeychainPlatform + 'static,
	S: AliasStore + 'static,
{
	pub fn new(platform: P, store: S) -> Self {
		Self {
			inner: Arc::new(Inner {
				platform,
				store,
				installed: Mutex::new(None),
				remembered: Mutex::new(None),
			}),
		}
	}

	pub fn platform(&self) -> &P {
		&self.inner.platform
	}

	pub fn store(&self) -> &S {
		&self.inner.store
	}

	/// Identity currently presented to servers, if any.
	pub fn installed(&self) -> Option<ClientIdentity> {
		self.inner.installed.lock().clone()
	}

	/// Answers a renderer certificate request.
	///
	/// Uses the installed identity if there is one. Otherwise it tries the
	/// remembered alias (installing it and reloading), and falls back to the
	/// platform picker.
	pub fn answer_request(&self, session: &SessionHandle) -> CertificateAnswer {
		if let Some(identity) = self.installed() {
			debug!(session = %session.id(), alias = identity.alias(), "presenting installed identity");
			return CertificateAnswer::Proceed(identity);
		}

		match self.remembered_alias() {
			Ok(Some(alias)) => match self.inner.platform.lookup_identity(&alias) {
				Some(identity) => {
					info!(session = %session.id(), alias = %alias, "reusing remembered certificate alias");
					self.install(session, Some(identity));
				}
				None => {
					warn!(session = %session.id(), alias = %alias, "remembered certificate alias unavailable");
					self.choose(session);
				}
			},
			Ok(None) => self.choose(session),
			Err(err) => {
				warn!(error = %err, "failed to read remembered certificate alias");
				self.choose(session);
			}
		}
		CertificateAnswer::Pending
	}

	fn choose(&self, session: &SessionHandle) {
		// Platforms usually park the reply inside themselves; a strong
		// reference here would keep the bridge alive through its own platform.
		let inner = Arc::downgrade(&self.inner);
		let target = session.clone();
		let reply = AliasReply::new(
			session.id(),
			Box::new(move |alias| match inner.upgrade() {
				Some(inner) => KeychainBridge { inner }.complete_selection(&target, alias),
				None => debug!(session = %target.id(), "certificate picker answered after bridge was dropped"),
			}),
		);
		self.inner.platform.request_alias(session, reply);
	}

	fn complete_selection(&self, session: &SessionHandle, alias: Option<String>) {
		let identity = match alias {
			Some(alias) => {
				let identity = self.inner.platform.lookup_identity(&alias);
				if identity.is_none() {
					warn!(session = %session.id(), alias = %alias, "selected certificate alias could not be loaded");
				}
				identity
			}
			None => {
				debug!(session = %session.id(), "certificate picker cancelled");
				None
			}
		};
		self.install(session, identity);
	}

	/// Swaps the installed identity, updates the remembered alias and reloads.
	fn install(&self, session: &SessionHandle, identity: Option<ClientIdentity>) {
		*self.inner.installed.lock() = identity.clone();
		self.inner.platform.clear_client_cert_preferences(session);

		let persisted = match &identity {
			Some(identity) => self.inner.store.save(identity.alias()),
			None => self.inner.store.remove(),
		};
		*self.inner.remembered.lock() = match persisted {
			Ok(()) => Some(identity.as_ref().map(|i| i.alias().to_string())),
			Err(err) => {
				warn!(error = %err, "failed to update remembered certificate alias");
				None
			}
		};

		info!(
			session = %session.id(),
			alias = ?identity.as_ref().map(ClientIdentity::alias),
			"client identity installed, reloading"
		);
		self.inner.platform.reload(session);
	}

	fn has_anything_to_forget(&self) -> bool {
		if self.inner.installed.lock().is_some() {
			return true;
		}
		// An unreadable store may still hold an alias; treat it as present.
		!matches!(self.remembered_alias(), Ok(None))
	}

	/// Reads the store once, then answers from the cached value.
	fn remembered_alias(&self) -> crate::error::Result<Option<String>> {
		let mut remembered = self.inner.remembered.lock();
		if let Some(alias) = remembered.as_ref() {
			return Ok(alias.clone());
		}
		let alias = self.inner.store.load()?;
		*remembered = Some(alias.clone());
		Ok(alias)
	}
}

impl<P, S> CertificateStoreBridge for KeychainBridge<P, S>
where
	P: KeychainPlatform + 'static,
	S: AliasStore + 'static,
{
	fn open_selector(&self, session: &SessionHandle) {
		self.choose(session);
	}

	fn clear_credentials(&self, session: &SessionHandle) {
		if !self.has_anything_to_forget() {
			debug!(session = %session.id(), "no client identity to clear");
			return;
		}
		self.install(session, None);
	}
}

#[cfg(test)]
mod tests;
