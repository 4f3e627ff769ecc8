//! Interface to the platform certificate store.

use std::sync::Arc;

use crate::session::SessionHandle;

/// Commands the controller issues to the platform certificate store.
///
/// Both commands are one-way: the controller receives no completion signal
/// and learns whether a selection worked only through later renderer events.
/// Implementations must accept every call; platform refusals surface
/// indirectly as certificate failures on the next response.
pub trait CertificateStoreBridge: Send + Sync {
	/// Opens the platform certificate picker for `session`.
	///
	/// The picker may complete with a selected identity installed for the
	/// session or be cancelled. Calling this while a picker is already open
	/// re-invokes it.
	fn open_selector(&self, session: &SessionHandle);

	/// Forgets any client identity installed for `session`.
	///
	/// Idempotent: clearing with nothing installed is a no-op.
	fn clear_credentials(&self, session: &SessionHandle);
}

impl<T: CertificateStoreBridge + ?Sized> CertificateStoreBridge for Arc<T> {
	fn open_selector(&self, session: &SessionHandle) {
		(**self).open_selector(session)
	}

	fn clear_credentials(&self, session: &SessionHandle) {
		(**self).clear_credentials(session)
	}
}

impl<T: CertificateStoreBridge + ?Sized> CertificateStoreBridge for Box<T> {
	fn open_selector(&self, session: &SessionHandle) {
		(**self).open_selector(session)
	}

	fn clear_credentials(&self, session: &SessionHandle) {
		(**self).clear_credentials(session)
	}
}
