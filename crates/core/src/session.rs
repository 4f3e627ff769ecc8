//! Session handles and the per-session certificate state machine.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of an embedded renderer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(u64);

impl SessionId {
	/// Returns a new process-unique session ID.
	pub fn next() -> Self {
		Self(NEXT_SESSION_ID.fetch_add(1, Ordering::SeqCst))
	}

	pub fn as_u64(&self) -> u64 {
		self.0
	}
}

impl std::fmt::Display for SessionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "session-{}", self.0)
	}
}

/// Opaque handle to one mounted renderer instance.
///
/// Created by the host when the renderer mounts and handed to the
/// [`SessionController`](crate::SessionController), which owns it until unmount.
/// Bridges receive it by reference to address their commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
	id: SessionId,
	target_url: Arc<str>,
}

impl SessionHandle {
	pub fn new(target_url: impl AsRef<str>) -> Self {
		Self {
			id: SessionId::next(),
			target_url: Arc::from(target_url.as_ref()),
		}
	}

	pub fn id(&self) -> SessionId {
		self.id
	}

	/// URL the renderer was mounted with.
	pub fn target_url(&self) -> &str {
		&self.target_url
	}
}

/// Certificate lifecycle of the active session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
	/// No identity selection in progress.
	#[default]
	Idle,
	/// The selector was opened; no load has confirmed an identity yet.
	AwaitingCertificate,
	/// A page load finished after selection.
	Authenticated,
	/// A trusted host rejected the presented certificate.
	Failed,
}

/// Input that can move a [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
	SelectorOpened,
	LoadFinished,
	CertificateRejected,
	CredentialsCleared,
}

impl SessionState {
	/// Applies `transition`, returning the resulting state.
	///
	/// Transitions that do not apply to the current state leave it unchanged.
	pub fn apply(self, transition: Transition) -> Self {
		use SessionState::*;
		match (self, transition) {
			(_, Transition::SelectorOpened) => AwaitingCertificate,
			(AwaitingCertificate, Transition::LoadFinished) => Authenticated,
			(AwaitingCertificate | Authenticated, Transition::CertificateRejected) => Failed,
			(_, Transition::CredentialsCleared) => Idle,
			(state, _) => state,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::AwaitingCertificate => "awaiting_certificate",
			Self::Authenticated => "authenticated",
			Self::Failed => "failed",
		}
	}
}

impl std::fmt::Display for SessionState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
