//! [`SessionController`]: mediates between the renderer, the certificate store
//! bridge and the host's recovery prompt for one embedded session.
//!
//! The controller owns an inbox. Renderer adapters and host UI post
//! [`ControllerEvent`]s through a cloneable [`ControllerHandle`]; the
//! controller drains them either on its own task ([`SessionController::run`])
//! or synchronously ([`SessionController::process_pending`]). Renderer signals
//! and host commands are unordered with respect to each other; the inbox only
//! guarantees that each is handled to completion before the next.

mod handle;

use std::collections::BTreeMap;
use std::sync::Arc;

use certgate_protocol::{HostCommand, HttpErrorEvent, LoadFinishedEvent, RendererEvent};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use self::handle::{ControllerEvent, ControllerHandle};
use crate::bridge::CertificateStoreBridge;
use crate::config::{ControllerConfig, PromptConfig};
use crate::error::Result;
use crate::events::{ControllerNotice, NoticeBus};
use crate::policy::{RecoveryDecision, RecoveryPolicy};
use crate::prompt::{DismissHandle, Dismissal, HostPrompt, PromptId, next_prompt_id};
use crate::session::{SessionHandle, SessionId, SessionState, Transition};

/// Counters of controller activity since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerStats {
	pub certificate_requests: u64,
	pub certificate_failures: u64,
	pub unclassified_errors: u64,
	pub selectors_opened: u64,
	pub clears_issued: u64,
	pub prompts_shown: u64,
	pub prompts_dismissed: u64,
}

/// Point-in-time view of a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSnapshot {
	pub session: Option<SessionId>,
	pub state: SessionState,
	pub stats: ControllerStats,
	pub outstanding_prompts: usize,
}

/// Certificate selection and recovery controller for one renderer session.
pub struct SessionController {
	session: Option<SessionHandle>,
	state: SessionState,
	policy: RecoveryPolicy,
	auto_open_selector: bool,
	prompt_config: PromptConfig,
	bridge: Arc<dyn CertificateStoreBridge>,
	prompt: Arc<dyn HostPrompt>,
	notices: Arc<NoticeBus>,
	stats: ControllerStats,
	/// Open prompts and the session each was raised for.
	outstanding_prompts: BTreeMap<PromptId, SessionId>,
	/// Dropped when [`run`](Self::run) starts so the loop ends with the last handle.
	inbox_tx: Option<mpsc::UnboundedSender<ControllerEvent>>,
	inbox_weak: mpsc::WeakUnboundedSender<ControllerEvent>,
	inbox_rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl SessionController {
	/// Creates a controller with no mounted session.
	///
	/// # Errors
	///
	/// Returns an error if the config's host patterns do not compile.
	pub fn new(
		config: &ControllerConfig,
		bridge: Arc<dyn CertificateStoreBridge>,
		prompt: Arc<dyn HostPrompt>,
	) -> Result<Self> {
		config.validate()?;
		let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
		let inbox_weak = inbox_tx.downgrade();

		Ok(Self {
			session: None,
			state: SessionState::Idle,
			policy: config.policy()?,
			auto_open_selector: config.auto_open_selector,
			prompt_config: config.prompt.clone(),
			bridge,
			prompt,
			notices: Arc::new(NoticeBus::new(config.notice_capacity)),
			stats: ControllerStats::default(),
			outstanding_prompts: BTreeMap::new(),
			inbox_tx: Some(inbox_tx),
			inbox_weak,
			inbox_rx,
		})
	}

	/// Mounts `session` at construction time.
	pub fn with_session(mut self, session: SessionHandle) -> Self {
		self.mount(session);
		self
	}

	/// Returns a handle for posting events to this controller.
	pub fn handle(&self) -> ControllerHandle {
		let tx = self.inbox_tx.clone().or_else(|| self.inbox_weak.upgrade());
		ControllerHandle::new(tx, Arc::clone(&self.notices))
	}

	pub fn session(&self) -> Option<&SessionHandle> {
		self.session.as_ref()
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn stats(&self) -> ControllerStats {
		self.stats
	}

	pub fn policy(&self) -> &RecoveryPolicy {
		&self.policy
	}

	pub fn snapshot(&self) -> ControllerSnapshot {
		ControllerSnapshot {
			session: self.session.as_ref().map(SessionHandle::id),
			state: self.state,
			stats: self.stats,
			outstanding_prompts: self.outstanding_prompts.len(),
		}
	}

	/// Binds the controller to a freshly mounted renderer.
	///
	/// A previously mounted session is unmounted first.
	pub fn mount(&mut self, session: SessionHandle) {
		if self.session.is_some() {
			self.unmount();
		}
		info!(session = %session.id(), url = session.target_url(), "session mounted");
		let id = session.id();
		self.session = Some(session);
		self.state = SessionState::Idle;
		self.notices.publish(ControllerNotice::Mounted { session: id });
	}

	/// Releases the active session, returning it.
	pub fn unmount(&mut self) -> Option<SessionHandle> {
		let session = self.session.take()?;
		info!(session = %session.id(), "session unmounted");
		self.state = SessionState::Idle;
		self.notices.publish(ControllerNotice::Unmounted { session: session.id() });
		Some(session)
	}

	/// Asks the bridge to open the certificate selector.
	///
	/// No-op without an active session. Repeated calls re-invoke the selector.
	pub fn open(&mut self) {
		let Some(session) = self.session.as_ref() else {
			debug!("open ignored: no active session");
			return;
		};
		self.bridge.open_selector(session);
		let id = session.id();
		self.stats.selectors_opened += 1;
		info!(session = %id, "certificate selector opened");
		self.notices.publish(ControllerNotice::SelectorOpened { session: id });
		self.transition(Transition::SelectorOpened);
	}

	/// Asks the bridge to forget the installed client identity.
	///
	/// No-op without an active session; idempotent otherwise.
	pub fn clear(&mut self) {
		let Some(session) = self.session.as_ref() else {
			debug!("clear ignored: no active session");
			return;
		};
		self.bridge.clear_credentials(session);
		let id = session.id();
		self.stats.clears_issued += 1;
		debug!(session = %id, "credentials cleared");
		self.notices.publish(ControllerNotice::CredentialsCleared { session: id });
		self.transition(Transition::CredentialsCleared);
	}

	/// Renderer callback: the server wants a client certificate.
	///
	/// Never blocks the handshake. Opens the selector only when
	/// `autoOpenSelector` is configured.
	pub fn on_certificate_requested(&mut self) {
		let Some(id) = self.session_id() else {
			debug!("certificate request ignored: no active session");
			return;
		};
		self.stats.certificate_requests += 1;
		info!(session = %id, "client certificate requested");
		self.notices.publish(ControllerNotice::CertificateRequested { session: id });
		if self.auto_open_selector {
			self.open();
		}
	}

	/// Renderer callback: a request completed with an HTTP error.
	///
	/// Credentials are cleared before the prompt is raised, so a reload can
	/// never reuse the rejected identity.
	pub fn on_http_error(&mut self, event: &HttpErrorEvent) -> RecoveryDecision {
		let Some(id) = self.session_id() else {
			debug!(status = event.status_code, url = %event.url, "http error ignored: no active session");
			return RecoveryDecision::NONE;
		};
		debug!(session = %id, status = event.status_code, url = %event.url, "http error");

		let decision = self.policy.classify(event);
		self.notices.publish(ControllerNotice::HttpErrorClassified {
			session: id,
			status_code: event.status_code,
			url: event.url.clone(),
			decision,
		});

		if decision.is_certificate_failure {
			self.stats.certificate_failures += 1;
			info!(session = %id, url = %event.url, "client certificate rejected");
			self.transition(Transition::CertificateRejected);
		} else {
			self.stats.unclassified_errors += 1;
		}
		if decision.should_clear_credentials {
			self.clear();
		}
		if decision.should_prompt_user {
			self.present_prompt();
		}
		decision
	}

	/// Renderer callback: a page load completed.
	pub fn on_load_finished(&mut self, event: &LoadFinishedEvent) {
		let Some(id) = self.session_id() else {
			return;
		};
		debug!(session = %id, url = %event.url, "load finished");
		self.transition(Transition::LoadFinished);
	}

	/// Dispatches a renderer signal to the matching callback.
	pub fn on_renderer_event(&mut self, event: &RendererEvent) {
		match event {
			RendererEvent::CertificateRequested => self.on_certificate_requested(),
			RendererEvent::HttpError(event) => {
				self.on_http_error(event);
			}
			RendererEvent::LoadFinished(event) => self.on_load_finished(event),
		}
	}

	/// Handles the dismissal of a prompt this controller raised.
	///
	/// Every dismissal path purges credentials again, exactly once per prompt,
	/// but only while the session the prompt was raised for is still mounted.
	pub fn on_prompt_dismissed(&mut self, prompt_id: PromptId, via: Dismissal) {
		let Some(raised_for) = self.outstanding_prompts.remove(&prompt_id) else {
			warn!(prompt_id, %via, "dismissal for unknown prompt ignored");
			return;
		};
		self.stats.prompts_dismissed += 1;
		info!(prompt_id, %via, session = %raised_for, "prompt dismissed");
		self.notices.publish(ControllerNotice::PromptDismissed { prompt_id, via });

		if self.session_id() == Some(raised_for) {
			self.clear();
		} else {
			info!(prompt_id, session = %raised_for, "prompt outlived its session; credentials left alone");
		}
	}

	/// Handles one inbox event.
	pub fn handle_event(&mut self, event: ControllerEvent) {
		match event {
			ControllerEvent::Renderer(event) => self.on_renderer_event(&event),
			ControllerEvent::Host(HostCommand::Open) => self.open(),
			ControllerEvent::Host(HostCommand::Clear) => self.clear(),
			ControllerEvent::PromptDismissed { prompt_id, via } => self.on_prompt_dismissed(prompt_id, via),
			ControllerEvent::Mount(session) => self.mount(session),
			ControllerEvent::Unmount => {
				self.unmount();
			}
			ControllerEvent::Snapshot(reply) => {
				let _ = reply.send(self.snapshot());
			}
		}
	}

	/// Drains queued inbox events without waiting, returning how many were handled.
	///
	/// Hosts without an async runtime call this after each batch of callbacks.
	pub fn process_pending(&mut self) -> usize {
		let mut handled = 0;
		while let Ok(event) = self.inbox_rx.try_recv() {
			self.handle_event(event);
			handled += 1;
		}
		handled
	}

	/// Runs the inbox loop until every [`ControllerHandle`] is dropped.
	///
	/// Returns the controller so callers can inspect its final state.
	pub async fn run(mut self) -> Self {
		self.inbox_tx = None;
		while let Some(event) = self.inbox_rx.recv().await {
			self.handle_event(event);
		}
		debug!("controller inbox closed");
		self
	}

	/// Spawns [`run`](Self::run) on the current tokio runtime.
	pub fn spawn(self) -> (ControllerHandle, JoinHandle<Self>) {
		let handle = self.handle();
		(handle, tokio::spawn(self.run()))
	}

	fn session_id(&self) -> Option<SessionId> {
		self.session.as_ref().map(SessionHandle::id)
	}

	fn transition(&mut self, transition: Transition) {
		let Some(id) = self.session_id() else {
			return;
		};
		let from = self.state;
		let to = from.apply(transition);
		if from != to {
			self.state = to;
			info!(session = %id, %from, %to, "session state changed");
			self.notices.publish(ControllerNotice::StateChanged { session: id, from, to });
		}
	}

	fn present_prompt(&mut self) {
		let Some(session) = self.session_id() else {
			return;
		};
		let prompt_id = next_prompt_id();
		let inbox = self.inbox_weak.clone();
		let on_dismiss = DismissHandle::new(prompt_id, move |prompt_id, via| {
			match inbox.upgrade() {
				Some(tx) => {
					let _ = tx.send(ControllerEvent::PromptDismissed { prompt_id, via });
				}
				None => debug!(prompt_id, "prompt dismissed after controller shut down"),
			}
		});

		self.outstanding_prompts.insert(prompt_id, session);
		self.stats.prompts_shown += 1;
		self.notices.publish(ControllerNotice::PromptShown { prompt_id });
		self.prompt.present(self.prompt_config.to_prompt(prompt_id), on_dismiss);
	}
}

impl std::fmt::Debug for SessionController {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionController")
			.field("session", &self.session)
			.field("state", &self.state)
			.field("stats", &self.stats)
			.field("outstanding_prompts", &self.outstanding_prompts)
			.finish_non_exhaustive()
	}
}
