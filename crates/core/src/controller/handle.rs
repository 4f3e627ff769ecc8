//! Inbox events and the cloneable [`ControllerHandle`].

use std::sync::Arc;
use std::time::Duration;

use certgate_protocol::{HostCommand, HttpErrorEvent, LoadFinishedEvent, RendererEvent};
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use super::ControllerSnapshot;
use crate::error::{Error, Result};
use crate::events::{ControllerNotice, NoticeBus, NoticeStream, NoticeWaiter};
use crate::prompt::{Dismissal, PromptId};
use crate::session::SessionHandle;

/// Message delivered to a [`SessionController`](super::SessionController) inbox.
#[derive(Debug)]
pub enum ControllerEvent {
	Renderer(RendererEvent),
	Host(HostCommand),
	PromptDismissed { prompt_id: PromptId, via: Dismissal },
	Mount(SessionHandle),
	Unmount,
	/// Replies with the controller state once every earlier event is handled.
	Snapshot(oneshot::Sender<ControllerSnapshot>),
}

/// Cloneable sender side of a controller.
///
/// Host UI chrome and renderer adapters hold one each. Posting never blocks;
/// host actions on a stopped controller are silently dropped, matching the
/// no-session tolerance of the controller itself.
#[derive(Clone)]
pub struct ControllerHandle {
	tx: Option<mpsc::UnboundedSender<ControllerEvent>>,
	notices: Arc<NoticeBus>,
}

impl ControllerHandle {
	pub(super) fn new(
		tx: Option<mpsc::UnboundedSender<ControllerEvent>>,
		notices: Arc<NoticeBus>,
	) -> Self {
		Self { tx, notices }
	}

	/// Posts a raw inbox event.
	///
	/// # Errors
	///
	/// Returns [`Error::ControllerClosed`] once the controller has stopped.
	pub fn send(&self, event: ControllerEvent) -> Result<()> {
		let tx = self.tx.as_ref().ok_or(Error::ControllerClosed)?;
		tx.send(event).map_err(|_| Error::ControllerClosed)
	}

	fn post(&self, event: ControllerEvent) {
		if let Err(err) = self.send(event) {
			trace!(error = %err, "event dropped");
		}
	}

	/// Host action: open the certificate selector.
	pub fn open(&self) {
		self.post(ControllerEvent::Host(HostCommand::Open));
	}

	/// Host action: forget the installed identity.
	pub fn clear(&self) {
		self.post(ControllerEvent::Host(HostCommand::Clear));
	}

	pub fn command(&self, command: HostCommand) {
		self.post(ControllerEvent::Host(command));
	}

	pub fn mount(&self, session: SessionHandle) {
		self.post(ControllerEvent::Mount(session));
	}

	pub fn unmount(&self) {
		self.post(ControllerEvent::Unmount);
	}

	/// Forwards a renderer signal.
	pub fn renderer_event(&self, event: RendererEvent) {
		self.post(ControllerEvent::Renderer(event));
	}

	pub fn certificate_requested(&self) {
		self.renderer_event(RendererEvent::CertificateRequested);
	}

	pub fn http_error(&self, event: HttpErrorEvent) {
		self.renderer_event(RendererEvent::HttpError(event));
	}

	pub fn load_finished(&self, event: LoadFinishedEvent) {
		self.renderer_event(RendererEvent::LoadFinished(event));
	}

	/// Waits until every event posted before this call has been handled.
	pub async fn snapshot(&self) -> Result<ControllerSnapshot> {
		let (reply_tx, reply_rx) = oneshot::channel();
		self.send(ControllerEvent::Snapshot(reply_tx))?;
		reply_rx.await.map_err(|_| Error::ControllerClosed)
	}

	/// Barrier: like [`snapshot`](Self::snapshot) without the result.
	pub async fn sync(&self) -> Result<()> {
		self.snapshot().await.map(|_| ())
	}

	/// Subscribes to notices emitted from now on.
	pub fn notices(&self) -> NoticeStream {
		self.notices.subscribe()
	}

	/// Registers a waiter for the first notice matching `predicate`.
	///
	/// Register before posting the event that causes the notice.
	pub fn wait_for_notice<F>(&self, predicate: F, timeout: Duration) -> NoticeWaiter
	where
		F: Fn(&ControllerNotice) -> bool + Send + Sync + 'static,
	{
		self.notices.wait_for(predicate, timeout)
	}

	/// Returns `true` once the controller can no longer receive events.
	pub fn is_closed(&self) -> bool {
		self.tx.as_ref().is_none_or(|tx| tx.is_closed())
	}
}

impl std::fmt::Debug for ControllerHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ControllerHandle")
			.field("closed", &self.is_closed())
			.finish()
	}
}
