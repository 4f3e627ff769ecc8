//! Notices published by the session controller.
//!
//! Hosts follow them through a [`NoticeStream`] to drive UI state. Tests and
//! adapters that need one specific notice register a [`NoticeWaiter`] before
//! posting the event that causes it, so nothing is missed and nobody sleeps.

use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, oneshot};
use tracing::warn;

use crate::error::{Error, Result};
use crate::policy::RecoveryDecision;
use crate::prompt::{Dismissal, PromptId};
use crate::session::{SessionId, SessionState};

/// Observable side effect of the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerNotice {
	Mounted {
		session: SessionId,
	},
	Unmounted {
		session: SessionId,
	},
	StateChanged {
		session: SessionId,
		from: SessionState,
		to: SessionState,
	},
	CertificateRequested {
		session: SessionId,
	},
	SelectorOpened {
		session: SessionId,
	},
	CredentialsCleared {
		session: SessionId,
	},
	HttpErrorClassified {
		session: SessionId,
		status_code: u16,
		url: String,
		decision: RecoveryDecision,
	},
	PromptShown {
		prompt_id: PromptId,
	},
	PromptDismissed {
		prompt_id: PromptId,
		via: Dismissal,
	},
}

type NoticeFilter = Box<dyn Fn(&ControllerNotice) -> bool + Send + Sync>;

struct PendingWaiter {
	filter: NoticeFilter,
	reply: oneshot::Sender<ControllerNotice>,
}

/// Fan-out of controller notices: waiters first, then stream subscribers.
///
/// Waiters are served before the broadcast so they see their notice even
/// when a slow subscriber makes the channel lag.
pub(crate) struct NoticeBus {
	tx: broadcast::Sender<ControllerNotice>,
	waiters: Mutex<Vec<PendingWaiter>>,
}

impl NoticeBus {
	pub fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity.max(1));
		Self {
			tx,
			waiters: Mutex::new(Vec::new()),
		}
	}

	pub fn publish(&self, notice: ControllerNotice) {
		let matched: Vec<PendingWaiter> = {
			let mut waiters = self.waiters.lock();
			// Waiters whose receiver is gone are pruned here too.
			waiters.retain(|w| !w.reply.is_closed());
			let (matched, rest): (Vec<_>, Vec<_>) = waiters.drain(..).partition(|w| (w.filter)(&notice));
			*waiters = rest;
			matched
		};
		for waiter in matched {
			let _ = waiter.reply.send(notice.clone());
		}
		// No subscribers is fine.
		let _ = self.tx.send(notice);
	}

	/// Notices published before this call are not replayed.
	pub fn subscribe(&self) -> NoticeStream {
		NoticeStream {
			rx: self.tx.subscribe(),
		}
	}

	pub fn wait_for<F>(&self, filter: F, timeout: Duration) -> NoticeWaiter
	where
		F: Fn(&ControllerNotice) -> bool + Send + Sync + 'static,
	{
		let (reply, rx) = oneshot::channel();
		self.waiters.lock().push(PendingWaiter {
			filter: Box::new(filter),
			reply,
		});
		NoticeWaiter { rx, timeout }
	}

	#[cfg(test)]
	pub fn pending_waiters(&self) -> usize {
		self.waiters.lock().len()
	}
}

/// Subscription to controller notices. Lag is logged and skipped.
pub struct NoticeStream {
	rx: broadcast::Receiver<ControllerNotice>,
}

impl NoticeStream {
	/// Next notice, or `None` once the controller is gone.
	pub async fn recv(&mut self) -> Option<ControllerNotice> {
		loop {
			match self.rx.recv().await {
				Ok(notice) => return Some(notice),
				Err(broadcast::error::RecvError::Lagged(n)) => lagged(n),
				Err(broadcast::error::RecvError::Closed) => return None,
			}
		}
	}

	/// Next already-queued notice, without waiting.
	pub fn try_recv(&mut self) -> Option<ControllerNotice> {
		loop {
			match self.rx.try_recv() {
				Ok(notice) => return Some(notice),
				Err(broadcast::error::TryRecvError::Lagged(n)) => lagged(n),
				Err(_) => return None,
			}
		}
	}
}

fn lagged(dropped: u64) {
	warn!(dropped, "notice stream lagged");
}

/// First notice matching a filter, bounded by a timeout.
pub struct NoticeWaiter {
	rx: oneshot::Receiver<ControllerNotice>,
	timeout: Duration,
}

impl NoticeWaiter {
	/// # Errors
	///
	/// - [`Error::Timeout`] if no matching notice arrives in time
	/// - [`Error::ChannelClosed`] if the controller is dropped first
	pub async fn wait(self) -> Result<ControllerNotice> {
		match tokio::time::timeout(self.timeout, self.rx).await {
			Ok(Ok(notice)) => Ok(notice),
			Ok(Err(_)) => Err(Error::ChannelClosed),
			Err(_) => Err(Error::Timeout(format!(
				"no matching controller notice within {}ms",
				self.timeout.as_millis()
			))),
		}
	}
}
