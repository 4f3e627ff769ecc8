//! Host-level confirmation prompts raised after a certificate failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use certgate_protocol::Dismissal;
use serde::{Deserialize, Serialize};

static NEXT_PROMPT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a presented prompt.
pub type PromptId = u64;

/// Returns a new process-unique prompt ID.
pub fn next_prompt_id() -> PromptId {
	NEXT_PROMPT_ID.fetch_add(1, Ordering::SeqCst)
}

/// Informational prompt content. The host decides how to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationPrompt {
	#[serde(default)]
	pub id: PromptId,
	pub title: String,
	pub message: String,
	pub buttons: Vec<String>,
	/// Whether the host should offer a cancel affordance (back button, tap outside).
	pub cancelable: bool,
}

type DismissFn = Box<dyn FnOnce(PromptId, Dismissal) + Send>;

/// One-shot dismissal callback handed to the host with each prompt.
///
/// Fires exactly once: on [`dismiss`](Self::dismiss), or with
/// [`Dismissal::Released`] when the handle is dropped unused.
pub struct DismissHandle {
	prompt_id: PromptId,
	on_dismiss: Option<DismissFn>,
}

impl DismissHandle {
	pub fn new<F>(prompt_id: PromptId, on_dismiss: F) -> Self
	where
		F: FnOnce(PromptId, Dismissal) + Send + 'static,
	{
		Self {
			prompt_id,
			on_dismiss: Some(Box::new(on_dismiss)),
		}
	}

	pub fn prompt_id(&self) -> PromptId {
		self.prompt_id
	}

	/// Reports that the user closed the prompt through `via`.
	pub fn dismiss(mut self, via: Dismissal) {
		self.fire(via);
	}

	fn fire(&mut self, via: Dismissal) {
		if let Some(on_dismiss) = self.on_dismiss.take() {
			on_dismiss(self.prompt_id, via);
		}
	}
}

impl Drop for DismissHandle {
	fn drop(&mut self) {
		self.fire(Dismissal::Released);
	}
}

impl std::fmt::Debug for DismissHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DismissHandle")
			.field("prompt_id", &self.prompt_id)
			.field("pending", &self.on_dismiss.is_some())
			.finish()
	}
}

/// Host UI surface able to show a [`ConfirmationPrompt`].
///
/// `present` must not block. The host keeps `on_dismiss` until the prompt
/// closes and then calls [`DismissHandle::dismiss`], or simply drops it.
pub trait HostPrompt: Send + Sync {
	fn present(&self, prompt: ConfirmationPrompt, on_dismiss: DismissHandle);
}

impl<T: HostPrompt + ?Sized> HostPrompt for Arc<T> {
	fn present(&self, prompt: ConfirmationPrompt, on_dismiss: DismissHandle) {
		(**self).present(prompt, on_dismiss)
	}
}

/// Prompt surface that closes every prompt immediately.
///
/// Useful for headless hosts: credentials are still purged on dismissal.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDismiss;

impl HostPrompt for AutoDismiss {
	fn present(&self, prompt: ConfirmationPrompt, on_dismiss: DismissHandle) {
		tracing::debug!(prompt_id = prompt.id, title = %prompt.title, "auto-dismissing prompt");
		on_dismiss.dismiss(Dismissal::Released);
	}
}
