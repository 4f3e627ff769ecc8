//! Stand-ins for the platform keychain and the host's dialog, driven by a
//! replay script instead of a user.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};

use certgate::{
	AliasReply, ClientIdentity, ConfirmationPrompt, DismissHandle, Dismissal, HostPrompt, KeychainPlatform,
	SessionHandle,
};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Keychain holding a fixed set of aliases, with the picker answered by [`SimulatedKeychain::answer_picker`].
#[derive(Debug, Default)]
pub struct SimulatedKeychain {
	identities: HashMap<String, ClientIdentity>,
	pickers: Mutex<VecDeque<AliasReply>>,
	preference_clears: AtomicU32,
	reloads: AtomicU32,
}

impl SimulatedKeychain {
	pub fn new<I, S>(aliases: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let identities = aliases
			.into_iter()
			.map(|alias| {
				let alias = alias.as_ref();
				// Placeholder DER; nothing here inspects the chain.
				(alias.to_string(), ClientIdentity::new(alias, vec![alias.as_bytes().to_vec()]))
			})
			.collect();
		Self {
			identities,
			..Self::default()
		}
	}

	/// Answers the oldest open picker. Returns false if no picker is open.
	pub fn answer_picker(&self, alias: Option<String>) -> bool {
		let Some(reply) = self.pickers.lock().pop_front() else {
			warn!("no certificate picker is open");
			return false;
		};
		reply.choose(alias);
		true
	}

	pub fn open_pickers(&self) -> usize {
		self.pickers.lock().len()
	}

	pub fn reloads(&self) -> u32 {
		self.reloads.load(Ordering::Relaxed)
	}

	pub fn preference_clears(&self) -> u32 {
		self.preference_clears.load(Ordering::Relaxed)
	}
}

impl KeychainPlatform for SimulatedKeychain {
	fn lookup_identity(&self, alias: &str) -> Option<ClientIdentity> {
		self.identities.get(alias).cloned()
	}

	fn request_alias(&self, session: &SessionHandle, reply: AliasReply) {
		debug!(session = %session.id(), "certificate picker opened");
		self.pickers.lock().push_back(reply);
	}

	fn clear_client_cert_preferences(&self, _session: &SessionHandle) {
		self.preference_clears.fetch_add(1, Ordering::Relaxed);
	}

	fn reload(&self, session: &SessionHandle) {
		debug!(session = %session.id(), url = session.target_url(), "renderer reload");
		self.reloads.fetch_add(1, Ordering::Relaxed);
	}
}

/// Holds presented prompts until the script dismisses them.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
	open: Mutex<VecDeque<(ConfirmationPrompt, DismissHandle)>>,
	shown: AtomicU32,
}

impl ScriptedPrompt {
	/// Dismisses the oldest open prompt. Returns false if none is open.
	pub fn dismiss_next(&self, via: Dismissal) -> bool {
		let Some((prompt, handle)) = self.open.lock().pop_front() else {
			warn!("no prompt is open");
			return false;
		};
		debug!(prompt_id = prompt.id, via = %via, "dismissing prompt");
		handle.dismiss(via);
		true
	}

	pub fn shown(&self) -> u32 {
		self.shown.load(Ordering::Relaxed)
	}

	pub fn open_count(&self) -> usize {
		self.open.lock().len()
	}
}

impl HostPrompt for ScriptedPrompt {
	fn present(&self, prompt: ConfirmationPrompt, on_dismiss: DismissHandle) {
		self.shown.fetch_add(1, Ordering::Relaxed);
		self.open.lock().push_back((prompt, on_dismiss));
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::AtomicBool;

	use super::*;

	#[test]
	fn answering_without_picker_is_reported() {
		let keychain = SimulatedKeychain::new(["work"]);
		assert!(!keychain.answer_picker(Some("work".into())));
		assert!(keychain.lookup_identity("work").is_some());
		assert!(keychain.lookup_identity("home").is_none());
	}

	#[test]
	fn prompts_are_dismissed_in_order() {
		let prompt = ScriptedPrompt::default();
		let fired = Arc::new(Mutex::new(Vec::new()));
		for id in [1, 2] {
			let fired = Arc::clone(&fired);
			prompt.present(
				ConfirmationPrompt {
					id,
					title: "t".into(),
					message: "m".into(),
					buttons: vec!["Ok".into()],
					cancelable: true,
				},
				DismissHandle::new(id, move |id, via| fired.lock().push((id, via))),
			);
		}

		assert!(prompt.dismiss_next(Dismissal::Cancelled));
		assert_eq!(prompt.open_count(), 1);
		assert_eq!(prompt.shown(), 2);
		assert_eq!(*fired.lock(), vec![(1, Dismissal::Cancelled)]);
	}

	#[test]
	fn dropping_prompt_releases_handles() {
		let released = Arc::new(AtomicBool::new(false));
		{
			let prompt = ScriptedPrompt::default();
			let released = Arc::clone(&released);
			prompt.present(
				ConfirmationPrompt {
					id: 7,
					title: String::new(),
					message: String::new(),
					buttons: vec![],
					cancelable: true,
				},
				DismissHandle::new(7, move |_, via| {
					released.store(via == Dismissal::Released, Ordering::SeqCst);
				}),
			);
		}
		assert!(released.load(Ordering::SeqCst));
	}
}
