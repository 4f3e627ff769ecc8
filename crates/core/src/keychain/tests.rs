use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlatformCall {
	RequestAlias,
	ClearPreferences,
	Reload,
}

#[derive(Default)]
struct FakePlatform {
	identities: HashMap<String, ClientIdentity>,
	calls: Mutex<Vec<PlatformCall>>,
	replies: Mutex<Vec<AliasReply>>,
}

impl FakePlatform {
	fn with_identities(aliases: &[&str]) -> Self {
		Self {
			identities: aliases
				.iter()
				.map(|a| (a.to_string(), ClientIdentity::new(a, vec![vec![0x30, 0x82]])))
				.collect(),
			..Self::default()
		}
	}

	fn calls(&self) -> Vec<PlatformCall> {
		self.calls.lock().clone()
	}

	fn next_reply(&self) -> AliasReply {
		self.replies.lock().remove(0)
	}
}

impl KeychainPlatform for FakePlatform {
	fn lookup_identity(&self, alias: &str) -> Option<ClientIdentity> {
		self.identities.get(alias).cloned()
	}

	fn request_alias(&self, _session: &SessionHandle, reply: AliasReply) {
		self.calls.lock().push(PlatformCall::RequestAlias);
		self.replies.lock().push(reply);
	}

	fn clear_client_cert_preferences(&self, _session: &SessionHandle) {
		self.calls.lock().push(PlatformCall::ClearPreferences);
	}

	fn reload(&self, _session: &SessionHandle) {
		self.calls.lock().push(PlatformCall::Reload);
	}
}

#[derive(Default)]
struct CountingStore {
	inner: MemoryAliasStore,
	loads: Mutex<usize>,
}

impl AliasStore for CountingStore {
	fn load(&self) -> Result<Option<String>> {
		*self.loads.lock() += 1;
		self.inner.load()
	}

	fn save(&self, alias: &str) -> Result<()> {
		self.inner.save(alias)
	}

	fn remove(&self) -> Result<()> {
		self.inner.remove()
	}
}

struct BrokenStore;

impl AliasStore for BrokenStore {
	fn load(&self) -> Result<Option<String>> {
		Err(Error::Io(std::io::Error::other("disk gone")))
	}

	fn save(&self, _alias: &str) -> Result<()> {
		Err(Error::Io(std::io::Error::other("disk gone")))
	}

	fn remove(&self) -> Result<()> {
		Err(Error::Io(std::io::Error::other("disk gone")))
	}
}

fn session() -> SessionHandle {
	SessionHandle::new("https://tempusnu.se")
}

#[test]
fn first_request_opens_picker() {
	let bridge = KeychainBridge::new(FakePlatform::with_identities(&["work"]), MemoryAliasStore::new());

	let answer = bridge.answer_request(&session());

	assert_eq!(answer, CertificateAnswer::Pending);
	assert_eq!(bridge.platform().calls(), vec![PlatformCall::RequestAlias]);
}

#[test]
fn chosen_alias_is_installed_remembered_and_reloaded() {
	let bridge = KeychainBridge::new(FakePlatform::with_identities(&["work"]), MemoryAliasStore::new());
	let session = session();
	bridge.open_selector(&session);

	bridge.platform().next_reply().choose(Some("work".into()));

	assert_eq!(bridge.installed().map(|i| i.alias().to_string()), Some("work".into()));
	assert_eq!(bridge.store().load().unwrap().as_deref(), Some("work"));
	assert_eq!(
		bridge.platform().calls(),
		vec![
			PlatformCall::RequestAlias,
			PlatformCall::ClearPreferences,
			PlatformCall::Reload
		]
	);
	assert!(matches!(bridge.answer_request(&session), CertificateAnswer::Proceed(_)));
}

#[test]
fn cancelled_picker_forgets_alias() {
	let bridge = KeychainBridge::new(
		FakePlatform::with_identities(&["work"]),
		MemoryAliasStore::with_alias("work"),
	);
	bridge.open_selector(&session());

	bridge.platform().next_reply().cancel();

	assert!(bridge.installed().is_none());
	assert_eq!(bridge.store().load().unwrap(), None);
	assert_eq!(bridge.platform().calls().last(), Some(&PlatformCall::Reload));
}

#[test]
fn unknown_selected_alias_installs_nothing() {
	let bridge = KeychainBridge::new(FakePlatform::with_identities(&["work"]), MemoryAliasStore::new());
	bridge.open_selector(&session());

	bridge.platform().next_reply().choose(Some("revoked".into()));

	assert!(bridge.installed().is_none());
	assert_eq!(bridge.store().load().unwrap(), None);
}

#[test]
fn remembered_alias_is_reused_without_picker() {
	let bridge = KeychainBridge::new(
		FakePlatform::with_identities(&["work"]),
		MemoryAliasStore::with_alias("work"),
	);
	let session = session();

	assert_eq!(bridge.answer_request(&session), CertificateAnswer::Pending);
	assert_eq!(
		bridge.platform().calls(),
		vec![PlatformCall::ClearPreferences, PlatformCall::Reload]
	);

	let answer = bridge.answer_request(&session);
	assert!(matches!(answer, CertificateAnswer::Proceed(ref id) if id.alias() == "work"));
}

#[test]
fn stale_remembered_alias_falls_back_to_picker() {
	let bridge = KeychainBridge::new(FakePlatform::with_identities(&[]), MemoryAliasStore::with_alias("gone"));

	assert_eq!(bridge.answer_request(&session()), CertificateAnswer::Pending);

	assert_eq!(bridge.platform().calls(), vec![PlatformCall::RequestAlias]);
}

#[test]
fn clear_with_nothing_installed_is_noop() {
	let bridge = KeychainBridge::new(FakePlatform::with_identities(&["work"]), MemoryAliasStore::new());

	bridge.clear_credentials(&session());
	bridge.clear_credentials(&session());

	assert!(bridge.platform().calls().is_empty());
}

#[test]
fn clear_twice_matches_clear_once() {
	let bridge = KeychainBridge::new(FakePlatform::with_identities(&["work"]), MemoryAliasStore::new());
	let session = session();
	bridge.open_selector(&session);
	bridge.platform().next_reply().choose(Some("work".into()));

	bridge.clear_credentials(&session);
	let after_once = bridge.platform().calls();
	bridge.clear_credentials(&session);

	assert!(bridge.installed().is_none());
	assert_eq!(bridge.store().load().unwrap(), None);
	assert_eq!(bridge.platform().calls(), after_once);
}

#[test]
fn clear_forgets_remembered_alias_without_installed_identity() {
	let bridge = KeychainBridge::new(
		FakePlatform::with_identities(&["work"]),
		MemoryAliasStore::with_alias("work"),
	);

	bridge.clear_credentials(&session());

	assert_eq!(bridge.store().load().unwrap(), None);
	assert_eq!(
		bridge.platform().calls(),
		vec![PlatformCall::ClearPreferences, PlatformCall::Reload]
	);
}

#[test]
fn store_failures_do_not_escape() {
	let bridge = KeychainBridge::new(FakePlatform::with_identities(&["work"]), BrokenStore);
	let session = session();

	assert_eq!(bridge.answer_request(&session), CertificateAnswer::Pending);
	bridge.platform().next_reply().choose(Some("work".into()));
	bridge.clear_credentials(&session);

	assert!(bridge.installed().is_none());
	assert_eq!(bridge.platform().calls().last(), Some(&PlatformCall::Reload));
}

#[test]
fn pending_picker_does_not_keep_bridge_alive() {
	let bridge = KeychainBridge::new(FakePlatform::with_identities(&["work"]), MemoryAliasStore::new());
	bridge.open_selector(&session());
	let weak = Arc::downgrade(&bridge.inner);

	drop(bridge);

	assert!(weak.upgrade().is_none());
}

#[test]
fn picker_answered_after_drop_is_ignored() {
	let bridge = KeychainBridge::new(FakePlatform::with_identities(&["work"]), MemoryAliasStore::new());
	bridge.open_selector(&session());
	let reply = bridge.platform().next_reply();
	let weak = Arc::downgrade(&bridge.inner);

	drop(bridge);
	reply.choose(Some("work".into()));

	assert!(weak.upgrade().is_none());
}

#[test]
fn repeated_clears_read_store_once() {
	let bridge = KeychainBridge::new(FakePlatform::with_identities(&["work"]), CountingStore::default());
	let session = session();

	for _ in 0..3 {
		bridge.clear_credentials(&session);
	}
	bridge.open_selector(&session);
	bridge.platform().next_reply().choose(Some("work".into()));
	bridge.clear_credentials(&session);
	bridge.clear_credentials(&session);

	assert_eq!(*bridge.store().loads.lock(), 1);
	assert_eq!(bridge.store().inner.load().unwrap(), None);
}
