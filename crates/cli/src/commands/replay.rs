use std::path::Path;
use std::sync::Arc;

use certgate::{
	AliasStore, CertificateAnswer, ControllerNotice, ControllerStats, FileAliasStore, KeychainBridge,
	RendererEvent, SessionController, SessionHandle, SessionId, SessionState,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::{AliasArgs, HostArgs};
use crate::commands::{alias_path, load_config};
use crate::error::Result;
use crate::script::{self, ScriptStep, SimulatorAction};
use crate::simulator::{ScriptedPrompt, SimulatedKeychain};

/// What the controller and the simulated platform ended up with.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
	pub session: SessionId,
	pub steps: usize,
	pub state: SessionState,
	pub stats: ControllerStats,
	pub installed_alias: Option<String>,
	pub stored_alias: Option<String>,
	pub reloads: u32,
	pub preference_clears: u32,
	pub prompts_shown: u32,
	pub open_prompts: usize,
	pub open_pickers: usize,
	/// Answer given to each `certificate_requested` step, in order.
	pub answers: Vec<String>,
	/// Steps that had nothing to act on (no open prompt or picker).
	pub skipped_steps: Vec<usize>,
	pub notices: Vec<ControllerNotice>,
}

pub async fn execute(
	script_path: &Path,
	hosts: &HostArgs,
	target_url: &str,
	identities: &[String],
	alias: &AliasArgs,
) -> Result<ReplaySummary> {
	let steps = script::load(script_path)?;
	let config = load_config(hosts)?;
	let store = FileAliasStore::new(alias_path(alias)?);

	let bridge = KeychainBridge::new(SimulatedKeychain::new(identities), store);
	let prompt = Arc::new(ScriptedPrompt::default());
	let session = SessionHandle::new(target_url);
	let controller = SessionController::new(&config, Arc::new(bridge.clone()), prompt.clone())?
		.with_session(session.clone());
	let (handle, task) = controller.spawn();
	let mut notices = handle.notices();

	info!(script = %script_path.display(), steps = steps.len(), session = %session.id(), "replaying script");

	let mut answers = Vec::new();
	let mut skipped_steps = Vec::new();
	for (line, step) in &steps {
		debug!(line = *line, step = ?step, "replay step");
		match step {
			ScriptStep::Renderer(event) => {
				handle.renderer_event(event.clone());
				if matches!(event, RendererEvent::CertificateRequested) {
					handle.sync().await?;
					answers.push(match bridge.answer_request(&session) {
						CertificateAnswer::Proceed(identity) => identity.alias().to_string(),
						CertificateAnswer::Pending => "pending".to_string(),
					});
				}
			}
			ScriptStep::Host(command) => handle.command(*command),
			ScriptStep::Simulator(SimulatorAction::Dismiss { via, label }) => {
				if !prompt.dismiss_next(via.to_dismissal(label.as_deref())) {
					skipped_steps.push(*line);
				}
			}
			ScriptStep::Simulator(SimulatorAction::Choose { alias }) => {
				if !bridge.platform().answer_picker(alias.clone()) {
					skipped_steps.push(*line);
				}
			}
		}
		handle.sync().await?;
	}

	let snapshot = handle.snapshot().await?;
	let mut seen = Vec::new();
	while let Some(notice) = notices.try_recv() {
		seen.push(notice);
	}

	drop(handle);
	// The controller stops once every handle is gone; open prompts only hold weak senders.
	task.await.map_err(anyhow::Error::from)?;

	let stored_alias = match bridge.store().load() {
		Ok(alias) => alias,
		Err(err) => {
			warn!(error = %err, "could not read remembered alias");
			None
		}
	};

	Ok(ReplaySummary {
		session: session.id(),
		steps: steps.len(),
		state: snapshot.state,
		stats: snapshot.stats,
		installed_alias: bridge.installed().map(|identity| identity.alias().to_string()),
		stored_alias,
		reloads: bridge.platform().reloads(),
		preference_clears: bridge.platform().preference_clears(),
		prompts_shown: prompt.shown(),
		open_prompts: prompt.open_count(),
		open_pickers: bridge.platform().open_pickers(),
		answers,
		skipped_steps,
		notices: seen,
	})
}
