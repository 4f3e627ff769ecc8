//! NDJSON replay scripts.
//!
//! One step per line; blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! {"type":"open"}
//! {"type":"choose","alias":"work"}
//! {"type":"certificate_requested"}
//! {"type":"load_finished","url":"https://tempusnu.se/"}
//! {"type":"http_error","statusCode":403,"url":"https://tempusnu.se/secure"}
//! {"type":"dismiss","via":"button","label":"Ok"}
//! ```

use std::fs;
use std::path::Path;

use certgate::{Dismissal, HostCommand, RendererEvent};
use serde::Deserialize;

use crate::error::{CliError, Result};

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
	Renderer(RendererEvent),
	Host(HostCommand),
	Simulator(SimulatorAction),
}

/// User actions outside the renderer: answering the picker or the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulatorAction {
	/// Close the oldest open prompt.
	Dismiss {
		#[serde(default)]
		via: DismissVia,
		#[serde(default)]
		label: Option<String>,
	},
	/// Answer the oldest open certificate picker; a missing alias cancels it.
	Choose {
		#[serde(default)]
		alias: Option<String>,
	},
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissVia {
	#[default]
	Button,
	Cancelled,
	Released,
}

impl DismissVia {
	/// The dismissal a `dismiss` step stands for. Buttons default to "Ok".
	pub fn to_dismissal(self, label: Option<&str>) -> Dismissal {
		match self {
			DismissVia::Button => Dismissal::button(label.unwrap_or("Ok")),
			DismissVia::Cancelled => Dismissal::Cancelled,
			DismissVia::Released => Dismissal::Released,
		}
	}
}

/// Parses script text. Line numbers in errors are 1-based.
pub fn parse(path: &Path, content: &str) -> Result<Vec<(usize, ScriptStep)>> {
	let mut steps = Vec::new();
	for (idx, raw) in content.lines().enumerate() {
		let line = raw.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}
		let step = serde_json::from_str::<ScriptStep>(line).map_err(|err| CliError::Script {
			path: path.to_path_buf(),
			line: idx + 1,
			message: format!("unrecognised step ({err})"),
		})?;
		steps.push((idx + 1, step));
	}
	Ok(steps)
}

pub fn load(path: &Path) -> Result<Vec<(usize, ScriptStep)>> {
	let content = fs::read_to_string(path)?;
	parse(path, &content)
}
