//! Commands issued by the host UI and prompt dismissal outcomes.

use serde::{Deserialize, Serialize};

/// Action triggered from host UI chrome (e.g. "Open" / "Clear" buttons).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCommand {
	/// Open the platform certificate selector for the active session.
	Open,
	/// Forget any installed client identity for the active session.
	Clear,
}

/// How a confirmation prompt was closed.
///
/// Every variant counts as a dismissal; the controller does not branch on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum Dismissal {
	/// One of the prompt's buttons was pressed.
	Button { label: String },
	/// Closed through a cancel affordance (back button, tap outside).
	Cancelled,
	/// The host dropped the prompt without an explicit user action.
	Released,
}

impl Dismissal {
	pub fn button(label: impl Into<String>) -> Self {
		Self::Button { label: label.into() }
	}
}

impl std::fmt::Display for Dismissal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Button { label } => write!(f, "button '{label}'"),
			Self::Cancelled => write!(f, "cancelled"),
			Self::Released => write!(f, "released"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn host_command_serializes_with_type_tag() {
		let json = serde_json::to_string(&HostCommand::Clear).unwrap();
		assert_eq!(json, r#"{"type":"clear"}"#);
	}

	#[test]
	fn dismissal_button_carries_label() {
		let dismissal: Dismissal = serde_json::from_str(r#"{"via":"button","label":"Ok"}"#).unwrap();
		assert_eq!(dismissal, Dismissal::button("Ok"));
		assert_eq!(dismissal.to_string(), "button 'Ok'");
	}

	#[test]
	fn dismissal_cancelled_has_no_fields() {
		let dismissal: Dismissal = serde_json::from_str(r#"{"via":"cancelled"}"#).unwrap();
		assert_eq!(dismissal, Dismissal::Cancelled);
	}
}
