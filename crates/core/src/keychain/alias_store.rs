//! Persistence of the last selected certificate alias.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Remembers which alias the user picked, across renderer sessions.
///
/// Called synchronously from the controller task whenever the installed
/// identity changes, so implementations must return quickly. [`FileAliasStore`]
/// does one small blocking read or write; hosts that keep the alias
/// somewhere slower should buffer it in memory and persist in the background.
pub trait AliasStore: Send + Sync {
	fn load(&self) -> Result<Option<String>>;
	fn save(&self, alias: &str) -> Result<()>;
	/// Forgets the alias. Removing when nothing is stored succeeds.
	fn remove(&self) -> Result<()>;
}

/// In-process alias store.
#[derive(Debug, Default)]
pub struct MemoryAliasStore {
	alias: Mutex<Option<String>>,
}

impl MemoryAliasStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_alias(alias: impl Into<String>) -> Self {
		Self {
			alias: Mutex::new(Some(alias.into())),
		}
	}
}

impl AliasStore for MemoryAliasStore {
	fn load(&self) -> Result<Option<String>> {
		Ok(self.alias.lock().clone())
	}

	fn save(&self, alias: &str) -> Result<()> {
		*self.alias.lock() = Some(alias.to_string());
		Ok(())
	}

	fn remove(&self) -> Result<()> {
		self.alias.lock().take();
		Ok(())
	}
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AliasFile {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	alias: Option<String>,
}

/// Alias store backed by a small JSON file (`{"alias": "..."}`).
#[derive(Debug, Clone)]
pub struct FileAliasStore {
	path: PathBuf,
}

impl FileAliasStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl AliasStore for FileAliasStore {
	fn load(&self) -> Result<Option<String>> {
		let content = match fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
			Err(err) => return Err(err.into()),
		};
		let file: AliasFile = serde_json::from_str(&content)?;
		Ok(file.alias.filter(|a| !a.is_empty()))
	}

	fn save(&self, alias: &str) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		let file = AliasFile {
			alias: Some(alias.to_string()),
		};
		fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
		Ok(())
	}

	fn remove(&self) -> Result<()> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
			Err(err) => Err(err.into()),
		}
	}
}
