use std::path::PathBuf;

use certgate::{AliasStore, FileAliasStore};
use serde::Serialize;
use tracing::info;

use crate::cli::AliasArgs;
use crate::commands::alias_path;
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgetOutput {
	pub alias_file: PathBuf,
	/// Alias that was remembered before, if any.
	pub forgotten: Option<String>,
}

pub fn execute(args: &AliasArgs) -> Result<ForgetOutput> {
	let store = FileAliasStore::new(alias_path(args)?);
	// A corrupt file is removed anyway.
	let forgotten = store.load().ok().flatten();
	store.remove()?;

	info!(path = %store.path().display(), alias = ?forgotten, "remembered certificate alias cleared");

	Ok(ForgetOutput {
		alias_file: store.path().to_path_buf(),
		forgotten,
	})
}
