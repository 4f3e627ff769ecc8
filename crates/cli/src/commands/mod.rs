mod classify;
mod forget;
mod replay;

use std::path::PathBuf;

use certgate::ControllerConfig;
use tracing::warn;

use crate::cli::{AliasArgs, Cli, Commands, HostArgs};
use crate::error::{CliError, Result};
use crate::output::{CommandResult, OutputFormat, print_result};

pub use self::classify::ClassifyOutput;
pub use self::forget::ForgetOutput;
pub use self::replay::ReplaySummary;

pub async fn dispatch(cli: Cli, format: OutputFormat) -> Result<()> {
	let name = cli.command.name();
	match cli.command {
		Commands::Classify { status, url, hosts } => {
			let data = classify::execute(status, &url, &hosts)?;
			print_result(&CommandResult::success(name, data), format);
		}
		Commands::Replay {
			script,
			hosts,
			target_url,
			identities,
			alias,
		} => {
			let data = replay::execute(&script, &hosts, &target_url, &identities, &alias).await?;
			print_result(&CommandResult::success(name, data), format);
		}
		Commands::Forget { alias } => {
			let data = forget::execute(&alias)?;
			print_result(&CommandResult::success(name, data), format);
		}
	}
	Ok(())
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Classify { .. } => "classify",
			Commands::Replay { .. } => "replay",
			Commands::Forget { .. } => "forget",
		}
	}
}

/// Loads `--config` (if any) and merges `--host` flags into it.
pub(crate) fn load_config(args: &HostArgs) -> Result<ControllerConfig> {
	let mut config = match &args.config {
		Some(path) => ControllerConfig::load(path)?,
		None => ControllerConfig::default(),
	};
	config.merge_hosts(args.hosts.iter().cloned());
	config.validate()?;

	if config.host_patterns.is_empty() {
		warn!("no trusted hosts configured; no error will classify as a certificate failure");
	}
	Ok(config)
}

pub(crate) fn alias_path(args: &AliasArgs) -> Result<PathBuf> {
	match &args.alias_file {
		Some(path) => Ok(path.clone()),
		None => dirs::data_dir()
			.map(|dir| dir.join("certgate").join("alias.json"))
			.ok_or(CliError::NoDataDir),
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use tempfile::TempDir;

	use super::*;

	#[test]
	fn host_flags_extend_config_file() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("certgate.json");
		fs::write(&path, r#"{"hostPatterns":["tempusnu.se"],"autoOpenSelector":true}"#).unwrap();

		let config = load_config(&HostArgs {
			config: Some(path),
			hosts: vec!["tempusnu.se".into(), "*.corp.example".into()],
		})
		.unwrap();

		assert_eq!(config.host_patterns, vec!["tempusnu.se", "*.corp.example"]);
		assert!(config.auto_open_selector);
	}

	#[test]
	fn bad_host_flag_is_rejected() {
		let err = load_config(&HostArgs {
			config: None,
			hosts: vec!["https://tempusnu.se/".into()],
		})
		.unwrap_err();
		assert!(matches!(
			err,
			CliError::Certgate(certgate::Error::InvalidHostPattern { .. })
		));
	}

	#[test]
	fn explicit_alias_file_wins() {
		let path = alias_path(&AliasArgs {
			alias_file: Some(PathBuf::from("/tmp/a.json")),
		})
		.unwrap();
		assert_eq!(path, PathBuf::from("/tmp/a.json"));
	}
}
