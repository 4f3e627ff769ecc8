use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "certgate")]
#[command(about = "Client certificate recovery for embedded web renderers")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: json (default), ndjson, or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Classify one HTTP error against the trusted host list
	Classify {
		/// HTTP status code reported by the renderer
		#[arg(long)]
		status: u16,

		/// URL of the failing request
		#[arg(long)]
		url: String,

		#[command(flatten)]
		hosts: HostArgs,
	},

	/// Replay an NDJSON script of renderer events through a controller
	Replay {
		/// Script file, one JSON step per line
		#[arg(value_name = "SCRIPT")]
		script: PathBuf,

		#[command(flatten)]
		hosts: HostArgs,

		/// URL the simulated renderer is pointed at
		#[arg(long, default_value = "https://localhost/")]
		target_url: String,

		/// Alias available in the simulated keychain (repeatable)
		#[arg(long = "identity", value_name = "ALIAS")]
		identities: Vec<String>,

		#[command(flatten)]
		alias: AliasArgs,
	},

	/// Forget the remembered certificate alias
	Forget {
		#[command(flatten)]
		alias: AliasArgs,
	},
}

/// Where trusted host patterns come from.
#[derive(Args, Debug, Clone, Default)]
pub struct HostArgs {
	/// Controller config file (JSON)
	#[arg(long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Trusted host pattern, merged with the config (repeatable)
	#[arg(long = "host", value_name = "PATTERN")]
	pub hosts: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AliasArgs {
	/// File holding the remembered alias [default: <data dir>/certgate/alias.json]
	#[arg(long, value_name = "FILE")]
	pub alias_file: Option<PathBuf>,
}

/// Help colours matching cargo's.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classify_collects_repeated_hosts() {
		let cli = Cli::try_parse_from([
			"certgate",
			"classify",
			"--status",
			"403",
			"--url",
			"https://tempusnu.se/x",
			"--host",
			"tempusnu.se",
			"--host",
			"*.corp.example",
		])
		.unwrap();

		match cli.command {
			Commands::Classify { status, hosts, .. } => {
				assert_eq!(status, 403);
				assert_eq!(hosts.hosts, vec!["tempusnu.se", "*.corp.example"]);
				assert!(hosts.config.is_none());
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn verbosity_counts_and_is_global() {
		let cli = Cli::try_parse_from(["certgate", "forget", "-vv"]).unwrap();
		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.format, OutputFormat::Json);
	}

	#[test]
	fn replay_defaults() {
		let cli = Cli::try_parse_from(["certgate", "replay", "flow.ndjson", "--identity", "work"]).unwrap();
		match cli.command {
			Commands::Replay {
				script,
				target_url,
				identities,
				alias,
				..
			} => {
				assert_eq!(script, PathBuf::from("flow.ndjson"));
				assert_eq!(target_url, "https://localhost/");
				assert_eq!(identities, vec!["work"]);
				assert!(alias.alias_file.is_none());
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn status_must_be_numeric() {
		assert!(Cli::try_parse_from(["certgate", "classify", "--status", "forbidden", "--url", "x"]).is_err());
	}
}
