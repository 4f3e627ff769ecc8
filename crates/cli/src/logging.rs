use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs the stderr subscriber. `RUST_LOG` wins over the verbosity flag.
///
/// Call once, at startup.
pub fn init_logging(verbosity: u8) {
	// 0 = warnings only, so stdout stays clean JSON
	// 1 (-v) = controller decisions
	// 2+ (-vv) = everything, including ignored events
	let filter = match verbosity {
		0 => "warn",
		1 => "warn,certgate=info,certgate_cli=info",
		_ => "debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
