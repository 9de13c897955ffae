//! Logging with the [`tracing`] crate.
//!
//! Optional: embedding hosts that already own a subscriber simply never call
//! [`init`].

use tracing_error::ErrorLayer;
use tracing_subscriber::{prelude::*, EnvFilter};
use tracing_tree::HierarchicalLayer;

use vocalia_common::errors::{ConfigError, VoxError};
use vocalia_common::settings::{EngineSettings, LoggingKind};

/// Initialise the logging stack from the log section of the settings.
///
/// # Errors
/// Fails when the level filter does not parse, the log file cannot be
/// created, or a global subscriber is already installed.
pub fn init(settings: &EngineSettings) -> Result<(), VoxError> {
	let env_filter = EnvFilter::try_new(&settings.log.level)
		.map_err(|err| ConfigError::Invalid(err.to_string()))?;
	//this requires boxing because the types returned by this match block would be incompatible otherwise, since we return different layers depending on what we get from the configuration
	let output_layer = match &settings.log.logger {
		LoggingKind::File(path) => {
			let file = std::fs::File::create(path).map_err(|err| {
				ConfigError::Provider(format!(
					"creating log file '{}': {err}",
					path.display()
				))
			})?;
			let fmt = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file);
			fmt.boxed()
		}
		LoggingKind::Tty => tracing_subscriber::fmt::layer()
			.with_ansi(true)
			.with_target(true)
			.boxed(),
	};
	let subscriber = tracing_subscriber::Registry::default()
		.with(env_filter)
		.with(output_layer)
		.with(ErrorLayer::default())
		.with(HierarchicalLayer::new(4)
			.with_bracketed_fields(true)
			.with_targets(true)
			.with_deferred_spans(true)
			.with_span_retrace(true)
			.with_indent_lines(true));
	tracing::subscriber::set_global_default(subscriber)
		.map_err(|err| VoxError::Generic(err.to_string()))?;
	Ok(())
}
