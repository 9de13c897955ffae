use std::path::PathBuf;

use serde::{Deserialize, Serialize};

///structure used for all the configurable options related to logging
#[derive(Clone, Debug, Serialize, Deserialize)]
#[allow(clippy::module_name_repetitions)]
pub struct LogSettings {
	///the logging level this session should output at
	/// see the tracing documentation for more information, in the log filters section
	/// typical values here include info, warn, debug and trace
	/// however, one can also include specific modules for which logging should be shown at a different warning level
	#[serde(default = "default_level")]
	pub level: String,
	///the place where the engine should output its logs
	#[serde(default)]
	pub logger: LoggingKind,
}

impl Default for LogSettings {
	fn default() -> Self {
		Self { level: default_level(), logger: LoggingKind::default() }
	}
}

fn default_level() -> String {
	"info".to_owned()
}

///the place where the engine should output its logs
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum LoggingKind {
	///a file where the log messages should be written
	/// the path can be both absolute and relative to the current working directory
	/// warning: the path must be accessible permission wise from the embedding process
	File(PathBuf),
	///logs are being sent to the terminal directly
	#[default]
	Tty,
}
