use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings for the embedded relational store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[allow(clippy::module_name_repetitions)]
pub struct StoreSettings {
	///where the store file lives; the embedding host supplies a writable path
	/// relative paths resolve against the host's working directory
	#[serde(default = "default_path")]
	pub path: PathBuf,
}

impl Default for StoreSettings {
	fn default() -> Self {
		Self { path: default_path() }
	}
}

fn default_path() -> PathBuf {
	PathBuf::from("vocalia.db")
}
