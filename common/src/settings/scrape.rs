use serde::{Deserialize, Serialize};

/// The depth beyond which no configuration can push the walker.
pub const HARD_DEPTH_CAP: u32 = 100;

/// Settings for tree walking and screen fingerprinting.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[allow(clippy::module_name_repetitions)]
pub struct ScrapeSettings {
	/// Maximum traversal depth. Values above [`HARD_DEPTH_CAP`] are clamped
	/// at the accessor, not at parse time, so a too-large configured value
	/// survives a round trip through the config file unchanged.
	#[serde(default = "default_max_tree_depth")]
	pub max_tree_depth: u32,
	/// How many significant element descriptors feed the screen content
	/// fingerprint.
	#[serde(default = "default_top_n")]
	pub screen_fingerprint_top_n: usize,
	/// Processed events between opportunistic store maintenance passes.
	#[serde(default = "default_cleanup_threshold")]
	pub retry_cleanup_threshold: u64,
}

impl ScrapeSettings {
	/// The effective traversal depth limit, with the hard cap applied.
	#[must_use]
	pub fn effective_max_depth(&self) -> u32 {
		self.max_tree_depth.min(HARD_DEPTH_CAP)
	}
}

impl Default for ScrapeSettings {
	fn default() -> Self {
		Self {
			max_tree_depth: default_max_tree_depth(),
			screen_fingerprint_top_n: default_top_n(),
			retry_cleanup_threshold: default_cleanup_threshold(),
		}
	}
}

fn default_max_tree_depth() -> u32 {
	50
}

fn default_top_n() -> usize {
	10
}

fn default_cleanup_threshold() -> u64 {
	100
}
