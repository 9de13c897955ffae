use serde::{Deserialize, Serialize};

/// Settings for command generation and speech-result dispatch.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[allow(clippy::module_name_repetitions)]
pub struct GrammarSettings {
	/// Results at or above this confidence execute immediately.
	#[serde(default = "default_confidence_high")]
	pub confidence_high: f64,
	/// Results between this and the high threshold ask the host for
	/// confirmation.
	#[serde(default = "default_confidence_medium")]
	pub confidence_medium: f64,
	/// Ordinal list-item commands are generated up to this index.
	#[serde(default = "default_list_index_cap")]
	pub list_index_cap: u32,
	/// Capacity of the speech-result buffer.
	#[serde(default = "default_speech_result_buffer")]
	pub speech_result_buffer: usize,
	/// How many nearest phrases are suggested for a low-confidence result.
	#[serde(default = "default_suggestion_count")]
	pub suggestion_count: usize,
}

impl Default for GrammarSettings {
	fn default() -> Self {
		Self {
			confidence_high: default_confidence_high(),
			confidence_medium: default_confidence_medium(),
			list_index_cap: default_list_index_cap(),
			speech_result_buffer: default_speech_result_buffer(),
			suggestion_count: default_suggestion_count(),
		}
	}
}

fn default_confidence_high() -> f64 {
	0.85
}

fn default_confidence_medium() -> f64 {
	0.60
}

fn default_list_index_cap() -> u32 {
	20
}

fn default_speech_result_buffer() -> usize {
	64
}

fn default_suggestion_count() -> usize {
	3
}
