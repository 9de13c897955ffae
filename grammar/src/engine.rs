//! The consumed speech-engine contract and the host feedback surface.

use async_trait::async_trait;

use vocalia_common::errors::GrammarError;

/// One recognition result from the speech engine.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechResult {
	/// What the engine heard, verbatim.
	pub text: String,
	/// Recognition confidence in `[0, 1]`.
	pub confidence: f64,
}

/// The speech recognizer, as consumed by Vocalia.
///
/// `set_active_phrases` may block while the engine recompiles its grammar;
/// the indexer is its single owner and never calls it concurrently nor more
/// often than the grammar-push debounce allows.
#[async_trait]
pub trait SpeechEngine: Send + Sync + 'static {
	/// Apply a grammar delta. Returning `Ok(())` is the acknowledgement the
	/// indexer waits for before moving its own phrase window.
	async fn set_active_phrases(
		&self,
		added: &[String],
		removed: &[String],
	) -> Result<(), GrammarError>;
}

/// Host callbacks surfaced by speech-result dispatch: confirmation requests
/// for medium-confidence results and suggestions for unmatched ones.
pub trait Feedback: Send + Sync + 'static {
	/// A medium-confidence result needs user confirmation before executing.
	fn request_confirmation(&self, phrase: &str, confidence: f64);

	/// Nothing matched; offer the nearest active phrases instead.
	fn suggest(&self, heard: &str, candidates: &[String]);
}

/// A host that ignores all dispatch feedback.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullFeedback;

impl Feedback for NullFeedback {
	fn request_confirmation(&self, _phrase: &str, _confidence: f64) {}

	fn suggest(&self, _heard: &str, _candidates: &[String]) {}
}
