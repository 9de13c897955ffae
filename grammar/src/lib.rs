#![deny(
	clippy::all,
	clippy::pedantic,
	clippy::cargo,
	clippy::map_unwrap_or,
	clippy::unwrap_used,
	unsafe_code
)]

//! Command indexing for Vocalia.
//!
//! Turns the element set of the foreground screen into a bounded set of
//! voice-command phrases, diffs it against the grammar the speech engine
//! currently holds, and matches incoming speech results back to actions.
//! This crate is the sole owner of the speech-engine boundary: only the
//! grammar diff it emits ever reaches [`SpeechEngine::set_active_phrases`].

mod diff;
mod engine;
mod generate;
mod matcher;
mod phrase;

pub use diff::{ActiveGrammar, CommandBinding, GrammarDelta};
pub use engine::{Feedback, NullFeedback, SpeechEngine, SpeechResult};
pub use generate::{generate_commands, GenerationContext};
pub use matcher::{match_result, Dispatch};
pub use phrase::{index_phrase, label_for, normalize};
