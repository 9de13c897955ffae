//! Speech-result matching.

use vocalia_common::settings::GrammarSettings;

use crate::diff::{ActiveGrammar, CommandBinding};
use crate::phrase::normalize;

/// Candidates below this normalized similarity are not worth suggesting.
const SUGGESTION_FLOOR: f64 = 0.4;

/// What to do with one speech result.
#[derive(Debug, PartialEq)]
pub enum Dispatch<'a> {
	/// Execute the bound action immediately.
	Execute(&'a CommandBinding),
	/// Ask the host to confirm before executing.
	Confirm(&'a CommandBinding),
	/// No confident match; offer the nearest active phrases.
	Suggest(Vec<String>),
}

/// Match a recognition result against the acknowledged grammar window.
///
/// High-confidence exact matches execute, medium-confidence ones confirm,
/// and everything else degrades to up-to-K nearest phrases by normalized
/// edit distance.
#[must_use]
pub fn match_result<'a>(
	grammar: &'a ActiveGrammar,
	text: &str,
	confidence: f64,
	settings: &GrammarSettings,
) -> Dispatch<'a> {
	let phrase = normalize(text);
	if let Some(binding) = grammar.binding(&phrase) {
		if confidence >= settings.confidence_high {
			return Dispatch::Execute(binding);
		}
		if confidence >= settings.confidence_medium {
			return Dispatch::Confirm(binding);
		}
	}
	let mut scored: Vec<(f64, &String)> = grammar
		.phrases()
		.iter()
		.map(|candidate| (strsim::normalized_levenshtein(&phrase, candidate), candidate))
		.filter(|(score, _)| *score >= SUGGESTION_FLOOR)
		.collect();
	scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
	Dispatch::Suggest(
		scored.into_iter()
			.take(settings.suggestion_count)
			.map(|(_, candidate)| candidate.clone())
			.collect(),
	)
}
