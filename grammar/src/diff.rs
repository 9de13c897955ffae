//! The active grammar and its delta against a fresh command set.
//!
//! `active_phrases` only ever reflects what the speech engine has
//! acknowledged: [`ActiveGrammar::diff`] proposes a delta, and
//! [`ActiveGrammar::commit`] applies it after the push succeeds. A failed
//! push leaves the grammar at the last acknowledged set.

use std::collections::{HashMap, HashSet};

use vocalia_common::hash::ElementHash;
use vocalia_common::model::{ActionType, CommandRecord};

/// What a phrase does when spoken: the dispatch-side view of one command.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandBinding {
	/// The phrase, normalized.
	pub phrase: String,
	/// The package the command was generated for.
	pub package: String,
	/// Target element; `None` for system commands.
	pub element_hash: Option<ElementHash>,
	/// The gesture to perform.
	pub action_type: ActionType,
	/// Generation confidence.
	pub confidence: f64,
}

/// The phrase delta to push to the speech engine, sorted for determinism.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrammarDelta {
	/// Phrases the engine should start accepting.
	pub added: Vec<String>,
	/// Phrases the engine should stop accepting.
	pub removed: Vec<String>,
}

impl GrammarDelta {
	/// Whether there is anything to push.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty()
	}
}

/// The engine-acknowledged grammar window.
#[derive(Debug, Default)]
pub struct ActiveGrammar {
	phrases: HashSet<String>,
	bindings: HashMap<String, CommandBinding>,
}

impl ActiveGrammar {
	/// An empty grammar; nothing is active until the first acknowledged push.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The delta that would take the engine from the current window to
	/// `next`.
	#[must_use]
	pub fn diff(&self, next: &[CommandRecord]) -> GrammarDelta {
		let next_phrases: HashSet<&str> =
			next.iter().map(|c| c.phrase.as_str()).collect();
		let mut added: Vec<String> = next_phrases
			.iter()
			.filter(|p| !self.phrases.contains(**p))
			.map(|p| (*p).to_owned())
			.collect();
		let mut removed: Vec<String> = self
			.phrases
			.iter()
			.filter(|p| !next_phrases.contains(p.as_str()))
			.cloned()
			.collect();
		added.sort();
		removed.sort();
		GrammarDelta { added, removed }
	}

	/// Replace the window with `next` after the engine acknowledged its
	/// delta.
	pub fn commit(&mut self, next: &[CommandRecord]) {
		tracing::trace!(phrases = next.len(), "grammar window committed");
		self.phrases = next.iter().map(|c| c.phrase.clone()).collect();
		self.bindings = next
			.iter()
			.map(|c| {
				(
					c.phrase.clone(),
					CommandBinding {
						phrase: c.phrase.clone(),
						package: c.package_name.clone(),
						element_hash: c.element_hash.clone(),
						action_type: c.action_type,
						confidence: c.confidence,
					},
				)
			})
			.collect();
	}

	/// The delta that empties the engine's grammar; pushed on shutdown so a
	/// dead target does not keep accepting phrases.
	#[must_use]
	pub fn flush_all(&self) -> GrammarDelta {
		let mut removed: Vec<String> = self.phrases.iter().cloned().collect();
		removed.sort();
		GrammarDelta { added: Vec::new(), removed }
	}

	/// The acknowledged phrase set.
	#[must_use]
	pub fn phrases(&self) -> &HashSet<String> {
		&self.phrases
	}

	/// Resolve a phrase to its binding.
	#[must_use]
	pub fn binding(&self, phrase: &str) -> Option<&CommandBinding> {
		self.bindings.get(phrase)
	}

	/// Whether nothing is currently active.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.phrases.is_empty()
	}
}
