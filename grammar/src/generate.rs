//! Command generation.
//!
//! Four sources feed the grammar for a screen, in decreasing phrase
//! priority: the persistent system set, label commands, list-index commands,
//! and the ephemeral numeric overlay. A phrase is claimed by the first
//! source that produces it; `(package, phrase)` stays unique across the
//! whole window.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use vocalia_common::hash::ElementHash;
use vocalia_common::model::{now_millis, ActionType, CommandRecord, ElementRecord};
use vocalia_common::settings::GrammarSettings;

use crate::phrase::{index_phrase, label_for};

/// The fixed persistent command set; phrases the user can always say.
const SYSTEM_COMMANDS: [(&str, ActionType); 7] = [
	("go back", ActionType::System),
	("go home", ActionType::System),
	("recent apps", ActionType::System),
	("scroll up", ActionType::ScrollUp),
	("scroll down", ActionType::ScrollDown),
	("page up", ActionType::ScrollUp),
	("page down", ActionType::ScrollDown),
];

/// Per-element confidence boost per prior successful interaction, and its cap.
const BOOST_PER_SUCCESS: f64 = 0.02;
const BOOST_CAP: f64 = 0.1;

/// Inputs to one generation pass.
pub struct GenerationContext<'a> {
	/// The package the commands belong to.
	pub package: &'a str,
	/// Thresholds and caps.
	pub settings: &'a GrammarSettings,
	/// Memory pressure suspends the numeric overlay.
	pub suspend_numeric_overlay: bool,
	/// Successful-interaction counts per element, for the ranking boost.
	pub interaction_counts: &'a HashMap<ElementHash, i64>,
}

impl GenerationContext<'_> {
	fn boost(&self, element_hash: &ElementHash) -> f64 {
		let successes = self.interaction_counts.get(element_hash).copied().unwrap_or(0);
		#[allow(clippy::cast_precision_loss)]
		let boost = successes as f64 * BOOST_PER_SUCCESS;
		boost.min(BOOST_CAP)
	}
}

/// Generate the command set for the current element set.
///
/// Elements must be in walk emission order; the numeric overlay numbers
/// actionable elements in that order, which is what the host draws.
#[must_use]
pub fn generate_commands(
	elements: &[ElementRecord],
	ctx: &GenerationContext<'_>,
) -> Vec<CommandRecord> {
	let now = now_millis();
	let mut commands = Vec::new();
	let mut claimed: HashSet<String> = HashSet::new();

	let push = |commands: &mut Vec<CommandRecord>,
	                claimed: &mut HashSet<String>,
	                phrase: String,
	                element_hash: Option<ElementHash>,
	                action_type: ActionType,
	                confidence: f64,
	                is_persistent: bool| {
		if !claimed.insert(phrase.clone()) {
			return;
		}
		commands.push(CommandRecord {
			command_id: None,
			package_name: ctx.package.to_owned(),
			element_hash,
			phrase,
			action_type,
			confidence: confidence.min(1.0),
			is_persistent,
			last_used_at: None,
			created_at: now,
		});
	};

	for (phrase, action_type) in SYSTEM_COMMANDS {
		push(&mut commands, &mut claimed, phrase.to_owned(), None, action_type, 1.0, true);
	}

	// Label commands, disambiguated: when several elements normalize to the
	// same phrase, the visually heaviest wins, then the shallower, then the
	// earlier sibling. Losers stay reachable through the numeric overlay.
	let mut by_phrase: HashMap<String, Vec<(usize, f64)>> = HashMap::new();
	for (index, element) in elements.iter().enumerate() {
		if !element.is_actionable() {
			continue;
		}
		if let Some((phrase, confidence)) = label_for(element) {
			by_phrase.entry(phrase).or_default().push((index, confidence));
		}
	}
	let mut label_phrases: Vec<_> = by_phrase.into_iter().collect();
	label_phrases.sort_by(|a, b| a.0.cmp(&b.0));
	for (phrase, mut contenders) in label_phrases {
		contenders.sort_by_key(|&(index, _)| {
			let e = &elements[index];
			(Reverse(e.visual_weight), e.depth, e.child_order)
		});
		let (winner, confidence) = contenders[0];
		let element = &elements[winner];
		let action = if element.is_clickable {
			ActionType::Click
		} else {
			ActionType::LongClick
		};
		push(
			&mut commands,
			&mut claimed,
			phrase,
			Some(element.element_hash.clone()),
			action,
			confidence + ctx.boost(&element.element_hash),
			false,
		);
	}

	// List-index commands for actionable items inside scrollable containers.
	for element in elements {
		if !element.is_actionable() || !element.in_scrollable {
			continue;
		}
		let Some(list_index) = element.list_index else { continue };
		let Some(phrase) = index_phrase(list_index + 1, ctx.settings.list_index_cap)
		else {
			continue;
		};
		push(
			&mut commands,
			&mut claimed,
			phrase,
			Some(element.element_hash.clone()),
			ActionType::Click,
			0.8,
			false,
		);
	}

	// The numeric overlay: badge numbers for everything actionable on
	// screen, ephemeral by construction.
	if !ctx.suspend_numeric_overlay {
		let mut badge = 0_u32;
		for element in elements {
			if !element.is_actionable() || element.bounds.area() == 0 {
				continue;
			}
			badge += 1;
			push(
				&mut commands,
				&mut claimed,
				badge.to_string(),
				Some(element.element_hash.clone()),
				ActionType::Click,
				1.0,
				false,
			);
		}
	}

	commands
}

#[cfg(test)]
mod tests {
	use super::*;
	use vocalia_common::model::Bounds;

	fn button(label: &str, weight: i64, depth: u32, order: u32) -> ElementRecord {
		let mut e = ElementRecord::for_walk(
			"com.ex",
			"android.widget.Button",
			None,
			Some(label.to_owned()),
			None,
			Bounds::new(0, 0, 100, 40),
			depth,
			order,
			&format!("root:{depth}/{order}"),
		);
		e.is_clickable = true;
		e.visual_weight = weight;
		e
	}

	fn ctx<'a>(
		settings: &'a GrammarSettings,
		counts: &'a HashMap<ElementHash, i64>,
	) -> GenerationContext<'a> {
		GenerationContext {
			package: "com.ex",
			settings,
			suspend_numeric_overlay: false,
			interaction_counts: counts,
		}
	}

	#[test]
	fn system_commands_are_always_present_and_persistent() {
		let settings = GrammarSettings::default();
		let counts = HashMap::new();
		let commands = generate_commands(&[], &ctx(&settings, &counts));
		assert_eq!(commands.len(), SYSTEM_COMMANDS.len());
		assert!(commands.iter().all(|c| c.is_persistent));
	}

	#[test]
	fn duplicate_labels_resolve_by_visual_weight_then_depth() {
		let settings = GrammarSettings::default();
		let counts = HashMap::new();
		let heavy = button("Settings", 9_000, 3, 1);
		let light = button("Settings", 1_000, 1, 0);
		let commands =
			generate_commands(&[light.clone(), heavy.clone()], &ctx(&settings, &counts));
		let settings_cmd = commands
			.iter()
			.find(|c| c.phrase == "settings")
			.expect("label command generated");
		assert_eq!(settings_cmd.element_hash.as_ref(), Some(&heavy.element_hash));
		// The loser is still reachable by its badge number.
		let badges: Vec<_> = commands
			.iter()
			.filter(|c| c.phrase.chars().all(|ch| ch.is_ascii_digit()))
			.collect();
		assert_eq!(badges.len(), 2);
	}

	#[test]
	fn list_items_get_ordinal_commands_up_to_the_cap() {
		let settings = GrammarSettings { list_index_cap: 3, ..GrammarSettings::default() };
		let counts = HashMap::new();
		let mut elements = Vec::new();
		for i in 0..5_u32 {
			let mut e = button(&format!("Row {i}"), 100, 2, i);
			e.in_scrollable = true;
			e.list_index = Some(i);
			elements.push(e);
		}
		let commands = generate_commands(&elements, &ctx(&settings, &counts));
		let phrases: HashSet<_> = commands.iter().map(|c| c.phrase.as_str()).collect();
		assert!(phrases.contains("first"));
		assert!(phrases.contains("third"));
		assert!(!phrases.contains("fourth"));
	}

	#[test]
	fn memory_pressure_suspends_the_numeric_overlay() {
		let settings = GrammarSettings::default();
		let counts = HashMap::new();
		let mut context = ctx(&settings, &counts);
		context.suspend_numeric_overlay = true;
		let commands = generate_commands(&[button("Go", 100, 1, 0)], &context);
		assert!(commands.iter().all(|c| !c.phrase.chars().all(|ch| ch.is_ascii_digit())));
	}

	#[test]
	fn successful_interactions_boost_confidence() {
		let settings = GrammarSettings::default();
		let element = button("Compose", 100, 1, 0);
		let mut counts = HashMap::new();
		counts.insert(element.element_hash.clone(), 3);
		let commands = generate_commands(std::slice::from_ref(&element), &ctx(&settings, &counts));
		let compose = commands
			.iter()
			.find(|c| c.phrase == "compose")
			.expect("label command generated");
		assert!((compose.confidence - 0.96).abs() < 1e-9);
	}

	#[test]
	fn phrases_stay_unique_across_sources() {
		let settings = GrammarSettings::default();
		let counts = HashMap::new();
		// An element labeled like a system command must not shadow it.
		let rogue = button("Go Back", 100, 1, 0);
		let commands = generate_commands(std::slice::from_ref(&rogue), &ctx(&settings, &counts));
		let go_back: Vec<_> =
			commands.iter().filter(|c| c.phrase == "go back").collect();
		assert_eq!(go_back.len(), 1);
		assert!(go_back[0].is_persistent);
	}
}
