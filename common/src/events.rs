//! The event and operation taxonomies the coordinator throttles over.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A kind of accessibility event delivered by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
	/// The foreground window changed. Never skipped, never debounced.
	WindowChange,
	/// Content inside the current window changed.
	ContentChange,
	/// A container scrolled.
	Scroll,
	/// Input focus moved.
	Focus,
	/// A notification was posted.
	Notification,
}

impl EventKind {
	/// Whether the coordinator may drop this event under the
	/// same-kind-in-flight guard or the debounce window.
	#[must_use]
	pub fn is_skippable(self) -> bool {
		!matches!(self, EventKind::WindowChange)
	}

	/// The debounce row this event is throttled under.
	#[must_use]
	pub fn operation(self) -> Operation {
		match self {
			EventKind::WindowChange => Operation::WindowChange,
			EventKind::Scroll => Operation::Scroll,
			EventKind::ContentChange | EventKind::Focus | EventKind::Notification => {
				Operation::ContentChange
			}
		}
	}
}

/// A throttled operation: one row of the debounce table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Operation {
	/// Re-scrape after content changed.
	ContentChange,
	/// Re-scrape after a scroll settled.
	Scroll,
	/// Push a grammar delta to the speech engine.
	GrammarPush,
	/// Handle a foreground window change.
	WindowChange,
}

impl Operation {
	/// Whether the high-throttle (memory pressure) mode may slow this
	/// operation further. Window changes are never delayed.
	#[must_use]
	pub fn is_skippable(self) -> bool {
		!matches!(self, Operation::WindowChange)
	}

	/// All operations, for iteration in tests and telemetry.
	pub const ALL: [Operation; 4] = [
		Operation::ContentChange,
		Operation::Scroll,
		Operation::GrammarPush,
		Operation::WindowChange,
	];
}

/// The static device speed tiers the debounce table is keyed by.
#[derive(
	Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeviceSpeedClass {
	/// Low-end hardware; widest debounce windows.
	Slow,
	/// The default tier.
	#[default]
	Medium,
	/// Flagship hardware; tightest debounce windows.
	Fast,
}
