//! All settings recognized by the Vocalia engine.
//!
//! Every section has serde defaults so a partial TOML override only touches
//! what it names. The engine treats the realized struct as a read-only view;
//! nothing re-reads configuration after startup.

mod grammar;
mod log;
mod scrape;
mod store;
mod throttle;

pub use grammar::GrammarSettings;
pub use log::{LogSettings, LoggingKind};
pub use scrape::{ScrapeSettings, HARD_DEPTH_CAP};
pub use store::StoreSettings;
pub use throttle::ThrottleSettings;

use serde::{Deserialize, Serialize};

/// The realized engine configuration, one field per section.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineSettings {
	/// Tree walking and fingerprinting.
	#[serde(default)]
	pub scrape: ScrapeSettings,
	/// Command generation and dispatch thresholds.
	#[serde(default)]
	pub grammar: GrammarSettings,
	/// Debounce tier selection.
	#[serde(default)]
	pub throttle: ThrottleSettings,
	/// Embedded store location.
	#[serde(default)]
	pub store: StoreSettings,
	/// Log sink and level.
	#[serde(default)]
	pub log: LogSettings,
}
