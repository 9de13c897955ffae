//! Settings realization.
//!
//! Defaults first, then an optional TOML overlay supplied by the embedding
//! host. The core reads no environment variables and discovers no paths on
//! its own.

use std::path::Path;

use figment::providers::{Format, Serialized, Toml};
use figment::Figment;

use vocalia_common::errors::{ConfigError, VoxError};
use vocalia_common::settings::EngineSettings;
use vocalia_common::VoxResult;

/// Realize the engine settings: built-in defaults, overlaid by the TOML file
/// at `overlay` when one is given.
///
/// # Errors
/// Fails when the overlay exists but does not parse, or a value fails
/// validation.
pub fn load_settings(overlay: Option<&Path>) -> VoxResult<EngineSettings> {
	let figment = Figment::from(Serialized::defaults(EngineSettings::default()));
	let figment = if let Some(path) = overlay {
		figment.admerge(Toml::file(path))
	} else {
		figment
	};
	figment.extract()
		.map_err(|err| VoxError::Config(ConfigError::Provider(err.to_string())))
}

#[cfg(test)]
mod tests {
	use super::*;
	use vocalia_common::events::DeviceSpeedClass;

	#[test]
	fn defaults_realize_without_an_overlay() -> eyre::Result<()> {
		let settings = load_settings(None)?;
		assert_eq!(settings.scrape.max_tree_depth, 50);
		assert_eq!(settings.grammar.speech_result_buffer, 64);
		assert_eq!(settings.throttle.device_speed_class, DeviceSpeedClass::Medium);
		Ok(())
	}

	#[test]
	fn a_partial_overlay_touches_only_what_it_names() -> eyre::Result<()> {
		let figment = Figment::from(Serialized::defaults(EngineSettings::default()))
			.admerge(Toml::string(
				"[throttle]\ndevice_speed_class = \"fast\"\n\n[scrape]\nmax_tree_depth = 30\n",
			));
		let settings: EngineSettings = figment.extract()?;
		assert_eq!(settings.throttle.device_speed_class, DeviceSpeedClass::Fast);
		assert_eq!(settings.scrape.max_tree_depth, 30);
		// untouched sections keep their defaults
		assert_eq!(settings.grammar.list_index_cap, 20);
		Ok(())
	}
}
