use serde::{Deserialize, Serialize};

use crate::events::DeviceSpeedClass;

/// Settings selecting the debounce tier.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[allow(clippy::module_name_repetitions)]
pub struct ThrottleSettings {
	/// Which row of the debounce table this device uses.
	#[serde(default)]
	pub device_speed_class: DeviceSpeedClass,
}
