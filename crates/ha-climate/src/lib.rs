//! Climate domain model for Home Assistant
//!
//! This crate provides the types shared by climate entities: HVAC modes and
//! actions, the supported-feature bitmask, temperature units and precision,
//! and the state snapshot an entity publishes to (and is restored from) the
//! host.

mod feature;
mod hvac;
mod state;
mod unit;

pub use feature::{ClimateEntityFeature, UnknownFeature};
pub use hvac::{HvacAction, HvacMode, ParseHvacError};
pub use state::State;
pub use unit::{Precision, TemperatureUnit};

/// Entity domain for climate devices
pub const DOMAIN: &str = "climate";

/// State value of an entity whose value is not known
pub const STATE_UNKNOWN: &str = "unknown";

/// State value of an entity that cannot be reached
pub const STATE_UNAVAILABLE: &str = "unavailable";

pub const STATE_ON: &str = "on";
pub const STATE_OFF: &str = "off";

/// Attribute keys used in published climate state
pub mod attrs {
    pub const ATTR_HVAC_MODES: &str = "hvac_modes";
    pub const ATTR_HVAC_ACTION: &str = "hvac_action";
    pub const ATTR_MIN_TEMP: &str = "min_temp";
    pub const ATTR_MAX_TEMP: &str = "max_temp";
    pub const ATTR_TARGET_TEMP_STEP: &str = "target_temp_step";
    pub const ATTR_CURRENT_TEMPERATURE: &str = "current_temperature";
    pub const ATTR_TEMPERATURE: &str = "temperature";
    pub const ATTR_TARGET_TEMP_HIGH: &str = "target_temp_high";
    pub const ATTR_TARGET_TEMP_LOW: &str = "target_temp_low";
    pub const ATTR_CURRENT_HUMIDITY: &str = "current_humidity";
    pub const ATTR_HUMIDITY: &str = "humidity";
    pub const ATTR_MIN_HUMIDITY: &str = "min_humidity";
    pub const ATTR_MAX_HUMIDITY: &str = "max_humidity";
    pub const ATTR_HVAC_MODE: &str = "hvac_mode";
    pub const ATTR_FAN_MODE: &str = "fan_mode";
    pub const ATTR_FAN_MODES: &str = "fan_modes";
    pub const ATTR_PRESET_MODE: &str = "preset_mode";
    pub const ATTR_PRESET_MODES: &str = "preset_modes";
    pub const ATTR_SWING_MODE: &str = "swing_mode";
    pub const ATTR_SWING_MODES: &str = "swing_modes";
    pub const ATTR_SWING_HORIZONTAL_MODE: &str = "swing_horizontal_mode";
    pub const ATTR_SWING_HORIZONTAL_MODES: &str = "swing_horizontal_modes";
    pub const ATTR_SUPPORTED_FEATURES: &str = "supported_features";
    pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";
    pub const ATTR_ICON: &str = "icon";
    pub const ATTR_TEMPERATURE_UNIT: &str = "temperature_unit";
}

/// Built-in fan, preset and bound defaults of the climate domain
pub mod defaults {
    pub const FAN_AUTO: &str = "auto";
    pub const FAN_LOW: &str = "low";
    pub const FAN_MEDIUM: &str = "medium";
    pub const FAN_HIGH: &str = "high";

    pub const PRESET_ECO: &str = "eco";
    pub const PRESET_AWAY: &str = "away";
    pub const PRESET_BOOST: &str = "boost";
    pub const PRESET_COMFORT: &str = "comfort";
    pub const PRESET_HOME: &str = "home";
    pub const PRESET_SLEEP: &str = "sleep";
    pub const PRESET_ACTIVITY: &str = "activity";

    /// Lower temperature bound, in degrees Celsius
    pub const DEFAULT_MIN_TEMP: f64 = 7.0;
    /// Upper temperature bound, in degrees Celsius
    pub const DEFAULT_MAX_TEMP: f64 = 35.0;
    pub const DEFAULT_MIN_HUMIDITY: f64 = 30.0;
    pub const DEFAULT_MAX_HUMIDITY: f64 = 99.0;
}
