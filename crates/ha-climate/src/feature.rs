//! Supported-feature bitmask of climate entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error for a feature name outside the climate capability vocabulary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown climate feature '{0}'")]
pub struct UnknownFeature(pub String);

/// Set of capabilities a climate entity supports
///
/// Bit values match Home Assistant's `ClimateEntityFeature`, so the set
/// serializes to the same integer the frontend expects in the
/// `supported_features` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClimateEntityFeature(u32);

bitflags::bitflags! {
    impl ClimateEntityFeature: u32 {
        const TARGET_TEMPERATURE = 1;
        const TARGET_TEMPERATURE_RANGE = 1 << 1;
        const TARGET_HUMIDITY = 1 << 2;
        const FAN_MODE = 1 << 3;
        const PRESET_MODE = 1 << 4;
        const SWING_MODE = 1 << 5;
        // 1 << 6 was AUX_HEAT, removed upstream
        const TURN_OFF = 1 << 7;
        const TURN_ON = 1 << 8;
        const SWING_HORIZONTAL_MODE = 1 << 9;
    }
}

impl ClimateEntityFeature {
    /// snake_case names of the features in this set, in bit order
    pub fn names(self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect()
    }
}

impl FromStr for ClimateEntityFeature {
    type Err = UnknownFeature;

    /// Look up a single feature by name, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(&s.trim().to_ascii_uppercase()).ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

impl fmt::Display for ClimateEntityFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(" | "))
    }
}
