//! HVAC modes and actions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a string is not a known HVAC mode or action
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseHvacError {
    #[error("'{0}' is not a valid hvac mode")]
    InvalidMode(String),

    #[error("'{0}' is not a valid hvac action")]
    InvalidAction(String),
}

/// Operation mode of a climate device
///
/// Serialized as the lowercase string Home Assistant uses for the entity
/// state (e.g. "heat_cool", "fan_only").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    Off,
    Heat,
    Cool,
    HeatCool,
    Auto,
    Dry,
    FanOnly,
}

impl HvacMode {
    pub const ALL: [HvacMode; 7] = [
        HvacMode::Off,
        HvacMode::Heat,
        HvacMode::Cool,
        HvacMode::HeatCool,
        HvacMode::Auto,
        HvacMode::Dry,
        HvacMode::FanOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Off => "off",
            HvacMode::Heat => "heat",
            HvacMode::Cool => "cool",
            HvacMode::HeatCool => "heat_cool",
            HvacMode::Auto => "auto",
            HvacMode::Dry => "dry",
            HvacMode::FanOnly => "fan_only",
        }
    }

    /// Whether this mode uses a low/high setpoint pair instead of a single one
    pub fn is_range(&self) -> bool {
        matches!(self, HvacMode::HeatCool)
    }
}

impl FromStr for HvacMode {
    type Err = ParseHvacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HvacMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ParseHvacError::InvalidMode(s.to_string()))
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a climate device is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacAction {
    Off,
    Preheating,
    Heating,
    Cooling,
    Drying,
    Idle,
    Fan,
    Defrosting,
}

impl HvacAction {
    pub const ALL: [HvacAction; 8] = [
        HvacAction::Off,
        HvacAction::Preheating,
        HvacAction::Heating,
        HvacAction::Cooling,
        HvacAction::Drying,
        HvacAction::Idle,
        HvacAction::Fan,
        HvacAction::Defrosting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HvacAction::Off => "off",
            HvacAction::Preheating => "preheating",
            HvacAction::Heating => "heating",
            HvacAction::Cooling => "cooling",
            HvacAction::Drying => "drying",
            HvacAction::Idle => "idle",
            HvacAction::Fan => "fan",
            HvacAction::Defrosting => "defrosting",
        }
    }
}

impl FromStr for HvacAction {
    type Err = ParseHvacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HvacAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ParseHvacError::InvalidAction(s.to_string()))
    }
}

impl fmt::Display for HvacAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
