//! Temperature units and display precision

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit a climate entity reports temperatures in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "°C", alias = "C", alias = "celsius")]
    Celsius,
    #[serde(rename = "°F", alias = "F", alias = "fahrenheit")]
    Fahrenheit,
    #[serde(rename = "K", alias = "kelvin")]
    Kelvin,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }

    /// Convert a temperature expressed in `from` into this unit
    pub fn convert_from(&self, value: f64, from: TemperatureUnit) -> f64 {
        if *self == from {
            return value;
        }
        let celsius = match from {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => (value - 32.0) / 1.8,
            TemperatureUnit::Kelvin => value - 273.15,
        };
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 1.8 + 32.0,
            TemperatureUnit::Kelvin => celsius + 273.15,
        }
    }

    /// Precision used when none is configured
    pub fn default_precision(&self) -> Precision {
        match self {
            TemperatureUnit::Celsius => Precision::Tenths,
            _ => Precision::Whole,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Resolution temperatures are displayed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Precision {
    Tenths,
    Halves,
    Whole,
}

impl Precision {
    pub fn value(&self) -> f64 {
        match self {
            Precision::Tenths => 0.1,
            Precision::Halves => 0.5,
            Precision::Whole => 1.0,
        }
    }

    /// Round a temperature to this precision
    pub fn round(&self, value: f64) -> f64 {
        match self {
            Precision::Tenths => (value * 10.0).round() / 10.0,
            Precision::Halves => (value * 2.0).round() / 2.0,
            Precision::Whole => value.round(),
        }
    }
}

impl TryFrom<f64> for Precision {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        [Precision::Tenths, Precision::Halves, Precision::Whole]
            .into_iter()
            .find(|p| (p.value() - value).abs() < f64::EPSILON)
            .ok_or_else(|| format!("precision must be one of 0.1, 0.5 or 1.0, got {}", value))
    }
}

impl From<Precision> for f64 {
    fn from(precision: Precision) -> f64 {
        precision.value()
    }
}
