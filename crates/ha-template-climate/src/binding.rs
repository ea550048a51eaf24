//! Attribute bindings
//!
//! Every observable of a template climate is held in an [`AttributeBinding`],
//! which records whether a template governs the attribute and whether the
//! entity applies commands optimistically. The binding decides whether a
//! command may write the value; the feed may always write it.

use ha_climate::{STATE_UNAVAILABLE, STATE_UNKNOWN};
use indexmap::IndexSet;
use std::borrow::Cow;
use std::fmt;

/// Identifies one climate attribute, and so one feed subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClimateAttribute {
    CurrentTemperature,
    TargetTemperature,
    TargetTemperatureLow,
    TargetTemperatureHigh,
    CurrentHumidity,
    TargetHumidity,
    MinTemp,
    MaxTemp,
    MinHumidity,
    MaxHumidity,
    HvacMode,
    HvacAction,
    FanMode,
    PresetMode,
    SwingMode,
    SwingHorizontalMode,
    HvacFeatures,
    Availability,
    Icon,
}

impl ClimateAttribute {
    pub const ALL: [ClimateAttribute; 19] = [
        ClimateAttribute::CurrentTemperature,
        ClimateAttribute::TargetTemperature,
        ClimateAttribute::TargetTemperatureLow,
        ClimateAttribute::TargetTemperatureHigh,
        ClimateAttribute::CurrentHumidity,
        ClimateAttribute::TargetHumidity,
        ClimateAttribute::MinTemp,
        ClimateAttribute::MaxTemp,
        ClimateAttribute::MinHumidity,
        ClimateAttribute::MaxHumidity,
        ClimateAttribute::HvacMode,
        ClimateAttribute::HvacAction,
        ClimateAttribute::FanMode,
        ClimateAttribute::PresetMode,
        ClimateAttribute::SwingMode,
        ClimateAttribute::SwingHorizontalMode,
        ClimateAttribute::HvacFeatures,
        ClimateAttribute::Availability,
        ClimateAttribute::Icon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClimateAttribute::CurrentTemperature => "current_temperature",
            ClimateAttribute::TargetTemperature => "target_temperature",
            ClimateAttribute::TargetTemperatureLow => "target_temperature_low",
            ClimateAttribute::TargetTemperatureHigh => "target_temperature_high",
            ClimateAttribute::CurrentHumidity => "current_humidity",
            ClimateAttribute::TargetHumidity => "target_humidity",
            ClimateAttribute::MinTemp => "min_temp",
            ClimateAttribute::MaxTemp => "max_temp",
            ClimateAttribute::MinHumidity => "min_humidity",
            ClimateAttribute::MaxHumidity => "max_humidity",
            ClimateAttribute::HvacMode => "hvac_mode",
            ClimateAttribute::HvacAction => "hvac_action",
            ClimateAttribute::FanMode => "fan_mode",
            ClimateAttribute::PresetMode => "preset_mode",
            ClimateAttribute::SwingMode => "swing_mode",
            ClimateAttribute::SwingHorizontalMode => "swing_horizontal_mode",
            ClimateAttribute::HvacFeatures => "hvac_features",
            ClimateAttribute::Availability => "availability",
            ClimateAttribute::Icon => "icon",
        }
    }

    /// Configuration key of the template feeding this attribute
    pub fn template_key(&self) -> &'static str {
        match self {
            ClimateAttribute::CurrentTemperature => "current_temperature_template",
            ClimateAttribute::TargetTemperature => "target_temperature_template",
            ClimateAttribute::TargetTemperatureLow => "target_temperature_low_template",
            ClimateAttribute::TargetTemperatureHigh => "target_temperature_high_template",
            ClimateAttribute::CurrentHumidity => "current_humidity_template",
            ClimateAttribute::TargetHumidity => "target_humidity_template",
            ClimateAttribute::MinTemp => "min_temp_template",
            ClimateAttribute::MaxTemp => "max_temp_template",
            ClimateAttribute::MinHumidity => "min_humidity_template",
            ClimateAttribute::MaxHumidity => "max_humidity_template",
            ClimateAttribute::HvacMode => "hvac_mode_template",
            ClimateAttribute::HvacAction => "hvac_action_template",
            ClimateAttribute::FanMode => "fan_mode_template",
            ClimateAttribute::PresetMode => "preset_mode_template",
            ClimateAttribute::SwingMode => "swing_mode_template",
            ClimateAttribute::SwingHorizontalMode => "swing_horizontal_mode_template",
            ClimateAttribute::HvacFeatures => "hvac_features_template",
            ClimateAttribute::Availability => "availability_template",
            ClimateAttribute::Icon => "icon_template",
        }
    }
}

impl fmt::Display for ClimateAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw value delivered by a feed
#[derive(Debug, Clone, PartialEq)]
pub enum FeedValue {
    Text(String),
    Number(f64),
    /// The "unknown" sentinel
    Unknown,
    /// The "unavailable" sentinel, also used when rendering failed
    Unavailable,
}

impl FeedValue {
    /// Interpret a rendered template result, recognising the sentinels
    pub fn from_rendered(rendered: &str) -> Self {
        match rendered.trim() {
            STATE_UNKNOWN => FeedValue::Unknown,
            STATE_UNAVAILABLE => FeedValue::Unavailable,
            other => FeedValue::Text(other.to_string()),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, FeedValue::Unknown | FeedValue::Unavailable)
    }

    /// Text form of the value as a template would have rendered it
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FeedValue::Text(s) => Cow::Borrowed(s.as_str()),
            FeedValue::Number(n) => Cow::Owned(n.to_string()),
            FeedValue::Unknown => Cow::Borrowed(STATE_UNKNOWN),
            FeedValue::Unavailable => Cow::Borrowed(STATE_UNAVAILABLE),
        }
    }
}

impl From<&str> for FeedValue {
    fn from(value: &str) -> Self {
        FeedValue::from_rendered(value)
    }
}

impl From<f64> for FeedValue {
    fn from(value: f64) -> Self {
        FeedValue::Number(value)
    }
}

impl From<serde_json::Value> for FeedValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FeedValue::Unknown,
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(FeedValue::Number)
                .unwrap_or_else(|| FeedValue::Text(n.to_string())),
            serde_json::Value::String(s) => FeedValue::from_rendered(&s),
            other => FeedValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for FeedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// The state of one climate attribute and who may write it
#[derive(Debug, Clone)]
pub struct AttributeBinding<T> {
    governed_by_template: bool,
    optimistic: bool,
    valid_values: Option<IndexSet<String>>,
    current_value: Option<T>,
}

impl<T: Clone + PartialEq> AttributeBinding<T> {
    pub fn new(value: Option<T>) -> Self {
        Self {
            governed_by_template: false,
            optimistic: false,
            valid_values: None,
            current_value: value,
        }
    }

    pub fn governed(mut self, governed_by_template: bool) -> Self {
        self.governed_by_template = governed_by_template;
        self
    }

    pub fn optimistic(mut self, optimistic: bool) -> Self {
        self.optimistic = optimistic;
        self
    }

    /// Restrict the attribute to a closed set of string values
    pub fn with_valid_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn value(&self) -> Option<&T> {
        self.current_value.as_ref()
    }

    pub fn is_governed(&self) -> bool {
        self.governed_by_template
    }

    pub fn valid_values(&self) -> Option<&IndexSet<String>> {
        self.valid_values.as_ref()
    }

    /// Whether `candidate` is allowed; attributes without a list allow anything
    pub fn allows(&self, candidate: &str) -> bool {
        self.valid_values
            .as_ref()
            .map_or(true, |values| values.contains(candidate))
    }

    /// Whether a command may write the value locally
    pub fn accepts_commands(&self) -> bool {
        !self.governed_by_template || self.optimistic
    }

    /// Replace the value, returning whether it changed
    pub fn set(&mut self, value: Option<T>) -> bool {
        if self.current_value == value {
            return false;
        }
        self.current_value = value;
        true
    }

    /// Write the value on behalf of a command, if the binding allows it
    ///
    /// Returns whether the stored value changed.
    pub fn apply_command(&mut self, value: T) -> bool {
        if !self.accepts_commands() {
            return false;
        }
        self.set(Some(value))
    }
}
