//! Template climate configuration
//!
//! Parses and validates the user declaration of a template climate: the
//! per-attribute templates, the per-command actions, value lists, bounds and
//! initial values.

use ha_climate::defaults::{
    DEFAULT_MAX_HUMIDITY, DEFAULT_MAX_TEMP, DEFAULT_MIN_HUMIDITY, DEFAULT_MIN_TEMP, FAN_AUTO,
    FAN_HIGH, FAN_LOW, FAN_MEDIUM, PRESET_ACTIVITY, PRESET_AWAY, PRESET_BOOST, PRESET_COMFORT,
    PRESET_ECO, PRESET_HOME, PRESET_SLEEP,
};
use ha_climate::{HvacMode, Precision, TemperatureUnit, DOMAIN, STATE_OFF, STATE_ON};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::binding::ClimateAttribute;
use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_NAME: &str = "Template Climate";

/// Target temperature used until a template, command or restore sets one
pub const DEFAULT_TEMP: f64 = 21.0;

pub const DEFAULT_TEMP_STEP: f64 = 1.0;

/// Deserialize a field that can be either a single value or a list of values
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(v) => Ok(v),
        OneOrMany::One(t) => Ok(vec![t]),
    }
}

/// A script bound to a command: a sequence of raw action definitions
///
/// Accepts a single action mapping or a list of them. The actions are opaque
/// here; the host's script runner interprets them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActionSequence(Vec<Value>);

impl ActionSequence {
    pub fn new(actions: Vec<Value>) -> Self {
        Self(actions)
    }

    pub fn actions(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for ActionSequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        one_or_many(deserializer).map(ActionSequence)
    }
}

/// Commands a climate entity accepts, each of which may carry an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClimateCommand {
    SetTemperature,
    SetHumidity,
    SetHvacMode,
    SetFanMode,
    SetPresetMode,
    SetSwingMode,
    SetSwingHorizontalMode,
    TurnOn,
    TurnOff,
}

impl ClimateCommand {
    pub const ALL: [ClimateCommand; 9] = [
        ClimateCommand::SetTemperature,
        ClimateCommand::SetHumidity,
        ClimateCommand::SetHvacMode,
        ClimateCommand::SetFanMode,
        ClimateCommand::SetPresetMode,
        ClimateCommand::SetSwingMode,
        ClimateCommand::SetSwingHorizontalMode,
        ClimateCommand::TurnOn,
        ClimateCommand::TurnOff,
    ];

    /// Service name, which is also the configuration key of its action
    pub fn as_str(&self) -> &'static str {
        match self {
            ClimateCommand::SetTemperature => "set_temperature",
            ClimateCommand::SetHumidity => "set_humidity",
            ClimateCommand::SetHvacMode => "set_hvac_mode",
            ClimateCommand::SetFanMode => "set_fan_mode",
            ClimateCommand::SetPresetMode => "set_preset_mode",
            ClimateCommand::SetSwingMode => "set_swing_mode",
            ClimateCommand::SetSwingHorizontalMode => "set_swing_horizontal_mode",
            ClimateCommand::TurnOn => "turn_on",
            ClimateCommand::TurnOff => "turn_off",
        }
    }
}

/// Values an entity starts with before restore or any feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitialValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hvac_mode: Option<HvacMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature_high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing_horizontal_mode: Option<String>,
}

/// Template climate configuration from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClimateConfig {
    /// Display name, also the source of the entity id
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,

    /// Apply commands locally even when a template governs the attribute
    #[serde(default)]
    pub optimistic: bool,

    // Templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_temperature_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature_low_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature_high_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_humidity_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_humidity_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temp_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_humidity_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_humidity_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hvac_mode_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hvac_action_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_mode_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_mode_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing_mode_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing_horizontal_mode_template: Option<String>,
    /// Feature list feed; when present, supported features are dynamic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hvac_features_template: Option<String>,

    // Actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_temperature: Option<ActionSequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_humidity: Option<ActionSequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_hvac_mode: Option<ActionSequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_fan_mode: Option<ActionSequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_preset_mode: Option<ActionSequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_swing_mode: Option<ActionSequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_swing_horizontal_mode: Option<ActionSequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_on: Option<ActionSequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_off: Option<ActionSequence>,

    // Value lists
    #[serde(default = "default_modes", deserialize_with = "one_or_many")]
    pub modes: Vec<HvacMode>,
    #[serde(default = "default_fan_modes", deserialize_with = "one_or_many")]
    pub fan_modes: Vec<String>,
    #[serde(default = "default_preset_modes", deserialize_with = "one_or_many")]
    pub preset_modes: Vec<String>,
    #[serde(default = "default_swing_modes", deserialize_with = "one_or_many")]
    pub swing_modes: Vec<String>,
    #[serde(default = "default_swing_modes", deserialize_with = "one_or_many")]
    pub swing_horizontal_modes: Vec<String>,

    // Bounds and display
    /// Lower temperature bound (default: 7 °C in the entity unit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f64>,
    /// Upper temperature bound (default: 35 °C in the entity unit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
    #[serde(default = "default_min_humidity")]
    pub min_humidity: f64,
    #[serde(default = "default_max_humidity")]
    pub max_humidity: f64,
    #[serde(default = "default_temp_step")]
    pub temp_step: f64,
    /// Overrides the host unit system
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_unit: Option<TemperatureUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<Precision>,

    #[serde(default)]
    pub initial: InitialValues,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_modes() -> Vec<HvacMode> {
    vec![
        HvacMode::Auto,
        HvacMode::Off,
        HvacMode::Cool,
        HvacMode::Heat,
        HvacMode::Dry,
        HvacMode::FanOnly,
    ]
}

fn default_fan_modes() -> Vec<String> {
    [FAN_AUTO, FAN_LOW, FAN_MEDIUM, FAN_HIGH]
        .map(String::from)
        .to_vec()
}

fn default_preset_modes() -> Vec<String> {
    [
        PRESET_ECO,
        PRESET_AWAY,
        PRESET_BOOST,
        PRESET_COMFORT,
        PRESET_HOME,
        PRESET_SLEEP,
        PRESET_ACTIVITY,
    ]
    .map(String::from)
    .to_vec()
}

fn default_swing_modes() -> Vec<String> {
    [STATE_ON, STATE_OFF].map(String::from).to_vec()
}

fn default_min_humidity() -> f64 {
    DEFAULT_MIN_HUMIDITY
}

fn default_max_humidity() -> f64 {
    DEFAULT_MAX_HUMIDITY
}

fn default_temp_step() -> f64 {
    DEFAULT_TEMP_STEP
}

impl ClimateConfig {
    /// Parse and validate a single climate from YAML
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|source| ConfigError::ParseYaml { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a single climate from a JSON value
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_value(value).map_err(|source| ConfigError::ParseJson { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid("name", "must not be empty"));
        }
        if self.modes.is_empty() {
            return Err(ConfigError::invalid("modes", "at least one mode is required"));
        }

        for attribute in ClimateAttribute::ALL {
            if let Some(template) = self.template(attribute) {
                if template.trim().is_empty() {
                    return Err(ConfigError::invalid(
                        attribute.template_key(),
                        "template must not be empty",
                    ));
                }
            }
        }
        for command in ClimateCommand::ALL {
            if self.action(command).is_some_and(|a| a.is_empty()) {
                return Err(ConfigError::invalid(
                    command.as_str(),
                    "action sequence must not be empty",
                ));
            }
        }

        if let (Some(min), Some(max)) = (self.min_temp, self.max_temp) {
            if min >= max {
                return Err(ConfigError::invalid(
                    "min_temp",
                    format!("min_temp ({}) must be less than max_temp ({})", min, max),
                ));
            }
        }
        if !(0.0..=100.0).contains(&self.min_humidity) || !(0.0..=100.0).contains(&self.max_humidity)
        {
            return Err(ConfigError::invalid(
                "min_humidity",
                "humidity bounds must be between 0 and 100",
            ));
        }
        if self.min_humidity >= self.max_humidity {
            return Err(ConfigError::invalid(
                "min_humidity",
                format!(
                    "min_humidity ({}) must be less than max_humidity ({})",
                    self.min_humidity, self.max_humidity
                ),
            ));
        }
        if !(self.temp_step > 0.0) {
            return Err(ConfigError::invalid("temp_step", "must be greater than 0"));
        }

        self.validate_initial()
    }

    fn validate_initial(&self) -> ConfigResult<()> {
        let initial = &self.initial;
        if let Some(mode) = initial.hvac_mode {
            if !self.modes.contains(&mode) {
                return Err(ConfigError::invalid(
                    "initial.hvac_mode",
                    format!("'{}' is not one of the configured modes", mode),
                ));
            }
        }
        let choices = [
            ("initial.fan_mode", &initial.fan_mode, &self.fan_modes),
            ("initial.preset_mode", &initial.preset_mode, &self.preset_modes),
            ("initial.swing_mode", &initial.swing_mode, &self.swing_modes),
            (
                "initial.swing_horizontal_mode",
                &initial.swing_horizontal_mode,
                &self.swing_horizontal_modes,
            ),
        ];
        for (key, value, allowed) in choices {
            if let Some(value) = value {
                if !allowed.contains(value) {
                    return Err(ConfigError::invalid(
                        key,
                        format!("'{}' is not one of {:?}", value, allowed),
                    ));
                }
            }
        }
        if let (Some(low), Some(high)) = (
            initial.target_temperature_low,
            initial.target_temperature_high,
        ) {
            if low > high {
                return Err(ConfigError::invalid(
                    "initial.target_temperature_low",
                    format!("low setpoint ({}) is above high setpoint ({})", low, high),
                ));
            }
        }
        Ok(())
    }

    /// Entity id derived from the name (e.g. "climate.living_room")
    pub fn entity_id(&self) -> String {
        let object_id = slug::slugify(&self.name).replace('-', "_");
        if object_id.is_empty() {
            format!("{}.{}", DOMAIN, slug::slugify(DEFAULT_NAME).replace('-', "_"))
        } else {
            format!("{}.{}", DOMAIN, object_id)
        }
    }

    /// Unit temperatures are reported in, given the host's unit system
    pub fn temperature_unit(&self, host_unit: TemperatureUnit) -> TemperatureUnit {
        self.temperature_unit.unwrap_or(host_unit)
    }

    /// Configured lower bound, or the domain default converted to `unit`
    pub fn min_temp(&self, unit: TemperatureUnit) -> f64 {
        self.min_temp
            .unwrap_or_else(|| unit.convert_from(DEFAULT_MIN_TEMP, TemperatureUnit::Celsius))
    }

    /// Configured upper bound, or the domain default converted to `unit`
    pub fn max_temp(&self, unit: TemperatureUnit) -> f64 {
        self.max_temp
            .unwrap_or_else(|| unit.convert_from(DEFAULT_MAX_TEMP, TemperatureUnit::Celsius))
    }

    /// Mode an entity starts in: the initial value, else `off` when configured
    pub fn initial_hvac_mode(&self) -> Option<HvacMode> {
        self.initial.hvac_mode.or_else(|| {
            self.modes
                .contains(&HvacMode::Off)
                .then_some(HvacMode::Off)
        })
    }

    /// The template feeding an attribute, if any
    pub fn template(&self, attribute: ClimateAttribute) -> Option<&str> {
        let template = match attribute {
            ClimateAttribute::CurrentTemperature => &self.current_temperature_template,
            ClimateAttribute::TargetTemperature => &self.target_temperature_template,
            ClimateAttribute::TargetTemperatureLow => &self.target_temperature_low_template,
            ClimateAttribute::TargetTemperatureHigh => &self.target_temperature_high_template,
            ClimateAttribute::CurrentHumidity => &self.current_humidity_template,
            ClimateAttribute::TargetHumidity => &self.target_humidity_template,
            ClimateAttribute::MinTemp => &self.min_temp_template,
            ClimateAttribute::MaxTemp => &self.max_temp_template,
            ClimateAttribute::MinHumidity => &self.min_humidity_template,
            ClimateAttribute::MaxHumidity => &self.max_humidity_template,
            ClimateAttribute::HvacMode => &self.hvac_mode_template,
            ClimateAttribute::HvacAction => &self.hvac_action_template,
            ClimateAttribute::FanMode => &self.fan_mode_template,
            ClimateAttribute::PresetMode => &self.preset_mode_template,
            ClimateAttribute::SwingMode => &self.swing_mode_template,
            ClimateAttribute::SwingHorizontalMode => &self.swing_horizontal_mode_template,
            ClimateAttribute::HvacFeatures => &self.hvac_features_template,
            ClimateAttribute::Availability => &self.availability_template,
            ClimateAttribute::Icon => &self.icon_template,
        };
        template.as_deref()
    }

    /// The action bound to a command, if any
    pub fn action(&self, command: ClimateCommand) -> Option<&ActionSequence> {
        let action = match command {
            ClimateCommand::SetTemperature => &self.set_temperature,
            ClimateCommand::SetHumidity => &self.set_humidity,
            ClimateCommand::SetHvacMode => &self.set_hvac_mode,
            ClimateCommand::SetFanMode => &self.set_fan_mode,
            ClimateCommand::SetPresetMode => &self.set_preset_mode,
            ClimateCommand::SetSwingMode => &self.set_swing_mode,
            ClimateCommand::SetSwingHorizontalMode => &self.set_swing_horizontal_mode,
            ClimateCommand::TurnOn => &self.turn_on,
            ClimateCommand::TurnOff => &self.turn_off,
        };
        action.as_ref()
    }
}
