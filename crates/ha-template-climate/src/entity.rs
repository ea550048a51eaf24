//! The template climate entity
//!
//! [`TemplateClimate`] aggregates the attribute state of one climate with the
//! three contracts it fulfils towards its host:
//!
//! - [`Restorable`]: seed attributes from the state saved before a restart
//! - [`TemplateBound`]: accept feed values keyed by attribute
//! - [`ClimateCommandable`]: validate and dispatch user commands
//!
//! Feeds always win for template-governed attributes. A command writes an
//! attribute locally only when no template governs it or the entity is
//! optimistic, and always after its action has completed.

use async_trait::async_trait;
use ha_climate::attrs::*;
use ha_climate::{
    ClimateEntityFeature, HvacAction, HvacMode, Precision, State, TemperatureUnit,
    STATE_UNAVAILABLE, STATE_UNKNOWN,
};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::binding::{AttributeBinding, ClimateAttribute, FeedValue};
use crate::config::{ActionSequence, ClimateCommand, ClimateConfig, DEFAULT_TEMP};
use crate::error::{CommandError, CommandResult, ConfigError, ConfigResult};
use crate::features::{derive_features, resolve_features, FeatureSource};
use crate::feed::FeedTable;
use crate::host::{HostServices, RestoreStateSource, ScriptRunner, StateWriter, TemplateRenderer};
use crate::resolver::{
    resolve_availability, resolve_choice, resolve_float, resolve_hvac_action, resolve_hvac_mode,
    resolve_text, Resolution,
};
use crate::validator::{
    validate_choice, validate_humidity, validate_hvac_mode, validate_set_temperature, Bounds,
    Setpoint, TemperatureRequest,
};

/// Per-attribute state of a template climate
#[derive(Debug, Clone)]
pub struct ClimateAttributes {
    pub current_temperature: AttributeBinding<f64>,
    pub target_temperature: AttributeBinding<f64>,
    pub target_temperature_low: AttributeBinding<f64>,
    pub target_temperature_high: AttributeBinding<f64>,
    pub current_humidity: AttributeBinding<f64>,
    pub target_humidity: AttributeBinding<f64>,
    pub min_temp: AttributeBinding<f64>,
    pub max_temp: AttributeBinding<f64>,
    pub min_humidity: AttributeBinding<f64>,
    pub max_humidity: AttributeBinding<f64>,
    pub hvac_mode: AttributeBinding<HvacMode>,
    pub hvac_action: AttributeBinding<HvacAction>,
    pub fan_mode: AttributeBinding<String>,
    pub preset_mode: AttributeBinding<String>,
    pub swing_mode: AttributeBinding<String>,
    pub swing_horizontal_mode: AttributeBinding<String>,
    pub features: AttributeBinding<ClimateEntityFeature>,
    pub available: AttributeBinding<bool>,
    pub icon: AttributeBinding<String>,
}

impl ClimateAttributes {
    /// Initial attribute state of a configuration, before restore or feeds
    pub fn from_config(config: &ClimateConfig, unit: TemperatureUnit) -> Self {
        let governed = |attribute: ClimateAttribute| config.template(attribute).is_some();
        let float = |attribute: ClimateAttribute, value: Option<f64>| {
            AttributeBinding::new(value)
                .governed(governed(attribute))
                .optimistic(config.optimistic)
        };
        let choice = |attribute: ClimateAttribute,
                      initial: &Option<String>,
                      default: &str,
                      allowed: &[String]| {
            let value = initial
                .clone()
                .or_else(|| allowed.iter().any(|v| v == default).then(|| default.to_string()));
            AttributeBinding::new(value)
                .governed(governed(attribute))
                .optimistic(config.optimistic)
                .with_valid_values(allowed.iter().cloned())
        };
        let initial = &config.initial;

        let features = match FeatureSource::for_config(config) {
            FeatureSource::Static => AttributeBinding::new(Some(derive_features(config))),
            FeatureSource::Dynamic => {
                AttributeBinding::new(Some(ClimateEntityFeature::empty())).governed(true)
            }
        };

        Self {
            current_temperature: float(ClimateAttribute::CurrentTemperature, None),
            target_temperature: float(
                ClimateAttribute::TargetTemperature,
                Some(initial.target_temperature.unwrap_or(DEFAULT_TEMP)),
            ),
            target_temperature_low: float(
                ClimateAttribute::TargetTemperatureLow,
                initial.target_temperature_low,
            ),
            target_temperature_high: float(
                ClimateAttribute::TargetTemperatureHigh,
                initial.target_temperature_high,
            ),
            current_humidity: float(ClimateAttribute::CurrentHumidity, None),
            target_humidity: float(ClimateAttribute::TargetHumidity, initial.target_humidity),
            min_temp: float(ClimateAttribute::MinTemp, Some(config.min_temp(unit))),
            max_temp: float(ClimateAttribute::MaxTemp, Some(config.max_temp(unit))),
            min_humidity: float(ClimateAttribute::MinHumidity, Some(config.min_humidity)),
            max_humidity: float(ClimateAttribute::MaxHumidity, Some(config.max_humidity)),
            hvac_mode: AttributeBinding::new(config.initial_hvac_mode())
                .governed(governed(ClimateAttribute::HvacMode))
                .optimistic(config.optimistic)
                .with_valid_values(config.modes.iter().map(HvacMode::as_str)),
            hvac_action: AttributeBinding::new(None)
                .governed(governed(ClimateAttribute::HvacAction)),
            fan_mode: choice(
                ClimateAttribute::FanMode,
                &initial.fan_mode,
                ha_climate::defaults::FAN_LOW,
                &config.fan_modes,
            ),
            preset_mode: choice(
                ClimateAttribute::PresetMode,
                &initial.preset_mode,
                ha_climate::defaults::PRESET_COMFORT,
                &config.preset_modes,
            ),
            swing_mode: choice(
                ClimateAttribute::SwingMode,
                &initial.swing_mode,
                ha_climate::STATE_OFF,
                &config.swing_modes,
            ),
            swing_horizontal_mode: choice(
                ClimateAttribute::SwingHorizontalMode,
                &initial.swing_horizontal_mode,
                ha_climate::STATE_OFF,
                &config.swing_horizontal_modes,
            ),
            features,
            available: AttributeBinding::new(Some(true))
                .governed(governed(ClimateAttribute::Availability)),
            icon: AttributeBinding::new(None).governed(governed(ClimateAttribute::Icon)),
        }
    }
}

/// Seeds attribute values from the state saved before a restart
#[async_trait]
pub trait Restorable {
    /// Look up the last state and apply it, if there is one
    async fn restore(&mut self, source: &dyn RestoreStateSource);

    fn apply_restored_state(&mut self, state: &State);
}

/// Receives feed values keyed by attribute
pub trait TemplateBound {
    fn feeds(&self) -> &FeedTable;

    /// Deliver one feed value without publishing
    fn apply_feed(&mut self, attribute: ClimateAttribute, value: &FeedValue) -> Resolution;

    fn publish_state(&self);

    /// Deliver one feed value and publish if it changed the entity
    fn handle_feed(&mut self, attribute: ClimateAttribute, value: FeedValue) -> Resolution {
        let resolution = self.apply_feed(attribute, &value);
        if resolution.should_publish() {
            self.publish_state();
        }
        resolution
    }

    /// Render every feed once and publish a single state if anything changed
    fn refresh_feeds(&mut self, renderer: &dyn TemplateRenderer) -> Resolution {
        let values = self.feeds().render_all(renderer);
        let resolution = values
            .iter()
            .fold(Resolution::Unchanged, |acc, (attribute, value)| {
                acc.merge(self.apply_feed(*attribute, value))
            });
        if resolution.should_publish() {
            self.publish_state();
        }
        resolution
    }
}

/// Commands of the host's climate contract
#[async_trait]
pub trait ClimateCommandable {
    async fn set_temperature(&mut self, request: TemperatureRequest) -> CommandResult<()>;
    async fn set_humidity(&mut self, humidity: f64) -> CommandResult<()>;
    async fn set_hvac_mode(&mut self, hvac_mode: HvacMode) -> CommandResult<()>;
    async fn set_fan_mode(&mut self, fan_mode: &str) -> CommandResult<()>;
    async fn set_preset_mode(&mut self, preset_mode: &str) -> CommandResult<()>;
    async fn set_swing_mode(&mut self, swing_mode: &str) -> CommandResult<()>;
    async fn set_swing_horizontal_mode(&mut self, swing_horizontal_mode: &str)
        -> CommandResult<()>;
    async fn turn_on(&mut self) -> CommandResult<()>;
    async fn turn_off(&mut self) -> CommandResult<()>;
}

type ChoiceBinding = fn(&mut ClimateAttributes) -> &mut AttributeBinding<String>;

/// A climate entity whose attributes come from templates
pub struct TemplateClimate {
    entity_id: String,
    name: String,
    unique_id: Option<String>,
    attrs: ClimateAttributes,
    feature_source: FeatureSource,
    feeds: FeedTable,
    actions: IndexMap<ClimateCommand, ActionSequence>,
    modes: Vec<HvacMode>,
    default_temp_bounds: Bounds,
    default_humidity_bounds: Bounds,
    unit: TemperatureUnit,
    precision: Precision,
    temp_step: f64,
    optimistic: bool,
    scripts: Arc<dyn ScriptRunner>,
    writer: Arc<dyn StateWriter>,
}

impl std::fmt::Debug for TemplateClimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateClimate")
            .field("entity_id", &self.entity_id)
            .field("attrs", &self.attrs)
            .field("feature_source", &self.feature_source)
            .finish_non_exhaustive()
    }
}

impl TemplateClimate {
    /// Build an entity from a configuration
    pub fn new(config: &ClimateConfig, host: &HostServices) -> ConfigResult<Self> {
        config.validate()?;

        let unit = config.temperature_unit(host.unit_system);
        let (min_temp, max_temp) = (config.min_temp(unit), config.max_temp(unit));
        if min_temp >= max_temp {
            return Err(ConfigError::invalid(
                "min_temp",
                format!(
                    "min_temp ({}) must be less than max_temp ({}) in {}",
                    min_temp, max_temp, unit
                ),
            ));
        }

        let actions = ClimateCommand::ALL
            .into_iter()
            .filter_map(|command| config.action(command).map(|a| (command, a.clone())))
            .collect();

        let entity = Self {
            entity_id: config.entity_id(),
            name: config.name.clone(),
            unique_id: config.unique_id.clone(),
            attrs: ClimateAttributes::from_config(config, unit),
            feature_source: FeatureSource::for_config(config),
            feeds: FeedTable::from_config(config),
            actions,
            modes: config.modes.clone(),
            default_temp_bounds: Bounds::new(min_temp, max_temp),
            default_humidity_bounds: Bounds::new(config.min_humidity, config.max_humidity),
            unit,
            precision: config.precision.unwrap_or_else(|| unit.default_precision()),
            temp_step: config.temp_step,
            optimistic: config.optimistic,
            scripts: host.scripts.clone(),
            writer: host.writer.clone(),
        };
        debug!(
            entity_id = %entity.entity_id,
            feeds = entity.feeds.len(),
            actions = entity.actions.len(),
            features = %entity.supported_features(),
            "Created template climate"
        );
        Ok(entity)
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    pub fn attributes(&self) -> &ClimateAttributes {
        &self.attrs
    }

    pub fn feature_source(&self) -> FeatureSource {
        self.feature_source
    }

    pub fn is_optimistic(&self) -> bool {
        self.optimistic
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn target_temperature_step(&self) -> f64 {
        self.temp_step
    }

    pub fn available(&self) -> bool {
        self.attrs.available.value() != Some(&false)
    }

    pub fn hvac_modes(&self) -> &[HvacMode] {
        &self.modes
    }

    pub fn hvac_mode(&self) -> Option<HvacMode> {
        self.attrs.hvac_mode.value().copied()
    }

    pub fn hvac_action(&self) -> Option<HvacAction> {
        self.attrs.hvac_action.value().copied()
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.attrs.current_temperature.value().copied()
    }

    /// Single setpoint; absent while in `heat_cool`
    pub fn target_temperature(&self) -> Option<f64> {
        if self.in_range_mode() {
            return None;
        }
        self.attrs.target_temperature.value().copied()
    }

    /// Low setpoint; present only in `heat_cool`
    pub fn target_temperature_low(&self) -> Option<f64> {
        if !self.in_range_mode() {
            return None;
        }
        self.attrs.target_temperature_low.value().copied()
    }

    /// High setpoint; present only in `heat_cool`
    pub fn target_temperature_high(&self) -> Option<f64> {
        if !self.in_range_mode() {
            return None;
        }
        self.attrs.target_temperature_high.value().copied()
    }

    pub fn current_humidity(&self) -> Option<f64> {
        self.attrs.current_humidity.value().copied()
    }

    pub fn target_humidity(&self) -> Option<f64> {
        self.attrs.target_humidity.value().copied()
    }

    pub fn min_temp(&self) -> f64 {
        self.attrs
            .min_temp
            .value()
            .copied()
            .unwrap_or(self.default_temp_bounds.min)
    }

    pub fn max_temp(&self) -> f64 {
        self.attrs
            .max_temp
            .value()
            .copied()
            .unwrap_or(self.default_temp_bounds.max)
    }

    pub fn min_humidity(&self) -> f64 {
        self.attrs
            .min_humidity
            .value()
            .copied()
            .unwrap_or(self.default_humidity_bounds.min)
    }

    pub fn max_humidity(&self) -> f64 {
        self.attrs
            .max_humidity
            .value()
            .copied()
            .unwrap_or(self.default_humidity_bounds.max)
    }

    pub fn fan_mode(&self) -> Option<&str> {
        self.attrs.fan_mode.value().map(String::as_str)
    }

    pub fn preset_mode(&self) -> Option<&str> {
        self.attrs.preset_mode.value().map(String::as_str)
    }

    pub fn swing_mode(&self) -> Option<&str> {
        self.attrs.swing_mode.value().map(String::as_str)
    }

    pub fn swing_horizontal_mode(&self) -> Option<&str> {
        self.attrs.swing_horizontal_mode.value().map(String::as_str)
    }

    pub fn icon(&self) -> Option<&str> {
        self.attrs.icon.value().map(String::as_str)
    }

    pub fn supported_features(&self) -> ClimateEntityFeature {
        self.attrs.features.value().copied().unwrap_or_default()
    }

    fn in_range_mode(&self) -> bool {
        self.hvac_mode().is_some_and(|m| m.is_range())
    }

    /// The state this entity publishes
    pub fn state(&self) -> State {
        let features = self.supported_features();
        let round = |v: Option<f64>| v.map(|v| self.precision.round(v));
        let mut attributes = Map::new();

        attributes.insert(
            ATTR_HVAC_MODES.to_string(),
            json!(self.modes.iter().map(HvacMode::as_str).collect::<Vec<_>>()),
        );
        attributes.insert(ATTR_MIN_TEMP.to_string(), json!(self.min_temp()));
        attributes.insert(ATTR_MAX_TEMP.to_string(), json!(self.max_temp()));
        attributes.insert(ATTR_TARGET_TEMP_STEP.to_string(), json!(self.temp_step));
        attributes.insert(
            ATTR_TEMPERATURE_UNIT.to_string(),
            json!(self.unit.symbol()),
        );
        attributes.insert(
            ATTR_CURRENT_TEMPERATURE.to_string(),
            json!(round(self.current_temperature())),
        );

        if features.contains(ClimateEntityFeature::TARGET_TEMPERATURE) {
            attributes.insert(
                ATTR_TEMPERATURE.to_string(),
                json!(round(self.target_temperature())),
            );
        }
        if features.contains(ClimateEntityFeature::TARGET_TEMPERATURE_RANGE) {
            attributes.insert(
                ATTR_TARGET_TEMP_HIGH.to_string(),
                json!(round(self.target_temperature_high())),
            );
            attributes.insert(
                ATTR_TARGET_TEMP_LOW.to_string(),
                json!(round(self.target_temperature_low())),
            );
        }

        if let Some(humidity) = self.current_humidity() {
            attributes.insert(ATTR_CURRENT_HUMIDITY.to_string(), json!(humidity));
        }
        if features.contains(ClimateEntityFeature::TARGET_HUMIDITY) {
            attributes.insert(ATTR_HUMIDITY.to_string(), json!(self.target_humidity()));
            attributes.insert(ATTR_MIN_HUMIDITY.to_string(), json!(self.min_humidity()));
            attributes.insert(ATTR_MAX_HUMIDITY.to_string(), json!(self.max_humidity()));
        }

        let choices = [
            (
                ClimateEntityFeature::FAN_MODE,
                ATTR_FAN_MODE,
                ATTR_FAN_MODES,
                &self.attrs.fan_mode,
            ),
            (
                ClimateEntityFeature::PRESET_MODE,
                ATTR_PRESET_MODE,
                ATTR_PRESET_MODES,
                &self.attrs.preset_mode,
            ),
            (
                ClimateEntityFeature::SWING_MODE,
                ATTR_SWING_MODE,
                ATTR_SWING_MODES,
                &self.attrs.swing_mode,
            ),
            (
                ClimateEntityFeature::SWING_HORIZONTAL_MODE,
                ATTR_SWING_HORIZONTAL_MODE,
                ATTR_SWING_HORIZONTAL_MODES,
                &self.attrs.swing_horizontal_mode,
            ),
        ];
        for (feature, key, list_key, binding) in choices {
            if features.contains(feature) {
                attributes.insert(key.to_string(), json!(binding.value()));
                attributes.insert(list_key.to_string(), json!(binding.valid_values()));
            }
        }

        if let Some(action) = self.hvac_action() {
            attributes.insert(ATTR_HVAC_ACTION.to_string(), json!(action.as_str()));
        }
        if let Some(icon) = self.icon() {
            attributes.insert(ATTR_ICON.to_string(), json!(icon));
        }
        attributes.insert(ATTR_FRIENDLY_NAME.to_string(), json!(self.name));
        attributes.insert(ATTR_SUPPORTED_FEATURES.to_string(), json!(features.bits()));

        let state = if !self.available() {
            STATE_UNAVAILABLE
        } else {
            self.hvac_mode().map_or(STATE_UNKNOWN, |m| m.as_str())
        };
        State::new(&self.entity_id, state, attributes)
    }

    /// Publish the current state to the host
    pub fn write_state(&self) {
        let state = self.state();
        debug!(entity_id = %self.entity_id, state = %state.state, "Writing state");
        self.writer.write_state(state);
    }

    fn temperature_bounds(&self) -> Bounds {
        Bounds::new(self.min_temp(), self.max_temp())
    }

    fn humidity_bounds(&self) -> Bounds {
        Bounds::new(self.min_humidity(), self.max_humidity())
    }

    /// Run the action bound to `command`, returning whether one was configured
    async fn run_action(
        &self,
        command: ClimateCommand,
        variables: Map<String, Value>,
    ) -> CommandResult<bool> {
        let Some(sequence) = self.actions.get(&command) else {
            return Ok(false);
        };
        debug!(entity_id = %self.entity_id, action = command.as_str(), "Running action");
        self.scripts
            .run(&self.entity_id, command.as_str(), sequence, variables)
            .await
            .map_err(|source| CommandError::Action {
                command: command.as_str(),
                source,
            })?;
        Ok(true)
    }

    /// Run set_hvac_mode's action and write the mode locally, without publishing
    async fn apply_hvac_mode(&mut self, hvac_mode: HvacMode) -> CommandResult<bool> {
        validate_hvac_mode(hvac_mode, &self.modes)?;
        self.run_action(
            ClimateCommand::SetHvacMode,
            variables([(ATTR_HVAC_MODE, json!(hvac_mode.as_str()))]),
        )
        .await?;
        Ok(self.attrs.hvac_mode.apply_command(hvac_mode))
    }

    async fn set_choice(
        &mut self,
        command: ClimateCommand,
        field: &'static str,
        value: &str,
        binding: ChoiceBinding,
    ) -> CommandResult<()> {
        validate_choice(
            field,
            value,
            binding(&mut self.attrs).valid_values().into_iter().flatten(),
        )?;
        self.run_action(command, variables([(field, json!(value))]))
            .await?;
        if binding(&mut self.attrs).apply_command(value.to_string()) {
            self.write_state();
        }
        Ok(())
    }

    /// Mode turn_on switches to when no turn_on action is configured
    fn turn_on_mode(&self) -> Option<HvacMode> {
        let on_modes: Vec<HvacMode> = self
            .modes
            .iter()
            .copied()
            .filter(|m| *m != HvacMode::Off)
            .collect();
        if on_modes.len() == 1 {
            return on_modes.first().copied();
        }
        [HvacMode::HeatCool, HvacMode::Heat, HvacMode::Cool]
            .into_iter()
            .find(|m| on_modes.contains(m))
            .or_else(|| on_modes.first().copied())
    }

    /// turn_on / turn_off: the action if configured, else a mode change
    async fn switch(&mut self, command: ClimateCommand, target: Option<HvacMode>) -> CommandResult<()> {
        if self.run_action(command, Map::new()).await? {
            if let Some(mode) = target {
                if self.attrs.hvac_mode.apply_command(mode) {
                    self.write_state();
                }
            }
            return Ok(());
        }
        match target {
            Some(mode) => self.set_hvac_mode(mode).await,
            None => Err(CommandError::NotSupported {
                command: command.as_str(),
                entity_id: self.entity_id.clone(),
            }),
        }
    }
}

fn variables<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[async_trait]
impl Restorable for TemplateClimate {
    async fn restore(&mut self, source: &dyn RestoreStateSource) {
        match source.last_state(&self.entity_id).await {
            Some(state) => {
                info!(entity_id = %self.entity_id, state = %state.state, "Restoring state");
                self.apply_restored_state(&state);
            }
            None => debug!(entity_id = %self.entity_id, "No state to restore"),
        }
    }

    fn apply_restored_state(&mut self, state: &State) {
        let attrs = &mut self.attrs;

        if state.is_unavailable() || state.is_unknown() {
            debug!(entity_id = %self.entity_id, state = %state.state, "Saved state has no mode");
        } else if let Ok(mode) = state.state.parse::<HvacMode>() {
            if self.modes.contains(&mode) {
                attrs.hvac_mode.set(Some(mode));
            } else {
                debug!(entity_id = %self.entity_id, mode = %mode, "Ignoring unconfigured restored mode");
            }
        }

        let floats = [
            (&mut attrs.target_temperature, ATTR_TEMPERATURE),
            (&mut attrs.target_temperature_low, ATTR_TARGET_TEMP_LOW),
            (&mut attrs.target_temperature_high, ATTR_TARGET_TEMP_HIGH),
            (&mut attrs.target_humidity, ATTR_HUMIDITY),
            (&mut attrs.current_temperature, ATTR_CURRENT_TEMPERATURE),
            (&mut attrs.current_humidity, ATTR_CURRENT_HUMIDITY),
        ];
        for (binding, key) in floats {
            if let Some(value) = state.attribute_f64(key) {
                binding.set(Some(value));
            }
        }

        // Static bounds stay as configured
        let bounds = [
            (&mut attrs.min_temp, ATTR_MIN_TEMP),
            (&mut attrs.max_temp, ATTR_MAX_TEMP),
            (&mut attrs.min_humidity, ATTR_MIN_HUMIDITY),
            (&mut attrs.max_humidity, ATTR_MAX_HUMIDITY),
        ];
        for (binding, key) in bounds {
            if binding.is_governed() {
                if let Some(value) = state.attribute_f64(key) {
                    binding.set(Some(value));
                }
            }
        }

        let choices = [
            (&mut attrs.fan_mode, ATTR_FAN_MODE),
            (&mut attrs.preset_mode, ATTR_PRESET_MODE),
            (&mut attrs.swing_mode, ATTR_SWING_MODE),
            (&mut attrs.swing_horizontal_mode, ATTR_SWING_HORIZONTAL_MODE),
        ];
        for (binding, key) in choices {
            if let Some(value) = state.attribute_str(key) {
                if binding.allows(value) {
                    binding.set(Some(value.to_string()));
                }
            }
        }

        if let Some(action) = state
            .attribute_str(ATTR_HVAC_ACTION)
            .and_then(|a| a.parse::<HvacAction>().ok())
        {
            attrs.hvac_action.set(Some(action));
        }

        if self.feature_source == FeatureSource::Dynamic {
            if let Some(bits) = state.attribute::<u32>(ATTR_SUPPORTED_FEATURES) {
                attrs
                    .features
                    .set(Some(ClimateEntityFeature::from_bits_truncate(bits)));
            }
        }
    }
}

impl TemplateBound for TemplateClimate {
    fn feeds(&self) -> &FeedTable {
        &self.feeds
    }

    fn apply_feed(&mut self, attribute: ClimateAttribute, value: &FeedValue) -> Resolution {
        let attrs = &mut self.attrs;
        let resolution = match attribute {
            ClimateAttribute::CurrentTemperature => {
                resolve_float(&mut attrs.current_temperature, attribute, value)
            }
            ClimateAttribute::TargetTemperature => {
                resolve_float(&mut attrs.target_temperature, attribute, value)
            }
            ClimateAttribute::TargetTemperatureLow => {
                resolve_float(&mut attrs.target_temperature_low, attribute, value)
            }
            ClimateAttribute::TargetTemperatureHigh => {
                resolve_float(&mut attrs.target_temperature_high, attribute, value)
            }
            ClimateAttribute::CurrentHumidity => {
                resolve_float(&mut attrs.current_humidity, attribute, value)
            }
            ClimateAttribute::TargetHumidity => {
                resolve_float(&mut attrs.target_humidity, attribute, value)
            }
            ClimateAttribute::MinTemp => resolve_float(&mut attrs.min_temp, attribute, value),
            ClimateAttribute::MaxTemp => resolve_float(&mut attrs.max_temp, attribute, value),
            ClimateAttribute::MinHumidity => {
                resolve_float(&mut attrs.min_humidity, attribute, value)
            }
            ClimateAttribute::MaxHumidity => {
                resolve_float(&mut attrs.max_humidity, attribute, value)
            }
            ClimateAttribute::HvacMode => resolve_hvac_mode(&mut attrs.hvac_mode, value),
            ClimateAttribute::HvacAction => resolve_hvac_action(&mut attrs.hvac_action, value),
            ClimateAttribute::FanMode => resolve_choice(&mut attrs.fan_mode, attribute, value),
            ClimateAttribute::PresetMode => {
                resolve_choice(&mut attrs.preset_mode, attribute, value)
            }
            ClimateAttribute::SwingMode => resolve_choice(&mut attrs.swing_mode, attribute, value),
            ClimateAttribute::SwingHorizontalMode => {
                resolve_choice(&mut attrs.swing_horizontal_mode, attribute, value)
            }
            ClimateAttribute::HvacFeatures => match self.feature_source {
                FeatureSource::Dynamic => resolve_features(&mut attrs.features, value),
                FeatureSource::Static => Resolution::Unchanged,
            },
            ClimateAttribute::Availability => resolve_availability(&mut attrs.available, value),
            ClimateAttribute::Icon => resolve_text(&mut attrs.icon, attribute, value),
        };
        debug!(
            entity_id = %self.entity_id,
            attribute = %attribute,
            value = %value,
            resolution = ?resolution,
            "Feed update"
        );
        resolution
    }

    fn publish_state(&self) {
        self.write_state();
    }
}

#[async_trait]
impl ClimateCommandable for TemplateClimate {
    #[instrument(skip(self), fields(entity_id = %self.entity_id))]
    async fn set_temperature(&mut self, request: TemperatureRequest) -> CommandResult<()> {
        let validated = validate_set_temperature(
            &request,
            self.hvac_mode(),
            &self.modes,
            self.temperature_bounds(),
        )?;

        // Mode switch goes first so the setpoint action sees the new mode
        let mut changed = false;
        if let Some(mode) = validated.hvac_mode {
            if Some(mode) != self.hvac_mode() {
                changed = self.apply_hvac_mode(mode).await?;
            }
        }

        let outcome = self
            .run_action(
                ClimateCommand::SetTemperature,
                variables([
                    (ATTR_TEMPERATURE, json!(request.temperature)),
                    (ATTR_TARGET_TEMP_HIGH, json!(request.target_temp_high)),
                    (ATTR_TARGET_TEMP_LOW, json!(request.target_temp_low)),
                    (ATTR_HVAC_MODE, json!(request.hvac_mode.map(|m| m.as_str()))),
                ]),
            )
            .await;
        if let Err(e) = outcome {
            if changed {
                self.write_state();
            }
            return Err(e);
        }

        changed |= match validated.setpoint {
            Setpoint::Single(Some(temperature)) => {
                self.attrs.target_temperature.apply_command(temperature)
            }
            Setpoint::Single(None) => false,
            Setpoint::Range { low, high } => {
                let low_changed = self.attrs.target_temperature_low.apply_command(low);
                let high_changed = self.attrs.target_temperature_high.apply_command(high);
                low_changed || high_changed
            }
        };

        if changed {
            self.write_state();
        }
        Ok(())
    }

    #[instrument(skip(self), fields(entity_id = %self.entity_id))]
    async fn set_humidity(&mut self, humidity: f64) -> CommandResult<()> {
        validate_humidity(humidity, self.humidity_bounds())?;
        self.run_action(
            ClimateCommand::SetHumidity,
            variables([(ATTR_HUMIDITY, json!(humidity))]),
        )
        .await?;
        if self.attrs.target_humidity.apply_command(humidity) {
            self.write_state();
        }
        Ok(())
    }

    #[instrument(skip(self), fields(entity_id = %self.entity_id))]
    async fn set_hvac_mode(&mut self, hvac_mode: HvacMode) -> CommandResult<()> {
        if self.apply_hvac_mode(hvac_mode).await? {
            self.write_state();
        }
        Ok(())
    }

    async fn set_fan_mode(&mut self, fan_mode: &str) -> CommandResult<()> {
        self.set_choice(ClimateCommand::SetFanMode, ATTR_FAN_MODE, fan_mode, |a| {
            &mut a.fan_mode
        })
        .await
    }

    async fn set_preset_mode(&mut self, preset_mode: &str) -> CommandResult<()> {
        self.set_choice(
            ClimateCommand::SetPresetMode,
            ATTR_PRESET_MODE,
            preset_mode,
            |a| &mut a.preset_mode,
        )
        .await
    }

    async fn set_swing_mode(&mut self, swing_mode: &str) -> CommandResult<()> {
        self.set_choice(
            ClimateCommand::SetSwingMode,
            ATTR_SWING_MODE,
            swing_mode,
            |a| &mut a.swing_mode,
        )
        .await
    }

    async fn set_swing_horizontal_mode(
        &mut self,
        swing_horizontal_mode: &str,
    ) -> CommandResult<()> {
        self.set_choice(
            ClimateCommand::SetSwingHorizontalMode,
            ATTR_SWING_HORIZONTAL_MODE,
            swing_horizontal_mode,
            |a| &mut a.swing_horizontal_mode,
        )
        .await
    }

    #[instrument(skip(self), fields(entity_id = %self.entity_id))]
    async fn turn_on(&mut self) -> CommandResult<()> {
        let target = self.turn_on_mode();
        self.switch(ClimateCommand::TurnOn, target).await
    }

    #[instrument(skip(self), fields(entity_id = %self.entity_id))]
    async fn turn_off(&mut self) -> CommandResult<()> {
        let target = self
            .modes
            .contains(&HvacMode::Off)
            .then_some(HvacMode::Off);
        self.switch(ClimateCommand::TurnOff, target).await
    }
}
