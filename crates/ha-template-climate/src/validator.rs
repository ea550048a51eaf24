//! Command argument validation
//!
//! Every check here runs before a command's action, so an action is never
//! started with arguments the entity would refuse.

use ha_climate::HvacMode;

use crate::error::{CommandError, CommandResult};

/// Arguments of a set_temperature command
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemperatureRequest {
    pub hvac_mode: Option<HvacMode>,
    pub temperature: Option<f64>,
    pub target_temp_low: Option<f64>,
    pub target_temp_high: Option<f64>,
}

impl TemperatureRequest {
    pub fn single(temperature: f64) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }

    pub fn range(low: f64, high: f64) -> Self {
        Self {
            target_temp_low: Some(low),
            target_temp_high: Some(high),
            ..Self::default()
        }
    }

    pub fn with_hvac_mode(mut self, mode: HvacMode) -> Self {
        self.hvac_mode = Some(mode);
        self
    }
}

/// The setpoint shape a validated request carries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Setpoint {
    /// Single setpoint; `None` when the request only changes the mode
    Single(Option<f64>),
    Range { low: f64, high: f64 },
}

/// A set_temperature request that passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedTemperature {
    /// Mode requested explicitly by the caller
    pub hvac_mode: Option<HvacMode>,
    /// Explicit mode, else the entity's current mode
    pub effective_mode: Option<HvacMode>,
    pub setpoint: Setpoint,
}

/// Closed interval a value must fall in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn check(&self, field: &'static str, value: f64) -> CommandResult<()> {
        if !value.is_finite() {
            return Err(CommandError::invalid(field, "must be a finite number"));
        }
        if value < self.min || value > self.max {
            return Err(CommandError::invalid(
                field,
                format!(
                    "{} is outside the allowed range [{}, {}]",
                    value, self.min, self.max
                ),
            ));
        }
        Ok(())
    }
}

/// Validate a set_temperature request against the entity's mode state
pub fn validate_set_temperature(
    request: &TemperatureRequest,
    current_mode: Option<HvacMode>,
    modes: &[HvacMode],
    bounds: Bounds,
) -> CommandResult<ValidatedTemperature> {
    if let Some(mode) = request.hvac_mode {
        validate_hvac_mode(mode, modes)?;
    }
    let effective_mode = request.hvac_mode.or(current_mode);
    let range_mode = effective_mode.is_some_and(|m| m.is_range());

    let setpoint = if range_mode {
        if request.temperature.is_some() {
            return Err(CommandError::invalid(
                "temperature",
                "not allowed in heat_cool mode; use target_temp_low and target_temp_high",
            ));
        }
        let low = request.target_temp_low.ok_or_else(|| {
            CommandError::invalid("target_temp_low", "required in heat_cool mode")
        })?;
        let high = request.target_temp_high.ok_or_else(|| {
            CommandError::invalid("target_temp_high", "required in heat_cool mode")
        })?;
        bounds.check("target_temp_low", low)?;
        bounds.check("target_temp_high", high)?;
        if low > high {
            return Err(CommandError::invalid(
                "target_temp_low",
                format!("{} is above target_temp_high ({})", low, high),
            ));
        }
        Setpoint::Range { low, high }
    } else {
        let mode = effective_mode.map_or("no mode", |m| m.as_str());
        if request.target_temp_low.is_some() {
            return Err(CommandError::invalid(
                "target_temp_low",
                format!("only allowed in heat_cool mode, not in {}", mode),
            ));
        }
        if request.target_temp_high.is_some() {
            return Err(CommandError::invalid(
                "target_temp_high",
                format!("only allowed in heat_cool mode, not in {}", mode),
            ));
        }
        if let Some(temperature) = request.temperature {
            bounds.check("temperature", temperature)?;
        } else if request.hvac_mode.is_none() {
            return Err(CommandError::invalid(
                "temperature",
                "a temperature or hvac_mode is required",
            ));
        }
        Setpoint::Single(request.temperature)
    };

    Ok(ValidatedTemperature {
        hvac_mode: request.hvac_mode,
        effective_mode,
        setpoint,
    })
}

/// Check that a requested mode is one of the configured modes
pub fn validate_hvac_mode(mode: HvacMode, modes: &[HvacMode]) -> CommandResult<()> {
    if modes.contains(&mode) {
        Ok(())
    } else {
        Err(CommandError::invalid(
            "hvac_mode",
            format!(
                "'{}' is not one of {:?}",
                mode,
                modes.iter().map(HvacMode::as_str).collect::<Vec<_>>()
            ),
        ))
    }
}

/// Check that a requested fan/preset/swing value is in its configured list
pub fn validate_choice<'a>(
    field: &'static str,
    value: &str,
    allowed: impl IntoIterator<Item = &'a String>,
) -> CommandResult<()> {
    let allowed: Vec<&String> = allowed.into_iter().collect();
    if allowed.iter().any(|v| v.as_str() == value) {
        Ok(())
    } else {
        Err(CommandError::invalid(
            field,
            format!("'{}' is not one of {:?}", value, allowed),
        ))
    }
}

pub fn validate_humidity(humidity: f64, bounds: Bounds) -> CommandResult<()> {
    bounds.check("humidity", humidity)
}
