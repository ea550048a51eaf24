//! Supported-feature derivation
//!
//! A template climate gets its feature set from exactly one source, chosen
//! at construction: the `hvac_features_template` feed (dynamic), or the
//! shape of its configuration (static).

use ha_climate::{ClimateEntityFeature, HvacMode};
use tracing::error;

use crate::binding::{AttributeBinding, ClimateAttribute, FeedValue};
use crate::config::{ClimateCommand, ClimateConfig};
use crate::resolver::Resolution;

/// Where an entity's feature set comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSource {
    /// Derived once from configuration
    Static,
    /// Re-derived from every value of the feature-list feed
    Dynamic,
}

impl FeatureSource {
    pub fn for_config(config: &ClimateConfig) -> Self {
        if config.template(ClimateAttribute::HvacFeatures).is_some() {
            FeatureSource::Dynamic
        } else {
            FeatureSource::Static
        }
    }
}

/// Derive the static feature set of a configuration
pub fn derive_features(config: &ClimateConfig) -> ClimateEntityFeature {
    let mut features = ClimateEntityFeature::empty();
    let modes = &config.modes;

    let controllable = |command: ClimateCommand, attributes: &[ClimateAttribute]| {
        config.optimistic
            || config.action(command).is_some()
            || attributes.iter().any(|a| config.template(*a).is_some())
    };

    if controllable(
        ClimateCommand::SetTemperature,
        &[
            ClimateAttribute::TargetTemperature,
            ClimateAttribute::TargetTemperatureLow,
            ClimateAttribute::TargetTemperatureHigh,
        ],
    ) {
        features |= setpoint_features(modes);
    }
    if controllable(ClimateCommand::SetHumidity, &[ClimateAttribute::TargetHumidity]) {
        features |= ClimateEntityFeature::TARGET_HUMIDITY;
    }
    if controllable(ClimateCommand::SetFanMode, &[ClimateAttribute::FanMode]) {
        features |= ClimateEntityFeature::FAN_MODE;
    }
    if controllable(ClimateCommand::SetPresetMode, &[ClimateAttribute::PresetMode]) {
        features |= ClimateEntityFeature::PRESET_MODE;
    }
    if controllable(ClimateCommand::SetSwingMode, &[ClimateAttribute::SwingMode]) {
        features |= ClimateEntityFeature::SWING_MODE;
    }
    if controllable(
        ClimateCommand::SetSwingHorizontalMode,
        &[ClimateAttribute::SwingHorizontalMode],
    ) {
        features |= ClimateEntityFeature::SWING_HORIZONTAL_MODE;
    }

    if modes.len() >= 2 || config.action(ClimateCommand::TurnOn).is_some() {
        features |= ClimateEntityFeature::TURN_ON;
    }
    if modes.contains(&HvacMode::Off)
        || modes.len() > 1
        || config.action(ClimateCommand::TurnOff).is_some()
    {
        features |= ClimateEntityFeature::TURN_OFF;
    }

    features
}

/// Single and/or range setpoint support, decided by the configured modes
fn setpoint_features(modes: &[HvacMode]) -> ClimateEntityFeature {
    if !modes.contains(&HvacMode::HeatCool) {
        return ClimateEntityFeature::TARGET_TEMPERATURE;
    }
    let single_modes = modes
        .iter()
        .filter(|m| !matches!(m, HvacMode::HeatCool | HvacMode::Off))
        .count();
    if single_modes > 0 {
        ClimateEntityFeature::TARGET_TEMPERATURE_RANGE | ClimateEntityFeature::TARGET_TEMPERATURE
    } else {
        ClimateEntityFeature::TARGET_TEMPERATURE_RANGE
    }
}

/// Parse a feature-list feed value
///
/// The value is a JSON list of feature names, or else a single bare name.
/// Unknown names are logged and skipped; sentinels yield the empty set.
pub fn parse_feature_list(raw: &FeedValue) -> ClimateEntityFeature {
    let text = match raw {
        FeedValue::Unknown | FeedValue::Unavailable => return ClimateEntityFeature::empty(),
        other => other.as_text(),
    };
    let text = text.trim();
    if text.is_empty() {
        return ClimateEntityFeature::empty();
    }

    let names = match serde_json::from_str::<Vec<String>>(text) {
        Ok(names) => names,
        Err(_) => vec![text.to_string()],
    };

    names
        .iter()
        .fold(ClimateEntityFeature::empty(), |acc, name| {
            match name.parse::<ClimateEntityFeature>() {
                Ok(feature) => acc | feature,
                Err(e) => {
                    error!(attribute = %ClimateAttribute::HvacFeatures, "{}", e);
                    acc
                }
            }
        })
}

/// Deliver a feature-list feed value to the dynamic feature binding
pub fn resolve_features(
    binding: &mut AttributeBinding<ClimateEntityFeature>,
    raw: &FeedValue,
) -> Resolution {
    if binding.set(Some(parse_feature_list(raw))) {
        Resolution::Changed
    } else {
        Resolution::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> ClimateConfig {
        ClimateConfig::from_value(value).unwrap()
    }

    #[test]
    fn test_feature_list_json() {
        let features = parse_feature_list(&r#"["turn_on","fan_mode"]"#.into());
        assert_eq!(
            features,
            ClimateEntityFeature::TURN_ON | ClimateEntityFeature::FAN_MODE
        );
    }

    #[test]
    fn test_feature_list_bare_string() {
        assert_eq!(
            parse_feature_list(&"turn_on".into()),
            ClimateEntityFeature::TURN_ON
        );
    }

    #[test]
    fn test_feature_list_unknown_name() {
        assert!(parse_feature_list(&"not_a_feature".into()).is_empty());
        assert_eq!(
            parse_feature_list(&r#"["swing_mode", "aux_heat"]"#.into()),
            ClimateEntityFeature::SWING_MODE
        );
    }

    #[test]
    fn test_feature_list_sentinels_and_empty() {
        assert!(parse_feature_list(&FeedValue::Unavailable).is_empty());
        assert!(parse_feature_list(&FeedValue::Unknown).is_empty());
        assert!(parse_feature_list(&"".into()).is_empty());
        assert!(parse_feature_list(&"[]".into()).is_empty());
    }

    #[test]
    fn test_feature_source() {
        assert_eq!(
            FeatureSource::for_config(&config(json!({}))),
            FeatureSource::Static
        );
        assert_eq!(
            FeatureSource::for_config(&config(json!({"hvac_features_template": "turn_on"}))),
            FeatureSource::Dynamic
        );
    }

    #[test]
    fn test_static_bare_config_only_turns_on_and_off() {
        let features = derive_features(&config(json!({})));
        assert_eq!(
            features,
            ClimateEntityFeature::TURN_ON | ClimateEntityFeature::TURN_OFF
        );
    }

    #[test]
    fn test_static_single_mode_without_off() {
        let features = derive_features(&config(json!({"modes": ["heat"]})));
        assert!(features.is_empty());

        let features = derive_features(&config(json!({"modes": ["off"]})));
        assert_eq!(features, ClimateEntityFeature::TURN_OFF);
    }

    #[test]
    fn test_static_from_scripts() {
        let features = derive_features(&config(json!({
            "modes": ["off", "heat"],
            "set_temperature": {"service": "script.set_temp"},
            "set_fan_mode": {"service": "script.fan"},
            "set_humidity": {"service": "script.humidity"}
        })));
        assert!(features.contains(ClimateEntityFeature::TARGET_TEMPERATURE));
        assert!(!features.contains(ClimateEntityFeature::TARGET_TEMPERATURE_RANGE));
        assert!(features.contains(ClimateEntityFeature::FAN_MODE));
        assert!(features.contains(ClimateEntityFeature::TARGET_HUMIDITY));
        assert!(!features.contains(ClimateEntityFeature::PRESET_MODE));
    }

    #[test]
    fn test_static_from_templates() {
        let features = derive_features(&config(json!({
            "preset_mode_template": "{{ 'eco' }}",
            "swing_horizontal_mode_template": "{{ 'on' }}"
        })));
        assert!(features.contains(ClimateEntityFeature::PRESET_MODE));
        assert!(features.contains(ClimateEntityFeature::SWING_HORIZONTAL_MODE));
        assert!(!features.contains(ClimateEntityFeature::SWING_MODE));
    }

    #[test]
    fn test_static_optimistic_enables_every_control() {
        let features = derive_features(&config(json!({"optimistic": true})));
        for feature in [
            ClimateEntityFeature::TARGET_TEMPERATURE,
            ClimateEntityFeature::TARGET_HUMIDITY,
            ClimateEntityFeature::FAN_MODE,
            ClimateEntityFeature::PRESET_MODE,
            ClimateEntityFeature::SWING_MODE,
            ClimateEntityFeature::SWING_HORIZONTAL_MODE,
        ] {
            assert!(features.contains(feature), "missing {}", feature);
        }
    }

    #[test]
    fn test_static_heat_cool_setpoints() {
        let action = json!({"service": "script.set_temp"});

        let only_range = derive_features(&config(json!({
            "modes": ["off", "heat_cool"], "set_temperature": action
        })));
        assert!(only_range.contains(ClimateEntityFeature::TARGET_TEMPERATURE_RANGE));
        assert!(!only_range.contains(ClimateEntityFeature::TARGET_TEMPERATURE));

        let both = derive_features(&config(json!({
            "modes": ["off", "heat_cool", "heat"], "set_temperature": action
        })));
        assert!(both.contains(ClimateEntityFeature::TARGET_TEMPERATURE_RANGE));
        assert!(both.contains(ClimateEntityFeature::TARGET_TEMPERATURE));

        let heat_cool_alone = derive_features(&config(json!({
            "modes": ["heat_cool"], "set_temperature": action
        })));
        assert_eq!(
            heat_cool_alone,
            ClimateEntityFeature::TARGET_TEMPERATURE_RANGE
        );
    }

    #[test]
    fn test_turn_scripts_add_turn_features() {
        let features = derive_features(&config(json!({
            "modes": ["heat"],
            "turn_on": {"service": "switch.turn_on"},
            "turn_off": {"service": "switch.turn_off"}
        })));
        assert_eq!(
            features,
            ClimateEntityFeature::TURN_ON | ClimateEntityFeature::TURN_OFF
        );
    }

    #[test]
    fn test_resolve_features_is_idempotent() {
        let mut binding = AttributeBinding::new(Some(ClimateEntityFeature::empty())).governed(true);
        assert_eq!(
            resolve_features(&mut binding, &"turn_on".into()),
            Resolution::Changed
        );
        assert_eq!(
            resolve_features(&mut binding, &r#"["turn_on"]"#.into()),
            Resolution::Unchanged
        );
        assert_eq!(
            resolve_features(&mut binding, &FeedValue::Unavailable),
            Resolution::Changed
        );
        assert_eq!(binding.value(), Some(&ClimateEntityFeature::empty()));
    }
}
