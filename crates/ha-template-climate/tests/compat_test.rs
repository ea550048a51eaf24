//! Compatibility tests for template climate configurations
//!
//! These tests use configurations in the shape users write for the
//! template climate integration and check they parse into the expected
//! entities.

use ha_climate::{ClimateEntityFeature, HvacMode, Precision, TemperatureUnit};
use ha_template_climate::{
    load_climates_yaml, ClimateAttribute, ClimateCommand, ClimateConfig, ConfigError,
    FeatureSource,
};
use serde_json::json;

// ============================================================================
// Schema
// ============================================================================

#[test]
fn test_full_yaml_config() {
    let configs = load_climates_yaml(
        r#"
- name: Living Room Thermostat
  unique_id: living_room_thermostat
  current_temperature_template: "{{ states('sensor.living_room_temperature') }}"
  target_temperature_template: "{{ states('input_number.living_room_target') }}"
  hvac_mode_template: "{{ states('input_select.living_room_mode') }}"
  hvac_action_template: >
    {% if is_state('switch.heater', 'on') %}heating{% else %}idle{% endif %}
  modes:
    - "off"
    - heat
    - cool
  fan_modes: [auto, low, high]
  min_temp: 10
  max_temp: 30
  temp_step: 0.5
  precision: 0.5
  set_temperature:
    - service: input_number.set_value
      target:
        entity_id: input_number.living_room_target
      data:
        value: "{{ temperature }}"
  set_hvac_mode:
    service: input_select.select_option
    target:
      entity_id: input_select.living_room_mode
    data:
      option: "{{ hvac_mode }}"
"#,
    )
    .unwrap();

    let config = &configs[0];
    assert_eq!(config.entity_id(), "climate.living_room_thermostat");
    assert_eq!(config.unique_id.as_deref(), Some("living_room_thermostat"));
    assert_eq!(
        config.modes,
        vec![HvacMode::Off, HvacMode::Heat, HvacMode::Cool]
    );
    assert_eq!(config.fan_modes, vec!["auto", "low", "high"]);
    assert_eq!(config.min_temp(TemperatureUnit::Celsius), 10.0);
    assert_eq!(config.max_temp(TemperatureUnit::Celsius), 30.0);
    assert_eq!(config.temp_step, 0.5);
    assert_eq!(config.precision, Some(Precision::Halves));
    assert!(config.template(ClimateAttribute::HvacAction).is_some());
    assert_eq!(config.action(ClimateCommand::SetTemperature).unwrap().len(), 1);
    assert_eq!(config.action(ClimateCommand::SetHvacMode).unwrap().len(), 1);
    assert!(config.action(ClimateCommand::SetFanMode).is_none());
}

#[test]
fn test_swing_horizontal_and_features_template() {
    let config = ClimateConfig::from_value(json!({
        "name": "Bedroom",
        "swing_horizontal_mode_template": "{{ states('input_select.vane') }}",
        "swing_horizontal_modes": ["left", "center", "right"],
        "hvac_features_template": "{{ ['turn_on', 'turn_off', 'swing_horizontal_mode'] | tojson }}"
    }))
    .unwrap();
    assert_eq!(
        config.swing_horizontal_modes,
        vec!["left", "center", "right"]
    );
    assert_eq!(FeatureSource::for_config(&config), FeatureSource::Dynamic);
}

#[test]
fn test_optimistic_flag() {
    let config = ClimateConfig::from_yaml("name: Garage\noptimistic: true").unwrap();
    assert!(config.optimistic);
    let features = ha_template_climate::derive_features(&config);
    assert!(features.contains(ClimateEntityFeature::TARGET_TEMPERATURE));
    assert!(features.contains(ClimateEntityFeature::FAN_MODE));
}

#[test]
fn test_initial_values_block() {
    let config = ClimateConfig::from_yaml(
        r#"
modes: ["off", heat_cool]
initial:
  hvac_mode: heat_cool
  target_temperature_low: 19
  target_temperature_high: 23
  fan_mode: high
"#,
    )
    .unwrap();
    assert_eq!(config.initial_hvac_mode(), Some(HvacMode::HeatCool));
    assert_eq!(config.initial.target_temperature_low, Some(19.0));
    assert_eq!(config.initial.fan_mode.as_deref(), Some("high"));
}

#[test]
fn test_fahrenheit_override() {
    let config = ClimateConfig::from_yaml("temperature_unit: °F").unwrap();
    assert_eq!(
        config.temperature_unit(TemperatureUnit::Celsius),
        TemperatureUnit::Fahrenheit
    );
    assert!((config.min_temp(TemperatureUnit::Fahrenheit) - 44.6).abs() < 1e-9);
}

// ============================================================================
// Rejected configurations
// ============================================================================

#[test]
fn test_rejects_unknown_hvac_mode() {
    let err = load_climates_yaml("- modes: [heat, turbo]").unwrap_err();
    assert!(matches!(err, ConfigError::ParseYaml { .. }));
}

#[test]
fn test_rejects_unknown_precision() {
    assert!(ClimateConfig::from_value(json!({"precision": 0.25})).is_err());
}

#[test]
fn test_rejects_legacy_keys() {
    // Keys of the older schema are not silently accepted
    let err = ClimateConfig::from_value(json!({"set_hvac_mode_template": "{{ 1 }}"})).unwrap_err();
    assert!(matches!(err, ConfigError::ParseJson { .. }));
}

#[test]
fn test_rejects_initial_preset_outside_list() {
    let err = ClimateConfig::from_value(json!({
        "preset_modes": ["eco"],
        "initial": {"preset_mode": "boost"}
    }))
    .unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "initial.preset_mode")
    );
}

#[test]
fn test_rejects_empty_action_list() {
    let err = ClimateConfig::from_value(json!({"turn_on": []})).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "turn_on"));
}
