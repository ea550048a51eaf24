//! Value resolution for feed updates
//!
//! Coerces a raw feed value to the attribute's type and stores it. Sentinels
//! clear the attribute; values that fail coercion are logged and dropped so a
//! single bad render never corrupts the entity.

use ha_climate::{HvacAction, HvacMode};
use tracing::error;

use crate::binding::{AttributeBinding, ClimateAttribute, FeedValue};

/// Outcome of delivering one feed value to an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The stored value changed; the entity should publish its state
    Changed,
    /// The value equals the stored one
    Unchanged,
    /// The value could not be coerced and was dropped
    Rejected,
}

impl Resolution {
    pub fn should_publish(self) -> bool {
        self == Resolution::Changed
    }

    fn from_changed(changed: bool) -> Self {
        if changed {
            Resolution::Changed
        } else {
            Resolution::Unchanged
        }
    }

    /// Combine two outcomes, keeping the one that demands the most work
    pub fn merge(self, other: Resolution) -> Resolution {
        match (self, other) {
            (Resolution::Changed, _) | (_, Resolution::Changed) => Resolution::Changed,
            (Resolution::Rejected, _) | (_, Resolution::Rejected) => Resolution::Rejected,
            _ => Resolution::Unchanged,
        }
    }
}

/// Deliver `raw` to `binding`, coercing it with `coerce`
pub fn resolve<T, F>(
    binding: &mut AttributeBinding<T>,
    attribute: ClimateAttribute,
    raw: &FeedValue,
    coerce: F,
) -> Resolution
where
    T: Clone + PartialEq,
    F: FnOnce(&AttributeBinding<T>, &FeedValue) -> Result<T, String>,
{
    if raw.is_sentinel() {
        return Resolution::from_changed(binding.set(None));
    }
    match coerce(binding, raw) {
        Ok(value) => Resolution::from_changed(binding.set(Some(value))),
        Err(reason) => {
            error!(attribute = %attribute, value = %raw, "{}", reason);
            Resolution::Rejected
        }
    }
}

/// Coerce a feed value to a finite float
pub fn coerce_float(raw: &FeedValue) -> Result<f64, String> {
    let parsed = match raw {
        FeedValue::Number(n) => Some(*n),
        FeedValue::Text(s) => s.trim().parse::<f64>().ok(),
        FeedValue::Unknown | FeedValue::Unavailable => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("Could not parse number from '{}'", raw))
}

pub fn resolve_float(
    binding: &mut AttributeBinding<f64>,
    attribute: ClimateAttribute,
    raw: &FeedValue,
) -> Resolution {
    resolve(binding, attribute, raw, |_, raw| coerce_float(raw))
}

/// Resolve a free-form mode (fan, preset, swing) against its configured list
pub fn resolve_choice(
    binding: &mut AttributeBinding<String>,
    attribute: ClimateAttribute,
    raw: &FeedValue,
) -> Resolution {
    resolve(binding, attribute, raw, |binding, raw| {
        let value = raw.as_text();
        if binding.allows(&value) {
            Ok(value.into_owned())
        } else {
            Err(format!(
                "Received invalid {}: {}. Expected: {:?}",
                attribute,
                value,
                binding.valid_values().map(|v| v.iter().collect::<Vec<_>>())
            ))
        }
    })
}

/// Resolve an HVAC mode: it must be a known mode and one of the configured ones
pub fn resolve_hvac_mode(binding: &mut AttributeBinding<HvacMode>, raw: &FeedValue) -> Resolution {
    resolve(binding, ClimateAttribute::HvacMode, raw, |binding, raw| {
        let expected = || {
            binding
                .valid_values()
                .map(|v| v.iter().cloned().collect::<Vec<_>>())
                .unwrap_or_default()
        };
        let mode: HvacMode = raw.as_text().trim().parse().map_err(|_| {
            format!("Received invalid hvac mode: {}. Expected: {:?}", raw, expected())
        })?;
        if binding.allows(mode.as_str()) {
            Ok(mode)
        } else {
            Err(format!(
                "Received invalid hvac mode: {}. Expected: {:?}",
                mode,
                expected()
            ))
        }
    })
}

pub fn resolve_hvac_action(
    binding: &mut AttributeBinding<HvacAction>,
    raw: &FeedValue,
) -> Resolution {
    resolve(binding, ClimateAttribute::HvacAction, raw, |_, raw| {
        raw.as_text().trim().parse().map_err(|_| {
            format!(
                "Received invalid hvac action: {}. Expected: {:?}",
                raw,
                HvacAction::ALL.map(|a| a.as_str())
            )
        })
    })
}

/// Resolve the availability feed; sentinels mean unavailable
pub fn resolve_availability(binding: &mut AttributeBinding<bool>, raw: &FeedValue) -> Resolution {
    let available = match raw {
        FeedValue::Unknown | FeedValue::Unavailable => false,
        FeedValue::Number(n) => *n != 0.0,
        FeedValue::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "on" | "yes" | "1" | "enable" | "home" | "open"
        ),
    };
    Resolution::from_changed(binding.set(Some(available)))
}

pub fn resolve_text(
    binding: &mut AttributeBinding<String>,
    attribute: ClimateAttribute,
    raw: &FeedValue,
) -> Resolution {
    resolve(binding, attribute, raw, |_, raw| Ok(raw.as_text().into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fan_binding() -> AttributeBinding<String> {
        AttributeBinding::new(Some("low".to_string()))
            .governed(true)
            .with_valid_values(["auto", "low", "high"])
    }

    #[test]
    fn test_float_resolution() {
        let mut binding = AttributeBinding::new(None).governed(true);
        let attr = ClimateAttribute::CurrentTemperature;

        assert_eq!(resolve_float(&mut binding, attr, &"21.5".into()), Resolution::Changed);
        assert_eq!(binding.value(), Some(&21.5));
        assert_eq!(
            resolve_float(&mut binding, attr, &FeedValue::Number(21.5)),
            Resolution::Unchanged
        );
        assert_eq!(resolve_float(&mut binding, attr, &"warm".into()), Resolution::Rejected);
        assert_eq!(binding.value(), Some(&21.5));
        assert_eq!(resolve_float(&mut binding, attr, &"nan".into()), Resolution::Rejected);
    }

    #[test]
    fn test_sentinel_clears_value() {
        let mut binding = AttributeBinding::new(Some(19.0)).governed(true);
        let attr = ClimateAttribute::TargetTemperature;
        assert_eq!(
            resolve_float(&mut binding, attr, &FeedValue::Unavailable),
            Resolution::Changed
        );
        assert_eq!(binding.value(), None);
        assert_eq!(
            resolve_float(&mut binding, attr, &FeedValue::Unknown),
            Resolution::Unchanged
        );
    }

    #[test]
    fn test_choice_outside_list_is_rejected() {
        let mut binding = fan_binding();
        let attr = ClimateAttribute::FanMode;
        assert_eq!(resolve_choice(&mut binding, attr, &"turbo".into()), Resolution::Rejected);
        assert_eq!(binding.value().map(String::as_str), Some("low"));
        assert_eq!(resolve_choice(&mut binding, attr, &"high".into()), Resolution::Changed);
        assert_eq!(resolve_choice(&mut binding, attr, &"high".into()), Resolution::Unchanged);
        assert_eq!(resolve_choice(&mut binding, attr, &"unknown".into()), Resolution::Changed);
        assert_eq!(binding.value(), None);
    }

    #[test]
    fn test_hvac_mode_must_be_configured() {
        let mut binding = AttributeBinding::new(Some(HvacMode::Off))
            .governed(true)
            .with_valid_values(["off", "heat"]);
        assert_eq!(resolve_hvac_mode(&mut binding, &"cool".into()), Resolution::Rejected);
        assert_eq!(resolve_hvac_mode(&mut binding, &"boiling".into()), Resolution::Rejected);
        assert_eq!(binding.value(), Some(&HvacMode::Off));
        assert_eq!(resolve_hvac_mode(&mut binding, &"heat".into()), Resolution::Changed);
        assert_eq!(binding.value(), Some(&HvacMode::Heat));
    }

    #[test]
    fn test_hvac_action() {
        let mut binding = AttributeBinding::new(None).governed(true);
        assert_eq!(resolve_hvac_action(&mut binding, &"heating".into()), Resolution::Changed);
        assert_eq!(resolve_hvac_action(&mut binding, &"warming".into()), Resolution::Rejected);
        assert_eq!(binding.value(), Some(&HvacAction::Heating));
    }

    #[test]
    fn test_availability() {
        let mut binding = AttributeBinding::new(Some(true)).governed(true);
        assert_eq!(resolve_availability(&mut binding, &"on".into()), Resolution::Unchanged);
        assert_eq!(resolve_availability(&mut binding, &"off".into()), Resolution::Changed);
        assert_eq!(binding.value(), Some(&false));
        assert_eq!(resolve_availability(&mut binding, &"True".into()), Resolution::Changed);
        assert_eq!(
            resolve_availability(&mut binding, &FeedValue::Unavailable),
            Resolution::Changed
        );
        assert_eq!(binding.value(), Some(&false));
    }

    #[test]
    fn test_merge() {
        use Resolution::*;
        assert_eq!(Unchanged.merge(Changed), Changed);
        assert_eq!(Rejected.merge(Unchanged), Rejected);
        assert_eq!(Unchanged.merge(Unchanged), Unchanged);
    }
}
