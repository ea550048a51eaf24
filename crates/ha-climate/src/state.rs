//! State snapshot an entity publishes to the host

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{STATE_UNAVAILABLE, STATE_UNKNOWN};

/// The state of an entity at a point in time
///
/// Climate entities publish their HVAC mode as the state value and every
/// other observable as an attribute. The same shape is handed back by the
/// host when an entity restores its last known state after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// The entity this state belongs to (e.g. "climate.living_room")
    pub entity_id: String,

    /// The state value (e.g. "heat", "off", "unavailable")
    pub state: String,

    /// Additional attributes associated with the state
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl State {
    pub fn new(
        entity_id: impl Into<String>,
        state: impl Into<String>,
        attributes: Map<String, Value>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.state == STATE_UNAVAILABLE
    }

    pub fn is_unknown(&self) -> bool {
        self.state == STATE_UNKNOWN
    }

    /// Get an attribute value by key
    pub fn attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get a numeric attribute, accepting numbers stored as strings
    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}
