//! Services a template climate consumes from its host
//!
//! Script execution, state publication and state restoration belong to the
//! host platform. They are modelled as traits so the entity can be driven
//! by a real host, by the CLI, or by tests.

use async_trait::async_trait;
use dashmap::DashMap;
use ha_climate::{State, TemperatureUnit};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::config::ActionSequence;
use crate::error::{ActionError, TemplateResult};

/// Runs the action sequence bound to a climate command
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run `sequence` to completion with `variables` in scope
    ///
    /// # Arguments
    /// * `entity_id` - The climate issuing the command
    /// * `action` - The command the sequence is bound to (e.g. "set_hvac_mode")
    /// * `sequence` - The configured action sequence
    /// * `variables` - The command payload (e.g. `{"hvac_mode": "heat"}`)
    async fn run(
        &self,
        entity_id: &str,
        action: &str,
        sequence: &ActionSequence,
        variables: Map<String, Value>,
    ) -> Result<(), ActionError>;
}

/// Receives every state an entity publishes
pub trait StateWriter: Send + Sync {
    fn write_state(&self, state: State);
}

/// Hands back the state an entity had before a restart
#[async_trait]
pub trait RestoreStateSource: Send + Sync {
    async fn last_state(&self, entity_id: &str) -> Option<State>;
}

/// Renders a template string against the host's current states
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str) -> TemplateResult<String>;
}

/// The host services every template climate is constructed with
#[derive(Clone)]
pub struct HostServices {
    pub scripts: Arc<dyn ScriptRunner>,
    pub writer: Arc<dyn StateWriter>,
    /// Unit system of the host; entities without an override report in it
    pub unit_system: TemperatureUnit,
}

impl HostServices {
    pub fn new(scripts: Arc<dyn ScriptRunner>, writer: Arc<dyn StateWriter>) -> Self {
        Self {
            scripts,
            writer,
            unit_system: TemperatureUnit::Celsius,
        }
    }

    pub fn with_unit_system(mut self, unit_system: TemperatureUnit) -> Self {
        self.unit_system = unit_system;
        self
    }
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices")
            .field("unit_system", &self.unit_system)
            .finish_non_exhaustive()
    }
}

/// In-memory entity states
///
/// Serves as the state writer, the restore source and the lookup behind
/// [`MiniJinjaRenderer`](crate::feed::MiniJinjaRenderer) when no host
/// platform is present.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: DashMap<String, State>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an entity's state value, keeping its attributes
    pub fn set(&self, entity_id: &str, state: impl Into<String>) {
        let state = state.into();
        self.states
            .entry(entity_id.to_string())
            .and_modify(|s| s.state = state.clone())
            .or_insert_with(|| State::new(entity_id, state, Map::new()));
    }

    pub fn insert(&self, state: State) {
        debug!(entity_id = %state.entity_id, state = %state.state, "Storing state");
        self.states.insert(state.entity_id.clone(), state);
    }

    pub fn get(&self, entity_id: &str) -> Option<State> {
        self.states.get(entity_id).map(|s| s.clone())
    }

    pub fn get_state(&self, entity_id: &str) -> Option<String> {
        self.states.get(entity_id).map(|s| s.state.clone())
    }

    /// All stored states, sorted by entity id
    pub fn states(&self) -> Vec<State> {
        let mut states: Vec<State> = self.states.iter().map(|s| s.value().clone()).collect();
        states.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl StateWriter for MemoryStateStore {
    fn write_state(&self, state: State) {
        self.insert(state);
    }
}

#[async_trait]
impl RestoreStateSource for MemoryStateStore {
    async fn last_state(&self, entity_id: &str) -> Option<State> {
        self.get(entity_id)
    }
}
