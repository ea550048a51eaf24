//! Template climate integration for Home Assistant
//!
//! A template climate is a virtual thermostat: every observable attribute is
//! fed by a template evaluated against other entities' states, and every
//! command may run a configured action.
//!
//! # Attribute sources
//!
//! - Feeds: a configured template governs its attribute
//! - Commands: written locally when no template governs the attribute, or
//!   when the entity is `optimistic`
//! - Restore: the state saved before a restart seeds the attributes
//!
//! # Example
//!
//! ```ignore
//! use ha_template_climate::{setup_platform, add_entities, load_climates_yaml};
//!
//! let configs = load_climates_yaml(&yaml)?;
//! let mut entities = setup_platform(&configs, &host)?;
//! add_entities(&mut entities, restore.as_ref()).await;
//!
//! entities[0].set_hvac_mode(HvacMode::Heat).await?;
//! ```

pub mod binding;
pub mod config;
pub mod entity;
pub mod error;
pub mod features;
pub mod feed;
pub mod host;
pub mod platform;
pub mod resolver;
pub mod validator;

pub use binding::{AttributeBinding, ClimateAttribute, FeedValue};
pub use config::{ActionSequence, ClimateCommand, ClimateConfig, InitialValues};
pub use entity::{
    ClimateAttributes, ClimateCommandable, Restorable, TemplateBound, TemplateClimate,
};
pub use error::{
    ActionError, CommandError, CommandResult, ConfigError, ConfigResult, TemplateError,
    TemplateResult,
};
pub use features::{derive_features, parse_feature_list, FeatureSource};
pub use feed::{FeedTable, MiniJinjaRenderer};
pub use host::{
    HostServices, MemoryStateStore, RestoreStateSource, ScriptRunner, StateWriter,
    TemplateRenderer,
};
pub use platform::{add_entities, load_climates_yaml, setup_platform};
pub use resolver::Resolution;
pub use validator::{Setpoint, TemperatureRequest};
