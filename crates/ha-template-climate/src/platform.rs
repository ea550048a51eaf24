//! Platform setup: configuration list to entities

use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::ClimateConfig;
use crate::entity::{Restorable, TemplateClimate};
use crate::error::{ConfigError, ConfigResult};
use crate::host::{HostServices, RestoreStateSource};

/// Parse and validate a YAML list of climate configurations
pub fn load_climates_yaml(yaml: &str) -> ConfigResult<Vec<ClimateConfig>> {
    let configs: Vec<ClimateConfig> =
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::ParseYaml { source })?;
    for config in &configs {
        config.validate()?;
    }
    Ok(configs)
}

/// Build one entity per configuration
///
/// Any invalid configuration, or two configurations resolving to the same
/// entity id, fails the whole platform.
pub fn setup_platform(
    configs: &[ClimateConfig],
    host: &HostServices,
) -> ConfigResult<Vec<TemplateClimate>> {
    let mut seen = HashSet::new();
    let mut entities = Vec::with_capacity(configs.len());

    for config in configs {
        let entity = TemplateClimate::new(config, host)?;
        if !seen.insert(entity.entity_id().to_string()) {
            return Err(ConfigError::DuplicateEntityId {
                entity_id: entity.entity_id().to_string(),
            });
        }
        debug!("Set up {}", entity.entity_id());
        entities.push(entity);
    }

    info!("Loaded {} template climate entities", entities.len());
    Ok(entities)
}

/// Restore each entity's previous state and publish its first state
pub async fn add_entities(entities: &mut [TemplateClimate], restore: &dyn RestoreStateSource) {
    for entity in entities.iter_mut() {
        entity.restore(restore).await;
        entity.write_state();
    }
}
