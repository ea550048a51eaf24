//! Template climate checker
//!
//! Loads a YAML file of template climates plus the entity states their
//! templates read, builds every entity, evaluates every feed once and prints
//! the state each entity would publish.

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use ha_climate::{State, TemperatureUnit};
use ha_template_climate::{
    add_entities, setup_platform, ActionError, ActionSequence, ClimateConfig, HostServices,
    MemoryStateStore, MiniJinjaRenderer, ScriptRunner, TemplateBound,
};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "template-climate", version, about)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a file and print the state of every climate it declares
    Check {
        /// YAML file with `climate:` and optional `states:` sections
        file: PathBuf,

        /// Report temperatures in °F unless a climate overrides its unit
        #[arg(long)]
        fahrenheit: bool,
    },
}

/// Contents of a checked file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CheckFile {
    #[serde(default)]
    climate: Vec<ClimateConfig>,

    /// Entity id → state, visible to templates and used for restore
    #[serde(default)]
    states: IndexMap<String, Value>,
}

/// Logs actions instead of running them
struct DryRunScripts;

#[async_trait]
impl ScriptRunner for DryRunScripts {
    async fn run(
        &self,
        entity_id: &str,
        action: &str,
        sequence: &ActionSequence,
        variables: Map<String, Value>,
    ) -> Result<(), ActionError> {
        info!(
            entity_id,
            action,
            steps = sequence.len(),
            variables = %serde_json::Value::Object(variables),
            "Dry run"
        );
        Ok(())
    }
}

async fn check(path: &Path, unit_system: TemperatureUnit) -> Result<Vec<State>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: CheckFile = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let store = Arc::new(MemoryStateStore::new());
    for (entity_id, state) in file.states {
        let state = match state {
            Value::String(s) => s,
            other => other.to_string(),
        };
        store.set(&entity_id, state);
    }

    let host = HostServices::new(Arc::new(DryRunScripts), store.clone())
        .with_unit_system(unit_system);
    let mut entities = setup_platform(&file.climate, &host)?;
    add_entities(&mut entities, store.as_ref()).await;

    let renderer = MiniJinjaRenderer::new(store.clone());
    for entity in &mut entities {
        entity.refresh_feeds(&renderer);
    }

    Ok(entities.iter().map(|e| e.state()).collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Check { file, fahrenheit } => {
            let unit = if fahrenheit {
                TemperatureUnit::Fahrenheit
            } else {
                TemperatureUnit::Celsius
            };
            let states = check(&file, unit).await?;
            println!("{}", serde_json::to_string_pretty(&states)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_check_renders_feeds() {
        let file = write_file(
            r#"
states:
  sensor.hall_temperature: 19.5
  input_select.hall_mode: heat
climate:
  - name: Hall
    modes: ["off", heat]
    current_temperature_template: "{{ states('sensor.hall_temperature') }}"
    hvac_mode_template: "{{ states('input_select.hall_mode') }}"
"#,
        );
        let states = check(file.path(), TemperatureUnit::Celsius).await.unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].entity_id, "climate.hall");
        assert_eq!(states[0].state, "heat");
        assert_eq!(states[0].attribute_f64("current_temperature"), Some(19.5));
    }

    #[tokio::test]
    async fn test_check_restores_from_states() {
        let file = write_file(
            r#"
states:
  climate.study: cool
climate:
  - name: Study
    modes: ["off", cool]
"#,
        );
        let states = check(file.path(), TemperatureUnit::Fahrenheit).await.unwrap();
        assert_eq!(states[0].state, "cool");
        assert_eq!(states[0].attribute_str("temperature_unit"), Some("°F"));
    }

    #[tokio::test]
    async fn test_check_rejects_invalid_config() {
        let file = write_file("climate:\n  - modes: []\n");
        assert!(check(file.path(), TemperatureUnit::Celsius).await.is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::parse_from(["template-climate", "check", "climates.yaml", "--fahrenheit"]);
        match cli.command {
            Command::Check { file, fahrenheit } => {
                assert_eq!(file, PathBuf::from("climates.yaml"));
                assert!(fahrenheit);
            }
        }
    }
}
