//! Error types for template climate entities

use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for climate commands
pub type CommandResult<T> = Result<T, CommandError>;

/// Result type for template rendering
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors raised while validating a climate configuration
///
/// Any of these is fatal for the entity: it is never constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse YAML
    #[error("failed to parse climate configuration: {source}")]
    ParseYaml {
        #[source]
        source: serde_yaml::Error,
    },

    /// Failed to parse JSON
    #[error("failed to parse climate configuration: {source}")]
    ParseJson {
        #[source]
        source: serde_json::Error,
    },

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// Two climates resolve to the same entity id
    #[error("duplicate climate entity id: {entity_id}")]
    DuplicateEntityId { entity_id: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Error reported by the host's script runner
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("action failed: {0}")]
    Failed(String),

    #[error("action stopped: {0}")]
    Stopped(String),
}

/// Errors surfaced to whoever issued a climate command
#[derive(Debug, Error)]
pub enum CommandError {
    /// The arguments are inconsistent with the entity; nothing was run
    #[error("invalid argument '{field}': {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// The configured action failed
    #[error("{command} action failed: {source}")]
    Action {
        command: &'static str,
        #[source]
        source: ActionError,
    },

    /// The entity has no way to carry out the command
    #[error("{command} is not supported by {entity_id}")]
    NotSupported {
        command: &'static str,
        entity_id: String,
    },
}

impl CommandError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while rendering a template
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    /// Invalid template syntax
    #[error("invalid template syntax: {message}")]
    SyntaxError { message: String },

    /// Failed to render template
    #[error("failed to render template: {message}")]
    RenderError { message: String },
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        match err.kind() {
            minijinja::ErrorKind::SyntaxError => TemplateError::SyntaxError {
                message: err.to_string(),
            },
            _ => TemplateError::RenderError {
                message: err.to_string(),
            },
        }
    }
}
