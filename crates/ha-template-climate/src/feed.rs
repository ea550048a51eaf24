//! Feed subscriptions and the default template renderer
//!
//! A feed binds one attribute to one template. The [`FeedTable`] is the
//! observer registration table: the host (or [`FeedTable::render_all`])
//! re-evaluates each template whenever its inputs change and delivers the
//! result to the entity keyed by attribute.

use indexmap::IndexMap;
use minijinja::{Environment, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::binding::{ClimateAttribute, FeedValue};
use crate::config::ClimateConfig;
use crate::error::TemplateResult;
use crate::host::{MemoryStateStore, TemplateRenderer};

/// Attribute → template subscriptions of one entity
#[derive(Debug, Clone, Default)]
pub struct FeedTable {
    feeds: IndexMap<ClimateAttribute, String>,
}

impl FeedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe every attribute that has a template configured
    pub fn from_config(config: &ClimateConfig) -> Self {
        let mut table = Self::new();
        for attribute in ClimateAttribute::ALL {
            if let Some(template) = config.template(attribute) {
                table.subscribe(attribute, template);
            }
        }
        table
    }

    /// Bind `attribute` to `template`, replacing any earlier subscription
    pub fn subscribe(&mut self, attribute: ClimateAttribute, template: impl Into<String>) {
        self.feeds.insert(attribute, template.into());
    }

    pub fn template(&self, attribute: ClimateAttribute) -> Option<&str> {
        self.feeds.get(&attribute).map(String::as_str)
    }

    pub fn is_governed(&self, attribute: ClimateAttribute) -> bool {
        self.feeds.contains_key(&attribute)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClimateAttribute, &str)> {
        self.feeds.iter().map(|(a, t)| (*a, t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// Evaluate every feed once, in subscription order
    ///
    /// A template that fails to render yields the `unavailable` sentinel.
    pub fn render_all(&self, renderer: &dyn TemplateRenderer) -> Vec<(ClimateAttribute, FeedValue)> {
        self.iter()
            .map(|(attribute, template)| {
                let value = match renderer.render(template) {
                    Ok(rendered) => FeedValue::from_rendered(&rendered),
                    Err(e) => {
                        warn!(attribute = %attribute, "Template error: {}", e);
                        FeedValue::Unavailable
                    }
                };
                (attribute, value)
            })
            .collect()
    }
}

/// Template renderer backed by minijinja and an in-memory state store
///
/// Provides `states('entity_id')`, `is_state('entity_id', 'value')` and
/// `state_attr('entity_id', 'attribute')`, plus minijinja's builtin filters.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new(store: Arc<MemoryStateStore>) -> Self {
        let mut env = Environment::new();

        let states = store.clone();
        env.add_function("states", move |entity_id: &str| -> String {
            states
                .get_state(entity_id)
                .unwrap_or_else(|| ha_climate::STATE_UNKNOWN.to_string())
        });

        let states = store.clone();
        env.add_function("is_state", move |entity_id: &str, value: &str| -> bool {
            states.get_state(entity_id).as_deref() == Some(value)
        });

        let states = store;
        env.add_function("state_attr", move |entity_id: &str, attribute: &str| -> Value {
            states
                .get(entity_id)
                .and_then(|s| s.attributes.get(attribute).cloned())
                .map(|v| Value::from_serialize(&v))
                .unwrap_or(Value::from(()))
        });

        Self { env }
    }
}

impl std::fmt::Debug for MiniJinjaRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniJinjaRenderer").finish_non_exhaustive()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template: &str) -> TemplateResult<String> {
        debug!("Rendering template: {}", template);
        let tmpl = self.env.template_from_str(template)?;
        Ok(tmpl.render(())?)
    }
}
