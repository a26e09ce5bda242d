//! Registry of action schemas

use super::action::{Action, ActionSchema};
use crate::error::{Result, VerityError};
use indexmap::IndexMap;
use serde_json::Value;

/// Action schemas by name, in registration order
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    schemas: IndexMap<String, ActionSchema>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        ActionRegistry::default()
    }

    /// Register a schema; a second schema with the same name is rejected
    pub fn register(&mut self, schema: ActionSchema) -> Result<()> {
        if self.schemas.contains_key(&schema.name) {
            return Err(VerityError::DuplicateAction(schema.name));
        }
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ActionSchema> {
        self.schemas.get(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &ActionSchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Bind arguments to a registered schema, checking that every required
    /// parameter has a value
    pub fn create_action<I, K, V>(&self, schema_name: &str, arguments: I) -> Result<Action>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let schema = self
            .get(schema_name)
            .ok_or_else(|| VerityError::UnknownAction(schema_name.to_string()))?;
        let action = Action::new(schema_name, arguments);
        if let Some(parameter) = schema.missing_arguments(&action.arguments).next() {
            return Err(VerityError::MissingArgument {
                action: schema_name.to_string(),
                parameter: parameter.to_string(),
            });
        }
        Ok(action)
    }
}
