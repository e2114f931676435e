//! Named environment trees.

use super::manager::{DEFAULT_ENVIRONMENT_NAME, ENVIRONMENT_KEY};
use super::value::{Mapping, Value};
use crate::error::{ConfigError, ConfigResult};
use std::collections::BTreeMap;
use tracing::debug;

/// One configuration tree per environment name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentStore {
    environments: BTreeMap<String, Value>,
}

impl EnvironmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a sequence of documents, in order.
    pub fn from_documents(documents: impl IntoIterator<Item = Value>) -> ConfigResult<Self> {
        let mut store = Self::new();
        for document in documents {
            store.add(document)?;
        }
        Ok(store)
    }

    /// Add one top-level document.
    ///
    /// The document must be a mapping. Its `environment` key names the
    /// environment it populates (default: `default`) and is removed from the
    /// stored tree. A second document for the same name is rejected.
    pub fn add(&mut self, document: Value) -> ConfigResult<()> {
        let mut mapping = match document {
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(ConfigError::invalid_argument(
                    "Unsupported configuration type. All configuration documents should be mappings",
                )
                .with_details(format!("found a {}", other.kind())));
            }
        };

        let name = environment_name(&mut mapping)?;
        if self.environments.contains_key(&name) {
            return Err(ConfigError::duplicate_environment(&name));
        }

        debug!(environment = %name, keys = mapping.len(), "Added environment");
        self.environments.insert(name, Value::Mapping(mapping));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.environments.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.environments.contains_key(name)
    }

    /// Environment names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}

/// Take the reserved `environment` key out of a document.
fn environment_name(mapping: &mut Mapping) -> ConfigResult<String> {
    match mapping.remove(ENVIRONMENT_KEY) {
        None | Some(Value::Null) => Ok(DEFAULT_ENVIRONMENT_NAME.to_string()),
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(name),
        Some(Value::Timestamp(ts)) => Ok(ts.as_str().to_string()),
        Some(Value::String(_)) => Err(ConfigError::invalid_argument(
            "Environment name must not be empty or blank",
        )),
        Some(other) => Err(ConfigError::invalid_argument(format!(
            "The '{}' key must be a string, found a {}",
            ENVIRONMENT_KEY,
            other.kind()
        ))),
    }
}
