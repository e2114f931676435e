//! Environment-variable overrides.
//!
//! The process environment is captured into an [`EnvSnapshot`] so that the
//! resolver never reads ambient state directly. An [`OverrideStore`] keeps
//! the subset of a snapshot whose names start with `<prefix>__`.

use super::manager::HIERARCHY_SEPARATOR;
use std::collections::BTreeMap;
use tracing::debug;

/// An owned copy of a set of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn from_process() -> Self {
        let mut vars = BTreeMap::new();
        for (name, value) in std::env::vars_os() {
            match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => {
                    vars.insert(name, value);
                }
                (Ok(name), Err(_)) => {
                    debug!(variable = %name, "Skipping environment variable with non-Unicode value");
                }
                (Err(name), _) => {
                    debug!(variable = ?name, "Skipping environment variable with non-Unicode name");
                }
            }
        }
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Override variables for one prefix, keyed by full variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideStore {
    entries: BTreeMap<String, String>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from the variables of `env` that start with `<prefix>__`.
    pub fn from_snapshot(env: &EnvSnapshot, prefix: &str) -> Self {
        let mut store = Self::new();
        store.rebuild(env, prefix);
        store
    }

    /// Replace every entry with the matching subset of `env`.
    ///
    /// Previous entries never survive a rebuild.
    pub fn rebuild(&mut self, env: &EnvSnapshot, prefix: &str) {
        let scope = format!("{}{}", prefix, HIERARCHY_SEPARATOR);
        self.entries = env
            .iter()
            .filter(|(name, _)| name.starts_with(&scope))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        debug!(prefix = %prefix, overrides = self.entries.len(), "Rebuilt override store");
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of all override variables in the store.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
