//! Lookup resolution across overrides and environment trees.
//!
//! Precedence, highest first:
//! 1. Override variable for the path (returned as a raw string)
//! 2. The active environment's tree
//! 3. The default environment's tree
//!
//! The first layer that has a value wins; otherwise the path is absent.

use super::environments::EnvironmentStore;
use super::overrides::OverrideStore;
use super::path::LookupPath;
use super::value::Value;
use crate::error::ConfigResult;
use std::fmt;
use tracing::trace;

/// Layer a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// An override variable, by full name
    Override { variable: String },
    /// The active environment's tree
    Environment { name: String },
    /// The default environment's tree, as a fallback
    DefaultEnvironment,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Override { variable } => write!(f, "override {}", variable),
            ValueSource::Environment { name } => write!(f, "environment {}", name),
            ValueSource::DefaultEnvironment => write!(f, "default environment"),
        }
    }
}

/// A value together with the layer that supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: Value,
    pub source: ValueSource,
}

/// Read-only view over the stores of one loaded configuration.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    prefix: &'a str,
    environments: &'a EnvironmentStore,
    overrides: &'a OverrideStore,
}

impl<'a> Resolver<'a> {
    pub fn new(
        prefix: &'a str,
        environments: &'a EnvironmentStore,
        overrides: &'a OverrideStore,
    ) -> Self {
        Self {
            prefix,
            environments,
            overrides,
        }
    }

    /// Resolve `path` for `active`, falling back to `default_name`.
    ///
    /// Missing keys are `Ok(None)`; a path that indexes past the end of a
    /// list or descends into the wrong kind of node is an error and stops
    /// resolution (no fallback).
    pub fn resolve(
        &self,
        path: &str,
        active: Option<&str>,
        default_name: &str,
    ) -> ConfigResult<Option<Resolved>> {
        let path = LookupPath::parse(path)?;

        let variable = path.override_name(self.prefix);
        if let Some(raw) = self.overrides.lookup(&variable) {
            trace!(path = %path, variable = %variable, "Resolved from override");
            return Ok(Some(Resolved {
                value: Value::String(raw.to_string()),
                source: ValueSource::Override { variable },
            }));
        }

        if let Some(name) = active
            && let Some(tree) = self.environments.get(name)
            && let Some(value) = path.navigate(tree)?
        {
            trace!(path = %path, environment = %name, "Resolved from active environment");
            return Ok(Some(Resolved {
                value: value.clone(),
                source: ValueSource::Environment {
                    name: name.to_string(),
                },
            }));
        }

        if active != Some(default_name)
            && let Some(tree) = self.environments.get(default_name)
            && let Some(value) = path.navigate(tree)?
        {
            trace!(path = %path, "Resolved from default environment");
            return Ok(Some(Resolved {
                value: value.clone(),
                source: ValueSource::DefaultEnvironment,
            }));
        }

        trace!(path = %path, "No value found");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::overrides::EnvSnapshot;
    use crate::error::ErrorCode;

    fn environments() -> EnvironmentStore {
        let docs = [
            r#"
my:
  nested:
    config:
      an_int: 3
      a_real: 2.5
      a_list: [a, b]
"#,
            r#"
environment: non-default
my:
  nested:
    config:
      an_int: 4
      other_int: 5
"#,
        ];
        EnvironmentStore::from_documents(
            docs.iter()
                .map(|d| Value::from_yaml(serde_yaml::from_str(d).unwrap()).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_active_environment_wins_over_default() {
        let envs = environments();
        let overrides = OverrideStore::new();
        let resolver = Resolver::new("TEST", &envs, &overrides);

        let resolved = resolver
            .resolve("my.nested.config.an_int", Some("non-default"), "default")
            .unwrap()
            .unwrap();
        assert_eq!(resolved.value, Value::Integer(4));
        assert_eq!(
            resolved.source,
            ValueSource::Environment {
                name: "non-default".into()
            }
        );
    }

    #[test]
    fn test_falls_back_to_default_environment() {
        let envs = environments();
        let overrides = OverrideStore::new();
        let resolver = Resolver::new("TEST", &envs, &overrides);

        let resolved = resolver
            .resolve("my.nested.config.a_real", Some("non-default"), "default")
            .unwrap()
            .unwrap();
        assert_eq!(resolved.value, Value::Float(2.5));
        assert_eq!(resolved.source, ValueSource::DefaultEnvironment);
    }

    #[test]
    fn test_override_wins_regardless_of_environment() {
        let envs = environments();
        let env: EnvSnapshot = [("TEST__MY__NESTED__CONFIG__AN_INT", "99")]
            .into_iter()
            .collect();
        let overrides = OverrideStore::from_snapshot(&env, "TEST");
        let resolver = Resolver::new("TEST", &envs, &overrides);

        for active in [Some("default"), Some("non-default"), None] {
            let resolved = resolver
                .resolve("my.nested.config.an_int", active, "default")
                .unwrap()
                .unwrap();
            assert_eq!(resolved.value, Value::from("99"));
            assert_eq!(
                resolved.source,
                ValueSource::Override {
                    variable: "TEST__MY__NESTED__CONFIG__AN_INT".into()
                }
            );
        }
    }

    #[test]
    fn test_override_for_indexed_path() {
        let envs = environments();
        let env: EnvSnapshot = [("TEST__MY__NESTED__CONFIG__A_LIST--1", "z")]
            .into_iter()
            .collect();
        let overrides = OverrideStore::from_snapshot(&env, "TEST");
        let resolver = Resolver::new("TEST", &envs, &overrides);

        let resolved = resolver
            .resolve("my.nested.config.a_list[1]", Some("default"), "default")
            .unwrap()
            .unwrap();
        assert_eq!(resolved.value, Value::from("z"));
    }

    #[test]
    fn test_absent_everywhere() {
        let envs = environments();
        let overrides = OverrideStore::new();
        let resolver = Resolver::new("TEST", &envs, &overrides);
        assert!(
            resolver
                .resolve("does.not.exist", Some("non-default"), "default")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_unknown_active_environment_uses_default() {
        let envs = environments();
        let overrides = OverrideStore::new();
        let resolver = Resolver::new("TEST", &envs, &overrides);
        let resolved = resolver
            .resolve("my.nested.config.an_int", Some("missing"), "default")
            .unwrap()
            .unwrap();
        assert_eq!(resolved.value, Value::Integer(3));
    }

    #[test]
    fn test_path_error_in_active_environment_is_not_masked() {
        let envs = environments();
        let overrides = OverrideStore::new();
        let resolver = Resolver::new("TEST", &envs, &overrides);
        let err = resolver
            .resolve("my.nested.config.an_int[0]", Some("non-default"), "default")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PathError);
    }

    #[test]
    fn test_value_source_display() {
        assert_eq!(
            ValueSource::Override {
                variable: "APP__X".into()
            }
            .to_string(),
            "override APP__X"
        );
        assert_eq!(
            ValueSource::Environment {
                name: "prod".into()
            }
            .to_string(),
            "environment prod"
        );
        assert_eq!(
            ValueSource::DefaultEnvironment.to_string(),
            "default environment"
        );
    }
}
