//! Configuration manager.
//!
//! Owns the environment trees, the override variables and the active
//! environment for one override prefix. State is only replaced by
//! [`ConfigManager::load_configs`]; lookups never mutate it.
//!
//! Loading is not synchronized: at most one `load_configs` may run per
//! manager, and reads must not overlap it. Once loaded, `&self` lookups are
//! safe to share across threads.

use super::coerce::FromValue;
use super::environments::EnvironmentStore;
use super::overrides::{EnvSnapshot, OverrideStore};
use super::path::LookupPath;
use super::resolver::{Resolved, Resolver};
use super::source::ConfigSource;
use super::value::Value;
use crate::error::{ConfigError, ConfigResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// Environment used when none is selected, and the fallback for lookups.
pub const DEFAULT_ENVIRONMENT_NAME: &str = "default";

/// Reserved top-level document key naming its environment. Also the lookup
/// path whose override variable selects the active environment.
pub const ENVIRONMENT_KEY: &str = "environment";

/// Joins the prefix and the levels of an override variable name.
pub const HIERARCHY_SEPARATOR: &str = "__";

/// Replaces list-index brackets in an override variable name.
pub const INDEX_SEPARATOR: &str = "--";

/// File names tried, in order, when discovering the default source.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["application.yml", "application.yaml"];

/// Appended to the prefix to name the explicit config path variable.
pub const CONFIG_PATH_SUFFIX: &str = "_CONFIG_PATH";

/// Multi-environment configuration with environment-variable overrides.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    prefix: String,
    /// Fixed at construction, or computed by the first successful load
    environment: Option<String>,
    env_snapshot: Option<EnvSnapshot>,
    environments: EnvironmentStore,
    overrides: OverrideStore,
    loaded: bool,
}

impl ConfigManager {
    /// Create a manager whose active environment is chosen at load time.
    pub fn new(prefix: &str) -> ConfigResult<Self> {
        validate_prefix(prefix)?;
        debug!(prefix = %prefix, "Created config manager");
        Ok(Self {
            prefix: prefix.to_string(),
            environment: None,
            env_snapshot: None,
            environments: EnvironmentStore::new(),
            overrides: OverrideStore::new(),
            loaded: false,
        })
    }

    /// Create a manager with a fixed active environment.
    pub fn with_environment(prefix: &str, environment: &str) -> ConfigResult<Self> {
        validate_environment(environment)?;
        let mut manager = Self::new(prefix)?;
        manager.environment = Some(environment.to_string());
        Ok(manager)
    }

    /// Read override variables from `snapshot` instead of the process
    /// environment on every load.
    pub fn with_env_snapshot(mut self, snapshot: EnvSnapshot) -> Self {
        self.env_snapshot = Some(snapshot);
        self
    }

    /// Replace all loaded state with the documents of `source`.
    ///
    /// Either every step succeeds and the new state is committed, or the
    /// manager is left empty and the error is returned.
    pub fn load_configs(&mut self, source: impl Into<ConfigSource>) -> ConfigResult<()> {
        self.environments = EnvironmentStore::new();
        self.overrides = OverrideStore::new();
        self.loaded = false;

        let documents = source.into().into_documents()?;
        let document_count = documents.len();
        let environments = EnvironmentStore::from_documents(documents)?;

        let snapshot = match &self.env_snapshot {
            Some(snapshot) => snapshot.clone(),
            None => EnvSnapshot::from_process(),
        };
        let overrides = OverrideStore::from_snapshot(&snapshot, &self.prefix);

        let active = match &self.environment {
            Some(name) => name.clone(),
            None => self.select_environment(&overrides)?,
        };
        if !environments.contains(&active) {
            let available: Vec<&str> = environments.names().collect();
            warn!(
                environment = %active,
                ?available,
                "Active environment is not defined by any document"
            );
            return Err(ConfigError::unknown_environment(&active));
        }

        info!(
            prefix = %self.prefix,
            environment = %active,
            documents = document_count,
            environments = environments.len(),
            overrides = overrides.len(),
            "Loaded configuration"
        );
        self.environment = Some(active);
        self.environments = environments;
        self.overrides = overrides;
        self.loaded = true;
        Ok(())
    }

    /// Discover the default source (see [`ConfigSource::discover`]) and load it.
    pub fn load_default_configs(&mut self) -> ConfigResult<()> {
        let snapshot = match &self.env_snapshot {
            Some(snapshot) => snapshot.clone(),
            None => EnvSnapshot::from_process(),
        };
        let source = ConfigSource::discover(&self.prefix, &snapshot)?;
        self.load_configs(source)
    }

    /// Active environment from the `<PREFIX>__ENVIRONMENT` override, or the
    /// default environment when it is unset or blank.
    fn select_environment(&self, overrides: &OverrideStore) -> ConfigResult<String> {
        let variable = LookupPath::parse(ENVIRONMENT_KEY)?.override_name(&self.prefix);
        match overrides.lookup(&variable) {
            Some(name) if !name.trim().is_empty() => {
                debug!(variable = %variable, environment = %name, "Environment selected by override");
                Ok(name.to_string())
            }
            _ => Ok(DEFAULT_ENVIRONMENT_NAME.to_string()),
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.prefix, &self.environments, &self.overrides)
    }

    /// Look up `path`, reporting which layer supplied the value.
    pub fn resolve(&self, path: &str) -> ConfigResult<Option<Resolved>> {
        self.resolver()
            .resolve(path, self.environment.as_deref(), DEFAULT_ENVIRONMENT_NAME)
    }

    /// Look up `path`. Absence is `Ok(None)`; override values are strings.
    pub fn get(&self, path: &str) -> ConfigResult<Option<Value>> {
        Ok(self.resolve(path)?.map(|resolved| resolved.value))
    }

    /// Look up and coerce `path`, tolerating absence.
    pub fn get_optional<T: FromValue>(&self, path: &str) -> ConfigResult<Option<T>> {
        match self.get(path)? {
            Some(value) => coerce(path, &value).map(Some),
            None => Ok(None),
        }
    }

    /// Look up and coerce `path`, returning `default` when it is absent.
    pub fn get_or<T: FromValue>(&self, path: &str, default: T) -> ConfigResult<T> {
        Ok(self.get_optional(path)?.unwrap_or(default))
    }

    /// Look up and coerce `path`; absence is a `NotFound` error.
    pub fn get_required<T: FromValue>(&self, path: &str) -> ConfigResult<T> {
        self.get_optional(path)?
            .ok_or_else(|| ConfigError::not_found(path))
    }

    /// Deserialize the subtree (or override string) at `path`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> ConfigResult<T> {
        let value = self.get(path)?.ok_or_else(|| ConfigError::not_found(path))?;
        serde_json::from_value(value.to_json()).map_err(|e| {
            ConfigError::type_coercion(path, std::any::type_name::<T>(), &value)
                .with_details(format!("found: {}; {}", value, e))
        })
    }

    pub fn get_int(&self, path: &str) -> ConfigResult<i32> {
        self.get_required(path)
    }

    pub fn get_long(&self, path: &str) -> ConfigResult<i64> {
        self.get_required(path)
    }

    pub fn get_short(&self, path: &str) -> ConfigResult<i16> {
        self.get_required(path)
    }

    pub fn get_byte(&self, path: &str) -> ConfigResult<i8> {
        self.get_required(path)
    }

    pub fn get_char(&self, path: &str) -> ConfigResult<char> {
        self.get_required(path)
    }

    pub fn get_float(&self, path: &str) -> ConfigResult<f32> {
        self.get_required(path)
    }

    pub fn get_double(&self, path: &str) -> ConfigResult<f64> {
        self.get_required(path)
    }

    pub fn get_boolean(&self, path: &str) -> ConfigResult<bool> {
        self.get_required(path)
    }

    pub fn get_string(&self, path: &str) -> ConfigResult<String> {
        self.get_required(path)
    }

    /// ISO-8601 date or date-time; a bare date is midnight UTC.
    pub fn get_date(&self, path: &str) -> ConfigResult<DateTime<Utc>> {
        self.get_required(path)
    }

    pub fn get_list<T: FromValue>(&self, path: &str) -> ConfigResult<Vec<T>> {
        self.get_required(path)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The active environment, once fixed or loaded.
    pub fn active_environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn environment_names(&self) -> impl Iterator<Item = &str> {
        self.environments.names()
    }

    /// Override variable name that would replace `path`.
    pub fn override_name(&self, path: &str) -> ConfigResult<String> {
        Ok(LookupPath::parse(path)?.override_name(&self.prefix))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

fn coerce<T: FromValue>(path: &str, value: &Value) -> ConfigResult<T> {
    T::from_value(value).ok_or_else(|| ConfigError::type_coercion(path, T::KIND, value))
}

/// A prefix must be non-empty and free of whitespace, `=` and NUL.
fn validate_prefix(prefix: &str) -> ConfigResult<()> {
    if prefix.trim().is_empty() {
        return Err(ConfigError::invalid_argument(
            "Override prefix must not be empty or blank",
        ));
    }
    if let Some(bad) = prefix
        .chars()
        .find(|c| c.is_whitespace() || *c == '=' || *c == '\0')
    {
        return Err(ConfigError::invalid_argument(format!(
            "Override prefix must not contain {:?}",
            bad
        ))
        .with_details(format!("prefix: {:?}", prefix)));
    }
    Ok(())
}

/// An explicit environment must not be empty or whitespace-only.
fn validate_environment(environment: &str) -> ConfigResult<()> {
    if environment.trim().is_empty() {
        return Err(ConfigError::invalid_argument(
            "Environment name must not be empty or blank",
        ));
    }
    Ok(())
}
