//! Multi-environment configuration resolution.
//!
//! Configuration documents each populate one named environment. Lookups use
//! dotted paths with optional list indices and resolve through three layers:
//! 1. **Overrides** - `<PREFIX>__LEVEL__LEVEL--N` environment variables
//! 2. **Active environment** - chosen explicitly, by `<PREFIX>__ENVIRONMENT`,
//!    or `default`
//! 3. **Default environment** - the `default` document, as a fallback
//!
//! ## Example
//! ```
//! use tiered_config::config::{ConfigManager, ConfigSource, EnvSnapshot};
//!
//! let env: EnvSnapshot = [("APP__SERVER__PORT", "9000")].into_iter().collect();
//! let mut manager = ConfigManager::with_environment("APP", "prod")
//!     .unwrap()
//!     .with_env_snapshot(env);
//! manager
//!     .load_configs(ConfigSource::yaml(
//!         "server: {host: localhost, port: 8080}\n---\nenvironment: prod\nserver: {host: example.com}\n",
//!     ))
//!     .unwrap();
//!
//! assert_eq!(manager.get_string("server.host").unwrap(), "example.com");
//! assert_eq!(manager.get_int("server.port").unwrap(), 9000);
//! ```

mod coerce;
mod environments;
mod manager;
mod overrides;
mod path;
mod resolver;
mod source;
mod value;

pub use coerce::{FromValue, parse_bool, parse_float, parse_integer};
pub use environments::EnvironmentStore;
pub use manager::{
    CONFIG_PATH_SUFFIX, ConfigManager, DEFAULT_CONFIG_FILES, DEFAULT_ENVIRONMENT_NAME,
    ENVIRONMENT_KEY, HIERARCHY_SEPARATOR, INDEX_SEPARATOR,
};
pub use overrides::{EnvSnapshot, OverrideStore};
pub use path::{LookupPath, Step, override_name};
pub use resolver::{Resolved, Resolver, ValueSource};
pub use source::{ConfigSource, DocumentFormat, parse_documents};
pub use value::{Mapping, Timestamp, Value};
