//! Shared fixtures for integration tests.

#![allow(dead_code)]

use tiered_config::config::{ConfigManager, ConfigSource, EnvSnapshot};

pub const PREFIX: &str = "TEST";

/// Route `tracing` output through the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Default environment plus a `non-default` environment.
pub fn application_yaml() -> &'static str {
    r#"
my:
  nested:
    config:
      a_hex_int: 0x01
      an_octal_int: 02
      an_int: 3
      a_boolean: true
      a_string: hello
      a_real: 2.5
      a_date: 1988-12-04
      a_date_time: 1988-12-04T10:15:30Z
      a_char: x
      delayMs: 100
      delay_ms: 200
      private: open
      _private: secret
      a_list:
        - first
        - 2
        - third: 3
      servers:
        - host: alpha
          ports: [80, 443]
        - host: beta
          ports: [8080]
---
environment: non-default
my:
  nested:
    config:
      an_int: 4
      other_int: 5
      a_string: ~
"#
}

/// Manager for `PREFIX` with the given override variables.
pub fn manager_with_env(vars: &[(&str, &str)]) -> ConfigManager {
    init_tracing();
    ConfigManager::new(PREFIX)
        .expect("valid prefix")
        .with_env_snapshot(vars.iter().copied().collect::<EnvSnapshot>())
}

/// Manager loaded from [`application_yaml`] with the given override variables.
pub fn loaded(vars: &[(&str, &str)]) -> ConfigManager {
    let mut manager = manager_with_env(vars);
    manager
        .load_configs(ConfigSource::yaml(application_yaml()))
        .expect("Failed to load application.yml fixture");
    manager
}

/// Same as [`loaded`], with a fixed active environment.
pub fn loaded_in(environment: &str, vars: &[(&str, &str)]) -> ConfigManager {
    init_tracing();
    let mut manager = ConfigManager::with_environment(PREFIX, environment)
        .expect("valid prefix and environment")
        .with_env_snapshot(vars.iter().copied().collect::<EnvSnapshot>());
    manager
        .load_configs(ConfigSource::yaml(application_yaml()))
        .expect("Failed to load application.yml fixture");
    manager
}
