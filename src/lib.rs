//! Tiered Config Library
//!
//! Multi-environment configuration with environment-variable overrides and
//! fallback to a default environment.

pub mod config;
pub mod error;

pub use config::{ConfigManager, ConfigSource, EnvSnapshot, Value};
pub use error::{ConfigError, ConfigResult, ErrorCode};
