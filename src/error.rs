//! Structured error types for configuration loading and lookup.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Construction and document shape
    InvalidArgument,
    DuplicateEnvironment,
    UnknownEnvironment,

    // Lookup errors
    PathError,
    TypeCoercion,
    NotFound,

    // Document source collaborator
    SourceRead,
    SourceParse,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::InvalidArgument => "invalid argument",
            ErrorCode::DuplicateEnvironment => "duplicate environment",
            ErrorCode::UnknownEnvironment => "unknown environment",
            ErrorCode::PathError => "path error",
            ErrorCode::TypeCoercion => "type coercion",
            ErrorCode::NotFound => "not found",
            ErrorCode::SourceRead => "source read",
            ErrorCode::SourceParse => "source parse",
        };
        write!(f, "{}", name)
    }
}

/// Structured configuration error.
///
/// Every failure the resolver can report carries one [`ErrorCode`]; `path`
/// holds the lookup path (or file path) involved when there is one.
#[derive(Debug, Clone, Serialize, Error)]
#[error("{message}")]
pub struct ConfigError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ConfigError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            details: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, reason)
    }

    pub fn duplicate_environment(name: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateEnvironment,
            format!("Duplicated environment: {}", name),
        )
    }

    pub fn unknown_environment(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownEnvironment,
            format!("Provided environment {} does not exist", name),
        )
    }

    pub fn path_error(path: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::PathError, reason).with_path(path)
    }

    pub fn type_coercion(path: &str, kind: &str, found: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::TypeCoercion,
            format!("Value at {} cannot be read as {}", path, kind),
        )
        .with_path(path)
        .with_details(format!("found: {}", found))
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("No configuration value found at {}", path),
        )
        .with_path(path)
    }

    pub fn source_read(path: &Path, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::SourceRead,
            format!("Failed to read configuration from {}", path.display()),
        )
        .with_path(path.display().to_string())
        .with_details(err.to_string())
    }

    pub fn source_parse(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::SourceParse, "Failed to parse configuration document")
            .with_details(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::source_parse(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::source_parse(err)
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
