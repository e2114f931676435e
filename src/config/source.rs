//! Document sources.
//!
//! A source yields zero or more parsed top-level documents. YAML text may
//! contain several `---` separated documents; JSON text holds one. Empty
//! documents are skipped.

use super::manager::{CONFIG_PATH_SUFFIX, DEFAULT_CONFIG_FILES};
use super::overrides::EnvSnapshot;
use super::value::Value;
use crate::error::{ConfigError, ConfigResult, ErrorCode};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Text format of a document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }

    /// Format implied by a file extension. Anything but `.json` is YAML.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_str)
            .unwrap_or(DocumentFormat::Yaml)
    }
}

/// Where configuration documents come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// In-memory text
    Text {
        content: String,
        format: DocumentFormat,
    },
    /// A file on disk; format from its extension
    File(PathBuf),
    /// Already parsed document trees
    Documents(Vec<Value>),
}

impl ConfigSource {
    pub fn text(content: impl Into<String>, format: DocumentFormat) -> Self {
        ConfigSource::Text {
            content: content.into(),
            format,
        }
    }

    pub fn yaml(content: impl Into<String>) -> Self {
        Self::text(content, DocumentFormat::Yaml)
    }

    pub fn json(content: impl Into<String>) -> Self {
        Self::text(content, DocumentFormat::Json)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        ConfigSource::File(path.into())
    }

    pub fn documents(documents: Vec<Value>) -> Self {
        ConfigSource::Documents(documents)
    }

    /// Read a whole stream into a text source.
    pub fn from_reader(mut reader: impl Read, format: DocumentFormat) -> ConfigResult<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| ConfigError::source_read(Path::new("<reader>"), e))?;
        Ok(Self::text(content, format))
    }

    /// Locate the default configuration file in the current directory.
    ///
    /// See [`ConfigSource::discover_in`].
    pub fn discover(prefix: &str, env: &EnvSnapshot) -> ConfigResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| ConfigError::source_read(Path::new("."), e))?;
        Self::discover_in(&cwd, prefix, env)
    }

    /// Locate the default configuration file under `dir`.
    ///
    /// `<PREFIX>_CONFIG_PATH` wins when set (relative paths are taken from
    /// `dir`); otherwise the first existing file of `application.yml`,
    /// `application.yaml`.
    pub fn discover_in(dir: &Path, prefix: &str, env: &EnvSnapshot) -> ConfigResult<Self> {
        let variable = format!("{}{}", prefix, CONFIG_PATH_SUFFIX);
        if let Some(explicit) = env.get(&variable)
            && !explicit.trim().is_empty()
        {
            let path = dir.join(explicit.trim());
            debug!(variable = %variable, path = %path.display(), "Using explicit config path");
            return Ok(ConfigSource::File(path));
        }

        for name in DEFAULT_CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                debug!(path = %path.display(), "Discovered config file");
                return Ok(ConfigSource::File(path));
            }
        }

        Err(ConfigError::new(
            ErrorCode::SourceRead,
            format!(
                "No configuration file found in {} (looked for {})",
                dir.display(),
                DEFAULT_CONFIG_FILES.join(", ")
            ),
        )
        .with_path(dir.display().to_string()))
    }

    /// Read and parse every document of this source.
    pub fn into_documents(self) -> ConfigResult<Vec<Value>> {
        match self {
            ConfigSource::Text { content, format } => parse_documents(&content, format),
            ConfigSource::File(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| ConfigError::source_read(&path, e))?;
                parse_documents(&content, DocumentFormat::from_path(&path))
                    .map_err(|e| e.with_path(path.display().to_string()))
            }
            ConfigSource::Documents(documents) => Ok(documents),
        }
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        ConfigSource::File(path)
    }
}

impl From<&Path> for ConfigSource {
    fn from(path: &Path) -> Self {
        ConfigSource::File(path.to_path_buf())
    }
}

impl From<Vec<Value>> for ConfigSource {
    fn from(documents: Vec<Value>) -> Self {
        ConfigSource::Documents(documents)
    }
}

/// Parse text into its non-empty top-level documents.
pub fn parse_documents(content: &str, format: DocumentFormat) -> ConfigResult<Vec<Value>> {
    let mut documents = Vec::new();
    match format {
        DocumentFormat::Yaml => {
            for document in serde_yaml::Deserializer::from_str(content) {
                let value = serde_yaml::Value::deserialize(document)?;
                if value.is_null() {
                    continue;
                }
                documents.push(Value::from_yaml(value)?);
            }
        }
        DocumentFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(content)?;
            if !value.is_null() {
                documents.push(Value::from_json(value));
            }
        }
    }
    debug!(documents = documents.len(), ?format, "Parsed configuration documents");
    Ok(documents)
}
