//! Lookup path codec.
//!
//! A lookup path is a dotted address into a configuration tree, where each
//! level may end in one or more `[n]` list indices:
//!
//! ```text
//! service.retries[0].delay-ms
//! matrix.rows[1][2]
//! ```
//!
//! The same path is encoded into the override variable name that can
//! replace it: `APP__SERVICE__RETRIES--0__DELAY_MS`.

use super::manager::{HIERARCHY_SEPARATOR, INDEX_SEPARATOR};
use super::value::Value;
use crate::error::{ConfigError, ConfigResult};
use regex_lite::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Trailing `[digits]` groups of a level.
static INDEXED_LEVEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)((?:\[\d+\])+)$").expect("level pattern is valid"));

static INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("index pattern is valid"));

/// A single navigation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Descend into a mapping by key.
    Key(String),
    /// Descend into a sequence by 0-based position.
    Index(usize),
}

/// One dotted level: a key name followed by zero or more indices.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Level {
    name: String,
    indices: Vec<usize>,
}

/// A parsed lookup path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupPath {
    raw: String,
    levels: Vec<Level>,
    steps: Vec<Step>,
}

impl LookupPath {
    /// Parse a dotted, optionally indexed path.
    ///
    /// Only trailing `[digits]` groups are indices; a level like `a[x]` is a
    /// literal key. An index too large for `usize` is a path error.
    pub fn parse(path: &str) -> ConfigResult<Self> {
        let mut levels = Vec::new();
        let mut steps = Vec::new();

        for raw_level in path.split('.') {
            let level = parse_level(path, raw_level)?;
            if !level.name.is_empty() || level.indices.is_empty() {
                steps.push(Step::Key(level.name.clone()));
            }
            steps.extend(level.indices.iter().copied().map(Step::Index));
            levels.push(level);
        }

        Ok(Self {
            raw: path.to_string(),
            levels,
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Encode as an override variable name under `prefix`.
    ///
    /// Each level name has `-` replaced by `_` and is ASCII-uppercased, one
    /// character at a time; indices are appended as `--n` and levels are
    /// joined with `__`. No word splitting happens, so `delayMs` becomes
    /// `DELAYMS`.
    pub fn override_name(&self, prefix: &str) -> String {
        let mut name = String::from(prefix);
        for level in &self.levels {
            name.push_str(HIERARCHY_SEPARATOR);
            name.extend(level.name.chars().map(override_char));
            for index in &level.indices {
                name.push_str(INDEX_SEPARATOR);
                name.push_str(&index.to_string());
            }
        }
        name
    }

    /// Walk `root` along this path.
    ///
    /// A missing mapping key (or an explicit null on the way) is `Ok(None)`.
    /// Descending into the wrong kind of node, or past the end of a
    /// sequence, is a [`PathError`](crate::error::ErrorCode::PathError).
    pub fn navigate<'a>(&self, root: &'a Value) -> ConfigResult<Option<&'a Value>> {
        let mut node = root;
        for step in &self.steps {
            node = match (step, node) {
                (Step::Key(key), Value::Mapping(map)) => match map.get(key) {
                    Some(child) => child,
                    None => return Ok(None),
                },
                (Step::Index(index), Value::Sequence(items)) => {
                    items.get(*index).ok_or_else(|| {
                        ConfigError::path_error(
                            &self.raw,
                            format!(
                                "Index {} is out of bounds for a list of {} items",
                                index,
                                items.len()
                            ),
                        )
                    })?
                }
                (Step::Key(key), other) => {
                    return Err(ConfigError::path_error(
                        &self.raw,
                        format!("Cannot look up key '{}' in a {}", key, other.kind()),
                    ));
                }
                (Step::Index(index), other) => {
                    return Err(ConfigError::path_error(
                        &self.raw,
                        format!("Cannot look up index {} in a {}", index, other.kind()),
                    ));
                }
            };
            if node.is_null() {
                return Ok(None);
            }
        }
        Ok(Some(node))
    }
}

impl fmt::Display for LookupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_level(path: &str, raw_level: &str) -> ConfigResult<Level> {
    let Some(caps) = INDEXED_LEVEL_RE.captures(raw_level) else {
        return Ok(Level {
            name: raw_level.to_string(),
            indices: Vec::new(),
        });
    };

    let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let groups = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    let indices = INDEX_RE
        .captures_iter(groups)
        .map(|c| {
            let digits = c.get(1).map(|m| m.as_str()).unwrap_or_default();
            digits.parse::<usize>().map_err(|_| {
                ConfigError::path_error(path, format!("List index {} is too large", digits))
            })
        })
        .collect::<ConfigResult<Vec<_>>>()?;

    Ok(Level {
        name: name.to_string(),
        indices,
    })
}

fn override_char(c: char) -> char {
    match c {
        '-' => '_',
        c => c.to_ascii_uppercase(),
    }
}

/// Encode `path` as the override variable name under `prefix`.
pub fn override_name(prefix: &str, path: &str) -> ConfigResult<String> {
    Ok(LookupPath::parse(path)?.override_name(prefix))
}
