//! Untyped configuration values.
//!
//! Documents are stored as a tree of [`Value`]s exactly as parsed. Nothing is
//! typed at storage time; the coercion layer interprets scalars on read.

use crate::error::{ConfigError, ConfigResult};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use regex_lite::Regex;
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Mapping node of a configuration tree.
pub type Mapping = BTreeMap<String, Value>;

/// YAML 1.1 timestamp grammar (date only, or date and time with optional offset).
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:(?:[Tt]|[ \t]+)(\d{1,2}):(\d{2}):(\d{2})(?:\.(\d*))?(?:[ \t]*(Z|[-+]\d{1,2}(?::?\d{2})?))?)?$",
    )
    .expect("timestamp pattern is valid")
});

/// A timestamp scalar, keeping the text it was written as.
#[derive(Debug, Clone, PartialEq)]
pub struct Timestamp {
    text: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    /// Parse ISO-8601 / YAML 1.1 timestamp text.
    ///
    /// A date without a time is midnight UTC; a time without an offset is UTC.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let caps = TIMESTAMP_RE.captures(trimmed)?;

        let year: i32 = caps.get(1)?.as_str().parse().ok()?;
        let month: u32 = caps.get(2)?.as_str().parse().ok()?;
        let day: u32 = caps.get(3)?.as_str().parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;

        let time = match caps.get(4) {
            Some(hour) => {
                let hour: u32 = hour.as_str().parse().ok()?;
                let minute: u32 = caps.get(5)?.as_str().parse().ok()?;
                let second: u32 = caps.get(6)?.as_str().parse().ok()?;
                let nanos = caps.get(7).map(|m| fraction_to_nanos(m.as_str())).unwrap_or(0);
                NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?
            }
            None => NaiveTime::from_hms_opt(0, 0, 0)?,
        };

        let offset = match caps.get(8) {
            Some(m) => parse_offset(m.as_str())?,
            None => FixedOffset::east_opt(0)?,
        };

        let instant = offset
            .from_local_datetime(&date.and_time(time))
            .single()?
            .with_timezone(&Utc);

        Some(Self {
            text: trimmed.to_string(),
            instant,
        })
    }

    /// Original text of the scalar.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The instant this timestamp denotes, in UTC.
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn fraction_to_nanos(digits: &str) -> u32 {
    let mut padded: String = digits.chars().take(9).collect();
    while padded.len() < 9 {
        padded.push('0');
    }
    padded.parse().unwrap_or(0)
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    if text == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = text.split_at(1);
    let sign = if sign == "-" { -1 } else { 1 };
    let rest = rest.replace(':', "");
    let (hours, minutes) = if rest.len() > 2 {
        rest.split_at(rest.len() - 2)
    } else {
        (rest.as_str(), "0")
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// A configuration value: a scalar, a sequence, or a mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(Timestamp),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// Convert a parsed YAML tree.
    ///
    /// Tags are dropped, scalar keys are stringified, and strings that read
    /// as timestamps become [`Value::Timestamp`]. The parsed tree does not
    /// record scalar style, so a quoted `"2020-01-01"` is a timestamp too and
    /// [`Value::as_str`] returns `None` for it; use [`Value::scalar_text`].
    pub fn from_yaml(value: serde_yaml::Value) -> ConfigResult<Self> {
        Ok(match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => number_from_parts(n.as_i64(), n.as_u64(), n.as_f64()),
            serde_yaml::Value::String(s) => match Timestamp::parse(&s) {
                Some(ts) => Value::Timestamp(ts),
                None => Value::String(s),
            },
            serde_yaml::Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(Value::from_yaml)
                    .collect::<ConfigResult<Vec<_>>>()?,
            ),
            serde_yaml::Value::Mapping(map) => {
                let mut mapping = Mapping::new();
                for (key, value) in map {
                    mapping.insert(yaml_key(key)?, Value::from_yaml(value)?);
                }
                Value::Mapping(mapping)
            }
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(tagged.value)?,
        })
    }

    /// Convert a parsed JSON tree. JSON strings are kept as strings.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => number_from_parts(n.as_i64(), n.as_u64(), n.as_f64()),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render as a JSON tree. Timestamps become their original text and
    /// non-finite floats their YAML spelling.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(float_text(*f))),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(ts) => serde_json::Value::String(ts.as_str().to_string()),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Textual form of a scalar. `None` for null, sequences and mappings.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(float_text(*f)),
            Value::String(s) => Some(s.clone()),
            Value::Timestamp(ts) => Some(ts.as_str().to_string()),
            Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }
}

fn number_from_parts(as_i64: Option<i64>, as_u64: Option<u64>, as_f64: Option<f64>) -> Value {
    if let Some(i) = as_i64 {
        Value::Integer(i)
    } else if let Some(u) = as_u64 {
        Value::Float(u as f64)
    } else {
        Value::Float(as_f64.unwrap_or(f64::NAN))
    }
}

fn yaml_key(key: serde_yaml::Value) -> ConfigResult<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(ConfigError::invalid_argument(
            "Mapping keys must be strings, numbers or booleans",
        )
        .with_details(format!("{:?}", other))),
    }
}

fn float_text(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f == f64::INFINITY {
        ".inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-.inf".to_string()
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scalar_text() {
            Some(text) => f.write_str(&text),
            None => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => serializer.serialize_str(ts.as_str()),
            Value::Sequence(items) => serializer.collect_seq(items),
            Value::Mapping(map) => serializer.collect_map(map),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn yaml(text: &str) -> Value {
        Value::from_yaml(serde_yaml::from_str(text).unwrap()).unwrap()
    }

    #[test]
    fn test_yaml_scalars() {
        let value = yaml(
            r#"
an_int: 3
a_real: 2.5
a_boolean: true
a_string: hello
nothing: ~
"#,
        );
        let map = value.as_mapping().unwrap();
        assert_eq!(map["an_int"], Value::Integer(3));
        assert_eq!(map["a_real"], Value::Float(2.5));
        assert_eq!(map["a_boolean"], Value::Bool(true));
        assert_eq!(map["a_string"], Value::String("hello".into()));
        assert!(map["nothing"].is_null());
    }

    #[test]
    fn test_yaml_timestamps_detected() {
        let value = yaml(
            r#"
a_date: 1988-12-04
a_date_time: 1988-12-04T10:30:00Z
"#,
        );
        let map = value.as_mapping().unwrap();
        match &map["a_date"] {
            Value::Timestamp(ts) => {
                assert_eq!(ts.as_str(), "1988-12-04");
                assert_eq!(ts.instant().day(), 4);
                assert_eq!(ts.instant().hour(), 0);
            }
            other => panic!("expected timestamp, got {:?}", other),
        }
        match &map["a_date_time"] {
            Value::Timestamp(ts) => assert_eq!(ts.instant().hour(), 10),
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_with_offset_normalizes_to_utc() {
        let ts = Timestamp::parse("2001-12-14 21:59:43.10 -5").unwrap();
        assert_eq!(ts.instant().hour(), 2);
        assert_eq!(ts.instant().day(), 15);
        assert_eq!(ts.instant().nanosecond(), 100_000_000);

        let ts = Timestamp::parse("2001-12-14t21:59:43+05:30").unwrap();
        assert_eq!(ts.instant().hour(), 16);
        assert_eq!(ts.instant().minute(), 29);
    }

    #[test]
    fn test_timestamp_rejects_invalid_dates() {
        assert!(Timestamp::parse("1988-13-04").is_none());
        assert!(Timestamp::parse("not a date").is_none());
        assert!(Timestamp::parse("1988-12").is_none());
    }

    #[test]
    fn test_scalar_keys_are_stringified() {
        let value = yaml("1: one\ntrue: yes-text\n");
        let map = value.as_mapping().unwrap();
        assert_eq!(map["1"], Value::from("one"));
        assert_eq!(map["true"], Value::from("yes-text"));
    }

    #[test]
    fn test_complex_keys_are_rejected() {
        let parsed: serde_yaml::Value = serde_yaml::from_str("? [a, b]\n: value\n").unwrap();
        let err = Value::from_yaml(parsed).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_tags_are_unwrapped() {
        let value = yaml("server: !custom {port: 8080}\n");
        let server = value.as_mapping().unwrap()["server"].as_mapping().unwrap();
        assert_eq!(server["port"], Value::Integer(8080));
    }

    #[test]
    fn test_json_strings_stay_strings() {
        let value = Value::from_json(serde_json::json!({"when": "1988-12-04", "n": 1}));
        let map = value.as_mapping().unwrap();
        assert_eq!(map["when"], Value::from("1988-12-04"));
        assert_eq!(map["n"], Value::Integer(1));
    }

    #[test]
    fn test_to_json_renders_timestamps_and_non_finite_floats() {
        let mut map = Mapping::new();
        map.insert("when".into(), Value::Timestamp(Timestamp::parse("1988-12-04").unwrap()));
        map.insert("inf".into(), Value::Float(f64::INFINITY));
        let json = Value::Mapping(map).to_json();
        assert_eq!(json, serde_json::json!({"when": "1988-12-04", "inf": ".inf"}));
    }

    #[test]
    fn test_display_scalars_and_containers() {
        assert_eq!(Value::Integer(3).to_string(), "3");
        assert_eq!(Value::from("hello").to_string(), "hello");
        let seq = Value::Sequence(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(seq.to_string(), "[1,2]");
    }

    #[test]
    fn test_quoted_date_text_is_kept_as_scalar_text() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("version: \"2020-01-01\"").unwrap();
        let value = Value::from_yaml(yaml).unwrap();
        let version = &value.as_mapping().unwrap()["version"];
        assert_eq!(version.kind(), "timestamp");
        assert_eq!(version.as_str(), None);
        assert_eq!(version.scalar_text().as_deref(), Some("2020-01-01"));
    }
}
