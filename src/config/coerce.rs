//! Read-time coercion of untyped values.
//!
//! Scalars are interpreted from their native variant when it matches, or
//! else from their text. Override variables always arrive as text, so every
//! kind here must be readable from a string.

use super::value::{Timestamp, Value};
use chrono::{DateTime, Utc};

/// Types that can be read out of a configuration [`Value`].
pub trait FromValue: Sized {
    /// Name used in coercion error messages.
    const KIND: &'static str;

    /// Interpret `value`, or `None` if it cannot be read as this kind.
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    const KIND: &'static str = "value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for String {
    const KIND: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.scalar_text()
    }
}

impl FromValue for bool {
    const KIND: &'static str = "boolean";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => parse_bool(s),
            _ => None,
        }
    }
}

impl FromValue for char {
    const KIND: &'static str = "char";

    fn from_value(value: &Value) -> Option<Self> {
        let text = value.scalar_text()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

macro_rules! integer_from_value {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const KIND: &'static str = $kind;

                fn from_value(value: &Value) -> Option<Self> {
                    let wide = match value {
                        Value::Integer(i) => *i,
                        other => parse_integer(&other.scalar_text()?)?,
                    };
                    <$ty>::try_from(wide).ok()
                }
            }
        )*
    };
}

integer_from_value!(i8 => "byte", i16 => "short", i32 => "int", i64 => "long");

impl FromValue for f64 {
    const KIND: &'static str = "double";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::String(s) => parse_float(s),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    const KIND: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        let wide = f64::from_value(value)?;
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return None;
        }
        Some(narrow)
    }
}

impl FromValue for DateTime<Utc> {
    const KIND: &'static str = "date";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(ts) => Some(ts.instant()),
            Value::String(s) => Timestamp::parse(s).map(|ts| ts.instant()),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const KIND: &'static str = "list";

    fn from_value(value: &Value) -> Option<Self> {
        value
            .as_sequence()?
            .iter()
            .map(T::from_value)
            .collect()
    }
}

/// Parse boolean text: `true/false`, `yes/no`, `on/off`, any case.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse integer text.
///
/// Accepts an optional sign, `0x`/`0o`/`0b` prefixes, legacy leading-zero
/// octal (`012`), and `_` digit separators.
pub fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let body = body.replace('_', "");
    if body.is_empty() {
        return None;
    }

    let lower = body.to_ascii_lowercase();
    let (radix, digits) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (8, oct)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (2, bin)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = u64::from_str_radix(digits, radix).ok()?;
    if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// Parse float text, including the YAML spellings `.inf`, `-.inf` and `.nan`.
pub fn parse_float(text: &str) -> Option<f64> {
    let text = text.trim();
    match text.to_ascii_lowercase().as_str() {
        ".inf" | "+.inf" => return Some(f64::INFINITY),
        "-.inf" => return Some(f64::NEG_INFINITY),
        ".nan" => return Some(f64::NAN),
        _ => {}
    }
    let cleaned = text.replace('_', "");
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if cleaned
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
    {
        return None;
    }
    cleaned.parse().ok()
}
