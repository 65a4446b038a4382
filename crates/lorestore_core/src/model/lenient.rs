//! Forgiving deserializers and best-effort parsers.
//!
//! Documents are edited by a browser front end and occasionally by hand, so a
//! stray number where a string belongs must not make the whole file look
//! corrupt. Each helper here accepts the expected shape plus the obvious
//! near-misses, and falls back to a default for anything else.
//!
//! Policy for numeric parsing: failure means "ignore the value", never an
//! error.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Default group fill opacity.
pub const DEFAULT_OPACITY: f64 = 0.08;

/// Parses a JSON value as a finite number.
///
/// Accepts numbers and numeric strings (surrounding whitespace allowed).
#[must_use]
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number_str(s),
        _ => None,
    }
}

/// Parses text as a finite number.
#[must_use]
pub fn parse_number_str(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// A string, coercing scalars and mapping `null` to `""`.
pub(crate) fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(value_to_string)
}

/// An optional string; `null`, arrays and objects become `None`.
pub(crate) fn opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Any present value, `null` included. Only a missing key is `None`.
pub(crate) fn present<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// An optional number via [`parse_number`].
pub(crate) fn opt_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    Value::deserialize(deserializer).map(|v| parse_number(&v))
}

/// Group opacity, [`DEFAULT_OPACITY`] when missing or unparseable.
pub(crate) fn opacity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Value::deserialize(deserializer).map(|v| parse_number(&v).unwrap_or(DEFAULT_OPACITY))
}

pub(crate) fn default_opacity() -> f64 {
    DEFAULT_OPACITY
}

/// A list of strings; non-string entries are dropped, non-arrays are empty.
pub(crate) fn string_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// `T::default()` when the value is `null`.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
