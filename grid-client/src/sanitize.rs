//! Value normalization for cells read from the exports and for every JSON
//! body the service sends back.
//!
//! Missing values always become `null`; the exports spell them in several
//! ways (`nan`, `NaT`, `None`, empty cells) and none of those spellings is
//! passed through to clients.

use serde_json::{Number, Value};

const MISSING_MARKERS: &[&str] = &["nan", "nat", "none", "null", "n/a"];

/// Largest magnitude at which an `f64` still holds every integer exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("'{0}' is not an integer")]
    NotInteger(String),
    #[error("'{0}' is not a number")]
    NotNumber(String),
}

pub fn is_missing_marker(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || MISSING_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m))
}

/// Trimmed text, or `None` for blank cells and missing-value markers.
pub fn clean_text(raw: &str) -> Option<String> {
    if is_missing_marker(raw) {
        None
    } else {
        Some(raw.trim().to_string())
    }
}

/// Parses an integer cell. Whole floats such as `1001.0` are accepted since
/// spreadsheet exports write integer columns that way once a column has a gap.
pub fn parse_integer(raw: &str) -> Result<Option<i64>, ParseError> {
    let Some(s) = clean_text(raw) else {
        return Ok(None);
    };
    if let Ok(v) = s.parse::<i64>() {
        return Ok(Some(v));
    }
    match s.parse::<f64>() {
        Ok(f) if whole_float(f) => Ok(Some(f as i64)),
        _ => Err(ParseError::NotInteger(s)),
    }
}

/// Parses a decimal cell, accepting a comma as the decimal separator.
pub fn parse_decimal(raw: &str) -> Result<Option<f64>, ParseError> {
    let Some(s) = clean_text(raw) else {
        return Ok(None);
    };
    let normalized = if s.contains(',') && !s.contains('.') {
        s.replace(',', ".")
    } else {
        s.clone()
    };
    match normalized.parse::<f64>() {
        Ok(f) => Ok(clean_number(f)),
        Err(_) => Err(ParseError::NotNumber(s)),
    }
}

pub fn clean_number(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Normalizes a code-like cell (`303`, `303.0`, ` 303 `) to its canonical
/// text form. Non-numeric codes are kept as trimmed text.
pub fn clean_code(raw: &str) -> Option<String> {
    match parse_integer(raw) {
        Ok(Some(v)) => Some(v.to_string()),
        Ok(None) => None,
        Err(_) => clean_text(raw),
    }
}

/// Text form of a GeoJSON property value.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean_text(s),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() && whole_float(f) => (f as i64).to_string(),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn value_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| whole_float(*f)).map(|f| f as i64)),
        Value::String(s) => parse_integer(s).ok().flatten(),
        _ => None,
    }
}

/// A scalar property reduced to a plain JSON number or trimmed string.
pub fn scalar(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(json_value(value.clone())),
        Value::String(s) => {
            let text = clean_text(s)?;
            Some(match parse_decimal(&text) {
                Ok(Some(f)) => number_value(f),
                _ => Value::String(text),
            })
        }
        Value::Bool(_) => Some(value.clone()),
        _ => None,
    }
}

/// The serialization boundary: every outgoing body passes through here.
///
/// Missing-value strings become `null` and whole floats become integers;
/// non-finite floats never reach a `Value` (serde_json maps them to `null`).
pub fn json_value(value: Value) -> Value {
    match value {
        Value::String(s) if is_missing_marker(&s) => Value::Null,
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => number_value(f),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(json_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, json_value(v)))
                .collect(),
        ),
        other => other,
    }
}

fn number_value(f: f64) -> Value {
    if whole_float(f) {
        Value::Number(Number::from(f as i64))
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn whole_float(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT_INT
}
