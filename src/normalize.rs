//! Lenient field coercion for request bodies.
//!
//! The admin pages post form values as strings, so numbers arrive as `"12.5"`
//! and lists as `"fabrics, trims"`. These helpers turn such loose input into
//! the typed values stored in the document store.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const DEFAULT_RATING: i64 = 3;
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Parses the longest numeric prefix of a string (`"12.5kg"` -> 12.5).
/// JSON numbers pass through; anything without a leading number is `None`.
pub fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => float_prefix(s),
        _ => None,
    }
}

/// Integer counterpart of [`parse_float`]; fractional input is truncated.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => int_prefix(s),
        _ => None,
    }
}

/// Strict numeric conversion: the whole (trimmed) string must be a number.
pub fn to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Supplier rating: missing or non-numeric input gives the default, anything
/// else is rounded and clamped into `[MIN_RATING, MAX_RATING]`.
pub fn rating(value: Option<&Value>) -> i64 {
    match value.and_then(to_number) {
        Some(n) => (n.round() as i64).clamp(MIN_RATING, MAX_RATING),
        None => DEFAULT_RATING,
    }
}

/// Rating sent on an update. Any value that is present counts, so `null` or a
/// blank string reads as zero and clamps to [`MIN_RATING`]; non-numeric text
/// still gives the default.
pub fn updated_rating(value: &Value) -> i64 {
    match value {
        Value::Null => MIN_RATING,
        Value::String(s) if s.trim().is_empty() => MIN_RATING,
        other => rating(Some(other)),
    }
}

/// Scalar JSON values rendered as text. Arrays, objects and null are `None`.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Accepts either a JSON array or a comma separated string. Entries are
/// trimmed, empty ones dropped and duplicates removed keeping first position.
pub fn string_set(value: &Value) -> Vec<String> {
    let items: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    let mut set: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !set.iter().any(|existing| existing == item) {
            set.push(item.to_string());
        }
    }
    set
}

pub fn trimmed(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Serde helper for optional text fields that may be posted as numbers.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text))
}

/// Serde helper that keeps an explicit `null` as `Some(Value::Null)`, so
/// "sent as null" and "not sent" stay distinguishable. Pair with
/// `#[serde(default)]`.
pub fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

fn int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse::<i64>().ok()
}
