//! Canonicalization of raw cell values.
//!
//! Rules, in order:
//!
//! 1. missing markers ([`Value::Null`], NaN floats) become [`Value::Null`]
//! 2. dates and date-times become ISO-8601 text (`2024-01-05`, `2024-01-05T10:30:00`)
//! 3. everything else is returned unchanged
//!
//! [`normalize`] is idempotent: canonical values are fixed points.

use chrono::Timelike;

use crate::types::Value;

/// Map a raw cell value to its canonical, transport-safe form.
pub fn normalize(value: &Value) -> Value {
    if is_missing(value) {
        return Value::Null;
    }
    match to_iso8601(value) {
        Some(text) => Value::Utf8(text),
        None => value.clone(),
    }
}

/// `true` if `value` is a missing marker.
pub fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Float64(f) => f.is_nan(),
        _ => false,
    }
}

/// `true` if every cell in `row` is a missing marker (an empty row is blank).
pub fn is_blank_row(row: &[Value]) -> bool {
    row.iter().all(is_missing)
}

/// ISO-8601 rendering of a date or date-time value; `None` for every other variant.
///
/// Fractional seconds are only printed when non-zero.
pub fn to_iso8601(value: &Value) -> Option<String> {
    match value {
        Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => {
            let fmt = if dt.time().nanosecond() == 0 {
                "%Y-%m-%dT%H:%M:%S"
            } else {
                "%Y-%m-%dT%H:%M:%S%.f"
            };
            Some(dt.format(fmt).to_string())
        }
        _ => None,
    }
}
