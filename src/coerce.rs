// Loose numeric coercion for JSON request values
//
// Request bodies arrive from clients that send numbers both as JSON numbers
// and as strings ("100000"). These helpers turn a `serde_json::Value` into a
// number the way the HTTP layer has always accepted them.

use serde_json::Value;

/// Convert a JSON value to a number.
///
/// - numbers are taken as-is
/// - strings are trimmed and parsed; an empty string is 0
/// - booleans are 1 / 0, null is 0
/// - arrays, objects and unparseable strings are not numbers (`None`)
///
/// Non-finite results (e.g. "inf") are returned as-is so callers can reject
/// them with their own error.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Number or zero: absent, non-numeric and non-finite values all become 0.
pub fn number_or_zero(value: Option<&Value>) -> f64 {
    value
        .and_then(to_number)
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Convert a JSON value to an integer. Fractional numbers are rejected.
pub fn to_integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }

    let n = to_number(value)?;
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

/// JavaScript-style truthiness, used for "present and truthy" patch fields.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
