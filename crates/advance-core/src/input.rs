//! Normalization of loosely-typed request values

use serde_json::Value;

use crate::error::CoreError;

/// Normalize a boolean-like value to a strict flag.
///
/// `true`, `1`, and the strings `"true"`, `"1"`, `"yes"` (any case,
/// surrounding whitespace ignored) are enabled. Everything else, including a
/// missing value, is disabled.
pub fn normalize_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes")
        }
        _ => false,
    }
}

/// Strictly parse a boolean-like value.
///
/// Accepts booleans, `0`/`1`, and the strings `"true"`/`"false"`,
/// `"yes"`/`"no"`, `"1"`/`"0"` in any case. Anything else is `None`.
pub fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => {
            let s = s.trim();
            if s == "1" || s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes") {
                Some(true)
            } else if s == "0" || s.eq_ignore_ascii_case("false") || s.eq_ignore_ascii_case("no") {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Parse an optional numeric id given as a JSON number or numeric string.
///
/// `null` and a missing value are `None`.
pub fn parse_optional_id(value: Option<&Value>, field: &str) -> Result<Option<i64>, CoreError> {
    let invalid = || CoreError::InvalidInput(format!("{} must be a numeric id", field));

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Whether an optional text field is missing or whitespace only
pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
