//! Shared utility functions

use chrono::{DateTime, Utc};

use crate::models::PermissionSelection;

/// Parse a datetime string (RFC3339 format) or return current time
///
/// Timestamps are written by this crate in RFC3339, so a parse failure only
/// happens for rows inserted by hand.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Decode a permission selection stored as JSON text.
///
/// Stored values may be booleans or the legacy `0`/`1` integers; anything
/// else is rejected as corrupt.
pub fn decode_selection(raw: &str) -> Result<PermissionSelection, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let object = match value {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a JSON object, found {}",
                other
            )));
        }
    };

    let mut selection = PermissionSelection::new();
    for (code, enabled) in object {
        let enabled = match enabled {
            serde_json::Value::Bool(b) => b,
            serde_json::Value::Number(n) => n.as_i64().map(|v| v != 0).unwrap_or(false),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "permission '{}' has non-boolean state {}",
                    code, other
                )));
            }
        };
        selection.insert(code, enabled);
    }
    Ok(selection)
}

/// Encode a permission selection as JSON text.
pub fn encode_selection(selection: &PermissionSelection) -> String {
    // BTreeMap<String, bool> serialization cannot fail
    serde_json::to_string(selection).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_or_now() {
        let valid_time = "2024-01-01T12:00:00Z";
        let parsed = parse_datetime_or_now(valid_time);
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T12:00:00+00:00");

        let now_before = Utc::now();
        let parsed = parse_datetime_or_now("invalid");
        let now_after = Utc::now();
        assert!(parsed >= now_before && parsed <= now_after);
    }

    #[test]
    fn test_decode_selection_accepts_bools_and_ints() {
        let selection = decode_selection(r#"{"U_VIEW": true, "U_EDIT": 0, "R_VIEW": 1}"#).unwrap();
        assert_eq!(selection.get("U_VIEW"), Some(&true));
        assert_eq!(selection.get("U_EDIT"), Some(&false));
        assert_eq!(selection.get("R_VIEW"), Some(&true));
    }

    #[test]
    fn test_decode_selection_rejects_non_objects() {
        assert!(decode_selection("[1, 2]").is_err());
        assert!(decode_selection(r#"{"U_VIEW": "maybe"}"#).is_err());
        assert!(decode_selection("not json").is_err());
    }

    #[test]
    fn test_encode_selection_is_sorted() {
        let mut selection = PermissionSelection::new();
        selection.insert("R_VIEW".to_string(), false);
        selection.insert("U_VIEW".to_string(), true);
        assert_eq!(encode_selection(&selection), r#"{"R_VIEW":false,"U_VIEW":true}"#);
    }
}
