//! Tolerant decoders for values that come out of hand-edited forms.
//!
//! Prices, pnl and psychology scores are typed in by the user and may arrive as
//! numbers, numeric strings, blanks or junk. None of that is allowed to fail a
//! whole trade record, so the decoders below map anything unusable to `None`.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::LazyLock;

use super::trade::{ChecklistItem, Discipline, Mood};

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("float prefix pattern is valid")
});

/// Parse the leading float of a string ("12.5", " 12.5 USD", "-3e2").
///
/// Returns `None` for blank, non-numeric or non-finite input.
pub fn parse_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let m = FLOAT_PREFIX.find(trimmed)?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_float(s),
        _ => None,
    }
}

fn string_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// Accept ids stored either as strings or as bare numbers; blank means absent.
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(string_from_value))
}

pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_id(deserializer)?.unwrap_or_default())
}

/// Free text. `null` reads as empty; numbers and booleans keep their JSON text.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => String::new(),
    })
}

pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(string_from_value))
}

/// Unix seconds; anything unreadable is 0.
pub fn timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .map(|v| v as i64)
        .unwrap_or(0))
}

/// Checklist entries. A bare string is an unchecked item; other junk is skipped.
pub fn checklist<'de, D>(deserializer: D) -> Result<Vec<ChecklistItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(ChecklistItem {
                text,
                checked: false,
            }),
            Value::Object(_) => serde_json::from_value(item).ok(),
            _ => None,
        })
        .collect())
}

pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let list = match value {
        Some(Value::Array(items)) => items.iter().filter_map(string_from_value).collect(),
        _ => Vec::new(),
    };
    Ok(list)
}

pub fn optional_mood<'de, D>(deserializer: D) -> Result<Option<Mood>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(Mood::from_label))
}

pub fn optional_discipline<'de, D>(deserializer: D) -> Result<Option<Discipline>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(Discipline::from_label))
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1" | "on" | "yes"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float("12.5"), Some(12.5));
        assert_eq!(parse_float("  -40 USD"), Some(-40.0));
        assert_eq!(parse_float("3e2"), Some(300.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("-"), None);
    }

    #[test]
    fn test_null_text_and_lists_do_not_fail_a_trade() {
        let trade: crate::models::Trade = serde_json::from_value(serde_json::json!({
            "id": "t1",
            "date": null,
            "symbol": null,
            "notes": null,
            "time": 930,
            "direction": null,
            "result": null,
            "created_at": null,
            "updated_at": "1700000000",
            "pnl": 25,
            "psychology": {
                "pre_trade": {
                    "sleep": 8,
                    "checklist": null,
                    "profile_4h": ["Trend up", {"text": "Above VWAP", "checked": true}, 7]
                }
            }
        }))
        .unwrap();

        assert_eq!(trade.date, "");
        assert_eq!(trade.notes, "");
        assert_eq!(trade.time.as_deref(), Some("930"));
        assert_eq!(trade.created_at, 0);
        assert_eq!(trade.updated_at, 1_700_000_000);
        let pre = trade.pre_trade().unwrap();
        assert_eq!(pre.sleep, Some(8.0));
        assert!(pre.checklist.is_empty());
        assert_eq!(pre.profile_4h.len(), 2);
        assert!(!pre.profile_4h[0].checked);
        assert!(pre.profile_4h[1].checked);
    }

    #[test]
    fn test_null_names_in_vocabulary() {
        let raw = serde_json::json!({"id": "m", "label": null, "color": 3});
        let mistake: crate::models::Mistake = serde_json::from_value(raw).unwrap();
        assert_eq!(mistake.label, "");
        assert_eq!(mistake.color, "3");
    }

    #[test]
    fn test_number_from_value() {
        assert_eq!(number_from_value(&serde_json::json!(7)), Some(7.0));
        assert_eq!(number_from_value(&serde_json::json!("8")), Some(8.0));
        assert_eq!(number_from_value(&serde_json::json!(true)), None);
        assert_eq!(number_from_value(&Value::Null), None);
    }
}
