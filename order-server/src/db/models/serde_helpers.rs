//! Serde helpers for lenient request payloads
//!
//! Storefront clients send numbers as JSON numbers or as strings, and the
//! ingestion contract keeps the original coercion semantics: float fields
//! parse like `parseFloat` (longest numeric prefix), integer fields parse
//! like `parseInt` (truncating). Anything unparsable deserializes to `None`
//! so the falsy-value guards downstream can reject or fall back.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize an optional float from a JSON number or numeric string
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

/// Deserialize an optional integer from a JSON number or numeric string,
/// truncating toward zero
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64).map(|f| f.trunc() as i64))
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }
}

/// Parse the longest numeric prefix of a string, `parseFloat`-style
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    while end < bytes.len() {
        let ok = match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                true
            }
            b'+' | b'-' => end == 0,
            b'.' if !seen_dot => {
                seen_dot = true;
                true
            }
            _ => false,
        };
        if !ok {
            break;
        }
        end += 1;
    }

    if !seen_digit {
        return None;
    }
    // drop a trailing '.' so "3." parses as 3
    while end > 0 && !bytes[end - 1].is_ascii_digit() {
        end -= 1;
    }
    s[..end].parse::<f64>().ok()
}
