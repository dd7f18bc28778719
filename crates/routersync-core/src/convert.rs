//! Scalar conversions for values reported by routers.
//!
//! RouterOS reports nearly everything as strings (`"true"`, `"1500"`,
//! `"10M/20M"`), other REST dialects use JSON types. These helpers accept both.

use serde_json::Value;

/// Boolean from `true`, `"true"`, `"yes"`, `"1"` and their negatives
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Integer from a JSON number or numeric string
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Text form of a scalar; `None` for null, arrays and objects
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Rate in bits per second; accepts plain numbers and `k`/`M`/`G` suffixes
pub fn parse_rate(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let (digits, multiplier) = match text.chars().last() {
        Some('k') | Some('K') => (&text[..text.len() - 1], 1_000u64),
        Some('M') | Some('m') => (&text[..text.len() - 1], 1_000_000u64),
        Some('G') | Some('g') => (&text[..text.len() - 1], 1_000_000_000u64),
        _ => (text, 1u64),
    };
    if multiplier == 1 {
        return digits.parse().ok();
    }
    let number: f64 = digits.parse().ok()?;
    if number < 0.0 || !number.is_finite() {
        return None;
    }
    Some((number * multiplier as f64).round() as u64)
}

/// Queue priority `"8"` or `"8/8"`; the upload half wins
pub fn parse_priority(text: &str) -> Option<i32> {
    let first = text.split('/').next()?.trim();
    let priority: i32 = first.parse().ok()?;
    (1..=8).contains(&priority).then_some(priority)
}

pub fn mbps_to_bps(mbps: f64) -> u64 {
    if mbps <= 0.0 || !mbps.is_finite() {
        return 0;
    }
    (mbps * 1_000_000.0).round() as u64
}
