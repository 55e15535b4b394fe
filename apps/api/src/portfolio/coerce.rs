//! Typed extraction from untrusted JSON.
//!
//! Every function takes the raw field (`None` when absent) plus a fallback and
//! always returns a usable value of the target type. Nothing here fails.

use std::ops::RangeInclusive;

use serde_json::{Map, Value};

/// Non-empty trimmed string, or `fallback`. Numbers and booleans are
/// stringified; everything else falls back.
pub fn coerce_string(raw: Option<&Value>, fallback: &str) -> String {
    let candidate = match raw {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };
    if candidate.is_empty() {
        fallback.to_string()
    } else {
        candidate
    }
}

/// Like [`coerce_string`] but keeps `None` when nothing usable is present.
pub fn coerce_opt_string(raw: Option<&Value>) -> Option<String> {
    let s = coerce_string(raw, "");
    (!s.is_empty()).then_some(s)
}

fn finite_number(raw: Option<&Value>) -> Option<f64> {
    let n = match raw? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Finite numbers (or numeric strings) are clamped into `range`. Anything
/// else, including `"NaN"` and `"inf"`, yields `fallback`.
pub fn coerce_number(raw: Option<&Value>, range: RangeInclusive<f64>, fallback: f64) -> f64 {
    debug_assert!(range.contains(&fallback));
    match finite_number(raw) {
        Some(n) => n.clamp(*range.start(), *range.end()),
        None => fallback,
    }
}

/// Integer variant of [`coerce_number`]. Fractions round to nearest.
pub fn coerce_int(raw: Option<&Value>, range: RangeInclusive<i64>, fallback: i64) -> i64 {
    debug_assert!(range.contains(&fallback));
    match finite_number(raw) {
        Some(n) => {
            let lo = *range.start() as f64;
            let hi = *range.end() as f64;
            n.round().clamp(lo, hi) as i64
        }
        None => fallback,
    }
}

/// Largest integer an `f64` (and a browser `Number`) holds exactly.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Integer in `0..=MAX_SAFE_INTEGER` when present and numeric, `None` otherwise.
pub fn coerce_id(raw: Option<&Value>) -> Option<i64> {
    finite_number(raw)
        .filter(|n| *n >= 0.0 && *n <= MAX_SAFE_INTEGER as f64)
        .map(|n| n.round() as i64)
}

pub fn coerce_enum<T>(raw: Option<&Value>, parse: impl Fn(&str) -> Option<T>, fallback: T) -> T {
    match raw {
        Some(Value::String(s)) => parse(s).unwrap_or(fallback),
        _ => fallback,
    }
}

/// Strings only, trimmed, empties dropped, capped at `limit` items.
pub fn coerce_string_list(raw: Option<&Value>, limit: usize) -> Vec<String> {
    coerce_array(raw)
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

pub fn coerce_array(raw: Option<&Value>) -> &[Value] {
    match raw {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

pub fn coerce_object(raw: Option<&Value>) -> Option<&Map<String, Value>> {
    raw.and_then(Value::as_object)
}

/// Keeps at most `max_chars` characters; longer input is cut to
/// `max_chars - 3` characters followed by a single `…`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push('…');
    out
}
