//! Best-effort recovery of a JSON object from raw model text.
//!
//! Models wrap JSON in code fences, add prose around it, leave trailing
//! commas or emit typographic quotes. Each strategy below is a pure
//! `&str -> Option<String>` candidate producer. [`parse_model_json`] tries
//! them in order and keeps the first candidate that `serde_json` accepts.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RepairError {
    #[error(
        "model output is not valid JSON ({source}); the model probably ignored the JSON-only output instruction"
    )]
    Unparseable {
        #[source]
        source: serde_json::Error,
    },

    #[error("model output is empty")]
    Empty,
}

pub type Strategy = fn(&str) -> Option<String>;

/// Ordered candidate producers. Order matters: cheaper and less invasive first.
pub const STRATEGIES: [(&str, Strategy); 4] = [
    ("direct", direct),
    ("balanced", balanced),
    ("repaired", repaired),
    ("repaired-balanced", repaired_balanced),
];

/// Stage 1: the trimmed text as-is.
pub fn direct(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Stage 2: first balanced object, ignoring surrounding prose.
pub fn balanced(raw: &str) -> Option<String> {
    extract_balanced_object(raw).map(str::to_string)
}

/// Stage 3: conservative textual repair of the whole input.
pub fn repaired(raw: &str) -> Option<String> {
    direct(&conservative_repair(raw))
}

/// Stage 4: balanced extraction over the repaired text.
pub fn repaired_balanced(raw: &str) -> Option<String> {
    balanced(&conservative_repair(raw))
}

/// Returns the first `{ ... }` whose braces balance, skipping braces that
/// appear inside string literals. `None` when no object opens or it never
/// closes (truncated output).
pub fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Fence stripping, then quote normalization, then trailing-comma removal.
/// Quotes go first so the comma pass sees the real string boundaries.
pub fn conservative_repair(text: &str) -> String {
    remove_trailing_commas(&normalize_smart_quotes(&strip_code_fences(text)))
}

pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
}

pub fn normalize_smart_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            other => other,
        })
        .collect()
}

/// Drops a `,` when the next non-whitespace char closes an object or array.
/// Commas inside string literals are kept.
pub fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Runs every strategy in order and returns the first parse that succeeds.
/// On total failure the error carries the parse error of the last candidate.
pub fn parse_model_json(raw: &str) -> Result<Value, RepairError> {
    let mut last_error = None;

    for (name, strategy) in STRATEGIES {
        let Some(candidate) = strategy(raw) else {
            continue;
        };
        match serde_json::from_str::<Value>(&candidate) {
            Ok(value) => {
                debug!(strategy = name, "model JSON recovered");
                return Ok(value);
            }
            Err(e) => last_error = Some(e),
        }
    }

    match last_error {
        Some(source) => Err(RepairError::Unparseable { source }),
        None => Err(RepairError::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_json_parses_in_stage_one() {
        let raw = r#"{"name": "Giulia", "skills": [1, 2, 3], "nested": {"ok": true}}"#;
        let candidate = direct(raw).unwrap();
        assert_eq!(candidate, raw);
        let via_pipeline = parse_model_json(raw).unwrap();
        let via_serde: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(via_pipeline, via_serde);
    }

    #[test]
    fn test_balanced_extraction_ignores_braces_in_strings() {
        let input = r#"prose {"a": "text with } inside"} trailing"#;
        assert_eq!(
            extract_balanced_object(input),
            Some(r#"{"a": "text with } inside"}"#)
        );
    }

    #[test]
    fn test_balanced_extraction_handles_escaped_quotes() {
        let input = r#"x {"a": "say \"}\" now", "b": {"c": 1}} y"#;
        assert_eq!(
            extract_balanced_object(input),
            Some(r#"{"a": "say \"}\" now", "b": {"c": 1}}"#)
        );
    }

    #[test]
    fn test_balanced_extraction_truncated_returns_none() {
        assert_eq!(extract_balanced_object(r#"{"a": {"b": 1}"#), None);
        assert_eq!(extract_balanced_object("no object here"), None);
    }

    #[test]
    fn test_trailing_commas_removed_outside_strings_only() {
        let input = r#"{"a": [1, 2, ], "b": "x, }", }"#;
        assert_eq!(remove_trailing_commas(input), r#"{"a": [1, 2 ], "b": "x, }" }"#);
    }

    #[test]
    fn test_smart_quotes_normalized() {
        assert_eq!(
            normalize_smart_quotes("{\u{201C}a\u{201D}: \u{2018}b\u{2019}}"),
            "{\"a\": 'b'}"
        );
    }

    #[test]
    fn test_fenced_json_with_trailing_comma_and_prose() {
        let raw = "```json\n{\"a\":1,}\n```\nHope this helps!";
        assert_eq!(parse_model_json(raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_prose_around_object() {
        let raw = "Here is your profile:\n{\"theme\": \"tech\"}\nLet me know.";
        assert_eq!(parse_model_json(raw).unwrap(), json!({"theme": "tech"}));
    }

    #[test]
    fn test_unparseable_reports_hint() {
        let err = parse_model_json("I cannot help with that.").unwrap_err();
        assert!(matches!(err, RepairError::Unparseable { .. }));
        assert!(err.to_string().contains("JSON-only"));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_model_json("   "), Err(RepairError::Empty)));
    }
}
