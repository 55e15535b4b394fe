// Cross-cutting prompt fragments. Feature prompts live next to the code that
// sends them (see portfolio::prompts).

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "Return valid JSON only. \
    No markdown. No code fences. No text before or after the JSON object.";

/// Appended to every system prompt that turns user material into narrative.
pub const NON_FABRICATION_SYSTEM: &str = "Do NOT invent stories, facts, names, \
    companies, years, metrics or quotes. If something is not supported by the INPUT, \
    say the information is not available and record it in the limitations.";

/// Joins fragments into one system prompt.
pub fn system_prompt(fragments: &[&str]) -> String {
    fragments.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_joins_fragments() {
        let s = system_prompt(&[JSON_ONLY_SYSTEM, NON_FABRICATION_SYSTEM]);
        assert!(s.starts_with("Return valid JSON only."));
        assert!(s.ends_with("limitations."));
    }
}
