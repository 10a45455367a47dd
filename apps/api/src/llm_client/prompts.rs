// Shared prompt fragments.
// Each feature that needs LLM calls defines its own prompts alongside it.
// This file contains the cross-cutting pieces.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

/// Appended to every structured prompt, directly before the example JSON shape.
/// The gateway has no system role here, so the constraint travels in the user turn.
pub const JSON_ONLY_INSTRUCTION: &str = "Return ONLY valid JSON in this format \
    (no markdown code fences, no text before or after the JSON object):";

/// Builds a structured prompt: task description, JSON-only instruction, shape.
pub fn json_prompt(task: &str, shape: &str) -> String {
    format!("{task}\n\n{JSON_ONLY_INSTRUCTION}\n{shape}")
}

/// Substitutes `{name}` markers in `template` in a single pass.
///
/// Substituted values are never rescanned, so user text containing `{...}` is
/// inserted verbatim. Markers without a value are left as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_prompt_puts_shape_last() {
        let prompt = json_prompt("Do the thing.", "{\"a\": 1}");
        assert!(prompt.starts_with("Do the thing."));
        assert!(prompt.contains(JSON_ONLY_INSTRUCTION));
        assert!(prompt.ends_with("{\"a\": 1}"));
    }

    #[test]
    fn test_fill_template_replaces_every_occurrence() {
        let filled = fill_template("{a} and {b}, then {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(filled, "x and y, then x");
    }

    #[test]
    fn test_fill_template_does_not_rescan_values() {
        let filled = fill_template(
            "first: {first}\nsecond: {second}",
            &[("first", "keep {second} literally"), ("second", "S")],
        );
        assert_eq!(filled, "first: keep {second} literally\nsecond: S");
    }

    #[test]
    fn test_fill_template_leaves_unknown_markers_and_json() {
        let filled = fill_template(r#"{known} {unknown} {"a": 1}"#, &[("known", "k")]);
        assert_eq!(filled, r#"k {unknown} {"a": 1}"#);
    }
}
