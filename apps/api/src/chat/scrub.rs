//! Strips internal action-JSON fragments that occasionally leak into model
//! replies (`{"action": …}`, `{"thought": …}`, `{"action_input": …}`).

use once_cell::sync::Lazy;
use regex::Regex;

static ACTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\s*"action":[^}]+\}"#).expect("valid regex"));
static THOUGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\s*"thought":[^}]+\}"#).expect("valid regex"));
// action_input payloads can span lines and nest braces, so this one is
// non-greedy across newlines rather than bounded at the first brace.
static ACTION_INPUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)\{\s*"action_input":.*?\}"#).expect("valid regex"));

/// Removes leaked action JSON from a reply and trims the result.
/// Ordinary prose, including fenced code blocks, passes through untouched.
pub fn scrub_action_leakage(reply: &str) -> String {
    let scrubbed = ACTION_RE.replace_all(reply, "");
    let scrubbed = THOUGHT_RE.replace_all(&scrubbed, "");
    let scrubbed = ACTION_INPUT_RE.replace_all(&scrubbed, "");
    scrubbed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_prose_passes_through() {
        let reply = "Hello! Here is the recipe you asked for.";
        assert_eq!(scrub_action_leakage(reply), reply);
    }

    #[test]
    fn strips_action_fragment() {
        let reply = r#"Sure thing. {"action": "search_web"} Here are the results."#;
        assert_eq!(
            scrub_action_leakage(reply),
            "Sure thing.  Here are the results."
        );
    }

    #[test]
    fn strips_thought_fragment() {
        let reply = r#"{"thought": "the user wants a summary"}The summary follows."#;
        assert_eq!(scrub_action_leakage(reply), "The summary follows.");
    }

    #[test]
    fn strips_multiline_action_input() {
        let reply = "Done.\n{\"action_input\":\n  \"query about weather\"\n}\nAnything else?";
        assert_eq!(scrub_action_leakage(reply), "Done.\n\nAnything else?");
    }

    #[test]
    fn strips_multiple_fragments_in_one_reply() {
        let reply = r#"{"action": "lookup"}{"thought": "done"}Final answer."#;
        assert_eq!(scrub_action_leakage(reply), "Final answer.");
    }

    #[test]
    fn trims_leftover_whitespace() {
        let reply = r#"  {"action": "noop"}  "#;
        assert_eq!(scrub_action_leakage(reply), "");
    }
}
