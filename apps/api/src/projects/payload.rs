//! Parsing of the model's generated-project payload.
//!
//! The model is asked for a JSON object with a `files` array and an
//! `explanation`. Replies wrap it in a ```json fence, a bare ``` fence, or
//! nothing at all. Anything that fails to parse — or parses but fails shape
//! validation — falls back to a single `index.html` file holding the raw
//! reply, so this function never errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const FALLBACK_FILE_PATH: &str = "index.html";
pub const FALLBACK_EXPLANATION: &str = "Generated project";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedProject {
    pub files: Vec<GeneratedFile>,
    #[serde(default)]
    pub explanation: Option<String>,
}

static JSON_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*\n(.*?)\n\s*```").expect("valid regex"));
static BARE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```\s*\n(.*?)\n\s*```").expect("valid regex"));

/// Returns the contents of the first fenced block, preferring ```json.
fn extract_fenced_block(reply: &str) -> Option<&str> {
    JSON_FENCE_RE
        .captures(reply)
        .or_else(|| BARE_FENCE_RE.captures(reply))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parses a model reply into a `GeneratedProject`, falling back to a
/// single-file project when the reply is not a usable payload.
pub fn parse_payload(reply: &str) -> GeneratedProject {
    let candidate = extract_fenced_block(reply).unwrap_or_else(|| reply.trim());

    match serde_json::from_str::<GeneratedProject>(candidate) {
        Ok(payload) if is_valid(&payload) => payload,
        _ => fallback(reply),
    }
}

/// Shape validation: a parseable payload with an empty file list or blank
/// paths/contents is treated exactly like a parse failure.
fn is_valid(payload: &GeneratedProject) -> bool {
    !payload.files.is_empty()
        && payload
            .files
            .iter()
            .all(|f| !f.path.trim().is_empty() && !f.content.is_empty())
}

fn fallback(reply: &str) -> GeneratedProject {
    GeneratedProject {
        files: vec![GeneratedFile {
            path: FALLBACK_FILE_PATH.to_string(),
            content: reply.to_string(),
            language: Some("html".to_string()),
        }],
        explanation: Some(FALLBACK_EXPLANATION.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_PAYLOAD: &str = r#"{
        "files": [
            {"path": "package.json", "content": "{}", "language": "json"},
            {"path": "src/index.js", "content": "console.log('hi');", "language": "javascript"}
        ],
        "explanation": "A minimal Node project"
    }"#;

    #[test]
    fn parses_json_fenced_payload() {
        let reply = format!("Here you go:\n```json\n{VALID_PAYLOAD}\n```\nEnjoy!");
        let payload = parse_payload(&reply);
        assert_eq!(payload.files.len(), 2);
        assert_eq!(payload.files[0].path, "package.json");
        assert_eq!(payload.explanation.as_deref(), Some("A minimal Node project"));
    }

    #[test]
    fn parses_bare_fenced_payload() {
        let reply = format!("```\n{VALID_PAYLOAD}\n```");
        let payload = parse_payload(&reply);
        assert_eq!(payload.files.len(), 2);
    }

    #[test]
    fn parses_unfenced_payload() {
        let payload = parse_payload(VALID_PAYLOAD);
        assert_eq!(payload.files[1].language.as_deref(), Some("javascript"));
    }

    #[test]
    fn prose_reply_falls_back_to_single_html_file() {
        let reply = "I could not produce JSON, but here is an outline of the project.";
        let payload = parse_payload(reply);
        assert_eq!(payload.files.len(), 1);
        assert_eq!(payload.files[0].path, FALLBACK_FILE_PATH);
        assert_eq!(payload.files[0].content, reply);
        assert_eq!(payload.files[0].language.as_deref(), Some("html"));
        assert_eq!(payload.explanation.as_deref(), Some(FALLBACK_EXPLANATION));
    }

    #[test]
    fn parseable_but_wrong_shape_falls_back() {
        let reply = r#"{"answer": 42}"#;
        let payload = parse_payload(reply);
        assert_eq!(payload.files[0].path, FALLBACK_FILE_PATH);
        assert_eq!(payload.files[0].content, reply);
    }

    #[test]
    fn empty_files_array_falls_back() {
        let reply = r#"{"files": [], "explanation": "nothing"}"#;
        let payload = parse_payload(reply);
        assert_eq!(payload.files.len(), 1);
        assert_eq!(payload.files[0].path, FALLBACK_FILE_PATH);
    }

    #[test]
    fn blank_file_path_falls_back() {
        let reply = r#"{"files": [{"path": "  ", "content": "x"}], "explanation": "bad"}"#;
        let payload = parse_payload(reply);
        assert_eq!(payload.files[0].path, FALLBACK_FILE_PATH);
    }

    #[test]
    fn missing_language_defaults_to_none() {
        let reply = r##"{"files": [{"path": "README.md", "content": "# Hi"}]}"##;
        let payload = parse_payload(reply);
        assert_eq!(payload.files[0].language, None);
        assert_eq!(payload.explanation, None);
    }

    #[test]
    fn fenced_garbage_falls_back_to_whole_reply() {
        let reply = "```json\nnot json at all\n```";
        let payload = parse_payload(reply);
        assert_eq!(payload.files[0].content, reply);
    }
}
