//! Best-effort cleanup of near-JSON model output.
//!
//! Providers occasionally wrap JSON in Markdown fences, add a sentence
//! before it, leave trailing commas or forget to quote keys. This is a
//! textual repair pass, not a parser: anything it cannot fix is left for
//! `serde_json` to reject.

use regex::Regex;
use std::sync::LazyLock;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid trailing comma regex"));

static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").expect("valid unquoted key regex")
});

/// Remove a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Slice from the first `{` or `[` to its matching last closer.
pub fn outermost_json(text: &str) -> &str {
    let Some(start) = text.find(['{', '[']) else {
        return text;
    };
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    match text.rfind(closer) {
        Some(end) if end > start => &text[start..=end],
        _ => &text[start..],
    }
}

/// Clean model output so it has the best chance of parsing.
///
/// Valid JSON (after fence stripping and trimming surrounding prose) is
/// returned unchanged, so applying this twice gives the same result.
pub fn sanitize_json(raw: &str) -> String {
    let candidate = outermost_json(strip_code_fences(raw));
    if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
        return candidate.to_string();
    }

    let without_commas = TRAILING_COMMA.replace_all(candidate, "$1");
    let quoted = UNQUOTED_KEY.replace_all(&without_commas, "$1\"$2\":");
    quoted.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn parse(raw: &str) -> Value {
        serde_json::from_str(&sanitize_json(raw)).unwrap()
    }

    #[test]
    fn test_fenced_with_language_tag() {
        assert_eq!(parse("```json\n{\"a\": 1}\n```"), json!({"a": 1}));
    }

    #[test]
    fn test_fenced_without_language_tag() {
        assert_eq!(parse("```\n[1, 2]\n```"), json!([1, 2]));
    }

    #[test]
    fn test_trailing_commas() {
        assert_eq!(
            parse(r#"{"a": [1, 2,], "b": {"c": true,},}"#),
            json!({"a": [1, 2], "b": {"c": true}})
        );
    }

    #[test]
    fn test_unquoted_keys() {
        assert_eq!(
            parse(r#"{title: "Soup", servings: 2, tags: ["warm"]}"#),
            json!({"title": "Soup", "servings": 2, "tags": ["warm"]})
        );
    }

    #[test]
    fn test_surrounding_prose() {
        assert_eq!(
            parse("Here is your recipe:\n{\"title\": \"Soup\"}\nEnjoy!"),
            json!({"title": "Soup"})
        );
    }

    #[test]
    fn test_valid_json_is_untouched() {
        // Looks like an unquoted key inside a string value; must survive.
        let valid = r#"{"note": "serve with, rice: plain", "list": []}"#;
        assert_eq!(sanitize_json(valid), valid);
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            r#"{"a": 1}"#,
            "```json\n{\"a\": [1,],}\n```",
            r#"{a: 1, b: "x",}"#,
            "not json at all",
        ] {
            let once = sanitize_json(raw);
            assert_eq!(sanitize_json(&once), once, "{raw}");
        }
    }

    #[test]
    fn test_hopeless_input_still_fails_to_parse() {
        assert!(serde_json::from_str::<Value>(&sanitize_json("no braces here")).is_err());
    }
}
