//! Recovery of a JSON object from free-form generated text.

use serde_json::{Map, Value};

const FENCE: &str = "```";

/// Returns the candidate JSON text: fences removed, then the span from the first `{`
/// to the last `}`.
pub fn extract_json(text: &str) -> Option<&str> {
    let mut inner = text.trim();
    if let Some(rest) = inner.strip_prefix(FENCE) {
        // Any language tag (`json`, `JSON`...) is left in place; the brace scan skips it.
        inner = rest;
    }
    if let Some(rest) = inner.trim_end().strip_suffix(FENCE) {
        inner = rest;
    }

    let start = inner.find('{')?;
    let end = inner.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&inner[start..=end])
}

/// Parses generated text into a JSON object. Anything that does not decode to an
/// object is `None`.
pub fn parse_payload(text: &str) -> Option<Map<String, Value>> {
    let candidate = extract_json(text)?;
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "generated text is not valid JSON");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(text: &str) -> Option<Value> {
        parse_payload(text).map(Value::Object)
    }

    #[test]
    fn fenced_block_with_language_tag() {
        assert_eq!(parsed("```json\n{\"a\":1}\n```"), Some(json!({"a": 1})));
    }

    #[test]
    fn fenced_block_without_language_tag() {
        assert_eq!(parsed("```\n{\"a\": [1, 2]}\n```\n"), Some(json!({"a": [1, 2]})));
    }

    #[test]
    fn trailing_prose_is_ignored() {
        let text = "Here you go:\n{\"a\": {\"b\": 2}}\nLet me know if you need more.";
        assert_eq!(parsed(text), Some(json!({"a": {"b": 2}})));
    }

    #[test]
    fn unbalanced_or_missing_braces_yield_nothing() {
        assert_eq!(parsed("no json here"), None);
        assert_eq!(parsed("{\"a\": 1"), None);
        assert_eq!(parsed("} backwards {"), None);
        assert_eq!(parsed("{\"a\": 1,}"), None);
    }

    #[test]
    fn non_object_json_yields_nothing() {
        assert_eq!(parsed("```json\n[1, 2, 3]\n```"), None);
    }

    #[test]
    fn extract_returns_brace_span() {
        assert_eq!(extract_json("x {\"a\":1} y"), Some("{\"a\":1}"));
    }
}
