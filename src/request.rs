// Inbound request representation
//
// One PromptRequest per relay invocation, deserialized either from a JSON
// body (POST) or from the query string (GET, for EventSource clients that
// cannot send a body). Immutable once constructed.

use serde::Deserialize;

/// A single inbound prompt submission.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptRequest {
    /// The free-text prompt. Required; an empty value is rejected before
    /// the content gate runs.
    #[serde(default)]
    pub prompt: String,
    /// Optional model override; the configured default applies otherwise.
    #[serde(default)]
    pub model: Option<String>,
    /// Optional temperature override.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Whether the caller wants an event-stream response.
    #[serde(default)]
    pub stream: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_body_deserializes() {
        let req: PromptRequest = serde_json::from_str(
            r#"{"prompt":"hello","model":"gpt-4o","temperature":0.7,"stream":true}"#,
        )
        .unwrap();
        assert_eq!(req.prompt, "hello");
        assert_eq!(req.model.as_deref(), Some("gpt-4o"));
        assert_eq!(req.temperature, Some(0.7));
        assert!(req.stream);
    }

    #[test]
    fn missing_optional_fields_default() {
        let req: PromptRequest = serde_json::from_str(r#"{"prompt":"hello"}"#).unwrap();
        assert!(req.model.is_none());
        assert!(req.temperature.is_none());
        assert!(!req.stream);
    }

    #[test]
    fn missing_prompt_defaults_to_empty() {
        // Validation (not deserialization) rejects the empty prompt, so a
        // bodyless `{}` still deserializes.
        let req: PromptRequest = serde_json::from_str("{}").unwrap();
        assert!(req.prompt.is_empty());
    }

    #[test]
    fn query_string_form_deserializes() {
        let req: PromptRequest =
            serde_urlencoded::from_str("prompt=hi%20there&stream=true&temperature=0.3").unwrap();
        assert_eq!(req.prompt, "hi there");
        assert!(req.stream);
        assert_eq!(req.temperature, Some(0.3));
    }
}
