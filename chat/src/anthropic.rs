//! Anthropic-style messages API.

use crate::{ChatMessage, Error, Role};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

pub(crate) const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub(crate) const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub(crate) const DEFAULT_MAX_TOKENS: usize = 4096;
const API_VERSION: &str = "2023-06-01";

pub(crate) fn build_headers(api_key: &str) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        "x-api-key",
        HeaderValue::from_str(api_key)
            .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
    );
    headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
    Ok(headers)
}

/// System-role messages never travel in `messages`; the prompt goes in `system`.
pub(crate) fn build_request(
    model: &str,
    max_tokens: usize,
    messages: &[ChatMessage],
    system: Option<&str>,
) -> Result<serde_json::Value, Error> {
    let request = ApiRequest {
        model,
        max_tokens,
        messages: messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| ApiMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        system: system.filter(|s| !s.is_empty()),
    };
    serde_json::to_value(&request).map_err(|e| Error::Config(e.to_string()))
}

/// Returns the first `text` block, or an empty string when there is none.
pub(crate) fn parse_reply(body: &str) -> Result<String, Error> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;

    Ok(response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .unwrap_or_default())
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiContent>,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_messages_are_stripped() {
        let messages = vec![
            ChatMessage::system("ignored"),
            ChatMessage::user("Hello"),
            ChatMessage::assistant("Hi"),
        ];
        let body = build_request(DEFAULT_MODEL, 4096, &messages, Some("Be brief.")).unwrap();

        let sent = body["messages"].as_array().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m["role"] != "system"));
        assert_eq!(body["system"], "Be brief.");
        assert_eq!(body["max_tokens"], 4096);
    }

    #[test]
    fn test_system_field_omitted_without_prompt() {
        let body = build_request("m", 10, &[ChatMessage::user("Hi")], None).unwrap();
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_first_text_block_wins() {
        let body = r#"{"content":[{"type":"thinking","thinking":"hmm"},{"type":"text","text":"hi"},{"type":"text","text":"later"}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "hi");
    }

    #[test]
    fn test_no_text_block_is_empty() {
        assert_eq!(parse_reply(r#"{"content":[]}"#).unwrap(), "");
    }

    #[test]
    fn test_headers() {
        let headers = build_headers("sk-ant").unwrap();
        assert_eq!(headers["x-api-key"], "sk-ant");
        assert_eq!(headers["anthropic-version"], API_VERSION);
    }
}
