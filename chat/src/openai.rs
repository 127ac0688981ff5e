//! OpenAI-style chat completions.

use crate::{ChatMessage, Error};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

pub(crate) const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub(crate) const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub(crate) fn build_headers(api_key: &str) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
    );
    Ok(headers)
}

/// The system prompt, when present, leads the conversation as a `system` message.
pub(crate) fn build_request(
    model: &str,
    messages: &[ChatMessage],
    system: Option<&str>,
) -> Result<serde_json::Value, Error> {
    let mut api_messages = Vec::with_capacity(messages.len() + 1);
    if let Some(system) = system.filter(|s| !s.is_empty()) {
        api_messages.push(ApiMessage {
            role: "system",
            content: system,
        });
    }
    api_messages.extend(messages.iter().map(|m| ApiMessage {
        role: m.role.as_str(),
        content: &m.content,
    }));

    let request = ApiRequest {
        model,
        messages: api_messages,
    };
    serde_json::to_value(&request).map_err(|e| Error::Config(e.to_string()))
}

pub(crate) fn parse_reply(body: &str) -> Result<String, Error> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| Error::Parse("response contained no choices".to_string()))
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_leads() {
        let body = build_request(
            "gpt-4o-mini",
            &[ChatMessage::user("How many cards?")],
            Some("You explain board game rules."),
        )
        .unwrap();

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "You explain board game rules.");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(body["model"], "gpt-4o-mini");
    }

    #[test]
    fn test_no_system_prompt() {
        let body = build_request("m", &[ChatMessage::user("Hi")], None).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_first_choice() {
        let text = parse_reply(r#"{"choices":[{"message":{"content":"hi"}},{"message":{"content":"no"}}]}"#)
            .unwrap();
        assert_eq!(text, "hi");
    }

    #[test]
    fn test_parse_empty_choices() {
        let err = parse_reply(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_bearer_header() {
        let headers = build_headers("sk-test").unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer sk-test");
    }
}
