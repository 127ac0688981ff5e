//! Minimal chat-completion client.
//!
//! This crate speaks two chat-completion wire formats behind one interface:
//! - OpenAI-style chat completions (system prompt sent as a leading message)
//! - Anthropic-style messages (system prompt sent as a top-level field)
//!
//! The HTTP layer is a [`Transport`] so callers and tests can swap in their own.

mod anthropic;
mod openai;
pub mod testing;
mod transport;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub use transport::{HttpReply, ReqwestTransport, Transport};

/// Errors that can occur when using the chat client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("{provider} API error: {status}")]
    Api {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status carried by a remote error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The chat-completion service a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Anthropic,
}

impl Provider {
    /// Stable identifier used in persisted configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    pub fn parse(value: &str) -> Option<Provider> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "anthropic" => Some(Provider::Anthropic),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "OpenAI"),
            Provider::Anthropic => write!(f, "Anthropic"),
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A plain-text message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Chat-completion client dispatching to one of the two wire formats.
#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn Transport>,
    openai_model: String,
    anthropic_model: String,
    max_tokens: usize,
}

impl ChatClient {
    /// Create a client backed by a real HTTP transport.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()))
    }

    /// Create a client that sends requests through the given transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            openai_model: openai::DEFAULT_MODEL.to_string(),
            anthropic_model: anthropic::DEFAULT_MODEL.to_string(),
            max_tokens: anthropic::DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_openai_model(mut self, model: impl Into<String>) -> Self {
        self.openai_model = model.into();
        self
    }

    pub fn with_anthropic_model(mut self, model: impl Into<String>) -> Self {
        self.anthropic_model = model.into();
        self
    }

    /// Token budget sent with Anthropic requests.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Send the conversation to `provider` and return the reply text.
    pub async fn chat(
        &self,
        provider: Provider,
        api_key: &str,
        messages: &[ChatMessage],
        system: Option<&str>,
    ) -> Result<String, Error> {
        if api_key.is_empty() {
            return Err(Error::NoApiKey);
        }

        let (url, headers, body) = match provider {
            Provider::OpenAi => (
                openai::ENDPOINT,
                openai::build_headers(api_key)?,
                openai::build_request(&self.openai_model, messages, system)?,
            ),
            Provider::Anthropic => (
                anthropic::ENDPOINT,
                anthropic::build_headers(api_key)?,
                anthropic::build_request(&self.anthropic_model, self.max_tokens, messages, system)?,
            ),
        };

        debug!(%provider, messages = messages.len(), "sending chat request");
        let reply = self.transport.post_json(url, headers, body).await?;

        if !reply.is_success() {
            warn!(%provider, status = reply.status, "chat request rejected");
            return Err(Error::Api {
                provider,
                status: reply.status,
                message: reply.body,
            });
        }

        match provider {
            Provider::OpenAi => openai::parse_reply(&reply.body),
            Provider::Anthropic => anthropic::parse_reply(&reply.body),
        }
    }
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use serde_json::json;

    #[test]
    fn test_provider_round_trip() {
        assert_eq!(Provider::parse("OpenAI"), Some(Provider::OpenAi));
        assert_eq!(Provider::parse("anthropic"), Some(Provider::Anthropic));
        assert_eq!(Provider::parse("mistral"), None);
        assert_eq!(
            serde_json::to_string(&Provider::Anthropic).unwrap(),
            "\"anthropic\""
        );
    }

    #[test]
    fn test_message_creation() {
        let msg = ChatMessage::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert_eq!(ChatMessage::system("x").role.as_str(), "system");
    }

    #[tokio::test]
    async fn test_empty_key_never_hits_transport() {
        let transport = MockTransport::new();
        let client = ChatClient::with_transport(Arc::new(transport.clone()));

        let result = client
            .chat(Provider::OpenAi, "", &[ChatMessage::user("Hi")], None)
            .await;

        assert!(matches!(result, Err(Error::NoApiKey)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_error_status_is_tagged_with_provider() {
        let transport = MockTransport::new();
        transport.push_reply(429, json!({"error": "slow down"}));
        let client = ChatClient::with_transport(Arc::new(transport));

        let err = client
            .chat(Provider::OpenAi, "sk-test", &[ChatMessage::user("Hi")], None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(429));
        assert_eq!(err.to_string(), "OpenAI API error: 429");
    }

    #[tokio::test]
    async fn test_anthropic_error_message() {
        let transport = MockTransport::new();
        transport.push_reply(401, json!({}));
        let client = ChatClient::with_transport(Arc::new(transport));

        let err = client
            .chat(Provider::Anthropic, "key", &[ChatMessage::user("Hi")], None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Anthropic API error: 401");
    }

    #[tokio::test]
    async fn test_custom_models_are_sent() {
        let transport = MockTransport::new();
        transport.push_reply(200, json!({"choices": [{"message": {"content": "ok"}}]}));
        let client = ChatClient::with_transport(Arc::new(transport.clone()))
            .with_openai_model("gpt-test");

        client
            .chat(Provider::OpenAi, "sk", &[ChatMessage::user("Hi")], None)
            .await
            .unwrap();

        assert_eq!(transport.requests()[0].body["model"], "gpt-test");
    }
}
