//! The AI rules assistant: provider choice and keys, plus request status.

use crate::storage::{keys, Persisted, Storage};
use chat::{ChatClient, ChatMessage, Provider};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("AI is not configured")]
    NotConfigured,

    #[error(transparent)]
    Chat(#[from] chat::Error),
}

/// Stored provider preference and one key per provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    pub provider: Provider,
    pub openai_key: Option<String>,
    pub anthropic_key: Option<String>,
}

impl AiConfig {
    pub fn key_for(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai_key.as_deref(),
            Provider::Anthropic => self.anthropic_key.as_deref(),
        }
    }

    /// The selected provider's key, if it is non-empty.
    pub fn active_key(&self) -> Option<&str> {
        self.key_for(self.provider).filter(|key| !key.is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.active_key().is_some()
    }
}

/// Observable request state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatStatus {
    pub is_loading: bool,
    pub last_error: Option<String>,
}

/// Clears `is_loading` however the request ends, including cancellation.
struct LoadingGuard<'a>(&'a watch::Sender<ChatStatus>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|status| status.is_loading = false);
    }
}

pub struct Assistant {
    config: Persisted<AiConfig>,
    client: ChatClient,
    status: watch::Sender<ChatStatus>,
}

impl Assistant {
    pub fn load(storage: Storage, client: ChatClient) -> Self {
        let (status, _) = watch::channel(ChatStatus::default());
        Self {
            config: Persisted::load(storage, keys::AI_CONFIG, AiConfig::default()),
            client,
            status,
        }
    }

    pub fn config(&self) -> &AiConfig {
        self.config.get()
    }

    pub fn set_provider(&mut self, provider: Provider) {
        self.config.update(|config| config.provider = provider);
    }

    pub fn set_api_key(&mut self, provider: Provider, key: &str) {
        let key = key.to_string();
        self.config.update(|config| match provider {
            Provider::OpenAi => config.openai_key = Some(key),
            Provider::Anthropic => config.anthropic_key = Some(key),
        });
    }

    pub fn is_configured(&self) -> bool {
        self.config.get().is_configured()
    }

    pub fn active_key(&self) -> Option<&str> {
        self.config.get().active_key()
    }

    /// Current request state.
    pub fn status(&self) -> ChatStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatStatus> {
        self.status.subscribe()
    }

    /// Send `messages` to the configured provider.
    ///
    /// Fails with [`AssistantError::NotConfigured`] before touching the network
    /// when the selected provider has no key.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
    ) -> Result<String, AssistantError> {
        let config = self.config.get();
        let Some(key) = config.active_key() else {
            return Err(AssistantError::NotConfigured);
        };
        let provider = config.provider;

        self.status.send_modify(|status| {
            status.is_loading = true;
            status.last_error = None;
        });
        let _loading = LoadingGuard(&self.status);

        match self.client.chat(provider, key, messages, system).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                warn!(%provider, error = %err, "assistant request failed");
                let message = err.to_string();
                self.status
                    .send_modify(|status| status.last_error = Some(message));
                Err(err.into())
            }
        }
    }

    /// Round-trip a trivial prompt. Any failure reads as `false`.
    pub async fn test_connection(&self) -> bool {
        let ok = self
            .chat(&[ChatMessage::user("Say \"ok\"")], None)
            .await
            .is_ok();
        info!(ok, provider = %self.config.get().provider, "tested AI connection");
        ok
    }

    /// Ask a rules question about `game`.
    pub async fn ask_rules(&self, game: &str, question: &str) -> Result<String, AssistantError> {
        let system = rules_prompt(game);
        self.chat(&[ChatMessage::user(question)], Some(&system))
            .await
    }

    pub fn reload(&mut self) {
        self.config.reload();
        self.status.send_replace(ChatStatus::default());
    }

    pub fn clear(&mut self) {
        self.config.clear();
        self.status.send_replace(ChatStatus::default());
    }
}

/// System prompt for rules questions about `game`.
pub fn rules_prompt(game: &str) -> String {
    let game = game.trim();
    if game.is_empty() {
        return "You are a helpful board game rules expert. Answer rules questions clearly \
                and concisely. If a rule is ambiguous, say so and give the most common \
                interpretation."
            .to_string();
    }
    format!(
        "You are a helpful board game rules expert for the game \"{game}\". Answer rules \
         questions clearly and concisely, citing the relevant rule when you can. If a rule \
         is ambiguous, say so and give the most common interpretation."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_key_follows_provider() {
        let mut config = AiConfig {
            provider: Provider::OpenAi,
            openai_key: Some(String::new()),
            anthropic_key: Some("sk-ant".to_string()),
        };
        assert!(!config.is_configured());

        config.provider = Provider::Anthropic;
        assert_eq!(config.active_key(), Some("sk-ant"));
    }

    #[test]
    fn test_config_storage_shape() {
        let config = AiConfig {
            provider: Provider::Anthropic,
            openai_key: None,
            anthropic_key: Some("k".to_string()),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"provider": "anthropic", "openaiKey": null, "anthropicKey": "k"})
        );
    }

    #[test]
    fn test_api_key_stored_as_given() {
        let storage = Storage::in_memory();
        let mut assistant = Assistant::load(storage.clone(), ChatClient::new());
        assistant.set_api_key(Provider::OpenAi, " sk-test\n");
        assert_eq!(assistant.config().openai_key.as_deref(), Some(" sk-test\n"));

        let reloaded = Assistant::load(storage, ChatClient::new());
        assert_eq!(reloaded.config().key_for(Provider::OpenAi), Some(" sk-test\n"));
    }

    #[test]
    fn test_rules_prompt_names_game() {
        assert!(rules_prompt("Catan").contains("\"Catan\""));
        assert!(!rules_prompt("  ").contains('"'));
    }
}
