//! Testing utilities for code built on gamepal-core.
//!
//! This module provides:
//! - `TestHarness`, a [`Gamepal`] over in-memory storage, a recording
//!   document and a scripted chat transport
//! - Reply builders for both chat wire formats
//! - Assertion helpers for common store invariants

use crate::app::Gamepal;
use crate::preferences::MemoryDocument;
use crate::storage::{MemoryStore, Storage};
use chat::testing::MockTransport;
use chat::{ChatClient, Provider};
use serde_json::{json, Value};
use std::sync::Arc;

/// A successful OpenAI-style reply carrying `text`.
pub fn openai_reply(text: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
}

/// A successful Anthropic-style reply carrying `text`.
pub fn anthropic_reply(text: &str) -> Value {
    json!({ "content": [{ "type": "text", "text": text }] })
}

/// A full application wired to inspectable fakes.
pub struct TestHarness {
    pub app: Gamepal,
    pub memory: MemoryStore,
    pub document: MemoryDocument,
    pub transport: MockTransport,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_memory(MemoryStore::new())
    }

    /// Build over existing storage, e.g. to check what survives a restart.
    pub fn with_memory(memory: MemoryStore) -> Self {
        let document = MemoryDocument::new();
        let transport = MockTransport::new();
        let app = Gamepal::open(
            Storage::new(memory.clone()),
            Arc::new(document.clone()),
            ChatClient::with_transport(Arc::new(transport.clone())),
        );
        Self {
            app,
            memory,
            document,
            transport,
        }
    }

    /// Select `provider` and give it a key.
    pub fn configure_ai(&mut self, provider: Provider, key: &str) -> &mut Self {
        self.app.assistant.set_provider(provider);
        self.app.assistant.set_api_key(provider, key);
        self
    }

    /// Queue a successful reply in the configured provider's format.
    pub fn expect_reply(&mut self, text: &str) -> &mut Self {
        let body = match self.app.assistant.config().provider {
            Provider::OpenAi => openai_reply(text),
            Provider::Anthropic => anthropic_reply(text),
        };
        self.transport.push_reply(200, body);
        self
    }

    /// Re-open the application over the same storage.
    pub fn restart(self) -> Self {
        Self::with_memory(self.memory)
    }

    /// Parse the JSON stored under `key`.
    pub fn stored(&self, key: &str) -> Option<Value> {
        self.memory
            .raw(key)
            .and_then(|raw| serde_json::from_str(&raw).ok())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that no player id appears in more than one team.
pub fn assert_exclusive_teams(app: &Gamepal) {
    let mut seen = std::collections::HashSet::new();
    for team in app.teams.all() {
        for id in &team.player_ids {
            assert!(
                seen.insert(id.as_str()),
                "Player {id} is in more than one team"
            );
        }
    }
}

/// Assert every score column's total equals the sum of its rounds.
pub fn assert_score_totals(app: &Gamepal) {
    for session in app.score_sessions.all() {
        for player in &session.players {
            assert_eq!(
                player.total,
                player.scores.iter().sum::<i64>(),
                "Total for {} in {} is out of sync",
                player.name,
                session.name
            );
        }
    }
}

/// Assert at most one timer is running.
pub fn assert_single_running_timer(app: &Gamepal) {
    let running = app.timers.snapshot().iter().filter(|t| t.is_running).count();
    assert!(running <= 1, "Expected at most one running timer, found {running}");
}
