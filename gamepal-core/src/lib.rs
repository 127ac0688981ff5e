//! Board game companion engine.
//!
//! This crate provides:
//! - Persisted stores for players, teams, the game library, rules, sessions,
//!   score sheets, per-game configs and dice/timer presets
//! - A countdown timer engine with at most one timer running
//! - An AI rules assistant over OpenAI- or Anthropic-style chat APIs
//! - Display, theme, language and speech preferences
//! - Dice rolling and a random player picker
//!
//! # Quick Start
//!
//! ```ignore
//! use gamepal_core::{FileStore, Gamepal, MemoryDocument, Storage};
//! use std::sync::Arc;
//!
//! let storage = Storage::new(FileStore::open("gamepal-data")?);
//! let mut app = Gamepal::open(storage, Arc::new(MemoryDocument::new()), chat::ChatClient::new());
//!
//! let alice = app.players.add("Alice", None);
//! let sheet = app.score_sessions.create("Game Night", &["Alice", "Bob"], Default::default());
//! app.score_sessions.update_player_score(&sheet.id, &sheet.players[0].id, 1, 7);
//! ```

pub mod app;
pub mod assistant;
pub mod collection;
pub mod colors;
pub mod dice;
pub mod ocr;
pub mod picker;
pub mod preferences;
pub mod random;
pub mod speech;
pub mod storage;
pub mod stores;
pub mod testing;
pub mod timer;

// Primary public API
pub use app::Gamepal;
pub use assistant::{AiConfig, Assistant, AssistantError, ChatStatus};
pub use dice::{DiceError, DiceExpression, DiceTray, DieType};
pub use picker::Roster;
pub use preferences::{Document, MemoryDocument};
pub use storage::{FileStore, KeyValueStore, MemoryStore, Storage, StorageError};
pub use testing::TestHarness;
pub use timer::{TimerEngine, TimerStatus};
