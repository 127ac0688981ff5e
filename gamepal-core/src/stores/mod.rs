//! Entity stores, one per persisted family.
//!
//! Stores never fail: unknown ids are no-ops (`false` from mutators, `None`
//! from getters) and storage problems are logged by [`crate::storage`].

pub mod dice_presets;
pub mod game_configs;
pub mod game_sessions;
pub mod library;
pub mod players;
pub mod rules;
pub mod score_sessions;
pub mod teams;

pub use dice_presets::{DicePreset, DicePresetPatch, DicePresetStore, StandardDice};
pub use game_configs::{ConfigLinks, ConfigPatch, GameConfig, GameConfigStore};
pub use game_sessions::{GameSession, GameSessionStore, SessionPatch};
pub use library::{
    Game, GameFilters, GamePatch, LibraryStats, LibraryStore, LoanHistoryEntry, NewGame,
};
pub use players::{Player, PlayerPatch, PlayerStore};
pub use rules::{NewRule, Rule, RulePatch, RuleSource, RuleStore};
pub use score_sessions::{ScoreOptions, ScorePlayer, ScoreSession, ScoreSessionStore};
pub use teams::{Team, TeamPatch, TeamStore};
