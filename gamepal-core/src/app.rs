//! The application container owning every store.

use crate::assistant::Assistant;
use crate::preferences::{
    Document, LocaleStore, MemoryDocument, SettingsStore, SpeechPrefs, ThemeStore,
};
use crate::storage::{keys, Storage};
use crate::stores::{
    DicePresetStore, GameConfigStore, GameSessionStore, LibraryStore, PlayerStore, RuleStore,
    ScoreSessionStore, TeamStore,
};
use crate::timer::{TimerEngine, TimerPresetStore};
use chat::ChatClient;
use std::sync::Arc;
use tracing::info;

/// All application state, hydrated once from storage.
pub struct Gamepal {
    storage: Storage,
    pub players: PlayerStore,
    pub teams: TeamStore,
    pub library: LibraryStore,
    pub rules: RuleStore,
    pub game_sessions: GameSessionStore,
    pub score_sessions: ScoreSessionStore,
    pub game_configs: GameConfigStore,
    pub dice_presets: DicePresetStore,
    pub timer_presets: TimerPresetStore,
    pub timers: TimerEngine,
    pub assistant: Assistant,
    pub settings: SettingsStore,
    pub theme: ThemeStore,
    pub locale: LocaleStore,
    pub speech: SpeechPrefs,
}

impl Gamepal {
    pub fn open(storage: Storage, document: Arc<dyn Document>, client: ChatClient) -> Self {
        Self {
            players: PlayerStore::load(storage.clone()),
            teams: TeamStore::load(storage.clone()),
            library: LibraryStore::load(storage.clone()),
            rules: RuleStore::load(storage.clone()),
            game_sessions: GameSessionStore::load(storage.clone()),
            score_sessions: ScoreSessionStore::load(storage.clone()),
            game_configs: GameConfigStore::load(storage.clone()),
            dice_presets: DicePresetStore::load(storage.clone()),
            timer_presets: TimerPresetStore::load(storage.clone()),
            timers: TimerEngine::new(),
            assistant: Assistant::load(storage.clone(), client),
            settings: SettingsStore::load(storage.clone(), Arc::clone(&document)),
            theme: ThemeStore::load(storage.clone(), Arc::clone(&document)),
            locale: LocaleStore::load(document),
            speech: SpeechPrefs::load(storage.clone()),
            storage,
        }
    }

    /// Fresh in-memory state with the real chat client.
    pub fn in_memory() -> Self {
        Self::open(
            Storage::in_memory(),
            Arc::new(MemoryDocument::new()),
            ChatClient::new(),
        )
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Delete a player and drop them from every team.
    pub fn delete_player(&mut self, id: &str) -> bool {
        if !self.players.delete(id) {
            return false;
        }
        self.teams.remove_player_everywhere(id);
        true
    }

    /// Discard in-memory state and re-read everything from storage.
    pub fn reset(&mut self) {
        self.timers.clear_all();
        self.players.reload();
        self.teams.reload();
        self.library.reload();
        self.rules.reload();
        self.game_sessions.reload();
        self.score_sessions.reload();
        self.game_configs.reload();
        self.dice_presets.reload();
        self.timer_presets.reload();
        self.assistant.reload();
        self.settings.reload();
        self.theme.reload();
        self.locale.reload();
        self.speech.reload();
    }

    /// Remove every stored key and return all stores to their defaults.
    pub fn clear_all_data(&mut self) {
        self.timers.clear_all();
        self.players.clear();
        self.teams.clear();
        self.library.clear();
        self.rules.clear();
        self.game_sessions.clear();
        self.score_sessions.clear();
        self.game_configs.clear();
        self.dice_presets.clear();
        self.timer_presets.clear();
        self.assistant.clear();
        self.settings.clear();
        self.theme.clear();
        self.speech.clear();
        for key in keys::ALL {
            self.storage.clear(key);
        }
        info!("cleared all stored data");
    }
}
