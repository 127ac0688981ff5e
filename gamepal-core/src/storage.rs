//! Key-value persistence for every store.
//!
//! Values are JSON text under `gamepal-*` keys. Reads never fail: a missing
//! backend, a missing key, or a record that no longer decodes into the
//! expected type all yield the caller's default. Write failures are logged and
//! swallowed so the in-memory state stays authoritative for the session.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Storage keys used by the application.
pub mod keys {
    pub const PLAYERS: &str = "gamepal-players";
    pub const TEAMS: &str = "gamepal-teams";
    pub const LIBRARY: &str = "gamepal-library";
    pub const RULES: &str = "gamepal-rules";
    pub const GAME_SESSIONS: &str = "gamepal-game-sessions";
    pub const GAME_SESSIONS_CURRENT: &str = "gamepal-game-sessions-current";
    pub const SCORE_SESSIONS: &str = "gamepal-score-sessions";
    pub const GAME_CONFIGS: &str = "gamepal-game-configs";
    pub const GAME_CONFIGS_ACTIVE: &str = "gamepal-game-configs-active";
    pub const DICE_PRESETS: &str = "gamepal-dice-presets";
    pub const TIMER_PRESETS: &str = "gamepal-timer-presets";
    pub const AI_CONFIG: &str = "gamepal-ai-config";
    pub const SETTINGS: &str = "gamepal-settings";
    pub const THEME: &str = "gamepal-theme";
    pub const TTS_VOICE: &str = "gamepal-tts-voice";
    pub const TTS_RATE: &str = "gamepal-tts-rate";

    /// Every key, in the order "clear data" removes them.
    pub const ALL: &[&str] = &[
        PLAYERS,
        TEAMS,
        LIBRARY,
        RULES,
        GAME_SESSIONS,
        GAME_SESSIONS_CURRENT,
        SCORE_SESSIONS,
        GAME_CONFIGS,
        GAME_CONFIGS_ACTIVE,
        DICE_PRESETS,
        TIMER_PRESETS,
        AI_CONFIG,
        SETTINGS,
        THEME,
        TTS_VOICE,
        TTS_RATE,
    ];
}

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage quota exceeded writing {key}")]
    QuotaExceeded { key: String },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// A string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, String>,
    reject_writes: bool,
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent write fail as if the quota were exhausted.
    pub fn reject_writes(&self, reject: bool) {
        self.state().reject_writes = reject;
    }

    /// Raw text stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.state().entries.get(key).cloned()
    }

    /// Write raw text, bypassing the write rejection switch.
    pub fn put_raw(&self, key: &str, value: &str) {
        self.state()
            .entries
            .insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.state().entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.state();
        if state.reject_writes {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
            });
        }
        state.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.state().entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path_for(key)?, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Shared handle to the active backend, or to none at all.
#[derive(Clone, Default)]
pub struct Storage {
    backend: Option<Arc<dyn KeyValueStore>>,
}

impl Storage {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Some(Arc::new(backend)),
        }
    }

    /// A handle with no backend: every load yields the default, every write is dropped.
    pub fn detached() -> Self {
        Self { backend: None }
    }

    /// Fresh in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    /// Decode the JSON stored under `key`, or return `default`.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(raw) = self.load_raw(key) else {
            return default;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "stored value does not decode; using default");
                default
            }
        }
    }

    /// Serialize `value` as JSON under `key`. Failures are logged, never returned.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.save_raw(key, &json),
            Err(err) => warn!(key, error = %err, "failed to encode value for storage"),
        }
    }

    /// Raw text stored under `key`, if the backend has any.
    pub fn load_raw(&self, key: &str) -> Option<String> {
        let backend = self.backend.as_ref()?;
        match backend.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "failed to read from storage");
                None
            }
        }
    }

    pub fn save_raw(&self, key: &str, value: &str) {
        let Some(backend) = &self.backend else {
            debug!(key, "no storage backend; dropping write");
            return;
        };
        if let Err(err) = backend.set(key, value) {
            warn!(key, error = %err, "failed to write to storage");
        }
    }

    /// Remove the entry under `key`.
    pub fn clear(&self, key: &str) {
        let Some(backend) = &self.backend else {
            return;
        };
        if let Err(err) = backend.remove(key) {
            warn!(key, error = %err, "failed to remove from storage");
        }
    }
}

/// A single value mirrored in storage under one key.
pub struct Persisted<T> {
    key: &'static str,
    storage: Storage,
    default: T,
    value: T,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Load the value under `key`, falling back to `default`.
    pub fn load(storage: Storage, key: &'static str, default: T) -> Self {
        let value = storage.load(key, default.clone());
        Self {
            key,
            storage,
            default,
            value,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value and write it through.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.save();
    }

    /// Mutate the value in place and write it through.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.value);
        self.save();
    }

    pub fn save(&self) {
        self.storage.save(self.key, &self.value);
    }

    /// Re-read the value from storage.
    pub fn reload(&mut self) {
        self.value = self.storage.load(self.key, self.default.clone());
    }

    /// Remove the stored entry and reset to the default.
    pub fn clear(&mut self) {
        self.storage.clear(self.key);
        self.value = self.default.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    fn sample() -> Sample {
        Sample {
            name: "test".to_string(),
            count: 0,
        }
    }

    #[test]
    fn test_missing_key_yields_default() {
        let storage = Storage::in_memory();
        assert_eq!(storage.load("gamepal-missing", 7u32), 7);
    }

    #[test]
    fn test_save_then_load() {
        let storage = Storage::in_memory();
        storage.save("gamepal-sample", &vec![1, 2, 3]);
        assert_eq!(storage.load::<Vec<i32>>("gamepal-sample", vec![]), vec![1, 2, 3]);
    }

    #[test]
    fn test_corrupt_json_yields_default() {
        let memory = MemoryStore::new();
        memory.put_raw("gamepal-sample", "{not json");
        let storage = Storage::new(memory);

        assert_eq!(storage.load("gamepal-sample", sample()), sample());
    }

    #[test]
    fn test_stale_shape_yields_default() {
        let memory = MemoryStore::new();
        memory.put_raw("gamepal-sample", r#"{"name": 5, "count": "many"}"#);
        let storage = Storage::new(memory);

        assert_eq!(storage.load("gamepal-sample", sample()), sample());
    }

    #[test]
    fn test_detached_storage() {
        let storage = Storage::detached();
        storage.save("gamepal-sample", &sample());
        assert!(!storage.is_attached());
        assert_eq!(storage.load_raw("gamepal-sample"), None);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let memory = MemoryStore::new();
        memory.reject_writes(true);
        let storage = Storage::new(memory.clone());

        storage.save("gamepal-sample", &sample());
        assert!(memory.is_empty());
    }

    #[test]
    fn test_persisted_clear_resets_default() {
        let memory = MemoryStore::new();
        let storage = Storage::new(memory.clone());
        let mut persisted = Persisted::load(storage, "gamepal-sample", sample());

        persisted.update(|s| s.count = 3);
        assert_eq!(persisted.get().count, 3);
        assert!(memory.raw("gamepal-sample").is_some());

        persisted.clear();
        assert_eq!(persisted.get(), &sample());
        assert!(memory.raw("gamepal-sample").is_none());
    }

    #[test]
    fn test_persisted_reload_sees_external_write() {
        let memory = MemoryStore::new();
        let storage = Storage::new(memory.clone());
        let mut persisted = Persisted::load(storage, "gamepal-sample", sample());

        memory.put_raw("gamepal-sample", r#"{"name":"other","count":9}"#);
        persisted.reload();
        assert_eq!(persisted.get().name, "other");
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FileStore::open(dir.path().join("data")).expect("open should succeed");

        assert_eq!(store.get("gamepal-players").unwrap(), None);
        store.set("gamepal-players", "[]").unwrap();
        assert_eq!(store.get("gamepal-players").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("data/gamepal-players.json").exists());

        store.remove("gamepal-players").unwrap();
        store.remove("gamepal-players").unwrap();
        assert_eq!(store.get("gamepal-players").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_all_keys_are_prefixed() {
        assert!(keys::ALL.iter().all(|k| k.starts_with("gamepal-")));
    }
}
