//! Per-game setups linking a library game to dice and timer presets.

use crate::collection::{Collection, Record};
use crate::random::generate_id;
use crate::storage::{keys, Storage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub id: String,
    pub game_id: Option<String>,
    pub game_name: String,
    pub dice_preset_id: Option<String>,
    pub timer_preset_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for GameConfig {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Optional links set when a config is created.
#[derive(Debug, Clone, Default)]
pub struct ConfigLinks {
    pub game_id: Option<String>,
    pub dice_preset_id: Option<String>,
    pub timer_preset_id: Option<String>,
}

/// Preset links use `Some(None)` to unlink.
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
    pub game_name: Option<String>,
    pub dice_preset_id: Option<Option<String>>,
    pub timer_preset_id: Option<Option<String>>,
}

pub struct GameConfigStore {
    storage: Storage,
    configs: Collection<GameConfig>,
    active_id: Option<String>,
}

impl GameConfigStore {
    pub fn load(storage: Storage) -> Self {
        let configs = Collection::load(storage.clone(), keys::GAME_CONFIGS);
        let active_id = storage
            .load_raw(keys::GAME_CONFIGS_ACTIVE)
            .filter(|id| !id.is_empty());
        Self {
            storage,
            configs,
            active_id,
        }
    }

    pub fn all(&self) -> &[GameConfig] {
        self.configs.items()
    }

    pub fn create(&mut self, game_name: &str, links: ConfigLinks) -> GameConfig {
        let now = Utc::now();
        let config = GameConfig {
            id: generate_id(),
            game_id: links.game_id,
            game_name: game_name.trim().to_string(),
            dice_preset_id: links.dice_preset_id,
            timer_preset_id: links.timer_preset_id,
            created_at: now,
            updated_at: now,
        };
        self.configs.insert_front(config.clone());
        self.persist_active();
        config
    }

    pub fn update(&mut self, id: &str, patch: ConfigPatch) -> bool {
        self.configs.modify(id, |config| {
            if let Some(name) = patch.game_name {
                config.game_name = name.trim().to_string();
            }
            if let Some(dice) = patch.dice_preset_id {
                config.dice_preset_id = dice;
            }
            if let Some(timer) = patch.timer_preset_id {
                config.timer_preset_id = timer;
            }
            config.updated_at = Utc::now();
        })
    }

    pub fn delete(&mut self, id: &str) -> bool {
        if self.configs.remove(id).is_none() {
            return false;
        }
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        self.persist_active();
        true
    }

    pub fn activate(&mut self, id: &str) -> Option<&GameConfig> {
        if !self.configs.modify(id, |config| config.updated_at = Utc::now()) {
            return None;
        }
        self.active_id = Some(id.to_string());
        self.persist_active();
        self.configs.find(id)
    }

    pub fn deactivate(&mut self) {
        self.active_id = None;
        self.persist_active();
    }

    pub fn get(&self, id: &str) -> Option<&GameConfig> {
        self.configs.find(id)
    }

    pub fn by_game_id(&self, game_id: &str) -> Option<&GameConfig> {
        self.configs
            .items()
            .iter()
            .find(|config| config.game_id.as_deref() == Some(game_id))
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&GameConfig> {
        self.active_id.as_deref().and_then(|id| self.configs.find(id))
    }

    fn persist_active(&self) {
        match &self.active_id {
            Some(id) => self.storage.save_raw(keys::GAME_CONFIGS_ACTIVE, id),
            None => self.storage.clear(keys::GAME_CONFIGS_ACTIVE),
        }
    }

    pub fn reload(&mut self) {
        self.configs.reload();
        self.active_id = self
            .storage
            .load_raw(keys::GAME_CONFIGS_ACTIVE)
            .filter(|id| !id.is_empty());
    }

    pub fn clear(&mut self) {
        self.configs.clear();
        self.active_id = None;
        self.storage.clear(keys::GAME_CONFIGS_ACTIVE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_create_with_links() {
        let mut store = GameConfigStore::load(Storage::in_memory());
        let config = store.create(
            " Catan ",
            ConfigLinks {
                game_id: Some("g1".to_string()),
                timer_preset_id: Some("t1".to_string()),
                ..ConfigLinks::default()
            },
        );

        assert_eq!(config.game_name, "Catan");
        assert!(config.dice_preset_id.is_none());
        assert_eq!(store.by_game_id("g1").unwrap().id, config.id);
        assert!(store.by_game_id("g2").is_none());
    }

    #[test]
    fn test_patch_unlinks_preset() {
        let mut store = GameConfigStore::load(Storage::in_memory());
        let config = store.create(
            "Catan",
            ConfigLinks {
                dice_preset_id: Some("d1".to_string()),
                ..ConfigLinks::default()
            },
        );

        store.update(
            &config.id,
            ConfigPatch {
                dice_preset_id: Some(None),
                ..ConfigPatch::default()
            },
        );
        assert!(store.get(&config.id).unwrap().dice_preset_id.is_none());
    }

    #[test]
    fn test_activate_persists_pointer() {
        let memory = MemoryStore::new();
        let mut store = GameConfigStore::load(Storage::new(memory.clone()));
        let config = store.create("Catan", ConfigLinks::default());

        assert!(store.activate("ghost").is_none());
        assert!(store.activate(&config.id).is_some());
        assert_eq!(
            memory.raw(keys::GAME_CONFIGS_ACTIVE).as_deref(),
            Some(config.id.as_str())
        );

        store.deactivate();
        assert!(store.active().is_none());
        assert!(memory.raw(keys::GAME_CONFIGS_ACTIVE).is_none());
    }

    #[test]
    fn test_delete_active_clears_pointer() {
        let mut store = GameConfigStore::load(Storage::in_memory());
        let config = store.create("Catan", ConfigLinks::default());
        store.activate(&config.id);

        assert!(store.delete(&config.id));
        assert!(store.active_id().is_none());
        assert!(!store.delete(&config.id));
    }
}
