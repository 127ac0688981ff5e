//! Saved timer durations.

use crate::collection::{Collection, Record};
use crate::random::generate_id;
use crate::storage::{keys, Storage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerPreset {
    pub id: String,
    pub name: String,
    pub duration: u32,
    pub game: Option<String>,
}

impl Record for TimerPreset {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimerPresetPatch {
    pub name: Option<String>,
    pub duration: Option<u32>,
    pub game: Option<Option<String>>,
}

pub struct TimerPresetStore {
    presets: Collection<TimerPreset>,
}

impl TimerPresetStore {
    pub fn load(storage: Storage) -> Self {
        Self {
            presets: Collection::load(storage, keys::TIMER_PRESETS),
        }
    }

    pub fn all(&self) -> &[TimerPreset] {
        self.presets.items()
    }

    pub fn add(&mut self, name: &str, duration: u32, game: Option<&str>) -> TimerPreset {
        let preset = TimerPreset {
            id: generate_id(),
            name: name.to_string(),
            duration,
            game: game.map(str::to_string),
        };
        self.presets.insert_back(preset.clone());
        preset
    }

    pub fn update(&mut self, id: &str, patch: TimerPresetPatch) -> bool {
        self.presets.modify(id, |preset| {
            if let Some(name) = patch.name {
                preset.name = name;
            }
            if let Some(duration) = patch.duration {
                preset.duration = duration;
            }
            if let Some(game) = patch.game {
                preset.game = game;
            }
        })
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.presets.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&TimerPreset> {
        self.presets.find(id)
    }

    pub fn reload(&mut self) {
        self.presets.reload();
    }

    pub fn clear(&mut self) {
        self.presets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_persist() {
        let storage = Storage::in_memory();
        let mut store = TimerPresetStore::load(storage.clone());
        let blitz = store.add("Blitz", 60, Some("Chess"));
        store.add("Slow", 600, None);

        assert!(store.update(
            &blitz.id,
            TimerPresetPatch {
                duration: Some(90),
                ..TimerPresetPatch::default()
            }
        ));

        let reopened = TimerPresetStore::load(storage);
        assert_eq!(reopened.all().len(), 2);
        assert_eq!(reopened.get(&blitz.id).unwrap().duration, 90);
        assert_eq!(reopened.get(&blitz.id).unwrap().game.as_deref(), Some("Chess"));
    }

    #[test]
    fn test_delete_unknown() {
        let mut store = TimerPresetStore::load(Storage::in_memory());
        assert!(!store.delete("ghost"));
    }
}
