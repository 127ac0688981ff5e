//! Saved dice trays.

use crate::collection::{Collection, Record};
use crate::dice::{CustomDie, DieType};
use crate::random::generate_id;
use crate::storage::{keys, Storage};
use serde::{Deserialize, Serialize};

/// `count` copies of one standard die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardDice {
    #[serde(rename = "type")]
    pub die: DieType,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DicePreset {
    pub id: String,
    pub name: String,
    pub standard_dice: Vec<StandardDice>,
    pub custom_dice: Vec<CustomDie>,
}

impl Record for DicePreset {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct DicePresetPatch {
    pub name: Option<String>,
    pub standard_dice: Option<Vec<StandardDice>>,
    pub custom_dice: Option<Vec<CustomDie>>,
}

pub struct DicePresetStore {
    presets: Collection<DicePreset>,
}

impl DicePresetStore {
    pub fn load(storage: Storage) -> Self {
        Self {
            presets: Collection::load(storage, keys::DICE_PRESETS),
        }
    }

    pub fn all(&self) -> &[DicePreset] {
        self.presets.items()
    }

    pub fn add(
        &mut self,
        name: &str,
        standard_dice: Vec<StandardDice>,
        custom_dice: Vec<CustomDie>,
    ) -> DicePreset {
        let preset = DicePreset {
            id: generate_id(),
            name: name.trim().to_string(),
            standard_dice,
            custom_dice,
        };
        self.presets.insert_back(preset.clone());
        preset
    }

    pub fn update(&mut self, id: &str, patch: DicePresetPatch) -> bool {
        self.presets.modify(id, |preset| {
            if let Some(name) = patch.name {
                preset.name = name.trim().to_string();
            }
            if let Some(dice) = patch.standard_dice {
                preset.standard_dice = dice;
            }
            if let Some(dice) = patch.custom_dice {
                preset.custom_dice = dice;
            }
        })
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.presets.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&DicePreset> {
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
    use crate::dice::CustomDieFace;

    #[test]
    fn test_standard_dice_serialize_as_face_count() {
        let dice = StandardDice {
            die: DieType::D20,
            count: 2,
        };
        let json = serde_json::to_value(dice).unwrap();
        assert_eq!(json, serde_json::json!({"type": 20, "count": 2}));
    }

    #[test]
    fn test_preset_crud() {
        let mut store = DicePresetStore::load(Storage::in_memory());
        let color_die = CustomDie::new(
            "Colors",
            vec![CustomDieFace::new("red"), CustomDieFace::new("blue")],
        );
        let preset = store.add(
            "Catan",
            vec![StandardDice {
                die: DieType::D6,
                count: 2,
            }],
            vec![color_die],
        );

        assert_eq!(store.get(&preset.id), Some(&preset));
        assert!(store.update(
            &preset.id,
            DicePresetPatch {
                name: Some("Catan (C&K)".to_string()),
                ..DicePresetPatch::default()
            }
        ));
        assert_eq!(store.get(&preset.id).unwrap().name, "Catan (C&K)");
        assert_eq!(store.get(&preset.id).unwrap().custom_dice.len(), 1);

        assert!(store.delete(&preset.id));
        assert!(store.all().is_empty());
    }

    #[test]
    fn test_unknown_die_type_in_storage_falls_back() {
        let memory = crate::storage::MemoryStore::new();
        memory.put_raw(
            keys::DICE_PRESETS,
            r#"[{"id":"x","name":"Odd","standardDice":[{"type":7,"count":1}],"customDice":[]}]"#,
        );
        let store = DicePresetStore::load(Storage::new(memory));
        assert!(store.all().is_empty());
    }
}
