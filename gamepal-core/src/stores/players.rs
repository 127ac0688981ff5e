//! Player roster.

use crate::collection::{Collection, Record};
use crate::colors::color_by_index;
use crate::random::generate_id;
use crate::storage::{keys, Storage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Record for Player {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Fields to change on a player; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct PlayerPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub avatar: Option<String>,
}

impl PlayerPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

pub struct PlayerStore {
    players: Collection<Player>,
}

impl PlayerStore {
    pub fn load(storage: Storage) -> Self {
        Self {
            players: Collection::load(storage, keys::PLAYERS),
        }
    }

    pub fn all(&self) -> &[Player] {
        self.players.items()
    }

    /// Add a player. Without a color, the palette entry at the current count is used.
    pub fn add(&mut self, name: &str, color: Option<&str>) -> Player {
        let player = Player {
            id: generate_id(),
            name: name.trim().to_string(),
            color: color
                .map(str::to_string)
                .unwrap_or_else(|| color_by_index(self.players.len()).to_string()),
            avatar: None,
        };
        self.players.insert_back(player.clone());
        player
    }

    pub fn update(&mut self, id: &str, patch: PlayerPatch) -> bool {
        self.players.modify(id, |player| {
            if let Some(name) = patch.name {
                player.name = name.trim().to_string();
            }
            if let Some(color) = patch.color {
                player.color = color;
            }
            if let Some(avatar) = patch.avatar {
                player.avatar = Some(avatar);
            }
        })
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.players.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.find(id)
    }

    /// Players for `ids` in the given order; unknown ids are skipped.
    pub fn get_many(&self, ids: &[String]) -> Vec<&Player> {
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn reload(&mut self) {
        self.players.reload();
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}
