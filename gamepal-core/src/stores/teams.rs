//! Teams and team membership.
//!
//! A player belongs to at most one team; moving a player into a team removes
//! them from every other team first.

use crate::collection::{Collection, Record};
use crate::colors::color_by_index;
use crate::random::generate_id;
use crate::storage::{keys, Storage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub color: String,
    pub player_ids: Vec<String>,
}

impl Record for Team {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    /// Replaces the member list. Members are removed from other teams.
    pub player_ids: Option<Vec<String>>,
}

pub struct TeamStore {
    teams: Collection<Team>,
}

impl TeamStore {
    pub fn load(storage: Storage) -> Self {
        Self {
            teams: Collection::load(storage, keys::TEAMS),
        }
    }

    pub fn all(&self) -> &[Team] {
        self.teams.items()
    }

    pub fn add(&mut self, name: &str, color: Option<&str>) -> Team {
        let team = Team {
            id: generate_id(),
            name: name.trim().to_string(),
            color: color
                .map(str::to_string)
                .unwrap_or_else(|| color_by_index(self.teams.len()).to_string()),
            player_ids: Vec::new(),
        };
        self.teams.insert_back(team.clone());
        team
    }

    pub fn update(&mut self, id: &str, patch: TeamPatch) -> bool {
        if self.teams.find(id).is_none() {
            return false;
        }

        let TeamPatch {
            name,
            color,
            player_ids,
        } = patch;

        self.teams.modify_all(|team| {
            if team.id == id {
                if let Some(name) = &name {
                    team.name = name.trim().to_string();
                }
                if let Some(color) = &color {
                    team.color = color.clone();
                }
                if let Some(ids) = &player_ids {
                    let mut members = Vec::with_capacity(ids.len());
                    for pid in ids {
                        if !members.contains(pid) {
                            members.push(pid.clone());
                        }
                    }
                    team.player_ids = members;
                }
            } else if let Some(ids) = &player_ids {
                team.player_ids.retain(|pid| !ids.contains(pid));
            }
        });
        true
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.teams.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Team> {
        self.teams.find(id)
    }

    /// Move `player_id` into `team_id`. No-op if the team is unknown or already holds them.
    pub fn add_player(&mut self, team_id: &str, player_id: &str) -> bool {
        match self.teams.find(team_id) {
            Some(team) if !team.player_ids.iter().any(|p| p == player_id) => {}
            _ => return false,
        }

        self.teams.modify_all(|team| {
            team.player_ids.retain(|p| p != player_id);
            if team.id == team_id {
                team.player_ids.push(player_id.to_string());
            }
        });
        true
    }

    pub fn remove_player(&mut self, team_id: &str, player_id: &str) -> bool {
        let holds = self
            .teams
            .find(team_id)
            .is_some_and(|team| team.player_ids.iter().any(|p| p == player_id));
        if !holds {
            return false;
        }
        self.teams
            .modify(team_id, |team| team.player_ids.retain(|p| p != player_id))
    }

    pub fn remove_player_everywhere(&mut self, player_id: &str) {
        self.teams
            .modify_all(|team| team.player_ids.retain(|p| p != player_id));
    }

    /// The team currently holding `player_id`.
    pub fn team_of(&self, player_id: &str) -> Option<&Team> {
        self.teams
            .items()
            .iter()
            .find(|team| team.player_ids.iter().any(|p| p == player_id))
    }

    pub fn reload(&mut self) {
        self.teams.reload();
    }

    pub fn clear(&mut self) {
        self.teams.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memberships(store: &TeamStore, player: &str) -> usize {
        store
            .all()
            .iter()
            .filter(|t| t.player_ids.iter().any(|p| p == player))
            .count()
    }

    #[test]
    fn test_moving_player_keeps_single_membership() {
        let mut store = TeamStore::load(Storage::in_memory());
        let red = store.add("Red", None);
        let blue = store.add("Blue", None);

        assert!(store.add_player(&red.id, "p1"));
        assert!(store.add_player(&blue.id, "p1"));

        assert_eq!(memberships(&store, "p1"), 1);
        assert_eq!(store.team_of("p1").unwrap().id, blue.id);
        assert!(store.get(&red.id).unwrap().player_ids.is_empty());
    }

    #[test]
    fn test_add_player_idempotent_and_unknown_team() {
        let mut store = TeamStore::load(Storage::in_memory());
        let red = store.add("Red", None);
        assert!(store.add_player(&red.id, "p1"));
        assert!(!store.add_player(&red.id, "p1"));
        assert!(!store.add_player("ghost", "p1"));
        assert_eq!(store.get(&red.id).unwrap().player_ids, vec!["p1"]);
    }

    #[test]
    fn test_patch_player_ids_is_exclusive() {
        let mut store = TeamStore::load(Storage::in_memory());
        let red = store.add("Red", None);
        let blue = store.add("Blue", None);
        store.add_player(&red.id, "p1");
        store.add_player(&red.id, "p2");

        let patch = TeamPatch {
            player_ids: Some(vec!["p1".to_string(), "p3".to_string(), "p1".to_string()]),
            ..TeamPatch::default()
        };
        assert!(store.update(&blue.id, patch));

        assert_eq!(store.get(&blue.id).unwrap().player_ids, vec!["p1", "p3"]);
        assert_eq!(store.get(&red.id).unwrap().player_ids, vec!["p2"]);
    }

    #[test]
    fn test_remove_player_everywhere() {
        let mut store = TeamStore::load(Storage::in_memory());
        let red = store.add("Red", None);
        store.add_player(&red.id, "p1");

        assert!(!store.remove_player(&red.id, "p9"));
        store.remove_player_everywhere("p1");
        assert!(store.team_of("p1").is_none());
    }
}
