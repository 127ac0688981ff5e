//! Random first-player picker and team splitter.

use crate::colors::color_by_index;
use crate::random::generate_id;
use crate::stores::Player;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerPlayer {
    #[serde(flatten)]
    pub player: Player,
    pub is_active: bool,
    pub team_id: Option<String>,
}

/// The players taking part in a draw.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: Vec<PickerPlayer>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from saved players, all active.
    pub fn from_players(players: &[Player]) -> Self {
        Self {
            players: players
                .iter()
                .cloned()
                .map(|player| PickerPlayer {
                    player,
                    is_active: true,
                    team_id: None,
                })
                .collect(),
        }
    }

    pub fn players(&self) -> &[PickerPlayer] {
        &self.players
    }

    pub fn active(&self) -> Vec<&PickerPlayer> {
        self.players.iter().filter(|p| p.is_active).collect()
    }

    /// Add an ad-hoc player colored by position. Blank names are ignored.
    pub fn add(&mut self, name: &str) -> Option<&PickerPlayer> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.players.push(PickerPlayer {
            player: Player {
                id: generate_id(),
                name: name.to_string(),
                color: color_by_index(self.players.len()).to_string(),
                avatar: None,
            },
            is_active: true,
            team_id: None,
        });
        self.players.last()
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.player.id != id);
        before != self.players.len()
    }

    pub fn toggle_active(&mut self, id: &str) -> bool {
        match self.players.iter_mut().find(|p| p.player.id == id) {
            Some(p) => {
                p.is_active = !p.is_active;
                true
            }
            None => false,
        }
    }

    pub fn pick(&self) -> Option<&PickerPlayer> {
        self.pick_with_rng(&mut rand::thread_rng())
    }

    /// A random active player, once at least two are active.
    pub fn pick_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&PickerPlayer> {
        let active = self.active();
        if active.len() < 2 {
            return None;
        }
        active.choose(rng).copied()
    }

    /// Deal shuffled active players round-robin into `team_ids`.
    ///
    /// Inactive players are left without a team. Nothing happens without teams.
    pub fn assign_teams<R: Rng + ?Sized>(&mut self, team_ids: &[String], rng: &mut R) {
        if team_ids.is_empty() {
            return;
        }

        let mut order: Vec<usize> = (0..self.players.len())
            .filter(|&i| self.players[i].is_active)
            .collect();
        order.shuffle(rng);

        for player in &mut self.players {
            player.team_id = None;
        }
        for (slot, index) in order.into_iter().enumerate() {
            self.players[index].team_id = Some(team_ids[slot % team_ids.len()].clone());
        }
    }

    pub fn members_of(&self, team_id: &str) -> Vec<&PickerPlayer> {
        self.players
            .iter()
            .filter(|p| p.team_id.as_deref() == Some(team_id))
            .collect()
    }
}
