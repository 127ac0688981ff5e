//! Round-by-round score sheets.

use crate::collection::{Collection, Record};
use crate::random::generate_id;
use crate::storage::{keys, Storage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A score column. `scores[i]` is the score for round `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePlayer {
    pub id: String,
    pub name: String,
    pub scores: Vec<i64>,
    pub total: i64,
}

impl ScorePlayer {
    fn new(name: &str) -> Self {
        Self {
            id: generate_id(),
            name: name.to_string(),
            scores: Vec::new(),
            total: 0,
        }
    }

    /// Record `score` for `round` (1-based), padding skipped rounds with zero.
    fn set_score(&mut self, round: usize, score: i64) {
        if self.scores.len() < round {
            self.scores.resize(round, 0);
        }
        self.scores[round - 1] = score;
        self.total = self.scores.iter().sum();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSession {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub players: Vec<ScorePlayer>,
    pub current_round: u32,
    pub max_rounds: Option<u32>,
    pub max_score: Option<i64>,
    pub is_team_mode: bool,
    pub is_closed: bool,
}

impl Record for ScoreSession {
    fn id(&self) -> &str {
        &self.id
    }
}

impl ScoreSession {
    pub fn player(&self, player_id: &str) -> Option<&ScorePlayer> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Players ordered by total, highest first. Ties keep sheet order.
    pub fn standings(&self) -> Vec<&ScorePlayer> {
        let mut ranked: Vec<_> = self.players.iter().collect();
        ranked.sort_by(|a, b| b.total.cmp(&a.total));
        ranked
    }

    /// True once the round limit is passed or someone reaches the score limit.
    pub fn end_reached(&self) -> bool {
        let rounds_done = self
            .max_rounds
            .is_some_and(|max| self.current_round > max);
        let score_hit = self
            .max_score
            .is_some_and(|max| self.players.iter().any(|p| p.total >= max));
        rounds_done || score_hit
    }
}

/// End conditions and mode for a new sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreOptions {
    pub max_rounds: Option<u32>,
    pub max_score: Option<i64>,
    pub is_team_mode: bool,
}

pub struct ScoreSessionStore {
    sessions: Collection<ScoreSession>,
    current_id: Option<String>,
}

impl ScoreSessionStore {
    pub fn load(storage: Storage) -> Self {
        Self {
            sessions: Collection::load(storage, keys::SCORE_SESSIONS),
            current_id: None,
        }
    }

    pub fn all(&self) -> &[ScoreSession] {
        self.sessions.items()
    }

    pub fn create(&mut self, name: &str, player_names: &[&str], options: ScoreOptions) -> ScoreSession {
        let now = Utc::now();
        let session = ScoreSession {
            id: generate_id(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            players: player_names.iter().map(|n| ScorePlayer::new(n)).collect(),
            current_round: 1,
            max_rounds: options.max_rounds,
            max_score: options.max_score,
            is_team_mode: options.is_team_mode,
            is_closed: false,
        };
        self.sessions.insert_front(session.clone());
        session
    }

    pub fn get(&self, id: &str) -> Option<&ScoreSession> {
        self.sessions.find(id)
    }

    /// Set one player's score for a 1-based `round`. Round 0 and unknown ids are no-ops.
    pub fn update_player_score(
        &mut self,
        session_id: &str,
        player_id: &str,
        round: usize,
        score: i64,
    ) -> bool {
        if round == 0 {
            return false;
        }
        let Some(session) = self.sessions.find_mut(session_id) else {
            return false;
        };
        let Some(player) = session.players.iter_mut().find(|p| p.id == player_id) else {
            return false;
        };

        player.set_score(round, score);
        session.updated_at = Utc::now();
        self.sessions.persist();
        true
    }

    pub fn add_round(&mut self, session_id: &str) -> bool {
        self.sessions.modify(session_id, |session| {
            session.current_round += 1;
            session.updated_at = Utc::now();
        })
    }

    /// Mark a sheet closed. Scores stay editable.
    pub fn close(&mut self, session_id: &str) -> bool {
        self.sessions.modify(session_id, |session| {
            session.is_closed = true;
            session.updated_at = Utc::now();
        })
    }

    pub fn delete(&mut self, id: &str) -> bool {
        if self.sessions.remove(id).is_none() {
            return false;
        }
        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
        }
        true
    }

    /// Select the sheet being viewed. Not persisted.
    pub fn set_current(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if self.sessions.find(id).is_none() => false,
            _ => {
                self.current_id = id.map(str::to_string);
                true
            }
        }
    }

    pub fn current(&self) -> Option<&ScoreSession> {
        self.current_id.as_deref().and_then(|id| self.sessions.find(id))
    }

    pub fn export(&self) -> serde_json::Result<String> {
        self.sessions.export()
    }

    pub fn reload(&mut self) {
        self.sessions.reload();
        self.current_id = None;
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.current_id = None;
    }
}
