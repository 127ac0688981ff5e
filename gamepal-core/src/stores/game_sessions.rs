//! Saved line-ups of players and teams, with one optionally loaded.

use crate::collection::{Collection, Record};
use crate::random::generate_id;
use crate::storage::{keys, Storage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: String,
    pub name: String,
    pub player_ids: Vec<String>,
    pub team_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl Record for GameSession {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub name: Option<String>,
    pub player_ids: Option<Vec<String>>,
    pub team_ids: Option<Vec<String>>,
}

pub struct GameSessionStore {
    storage: Storage,
    sessions: Collection<GameSession>,
    current_id: Option<String>,
}

impl GameSessionStore {
    pub fn load(storage: Storage) -> Self {
        let sessions = Collection::load(storage.clone(), keys::GAME_SESSIONS);
        let current_id = storage
            .load_raw(keys::GAME_SESSIONS_CURRENT)
            .filter(|id| !id.is_empty());
        Self {
            storage,
            sessions,
            current_id,
        }
    }

    pub fn all(&self) -> &[GameSession] {
        self.sessions.items()
    }

    pub fn create(&mut self, name: &str, player_ids: &[String], team_ids: &[String]) -> GameSession {
        let now = Utc::now();
        let session = GameSession {
            id: generate_id(),
            name: name.trim().to_string(),
            player_ids: player_ids.to_vec(),
            team_ids: team_ids.to_vec(),
            created_at: now,
            last_used_at: now,
        };
        self.sessions.insert_front(session.clone());
        self.persist_current();
        session
    }

    pub fn update(&mut self, id: &str, patch: SessionPatch) -> bool {
        self.sessions.modify(id, |session| {
            if let Some(name) = patch.name {
                session.name = name.trim().to_string();
            }
            if let Some(ids) = patch.player_ids {
                session.player_ids = ids;
            }
            if let Some(ids) = patch.team_ids {
                session.team_ids = ids;
            }
            session.last_used_at = Utc::now();
        })
    }

    /// Delete a session, unloading it if it was current.
    pub fn delete(&mut self, id: &str) -> bool {
        if self.sessions.remove(id).is_none() {
            return false;
        }
        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
        }
        self.persist_current();
        true
    }

    /// Make `id` the current session and refresh its `last_used_at`.
    pub fn load_session(&mut self, id: &str) -> Option<&GameSession> {
        if !self.sessions.modify(id, |session| session.last_used_at = Utc::now()) {
            return None;
        }
        self.current_id = Some(id.to_string());
        self.persist_current();
        self.sessions.find(id)
    }

    pub fn unload(&mut self) {
        self.current_id = None;
        self.persist_current();
    }

    pub fn get(&self, id: &str) -> Option<&GameSession> {
        self.sessions.find(id)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    /// The loaded session, if its id still resolves.
    pub fn current(&self) -> Option<&GameSession> {
        self.current_id.as_deref().and_then(|id| self.sessions.find(id))
    }

    fn persist_current(&self) {
        match &self.current_id {
            Some(id) => self.storage.save_raw(keys::GAME_SESSIONS_CURRENT, id),
            None => self.storage.clear(keys::GAME_SESSIONS_CURRENT),
        }
    }

    pub fn reload(&mut self) {
        self.sessions.reload();
        self.current_id = self
            .storage
            .load_raw(keys::GAME_SESSIONS_CURRENT)
            .filter(|id| !id.is_empty());
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.current_id = None;
        self.storage.clear(keys::GAME_SESSIONS_CURRENT);
    }
}
