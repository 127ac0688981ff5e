//! The game library: owned, borrowed and for-sale games with loan tracking.

use crate::collection::{Collection, Record};
use crate::random::generate_id;
use crate::storage::{keys, Storage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One lending of a game. Open while `returned_at` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanHistoryEntry {
    pub id: String,
    pub borrower: String,
    pub lent_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl LoanHistoryEntry {
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub name: String,
    pub min_players: u32,
    pub max_players: u32,
    pub style: Option<String>,
    pub mood: Option<String>,
    pub is_owned: bool,
    pub is_borrowed: bool,
    pub borrowed_to: Option<String>,
    pub for_sale: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub loan_history: Vec<LoanHistoryEntry>,
}

impl Record for Game {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Game {
    /// The loan that has not been returned yet.
    pub fn open_loan(&self) -> Option<&LoanHistoryEntry> {
        self.loan_history.iter().find(|loan| loan.is_open())
    }

    fn close_open_loan(&mut self, at: DateTime<Utc>) {
        if let Some(loan) = self.loan_history.iter_mut().find(|loan| loan.is_open()) {
            loan.returned_at = Some(at);
        }
    }

    fn in_hand(&self) -> bool {
        self.is_owned && !self.is_borrowed && !self.for_sale
    }
}

/// Data for a new library entry.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub name: String,
    pub min_players: u32,
    pub max_players: u32,
    pub style: Option<String>,
    pub mood: Option<String>,
    pub is_owned: bool,
    pub for_sale: bool,
}

impl NewGame {
    pub fn new(name: impl Into<String>, min_players: u32, max_players: u32) -> Self {
        Self {
            name: name.into(),
            min_players,
            max_players,
            style: None,
            mood: None,
            is_owned: false,
            for_sale: false,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn owned(mut self) -> Self {
        self.is_owned = true;
        self
    }

    pub fn for_sale(mut self) -> Self {
        self.for_sale = true;
        self
    }
}

/// Fields to change on a game. `style`/`mood` use `Some(None)` to clear.
#[derive(Debug, Clone, Default)]
pub struct GamePatch {
    pub name: Option<String>,
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
    pub style: Option<Option<String>>,
    pub mood: Option<Option<String>>,
    pub is_owned: Option<bool>,
    pub for_sale: Option<bool>,
}

/// Library search criteria. The default shows every game.
#[derive(Debug, Clone)]
pub struct GameFilters {
    pub search: String,
    pub style: Option<String>,
    pub mood: Option<String>,
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
    pub show_owned: bool,
    pub show_borrowed: bool,
    pub show_for_sale: bool,
}

impl Default for GameFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            style: None,
            mood: None,
            min_players: None,
            max_players: None,
            show_owned: true,
            show_borrowed: true,
            show_for_sale: true,
        }
    }
}

impl GameFilters {
    pub fn matches(&self, game: &Game) -> bool {
        if !self.search.is_empty()
            && !game
                .name
                .to_lowercase()
                .contains(&self.search.to_lowercase())
        {
            return false;
        }
        if self.style.is_some() && game.style != self.style {
            return false;
        }
        if self.mood.is_some() && game.mood != self.mood {
            return false;
        }
        if matches!(self.min_players, Some(min) if min > 0 && game.max_players < min) {
            return false;
        }
        if matches!(self.max_players, Some(max) if max > 0 && game.min_players > max) {
            return false;
        }
        if !self.show_owned && game.in_hand() {
            return false;
        }
        if !self.show_borrowed && game.is_borrowed {
            return false;
        }
        if !self.show_for_sale && game.for_sale {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total: usize,
    pub owned: usize,
    pub borrowed: usize,
    pub for_sale: usize,
    pub min_players: u32,
    pub max_players: u32,
    pub total_loans: usize,
}

pub struct LibraryStore {
    games: Collection<Game>,
}

impl LibraryStore {
    pub fn load(storage: Storage) -> Self {
        Self {
            games: Collection::load(storage, keys::LIBRARY),
        }
    }

    pub fn all(&self) -> &[Game] {
        self.games.items()
    }

    /// Add a game at the front of the library.
    pub fn add(&mut self, new: NewGame) -> Game {
        let game = Game {
            id: generate_id(),
            name: new.name.trim().to_string(),
            min_players: new.min_players,
            max_players: new.max_players,
            style: new.style,
            mood: new.mood,
            is_owned: new.is_owned,
            is_borrowed: false,
            borrowed_to: None,
            for_sale: new.for_sale,
            created_at: Utc::now(),
            loan_history: Vec::new(),
        };
        self.games.insert_front(game.clone());
        game
    }

    pub fn update(&mut self, id: &str, patch: GamePatch) -> bool {
        self.games.modify(id, |game| {
            if let Some(name) = patch.name {
                game.name = name.trim().to_string();
            }
            if let Some(min) = patch.min_players {
                game.min_players = min;
            }
            if let Some(max) = patch.max_players {
                game.max_players = max;
            }
            if let Some(style) = patch.style {
                game.style = style;
            }
            if let Some(mood) = patch.mood {
                game.mood = mood;
            }
            if let Some(owned) = patch.is_owned {
                game.is_owned = owned;
            }
            if let Some(for_sale) = patch.for_sale {
                game.for_sale = for_sale;
            }
        })
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.games.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Game> {
        self.games.find(id)
    }

    /// Lend the game to `borrower`, or mark it returned with `None`.
    ///
    /// Lending a game that is already out closes the previous loan first, so
    /// at most one loan entry is ever open.
    pub fn mark_borrowed(&mut self, id: &str, borrower: Option<&str>) -> bool {
        let now = Utc::now();
        self.games.modify(id, |game| {
            game.close_open_loan(now);
            match borrower {
                Some(borrower) => {
                    game.loan_history.push(LoanHistoryEntry {
                        id: generate_id(),
                        borrower: borrower.to_string(),
                        lent_at: now,
                        returned_at: None,
                    });
                    game.is_borrowed = true;
                    game.borrowed_to = Some(borrower.to_string());
                }
                None => {
                    game.is_borrowed = false;
                    game.borrowed_to = None;
                }
            }
        })
    }

    pub fn mark_for_sale(&mut self, id: &str, for_sale: bool) -> bool {
        self.games.modify(id, |game| game.for_sale = for_sale)
    }

    pub fn loan_history(&self, id: &str) -> &[LoanHistoryEntry] {
        self.get(id)
            .map(|game| game.loan_history.as_slice())
            .unwrap_or_default()
    }

    pub fn filter(&self, filters: &GameFilters) -> Vec<&Game> {
        self.games
            .items()
            .iter()
            .filter(|game| filters.matches(game))
            .collect()
    }

    pub fn stats(&self) -> LibraryStats {
        let games = self.games.items();
        LibraryStats {
            total: games.len(),
            owned: games.iter().filter(|g| g.is_owned).count(),
            borrowed: games.iter().filter(|g| g.is_borrowed).count(),
            for_sale: games.iter().filter(|g| g.for_sale).count(),
            min_players: games.iter().map(|g| g.min_players).min().unwrap_or(0),
            max_players: games.iter().map(|g| g.max_players).max().unwrap_or(0),
            total_loans: games.iter().map(|g| g.loan_history.len()).sum(),
        }
    }

    /// Distinct styles, sorted.
    pub fn styles(&self) -> Vec<String> {
        distinct(self.games.items().iter().filter_map(|g| g.style.as_deref()))
    }

    pub fn moods(&self) -> Vec<String> {
        distinct(self.games.items().iter().filter_map(|g| g.mood.as_deref()))
    }

    pub fn export(&self) -> serde_json::Result<String> {
        self.games.export()
    }

    pub fn reload(&mut self) {
        self.games.reload();
    }

    pub fn clear(&mut self) {
        self.games.clear();
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
