//! Saved game rules, typed in, scanned, or answered by the assistant.

use crate::collection::{Collection, Record};
use crate::random::generate_id;
use crate::storage::{keys, Storage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a rule's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSource {
    #[default]
    Manual,
    Ocr,
    Ai,
}

impl RuleSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "manual" => Some(RuleSource::Manual),
            "ocr" => Some(RuleSource::Ocr),
            "ai" => Some(RuleSource::Ai),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub game: String,
    pub title: String,
    pub content: String,
    pub source: RuleSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Rule {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone)]
pub struct NewRule {
    pub game: String,
    pub title: String,
    pub content: String,
    pub source: RuleSource,
}

impl NewRule {
    pub fn new(
        game: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            game: game.into(),
            title: title.into(),
            content: content.into(),
            source: RuleSource::Manual,
        }
    }

    pub fn with_source(mut self, source: RuleSource) -> Self {
        self.source = source;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct RulePatch {
    pub game: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub source: Option<RuleSource>,
}

pub struct RuleStore {
    rules: Collection<Rule>,
}

impl RuleStore {
    pub fn load(storage: Storage) -> Self {
        Self {
            rules: Collection::load(storage, keys::RULES),
        }
    }

    pub fn all(&self) -> &[Rule] {
        self.rules.items()
    }

    pub fn add(&mut self, new: NewRule) -> Rule {
        let now = Utc::now();
        let rule = Rule {
            id: generate_id(),
            game: new.game,
            title: new.title,
            content: new.content,
            source: new.source,
            created_at: now,
            updated_at: now,
        };
        self.rules.insert_back(rule.clone());
        rule
    }

    /// Apply `patch`; `updated_at` is refreshed even for an empty patch.
    pub fn update(&mut self, id: &str, patch: RulePatch) -> bool {
        self.rules.modify(id, |rule| {
            if let Some(game) = patch.game {
                rule.game = game;
            }
            if let Some(title) = patch.title {
                rule.title = title;
            }
            if let Some(content) = patch.content {
                rule.content = content;
            }
            if let Some(source) = patch.source {
                rule.source = source;
            }
            rule.updated_at = Utc::now();
        })
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.rules.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.find(id)
    }

    /// Rules whose game name equals `game`, ignoring case.
    pub fn by_game(&self, game: &str) -> Vec<&Rule> {
        let game = game.to_lowercase();
        self.rules
            .items()
            .iter()
            .filter(|rule| rule.game.to_lowercase() == game)
            .collect()
    }

    /// Case-insensitive search over title, game and content. A blank query returns everything.
    pub fn search(&self, query: &str) -> Vec<&Rule> {
        let query = query.trim().to_lowercase();
        self.rules
            .items()
            .iter()
            .filter(|rule| {
                query.is_empty()
                    || rule.title.to_lowercase().contains(&query)
                    || rule.game.to_lowercase().contains(&query)
                    || rule.content.to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn game_names(&self) -> Vec<String> {
        self.rules
            .items()
            .iter()
            .map(|rule| rule.game.as_str())
            .filter(|game| !game.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn export(&self) -> serde_json::Result<String> {
        self.rules.export()
    }

    pub fn reload(&mut self) {
        self.rules.reload();
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_rules() -> RuleStore {
        let mut store = RuleStore::load(Storage::in_memory());
        store.add(NewRule::new("Catan", "Robber", "Move the robber on a 7."));
        store.add(NewRule::new("catan", "Trading", "Trade with the bank at 4:1."));
        store.add(NewRule::new("Azul", "Scoring", "Adjacent tiles score.").with_source(RuleSource::Ocr));
        store
    }

    #[test]
    fn test_by_game_ignores_case() {
        let store = store_with_rules();
        assert_eq!(store.by_game("CATAN").len(), 2);
        assert!(store.by_game("Cat").is_empty());
    }

    #[test]
    fn test_search() {
        let store = store_with_rules();
        assert_eq!(store.search("").len(), 3);
        assert_eq!(store.search("   ").len(), 3);
        assert_eq!(store.search("robber").len(), 1);
        assert_eq!(store.search("azul").len(), 1);
        assert_eq!(store.search("bank").len(), 1);
        assert!(store.search("chess").is_empty());
    }

    #[test]
    fn test_game_names_sorted_distinct() {
        let store = store_with_rules();
        assert_eq!(store.game_names(), vec!["Azul", "Catan", "catan"]);
    }

    #[test]
    fn test_empty_patch_only_touches_updated_at() {
        let mut store = store_with_rules();
        let before = store.all()[0].clone();
        assert!(store.update(&before.id, RulePatch::default()));

        let after = store.get(&before.id).unwrap();
        assert_eq!(after.title, before.title);
        assert_eq!(after.content, before.content);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[test]
    fn test_source_serialization() {
        assert_eq!(serde_json::to_string(&RuleSource::Ai).unwrap(), "\"ai\"");
        assert_eq!(RuleSource::parse("OCR"), Some(RuleSource::Ocr));
        assert_eq!(RuleSource::parse("fax"), None);
    }
}
