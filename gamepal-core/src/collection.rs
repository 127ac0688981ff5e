//! Ordered, persisted record lists.
//!
//! Every entity store wraps one [`Collection`]. The in-memory list is the
//! source of truth; each mutation writes the whole list back under its key.

use crate::storage::Storage;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A stored entity with a string id.
pub trait Record: Serialize + DeserializeOwned + Clone {
    fn id(&self) -> &str;
}

pub struct Collection<T: Record> {
    key: &'static str,
    storage: Storage,
    items: Vec<T>,
}

impl<T: Record> Collection<T> {
    /// Hydrate from `key`, starting empty when nothing usable is stored.
    pub fn load(storage: Storage, key: &'static str) -> Self {
        let items = storage.load(key, Vec::new());
        Self {
            key,
            storage,
            items,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Mutable access. Callers must [`persist`](Self::persist) afterwards.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub fn insert_back(&mut self, item: T) {
        self.items.push(item);
        self.persist();
    }

    pub fn insert_front(&mut self, item: T) {
        self.items.insert(0, item);
        self.persist();
    }

    /// Remove the record with `id`, returning it.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        let removed = self.items.remove(index);
        self.persist();
        Some(removed)
    }

    /// Apply `f` to the record with `id` and persist. Returns whether it existed.
    pub fn modify(&mut self, id: &str, f: impl FnOnce(&mut T)) -> bool {
        let Some(item) = self.find_mut(id) else {
            return false;
        };
        f(item);
        self.persist();
        true
    }

    /// Apply `f` to every record and persist once.
    pub fn modify_all(&mut self, mut f: impl FnMut(&mut T)) {
        self.items.iter_mut().for_each(&mut f);
        self.persist();
    }

    pub fn persist(&self) {
        self.storage.save(self.key, &self.items);
    }

    /// Pretty-printed JSON of the whole list.
    pub fn export(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.items)
    }

    /// Drop in-memory state and re-read from storage.
    pub fn reload(&mut self) {
        self.items = self.storage.load(self.key, Vec::new());
    }

    /// Remove the stored list and empty the in-memory one.
    pub fn clear(&mut self) {
        self.storage.clear(self.key);
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        label: String,
    }

    impl Record for Item {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            label: id.to_uppercase(),
        }
    }

    #[test]
    fn test_insert_order() {
        let mut items: Collection<Item> = Collection::load(Storage::in_memory(), "gamepal-items");
        items.insert_back(item("a"));
        items.insert_back(item("b"));
        items.insert_front(item("c"));

        let ids: Vec<_> = items.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_writes_through() {
        let memory = MemoryStore::new();
        let storage = Storage::new(memory.clone());
        let mut items: Collection<Item> = Collection::load(storage.clone(), "gamepal-items");
        items.insert_back(item("a"));
        assert!(items.modify("a", |i| i.label = "changed".to_string()));
        assert!(!items.modify("missing", |_| {}));

        let reloaded: Collection<Item> = Collection::load(storage, "gamepal-items");
        assert_eq!(reloaded.items(), items.items());
        assert_eq!(reloaded.find("a").unwrap().label, "changed");
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut items: Collection<Item> = Collection::load(Storage::in_memory(), "gamepal-items");
        items.insert_back(item("a"));
        assert!(items.remove("zzz").is_none());
        assert_eq!(items.remove("a"), Some(item("a")));
        assert!(items.is_empty());
    }

    #[test]
    fn test_export_parses_back() {
        let mut items: Collection<Item> = Collection::load(Storage::in_memory(), "gamepal-items");
        items.insert_back(item("a"));
        items.insert_back(item("b"));

        let json = items.export().unwrap();
        let parsed: Vec<Item> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, items.items());
    }

    #[test]
    fn test_clear_removes_key() {
        let memory = MemoryStore::new();
        let mut items: Collection<Item> =
            Collection::load(Storage::new(memory.clone()), "gamepal-items");
        items.insert_back(item("a"));
        items.clear();
        assert!(items.is_empty());
        assert!(memory.raw("gamepal-items").is_none());
    }
}
