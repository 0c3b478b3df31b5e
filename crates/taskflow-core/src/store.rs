use std::sync::Arc;

use parking_lot::Mutex;
use taskflow_shared::{Category, Task, User};
use tracing::{debug, info};
use uuid::Uuid;

use crate::fixtures::Fixtures;
use crate::record::Record;

/// One mutable, ordered collection of records. Every accessor hands out
/// clones; nothing outside the collection ever borrows stored records.
#[derive(Debug)]
pub struct Collection<R> {
    items: Mutex<Vec<R>>,
}

impl<R: Record> Collection<R> {
    pub fn new(items: Vec<R>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    pub fn snapshot(&self) -> Vec<R> {
        self.items.lock().clone()
    }

    pub fn find(&self, id: &str) -> Option<R> {
        self.items.lock().iter().find(|r| r.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Appends a record built around a freshly minted id that no stored
    /// record already uses.
    pub fn insert_new<F>(&self, build: F) -> R
    where
        F: FnOnce(String) -> R,
    {
        let mut items = self.items.lock();
        let id = fresh_id(&items);
        let record = build(id);
        items.push(record.clone());
        debug!(kind = %R::KIND, id = record.id(), count = items.len(), "inserted record");
        record
    }

    /// Swaps the record `id` for `next(current)`. The closure sees the
    /// stored record by reference and returns a whole new value.
    pub fn replace_with<F>(&self, id: &str, next: F) -> Option<R>
    where
        F: FnOnce(&R) -> R,
    {
        let mut items = self.items.lock();
        let slot = items.iter_mut().find(|r| r.id() == id)?;
        let replacement = next(slot);
        *slot = replacement.clone();
        Some(replacement)
    }

    pub fn remove(&self, id: &str) -> Option<R> {
        let mut items = self.items.lock();
        let idx = items.iter().position(|r| r.id() == id)?;
        Some(items.remove(idx))
    }
}

fn fresh_id<R: Record>(items: &[R]) -> String {
    loop {
        let candidate = Uuid::new_v4().to_string();
        if !items.iter().any(|r| r.id() == candidate) {
            return candidate;
        }
    }
}

/// Process-lifetime state behind the entity services. Owned by the
/// application and shared by handle; there is no global instance.
#[derive(Debug)]
pub struct Store {
    tasks: Collection<Task>,
    categories: Collection<Category>,
    users: Collection<User>,
}

impl Store {
    #[tracing::instrument(skip(fixtures))]
    pub fn seed(fixtures: Fixtures) -> Arc<Self> {
        info!(
            tasks = fixtures.tasks.len(),
            categories = fixtures.categories.len(),
            users = fixtures.users.len(),
            "seeding in-memory store"
        );
        Arc::new(Self {
            tasks: Collection::new(fixtures.tasks),
            categories: Collection::new(fixtures.categories),
            users: Collection::new(fixtures.users),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::seed(Fixtures::default())
    }

    pub fn tasks(&self) -> &Collection<Task> {
        &self.tasks
    }

    pub fn categories(&self) -> &Collection<Category> {
        &self.categories
    }

    pub fn users(&self) -> &Collection<User> {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use taskflow_shared::Category;

    use super::Store;

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn snapshots_are_detached_from_storage() {
        let store = Store::empty();
        store.categories().insert_new(|id| category(&id, "Work"));

        let mut snapshot = store.categories().snapshot();
        snapshot[0].name = "Changed".to_string();

        assert_eq!(store.categories().snapshot()[0].name, "Work");
    }

    #[test]
    fn inserted_ids_are_unique() {
        let store = Store::empty();
        let ids: Vec<String> = (0..50)
            .map(|_| store.categories().insert_new(|id| category(&id, "x")).id)
            .collect();

        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn replace_and_remove_report_missing_ids() {
        let store = Store::empty();
        assert!(store
            .categories()
            .replace_with("nope", |c| c.clone())
            .is_none());
        assert!(store.categories().remove("nope").is_none());
        assert!(store.categories().is_empty());
    }
}
