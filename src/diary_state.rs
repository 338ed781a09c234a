use crate::diary_entry::{Category, DiaryEntry};
use crate::error::{JournalError, Result};
use crate::store::{Store, CATEGORIES_KEY, ENTRIES_KEY};

/// The entry and category collections. Every mutation rewrites the affected
/// collection in the store.
pub struct DiaryState {
    entries: Vec<DiaryEntry>,
    categories: Vec<Category>,
    store: Store,
}

impl DiaryState {
    pub fn new(store: Store) -> Self {
        DiaryState {
            entries: Vec::new(),
            categories: Vec::new(),
            store,
        }
    }

    pub fn load(store: Store) -> Result<Self> {
        let entries = store.get(ENTRIES_KEY)?.unwrap_or_default();
        let categories = store.get(CATEGORIES_KEY)?.unwrap_or_default();
        let state = DiaryState {
            entries,
            categories,
            store,
        };
        tracing::info!(
            "Loaded {} entries and {} categories",
            state.entries.len(),
            state.categories.len()
        );
        Ok(state)
    }

    /// New entries go to the front, newest first.
    pub fn add_entry(&mut self, mut entry: DiaryEntry) -> Result<()> {
        entry.id = self.unique_id(entry.id);
        tracing::info!("Adding entry {}", entry.id);
        self.entries.insert(0, entry);
        self.save_entries()
    }

    pub fn update_entry(&mut self, updated_entry: DiaryEntry) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == updated_entry.id)
            .ok_or_else(|| JournalError::EntryNotFound {
                id: updated_entry.id.clone(),
            })?;
        *entry = updated_entry;
        self.save_entries()
    }

    pub fn delete_entry(&mut self, id: &str) -> Result<()> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Err(JournalError::EntryNotFound { id: id.to_string() });
        }
        tracing::info!("Deleted entry {}", id);
        self.save_entries()
    }

    pub fn add_category(&mut self, name: &str) -> Result<Category> {
        let mut category = Category::new(name.trim().to_string());
        while self.categories.iter().any(|c| c.id == category.id) {
            category.id = bump(&category.id);
        }
        self.categories.push(category.clone());
        self.store.set(CATEGORIES_KEY, &self.categories)?;
        Ok(category)
    }

    pub fn get_entries(&self) -> &[DiaryEntry] {
        &self.entries
    }

    pub fn get_categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    fn save_entries(&self) -> Result<()> {
        self.store.set(ENTRIES_KEY, &self.entries)
    }

    fn unique_id(&self, mut id: String) -> String {
        while self.entries.iter().any(|e| e.id == id) {
            id = bump(&id);
        }
        id
    }
}

fn bump(id: &str) -> String {
    match id.parse::<i64>() {
        Ok(n) => (n + 1).to_string(),
        Err(_) => format!("{id}-1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary_entry::Mood;
    use tempfile::TempDir;

    fn entry(id: &str, content: &str) -> DiaryEntry {
        let mut e = DiaryEntry::new(content.to_string());
        e.id = id.to_string();
        e
    }

    #[test]
    fn add_update_delete_round_trip_through_store() {
        let temp = TempDir::new().unwrap();
        let mut state = DiaryState::new(Store::open(temp.path()).unwrap());

        state.add_entry(entry("10", "first")).unwrap();
        state.add_entry(entry("11", "second")).unwrap();
        assert_eq!(state.get_entries()[0].content, "second");

        let mut edited = state.get_entries()[1].clone();
        edited.mood = Some(Mood::Happy);
        state.update_entry(edited).unwrap();

        let reloaded = DiaryState::load(Store::open(temp.path()).unwrap()).unwrap();
        assert_eq!(reloaded.get_entries().len(), 2);
        assert_eq!(reloaded.get_entries()[1].mood, Some(Mood::Happy));

        state.delete_entry("10").unwrap();
        let reloaded = DiaryState::load(Store::open(temp.path()).unwrap()).unwrap();
        assert_eq!(reloaded.get_entries().len(), 1);
        assert_eq!(reloaded.get_entries()[0].id, "11");
    }

    #[test]
    fn colliding_ids_are_made_unique() {
        let temp = TempDir::new().unwrap();
        let mut state = DiaryState::new(Store::open(temp.path()).unwrap());
        state.add_entry(entry("100", "a")).unwrap();
        state.add_entry(entry("100", "b")).unwrap();

        let ids: Vec<&str> = state.get_entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["101", "100"]);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let temp = TempDir::new().unwrap();
        let mut state = DiaryState::new(Store::open(temp.path()).unwrap());
        assert!(matches!(
            state.delete_entry("nope"),
            Err(JournalError::EntryNotFound { .. })
        ));
        assert!(state.update_entry(entry("nope", "x")).is_err());
    }

    #[test]
    fn categories_persist() {
        let temp = TempDir::new().unwrap();
        let mut state = DiaryState::new(Store::open(temp.path()).unwrap());
        let work = state.add_category("  Work ").unwrap();
        assert_eq!(work.name, "Work");

        let reloaded = DiaryState::load(Store::open(temp.path()).unwrap()).unwrap();
        assert_eq!(reloaded.category(&work.id).map(|c| c.name.as_str()), Some("Work"));
    }
}
