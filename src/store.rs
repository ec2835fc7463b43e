//! The store module
//! Provide CRUD methods and JSON import/export for the session's entries

use crate::embedding::{embed, is_separator, EMBEDDING_DIM};
use crate::entry::Entry;
use crate::error::{StoreError, StoreResult, VectorResult};
use crate::search::{rank, SearchResult};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Entries of one session, in insertion order.
///
/// A store is created when a session starts and dropped when it ends; nothing
/// is written anywhere unless the caller exports it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EntryStore {
    entries: Vec<Entry>,
}

impl EntryStore {
    /// Creates a new empty store.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashvdb::EntryStore;
    ///
    /// let store = EntryStore::new();
    /// assert_eq!(store.count(), 0);
    /// ```
    pub fn new() -> EntryStore {
        EntryStore { entries: Vec::new() }
    }

    /// Builds a store from an exported JSON array.
    ///
    /// # Errors
    ///
    /// Same as [`deserialize`](EntryStore::deserialize).
    pub fn from_json(text: &str) -> StoreResult<EntryStore> {
        let mut store = EntryStore::new();
        store.deserialize(text)?;
        Ok(store)
    }

    /// All entries, oldest first.
    pub fn list(&self) -> &[Entry] {
        &self.entries
    }

    /// Looks up an entry by id.
    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// * `StoreError::DuplicateId` - An entry with the same id is already stored
    /// * `StoreError::InvalidEntry` - The embedding is not [`EMBEDDING_DIM`] finite components
    ///
    /// # Examples
    ///
    /// ```
    /// use hashvdb::{Entry, EntryStore};
    ///
    /// let mut store = EntryStore::new();
    /// let entry = Entry::from_text("first note").unwrap();
    ///
    /// store.add(entry.clone()).unwrap();
    /// assert_eq!(store.count(), 1);
    ///
    /// // Same id twice is refused
    /// assert!(store.add(entry).is_err());
    /// ```
    pub fn add(&mut self, entry: Entry) -> StoreResult<()> {
        if self.get(&entry.id).is_some() {
            return Err(StoreError::DuplicateId(entry.id));
        }

        if let Err(reason) = check_embedding(&entry) {
            warn!(id = %entry.id, %reason, "add rejected");
            return Err(StoreError::InvalidEntry { id: entry.id, reason });
        }

        info!(id = %entry.id, chars = entry.text.chars().count(), "added entry");
        self.entries.push(entry);
        Ok(())
    }

    /// Vectorizes `text` and appends it as a new entry.
    ///
    /// # Errors
    ///
    /// * `StoreError::EmptyText` - The text is blank
    pub fn add_text(&mut self, text: &str) -> StoreResult<&Entry> {
        let entry = Entry::from_text(text)?;
        self.add(entry)?;
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Deletes the entry with this id. Returns whether anything was removed;
    /// deleting a missing id is a no-op.
    pub fn delete_by_id(&mut self, id: &str) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entries.remove(index);
                info!(id, "deleted entry");
                true
            }
            None => {
                debug!(id, "delete of unknown id ignored");
                false
            }
        }
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        info!(count = self.entries.len(), "cleared store");
        self.entries.clear();
    }

    /// Returns the number of entries in the store.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embeds `query` and ranks every stored entry against it.
    ///
    /// A blank query returns no results.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashvdb::EntryStore;
    ///
    /// let mut store = EntryStore::new();
    /// store.add_text("the cat sat on the mat").unwrap();
    /// store.add_text("stock markets fell sharply").unwrap();
    ///
    /// let results = store.search("the cat sat on the mat").unwrap();
    /// assert_eq!(results[0].entry.text, "the cat sat on the mat");
    /// assert!((results[0].similarity - 1.0).abs() < 1e-9);
    ///
    /// assert!(store.search("   ").unwrap().is_empty());
    /// ```
    pub fn search(&self, query: &str) -> VectorResult<Vec<SearchResult>> {
        if query.trim_matches(is_separator).is_empty() || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        rank(&embed(query), &self.entries)
    }

    /// Exports all entries as a pretty-printed JSON array.
    pub fn serialize(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Replaces the store's contents with the entries in a JSON array and
    /// returns how many were loaded.
    ///
    /// Every element must be a complete entry with a
    /// [`EMBEDDING_DIM`]-component embedding, and ids must be unique. On any
    /// failure the store is left exactly as it was.
    ///
    /// # Errors
    ///
    /// * `StoreError::ImportFormat` - Not JSON, not an array, or an invalid element
    ///
    /// # Examples
    ///
    /// ```
    /// use hashvdb::EntryStore;
    ///
    /// let mut store = EntryStore::new();
    /// store.add_text("keep me").unwrap();
    ///
    /// // Top-level value must be an array; the store is untouched
    /// assert!(store.deserialize(r#"{"id": "x"}"#).is_err());
    /// assert_eq!(store.count(), 1);
    ///
    /// let exported = store.serialize().unwrap();
    /// let mut other = EntryStore::new();
    /// assert_eq!(other.deserialize(&exported).unwrap(), 1);
    /// assert_eq!(other.list(), store.list());
    /// ```
    pub fn deserialize(&mut self, text: &str) -> StoreResult<usize> {
        let entries = parse_entries(text).inspect_err(|e| warn!(error = %e, "import rejected"))?;

        self.entries = entries;
        info!(count = self.entries.len(), "imported entries");
        Ok(self.entries.len())
    }
}

fn parse_entries(text: &str) -> StoreResult<Vec<Entry>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::import_format(format!("invalid JSON: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(StoreError::import_format(format!(
                "expected a JSON array of entries, found {}",
                json_kind(&other)
            )))
        }
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut entries = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let entry: Entry = serde_json::from_value(item)
            .map_err(|e| StoreError::import_format(format!("entry {}: {}", index, e)))?;

        check_embedding(&entry)
            .map_err(|reason| StoreError::import_format(format!("entry {}: {}", index, reason)))?;

        if !seen.insert(entry.id.clone()) {
            return Err(StoreError::import_format(format!("entry {}: duplicate id {}", index, entry.id)));
        }

        entries.push(entry);
    }

    Ok(entries)
}

/// Every stored embedding has [`EMBEDDING_DIM`] finite components
fn check_embedding(entry: &Entry) -> Result<(), String> {
    let len = entry.embedding.len();
    if len != EMBEDDING_DIM {
        return Err(format!("embedding has {} dimensions, expected {}", len, EMBEDDING_DIM));
    }

    match entry.embedding.iter().position(|x| !x.is_finite()) {
        Some(dim) => Err(format!("embedding component {} is not a finite number", dim)),
        None => Ok(()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod store_test {
    use super::*;
    use crate::vector::Embedding;

    fn entry(id: &str, text: &str) -> Entry {
        Entry::new(id, text, embed(text), 1_700_000_000_000)
    }

    fn store_with(texts: &[&str]) -> EntryStore {
        let mut store = EntryStore::new();
        for (i, text) in texts.iter().enumerate() {
            store.add(entry(&format!("id{}", i + 1), text)).unwrap();
        }
        store
    }

    // ========== Add Tests ==========

    #[test]
    fn test_add_single_entry() {
        let mut store = EntryStore::new();
        store.add(entry("id1", "hello")).unwrap();

        assert_eq!(store.count(), 1);
        assert_eq!(store.list()[0].id, "id1");
        assert_eq!(store.list()[0].embedding.len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let store = store_with(&["one", "two", "three"]);
        let texts: Vec<&str> = store.list().iter().map(|e| e.text.as_str()).collect();

        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_add_duplicate_id() {
        let mut store = store_with(&["one"]);
        let result = store.add(entry("id1", "other"));

        assert!(matches!(result, Err(StoreError::DuplicateId(id)) if id == "id1"));
        assert_eq!(store.count(), 1);
        assert_eq!(store.list()[0].text, "one");
    }

    #[test]
    fn test_add_rejects_wrong_dimension() {
        let mut store = store_with(&["hello world"]);
        let before = store.clone();
        let short = Entry::new("bad", "bad", Embedding::new(vec![1.0, 0.0]), 0);

        let result = store.add(short);
        assert!(matches!(result, Err(StoreError::InvalidEntry { ref id, .. }) if id == "bad"));
        assert!(result.unwrap_err().to_string().contains("2 dimensions"));
        assert_eq!(store, before);

        // Search still works for the rest of the session
        assert_eq!(store.search("hello").unwrap().len(), 1);
    }

    #[test]
    fn test_add_rejects_non_finite_components() {
        let mut store = EntryStore::new();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut values = embed("hello").into_inner();
            values[0] = bad;
            let result = store.add(Entry::new("bad", "hello", Embedding::new(values), 0));
            assert!(matches!(result, Err(StoreError::InvalidEntry { .. })));
        }
        assert!(store.is_empty());

        // Whatever add accepts survives export and import
        store.add(entry("ok", "hello")).unwrap();
        let exported = store.serialize().unwrap();
        assert!(!exported.contains("null"));
        assert_eq!(EntryStore::from_json(&exported).unwrap(), store);
    }

    #[test]
    fn test_add_text() {
        let mut store = EntryStore::new();
        let id = store.add_text("  some note ").unwrap().id.clone();

        assert_eq!(store.get(&id).unwrap().text, "some note");
        assert!(matches!(store.add_text(" "), Err(StoreError::EmptyText)));
        assert_eq!(store.count(), 1);
    }

    // ========== Get / Delete / Clear Tests ==========

    #[test]
    fn test_get_existing_and_missing() {
        let store = store_with(&["one", "two"]);

        assert_eq!(store.get("id2").unwrap().text, "two");
        assert!(store.get("id9").is_none());
        assert!(EntryStore::new().get("id1").is_none());
    }

    #[test]
    fn test_delete_middle_entry() {
        let mut store = store_with(&["one", "two", "three"]);

        assert!(store.delete_by_id("id2"));
        assert!(store.get("id2").is_none());

        let ids: Vec<&str> = store.list().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["id1", "id3"]);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut store = store_with(&["one"]);

        assert!(!store.delete_by_id("nope"));
        assert_eq!(store.count(), 1);
        assert!(!EntryStore::new().delete_by_id("id1"));
    }

    #[test]
    fn test_add_after_delete_same_id() {
        let mut store = store_with(&["one"]);
        store.delete_by_id("id1");

        assert!(store.add(entry("id1", "again")).is_ok());
        assert_eq!(store.get("id1").unwrap().text, "again");
    }

    #[test]
    fn test_clear() {
        let mut store = store_with(&["one", "two"]);
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.count(), 0);
    }

    // ========== Search Tests ==========

    #[test]
    fn test_search_finds_exact_text_first() {
        let store = store_with(&["rust ownership rules", "baking sourdough bread", "rust borrow checker"]);
        let results = store.search("Rust ownership rules").unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].entry.id, "id1");
        assert!((results[0].similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_search_empty_store() {
        assert!(EntryStore::new().search("anything").unwrap().is_empty());
    }

    #[test]
    fn test_search_blank_query() {
        let store = store_with(&["one"]);
        assert!(store.search(" \t ").unwrap().is_empty());
    }

    // ========== Serialize / Deserialize Tests ==========

    #[test]
    fn test_round_trip_preserves_order() {
        let store = store_with(&["first", "second", "third"]);
        let json = store.serialize().unwrap();

        let loaded = EntryStore::from_json(&json).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_serialize_is_pretty_array() {
        let json = store_with(&["one"]).serialize().unwrap();

        assert!(json.starts_with("[\n  {\n    \"id\": \"id1\""));
        assert!(serde_json::from_str::<Value>(&json).unwrap().is_array());
    }

    #[test]
    fn test_serialize_empty_store() {
        let json = EntryStore::new().serialize().unwrap();
        assert_eq!(json, "[]");
        assert!(EntryStore::from_json(&json).unwrap().is_empty());
    }

    #[test]
    fn test_deserialize_replaces_contents() {
        let mut store = store_with(&["old"]);
        let incoming = store_with(&["new one", "new two"]).serialize().unwrap();

        assert_eq!(store.deserialize(&incoming).unwrap(), 2);
        assert_eq!(store.list()[0].text, "new one");
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_deserialize_rejects_non_array() {
        let mut store = store_with(&["keep"]);

        for payload in [r#"{"entries": []}"#, "42", "null", r#""text""#] {
            let result = store.deserialize(payload);
            assert!(matches!(result, Err(StoreError::ImportFormat(_))), "{}", payload);
        }
        assert_eq!(store.count(), 1);
        assert_eq!(store.list()[0].text, "keep");
    }

    #[test]
    fn test_deserialize_rejects_invalid_json() {
        let mut store = store_with(&["keep"]);
        let err = store.deserialize("[{not json").unwrap_err();

        assert!(err.to_string().starts_with("Failed to import data: invalid JSON"));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_deserialize_rejects_missing_fields() {
        let mut store = store_with(&["keep"]);
        let err = store.deserialize(r#"[{"id": "x", "text": "no embedding"}]"#).unwrap_err();

        assert!(err.to_string().contains("entry 0"));
        assert_eq!(store.list()[0].text, "keep");
    }

    #[test]
    fn test_deserialize_rejects_wrong_dimension() {
        let mut store = EntryStore::new();
        let short = Entry::new("x", "short", Embedding::new(vec![1.0, 0.0]), 0);
        let json = serde_json::to_string(&vec![short]).unwrap();

        let err = store.deserialize(&json).unwrap_err();
        assert!(err.to_string().contains("2 dimensions"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_deserialize_rejects_duplicate_ids() {
        let mut store = EntryStore::new();
        let json = serde_json::to_string(&vec![entry("dup", "a"), entry("dup", "b")]).unwrap();

        let err = store.deserialize(&json).unwrap_err();
        assert!(err.to_string().contains("duplicate id dup"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_deserialize_error_leaves_all_entries() {
        let mut store = store_with(&["a", "b"]);
        let before = store.clone();
        let mut items: Vec<Value> = serde_json::from_str(&store_with(&["c"]).serialize().unwrap()).unwrap();
        items.push(serde_json::json!({"bogus": true}));

        assert!(store.deserialize(&Value::Array(items).to_string()).is_err());
        assert_eq!(store, before);
    }
}
