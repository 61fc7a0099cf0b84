use crate::error::Result;
use crate::model::{date_parts, DocKey, Document, LibraryEntry};
use crate::normalize::{ensure_date, repair_date};
use crate::redirect::{resolve_redirect, RedirectOutcome};
use crate::store::{to_indented_json, LibraryStore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;

/// The aggregated index: `"idType/idValue"` -> display entry. Sorted keys
/// keep rebuilds deterministic regardless of traversal order.
#[derive(Debug, Default)]
pub struct Index {
    entries: BTreeMap<String, LibraryEntry>,
}

impl Index {
    /// Load `index.json`. An absent file is an empty index; anything lost
    /// with it is reconciled by the next full refresh.
    pub fn load(store: &LibraryStore) -> Result<Self> {
        let path = store.index_path();
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(Self {
            entries: serde_json::from_str(&text)?,
        })
    }

    /// Overwrite `index.json` atomically (temp file + rename) so a crash
    /// mid-write never leaves a torn index behind.
    pub fn save(&self, store: &LibraryStore) -> Result<()> {
        let path = store.index_path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, to_indented_json(&self.entries)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn upsert(&mut self, entry: LibraryEntry) {
        self.entries.insert(entry.library.clone(), entry);
    }

    /// Remove the entry for `key`; removing an absent entry is fine.
    pub fn remove(&mut self, key: &DocKey) -> bool {
        self.entries.remove(&key.library()).is_some()
    }

    pub fn get(&self, library: &str) -> Option<&LibraryEntry> {
        self.entries.get(library)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Project a document into its display entry.
pub fn library_entry(doc: &Document, key: &DocKey) -> LibraryEntry {
    let mut ids = BTreeMap::new();
    ids.insert(key.id_type.clone(), Value::from(key.value.clone()));
    if key.id_type != "arxiv" {
        if let Some(arxiv) = doc.get("arxiv").and_then(Value::as_str) {
            if !arxiv.is_empty() {
                ids.insert("arxiv".to_string(), Value::from(arxiv));
            }
        }
    }

    LibraryEntry {
        date: doc.get("date").map(date_parts).unwrap_or_default(),
        author: doc.get("author").cloned().unwrap_or_else(empty),
        title: doc.get("title").cloned().unwrap_or_else(empty),
        journal: doc.get("container-title").cloned().unwrap_or_else(empty),
        library: key.library(),
        ids,
        file: doc.get("localfile").cloned().unwrap_or_else(empty),
        tag: doc
            .get("tag")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())),
        note: doc.get("note").cloned().unwrap_or_else(empty),
    }
}

fn empty() -> Value {
    Value::String(String::new())
}

/// Rebuilds the index from every document on disk. Full recomputation, no
/// diffing: one pass over the store reconciles the index with whatever
/// state the documents are in, including a corrupted or missing
/// `index.json`.
pub struct IndexBuilder<'a> {
    store: &'a LibraryStore,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(store: &'a LibraryStore) -> Self {
        Self { store }
    }

    /// Walk the store, normalize each document and overwrite the index.
    pub fn rebuild_full(&self) -> Result<Index> {
        let mut index = Index::default();

        for path in self.store.list() {
            let Some(key) = self.store.key_for_path(&path) else {
                continue;
            };
            let mut doc = self.store.read(&path)?;

            if resolve_redirect(self.store, &key, &mut doc)? == RedirectOutcome::Excluded {
                continue;
            }

            let mut changed = ensure_date(&mut doc);
            changed |= repair_date(&mut doc);
            if changed {
                self.store.write(&key, &doc)?;
            }

            index.upsert(library_entry(&doc, &key));
        }

        index.save(self.store)?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(pairs: serde_json::Value) -> Document {
        pairs.as_object().unwrap().clone()
    }

    fn store() -> (LibraryStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (LibraryStore::new(dir.path()), dir)
    }

    #[test]
    fn test_rebuild_on_empty_store_writes_empty_index() {
        let (store, dir) = store();
        let index = IndexBuilder::new(&store).rebuild_full().unwrap();

        assert!(index.is_empty());
        let text = std::fs::read_to_string(dir.path().join("index.json")).unwrap();
        assert_eq!(text, "{}");
    }

    #[test]
    fn test_rebuild_backfills_date_into_document() {
        let (store, _dir) = store();
        let key = DocKey::new("doi", "10.1/x");
        store
            .write(
                &key,
                &doc(json!({"title": "T", "issued": {"date-parts": [[2019, 4]]}})),
            )
            .unwrap();

        let index = IndexBuilder::new(&store).rebuild_full().unwrap();
        let entry = index.get("doi/10.1/x").unwrap();
        assert_eq!(entry.date, vec![Some(2019), Some(4), Some(1)]);

        // Derived once, cached in the file itself.
        let on_disk = store.read(&store.document_path(&key)).unwrap();
        assert_eq!(on_disk["date"], json!([2019, 4, 1]));
    }

    #[test]
    fn test_rebuild_repairs_zero_date_components() {
        let (store, _dir) = store();
        let key = DocKey::new("doi", "10.1/x");
        store
            .write(&key, &doc(json!({"title": "T", "date": [2020, 0, 0]})))
            .unwrap();

        let index = IndexBuilder::new(&store).rebuild_full().unwrap();
        let entry = index.get("doi/10.1/x").unwrap();
        assert_eq!(entry.date, vec![Some(2020), Some(1), Some(1)]);

        let on_disk = store.read(&store.document_path(&key)).unwrap();
        assert_eq!(on_disk["date"], json!([2020, 1, 1]));
    }

    #[test]
    fn test_rebuild_is_idempotent_byte_for_byte() {
        let (store, dir) = store();
        store
            .write(
                &DocKey::new("doi", "10.1/x"),
                &doc(json!({"title": "T", "date": [2020, 5, 1]})),
            )
            .unwrap();
        store
            .write(
                &DocKey::new("arxiv", "2101.00001"),
                &doc(json!({"title": "Preprint", "date": [2021, 1, 1]})),
            )
            .unwrap();

        IndexBuilder::new(&store).rebuild_full().unwrap();
        let first = std::fs::read(dir.path().join("index.json")).unwrap();
        IndexBuilder::new(&store).rebuild_full().unwrap();
        let second = std::fs::read(dir.path().join("index.json")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rebuild_excludes_live_redirect_and_cross_references_it() {
        let (store, _dir) = store();
        store
            .write(
                &DocKey::new("doi", "10.1/x"),
                &doc(json!({
                    "title": "T",
                    "arxiv": "2101.00001",
                    "date": [2020, 5, 1]
                })),
            )
            .unwrap();
        store
            .write(
                &DocKey::new("arxiv", "2101.00001"),
                &doc(json!({"redirect": "doi/10.1/x", "doi": "10.1/x"})),
            )
            .unwrap();

        let index = IndexBuilder::new(&store).rebuild_full().unwrap();
        assert_eq!(index.len(), 1);

        let entry = index.get("doi/10.1/x").unwrap();
        assert_eq!(entry.ids["doi"], json!("10.1/x"));
        assert_eq!(entry.ids["arxiv"], json!("2101.00001"));
        assert!(index.get("arxiv/2101.00001").is_none());
    }

    #[test]
    fn test_library_entry_projection_defaults() {
        let key = DocKey::new("doi", "10.1/x");
        let entry = library_entry(&doc(json!({"title": "T", "date": [2020, 5, 1]})), &key);

        assert_eq!(entry.title, json!("T"));
        assert_eq!(entry.author, json!(""));
        assert_eq!(entry.journal, json!(""));
        assert_eq!(entry.library, "doi/10.1/x");
        assert_eq!(entry.file, json!(""));
        assert_eq!(entry.tag, json!([]));
        assert_eq!(entry.note, json!(""));
    }

    #[test]
    fn test_index_round_trips_through_disk() {
        let (store, _dir) = store();
        let key = DocKey::new("doi", "10.1/x");
        let mut index = Index::default();
        index.upsert(library_entry(
            &doc(json!({"title": "T", "date": [2020, 5, 1], "tag": ["ml"]})),
            &key,
        ));
        index.save(&store).unwrap();

        let loaded = Index::load(&store).unwrap();
        let entry = loaded.get("doi/10.1/x").unwrap();
        assert_eq!(entry.title, json!("T"));
        assert_eq!(entry.tag, json!(["ml"]));
        assert_eq!(entry.ids["doi"], json!("10.1/x"));
    }

    #[test]
    fn test_remove_absent_entry_is_fine() {
        let mut index = Index::default();
        assert!(!index.remove(&DocKey::new("doi", "missing")));
    }
}
