use crate::error::Result;
use crate::model::{DocKey, Document};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the aggregated index file at the store root.
pub const INDEX_FILE: &str = "index.json";

/// File-backed document store rooted at one library directory.
///
/// Layout: `<root>/<idType>/<idValue>.json` per document, `index.json`
/// at the root. Identifier values may contain `/` (DOIs do), producing
/// nested directories under the id-type directory.
pub struct LibraryStore {
    root: PathBuf,
}

impl LibraryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `key`.
    pub fn document_path(&self, key: &DocKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Path of the aggregated index file.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Path of an arbitrary `"idType/idValue"` reference.
    pub fn library_path(&self, library: &str) -> PathBuf {
        self.root.join(format!("{library}.json"))
    }

    pub fn exists(&self, key: &DocKey) -> bool {
        self.document_path(key).is_file()
    }

    /// Write `doc`, creating id-type directories as needed. Overwrites
    /// any existing file.
    pub fn write(&self, key: &DocKey, doc: &Document) -> Result<()> {
        let path = self.document_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, to_indented_json(doc)?)?;
        Ok(())
    }

    /// Parse one stored file as a document.
    pub fn read(&self, path: &Path) -> Result<Document> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Remove the document for `key`. Absent files are fine.
    pub fn delete(&self, key: &DocKey) -> Result<()> {
        match fs::remove_file(self.document_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// All document files: every `.json` under a top-level id-type
    /// directory, recursively, excluding the index by name. Traversal
    /// order is not part of the contract.
    pub fn list(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let Ok(entries) = fs::read_dir(&self.root) else {
            return files;
        };

        for entry in entries.filter_map(|e| e.ok()) {
            if !entry.path().is_dir() {
                continue;
            }

            for entry in WalkDir::new(entry.path())
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();

                if path.is_file() {
                    if let Some(ext) = path.extension() {
                        if ext == "json" && path.file_name().is_some_and(|name| name != INDEX_FILE)
                        {
                            files.push(path.to_path_buf());
                        }
                    }
                }
            }
        }

        files
    }

    /// Recover `(idType, idValue)` from a stored path. The first path
    /// component under the root is the id type and everything after it
    /// the value, so values containing `/` survive the round trip.
    pub fn key_for_path(&self, path: &Path) -> Option<DocKey> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut components = relative.components();
        let id_type = components.next()?.as_os_str().to_str()?;
        let value = components.as_path().to_str()?.strip_suffix(".json")?;
        if value.is_empty() {
            return None;
        }
        Some(DocKey::new(id_type, value))
    }
}

/// 4-space-indented JSON, the on-disk format the store has always used.
pub fn to_indented_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}
