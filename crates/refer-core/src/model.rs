use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A reference document body. Documents are open-schema (whatever the
/// metadata source returned), so they stay as raw JSON maps.
pub type Document = serde_json::Map<String, Value>;

/// Publication date as ordered parts (year, month, day). Degenerate
/// upstream data can carry nulls inside `date-parts`, hence the Option.
pub type DateParts = Vec<Option<i64>>;

/// Document identity: `(idType, idValue)`, encoded in the file path
/// `<idType>/<idValue>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    pub id_type: String,
    pub value: String,
}

impl DocKey {
    pub fn new(id_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id_type: id_type.into(),
            value: value.into(),
        }
    }

    /// The index key, `"idType/idValue"`.
    pub fn library(&self) -> String {
        format!("{}/{}", self.id_type, self.value)
    }

    /// Path of the document relative to the store root.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(format!("{}/{}.json", self.id_type, self.value))
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id_type, self.value)
    }
}

/// Display-ready projection of one document, as stored in `index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    #[serde(default)]
    pub date: DateParts,
    #[serde(default)]
    pub author: Value,
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub journal: Value,
    /// The `"idType/idValue"` index key, repeated inside the entry so the
    /// front-end can render it without reparsing the map key.
    pub library: String,
    /// The identifier pair itself (`"doi": "10.1/x"`) plus, on a DOI
    /// entry, the arXiv cross-reference when the document declares one.
    #[serde(flatten)]
    pub ids: BTreeMap<String, Value>,
    #[serde(default)]
    pub file: Value,
    #[serde(default)]
    pub tag: Value,
    #[serde(default)]
    pub note: Value,
}

/// Read a stored `date` value back into parts; non-integer elements come
/// through as null.
pub fn date_parts(value: &Value) -> DateParts {
    value
        .as_array()
        .map(|parts| parts.iter().map(Value::as_i64).collect())
        .unwrap_or_default()
}

/// Render parts back to a JSON array.
pub fn date_value(parts: &DateParts) -> Value {
    Value::Array(
        parts
            .iter()
            .map(|part| match part {
                Some(n) => Value::from(*n),
                None => Value::Null,
            })
            .collect(),
    )
}
