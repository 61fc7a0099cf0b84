use refer_core::index::{library_entry, Index, IndexBuilder};
use refer_core::normalize::ensure_date;
use refer_core::redirect::link_arxiv_redirect;
use refer_core::{DocKey, Document, LibraryError, LibraryStore};
use serde::Deserialize;
use serde_json::Value;

/// One decoded request off the wire.
#[derive(Debug)]
pub enum Request {
    Upsert { key: DocKey, content: Document },
    Delete { key: DocKey },
    Refresh,
}

/// Raw request shape. A message without `type` is a refresh; `content`
/// distinguishes delete (the literal string "delete") from upsert.
#[derive(Deserialize)]
struct RawRequest {
    #[serde(rename = "type")]
    id_type: Option<String>,
    value: Option<String>,
    content: Option<Value>,
}

impl Request {
    pub fn parse(message: Value) -> Result<Self, LibraryError> {
        let raw: RawRequest = serde_json::from_value(message)?;
        let Some(id_type) = raw.id_type else {
            return Ok(Request::Refresh);
        };
        let Some(value) = raw.value else {
            return Err(LibraryError::InvalidRequest("missing \"value\"".to_string()));
        };
        let key = DocKey::new(id_type, value);
        match raw.content {
            Some(Value::String(text)) if text == "delete" => Ok(Request::Delete { key }),
            Some(Value::Object(content)) => Ok(Request::Upsert { key, content }),
            Some(_) => Err(LibraryError::InvalidRequest(
                "\"content\" must be an object or \"delete\"".to_string(),
            )),
            None => Err(LibraryError::InvalidRequest(
                "missing \"content\"".to_string(),
            )),
        }
    }
}

/// Handles one message at a time against a single store root.
///
/// The process owns the store for its lifetime and every index
/// read-modify-write runs on this one thread, which is the single-writer
/// discipline the index file relies on. A crash between the document
/// write and the index patch leaves the index stale until the next full
/// refresh.
pub struct Dispatcher {
    store: LibraryStore,
}

impl Dispatcher {
    pub fn new(store: LibraryStore) -> Self {
        Self { store }
    }

    /// Handle one message; errors become the reply text instead of
    /// tearing down the loop.
    pub fn handle(&mut self, message: Value) -> String {
        match self.dispatch(message) {
            Ok(reply) => reply,
            Err(err) => {
                log::warn!("request failed: {err}");
                err.to_string()
            }
        }
    }

    fn dispatch(&mut self, message: Value) -> Result<String, LibraryError> {
        match Request::parse(message)? {
            Request::Upsert { key, content } => self.upsert(key, content),
            Request::Delete { key } => self.delete(key),
            Request::Refresh => self.refresh(),
        }
    }

    fn upsert(&mut self, key: DocKey, mut content: Document) -> Result<String, LibraryError> {
        log::debug!("upsert {key}");
        ensure_date(&mut content);
        let redirect = link_arxiv_redirect(&self.store, &key, &mut content)?;
        self.store.write(&key, &content)?;

        let mut index = Index::load(&self.store)?;
        index.upsert(library_entry(&content, &key));
        if let Some(redirect) = redirect {
            // The arXiv entry is now eclipsed by its redirect record.
            index.remove(&redirect);
        }
        index.save(&self.store)?;

        Ok(format!(
            "Library of {key} successfully updated.</br>Index updated."
        ))
    }

    fn delete(&mut self, key: DocKey) -> Result<String, LibraryError> {
        log::debug!("delete {key}");
        self.store.delete(&key)?;

        let mut index = Index::load(&self.store)?;
        index.remove(&key);
        index.save(&self.store)?;

        Ok(format!(
            "Library of {key} successfully deleted.</br>Index updated."
        ))
    }

    fn refresh(&mut self) -> Result<String, LibraryError> {
        let index = IndexBuilder::new(&self.store).rebuild_full()?;
        log::debug!("index rebuilt with {} entries", index.len());
        Ok("Index refreshed.".to_string())
    }
}
