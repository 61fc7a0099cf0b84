use crate::error::Result;
use crate::model::{DocKey, Document};
use crate::store::LibraryStore;
use serde_json::Value;

/// Outcome of rebuild-time redirect resolution for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// Document gets an index entry.
    Keep,
    /// Document is eclipsed by its redirect target and gets no entry.
    Excluded,
}

/// On upsert of a DOI document declaring an arXiv id, write or update the
/// redirect record at `arxiv/<id>.json` pointing back at the DOI. The two
/// files describe one physical work; the DOI document stays canonical.
///
/// The record carries the DOI's localfile when set. Otherwise a localfile
/// stored on the previous version of the arXiv document (a preprint entry
/// being superseded, or an older record) is adopted into the DOI document
/// so the attachment is not orphaned.
///
/// Returns the key of the redirect record when one was written.
pub fn link_arxiv_redirect(
    store: &LibraryStore,
    key: &DocKey,
    content: &mut Document,
) -> Result<Option<DocKey>> {
    if key.id_type != "doi" {
        return Ok(None);
    }
    let Some(arxiv) = content
        .get("arxiv")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
    else {
        return Ok(None);
    };

    let redirect_key = DocKey::new("arxiv", arxiv);
    let doi_file = content
        .get("localfile")
        .and_then(Value::as_str)
        .filter(|file| !file.is_empty())
        .map(str::to_owned);

    let mut record = Document::new();
    record.insert("redirect".to_string(), Value::from(key.library()));
    record.insert("doi".to_string(), Value::from(key.value.clone()));

    match doi_file {
        Some(file) => {
            record.insert("localfile".to_string(), Value::from(file));
        }
        None => {
            if store.exists(&redirect_key) {
                let previous = store.read(&store.document_path(&redirect_key))?;
                if let Some(file) = previous
                    .get("localfile")
                    .and_then(Value::as_str)
                    .filter(|file| !file.is_empty())
                {
                    record.insert("localfile".to_string(), Value::from(file));
                    content.insert("localfile".to_string(), Value::from(file));
                }
            }
        }
    }

    store.write(&redirect_key, &record)?;
    Ok(Some(redirect_key))
}

/// Rebuild-time handling of a document carrying a `redirect` field.
///
/// The target is loaded; a target declaring an `arxiv` id equal to this
/// document's own value is the live half of the pair, so the redirect
/// document stays out of the index. Any other state means the redirect is
/// stale: the field is stripped on disk and the document indexed
/// normally. A missing target counts as stale.
pub fn resolve_redirect(
    store: &LibraryStore,
    key: &DocKey,
    doc: &mut Document,
) -> Result<RedirectOutcome> {
    let Some(target) = doc
        .get("redirect")
        .and_then(Value::as_str)
        .map(str::to_owned)
    else {
        return Ok(RedirectOutcome::Keep);
    };

    if let Ok(target_doc) = store.read(&store.library_path(&target)) {
        if target_doc.get("arxiv").and_then(Value::as_str) == Some(key.value.as_str()) {
            return Ok(RedirectOutcome::Excluded);
        }
    }

    doc.remove("redirect");
    store.write(key, doc)?;
    Ok(RedirectOutcome::Keep)
}
