use crate::model::{date_parts, date_value, DateParts, Document};
use serde_json::Value;

/// Date-bearing fields, in tie-break priority order.
const DATE_FIELDS: [&str; 6] = [
    "published",
    "published-online",
    "published-print",
    "issued",
    "created",
    "deposited",
];

/// Derive a publication date from the document's date-bearing fields.
///
/// Each field whose first `date-parts` list is present and non-null
/// contributes that list as a candidate. The winner is the candidate with
/// the smallest join key, ties broken by field order; it is padded
/// on the right with 1 to exactly three parts. Empty when no field
/// carries a usable date.
pub fn published_date(doc: &Document) -> DateParts {
    let mut candidates: Vec<DateParts> = Vec::new();

    for field in DATE_FIELDS {
        let parts = doc
            .get(field)
            .and_then(|value| value.get("date-parts"))
            .and_then(|value| value.get(0));
        if let Some(Value::Array(list)) = parts {
            candidates.push(list.iter().map(Value::as_i64).collect());
        }
    }

    if candidates.is_empty() {
        return Vec::new();
    }

    // Stable sort: equal keys keep field priority order.
    candidates.sort_by_key(|parts| joined_key(parts));
    let mut best = candidates.swap_remove(0);
    while best.len() < 3 {
        best.push(Some(1));
    }
    best
}

/// Sort key used to pick the most complete candidate: each non-null part
/// rendered in decimal with a leading "0" when below 10, concatenated
/// without separators. Only a heuristic -- parts over two digits (years)
/// compare lexicographically rather than numerically -- but the front-end
/// depends on the exact ordering, so it is reproduced as-is.
fn joined_key(parts: &[Option<i64>]) -> String {
    let mut key = String::new();
    for part in parts.iter().flatten() {
        if *part < 10 {
            key.push('0');
        }
        key.push_str(&part.to_string());
    }
    key
}

/// Backfill `date` from the date-bearing fields. Returns true when the
/// document was modified; a document that already has `date` is left
/// untouched, whatever it contains.
pub fn ensure_date(doc: &mut Document) -> bool {
    if doc.contains_key("date") {
        return false;
    }
    let derived = published_date(doc);
    doc.insert("date".to_string(), date_value(&derived));
    true
}

/// Replace stored `date` parts equal to 0 with 1 (repair of entries
/// written before zero components were rejected). Rebuild-time only;
/// returns true when something changed.
pub fn repair_date(doc: &mut Document) -> bool {
    let Some(value) = doc.get("date") else {
        return false;
    };
    let mut parts = date_parts(value);
    let mut changed = false;
    for part in parts.iter_mut() {
        if *part == Some(0) {
            *part = Some(1);
            changed = true;
        }
    }
    if changed {
        doc.insert("date".to_string(), date_value(&parts));
    }
    changed
}
