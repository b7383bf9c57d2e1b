//! Hierarchical key-path codec.
//!
//! Converts between a nested JSON document and a flat table of
//! separator-joined keys (e.g. `"common.hello" -> "Hello"`), and back.
//! The flat form is what [`crate::source`] stores and persists; the nested
//! form is what lives on disk.
//!
//! The transform is not symmetric: [`flatten`] walks objects *and*
//! arrays (array elements get their index as a path segment), while
//! [`unflatten`] rebuilds objects only. `flatten -> unflatten -> flatten`
//! always reproduces the same table, but `unflatten -> flatten -> unflatten`
//! reproduces the same document only when the original contained no arrays.

use serde_json::{
    Map,
    Value,
};

/// Flat key→value table in emission/insertion order.
///
/// Backed by an insertion-ordered map so that saving a freshly loaded
/// document keeps keys in document order (diff-friendly output).
pub type FlatTable = indexmap::IndexMap<String, String>;

/// Flatten a nested JSON document into a separator-joined key table.
///
/// Object fields extend the path with their name, array elements with their
/// index; scalars emit one entry. Traversal follows document order, and the
/// returned table iterates in emission order.
///
/// Empty objects and arrays contribute no entries, so they are lost on a
/// round trip. The separator must not occur inside any field name; this is
/// a caller obligation and is not validated.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use lazy_i18n::codec::flatten;
///
/// let document = json!({
///     "common": {
///         "hello": "Hello",
///         "goodbye": "Goodbye"
///     }
/// });
///
/// let table = flatten(&document, ".");
/// assert_eq!(table.get("common.hello"), Some(&"Hello".to_string()));
/// assert_eq!(table.get("common.goodbye"), Some(&"Goodbye".to_string()));
/// ```
#[must_use]
pub fn flatten(document: &Value, separator: &str) -> FlatTable {
    let mut table = FlatTable::new();
    flatten_value(document, separator, None, &mut table);
    table
}

/// Depth-first worker for [`flatten`].
fn flatten_value(value: &Value, separator: &str, path: Option<&str>, table: &mut FlatTable) {
    match value {
        Value::Object(fields) => {
            for (name, child) in fields {
                let child_path =
                    path.map_or_else(|| name.clone(), |p| format!("{p}{separator}{name}"));
                flatten_value(child, separator, Some(&child_path), table);
            }
        }
        Value::Array(elements) => {
            for (index, child) in elements.iter().enumerate() {
                let child_path =
                    path.map_or_else(|| index.to_string(), |p| format!("{p}{separator}{index}"));
                flatten_value(child, separator, Some(&child_path), table);
            }
        }
        scalar => {
            if let Some(key) = path {
                table.insert(key.to_string(), scalar_text(scalar));
            } else {
                tracing::debug!("scalar at document root has no key path, skipping");
            }
        }
    }
}

/// Scalar rendering: strings verbatim, every other scalar as its JSON text
/// (`42`, `true`, `null`).
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Rebuild a nested JSON document from a flat table.
///
/// Each key is split on `separator` (empty segments produced by leading,
/// trailing, or doubled separators are discarded); every segment but the
/// last becomes an object node and the last holds the value as a JSON
/// string. Array reconstruction is not attempted: segments that were array
/// indices come back as object fields named `"0"`, `"1"`, ...
///
/// When one key's path is a prefix of another's, the entry processed later
/// wins: a scalar in the middle of a longer path is replaced by an object,
/// and a value landing on an existing object replaces it. Resolution
/// therefore follows table iteration order.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use lazy_i18n::codec::FlatTable;
/// use lazy_i18n::codec::unflatten;
///
/// let mut table = FlatTable::new();
/// table.insert("common.hello".to_string(), "Hello".to_string());
///
/// let document = unflatten(&table, ".");
/// assert_eq!(document, json!({ "common": { "hello": "Hello" } }));
/// ```
#[must_use]
pub fn unflatten(table: &FlatTable, separator: &str) -> Value {
    let mut root = Map::new();

    for (key, value) in table {
        let segments: Vec<&str> = key.split(separator).filter(|s| !s.is_empty()).collect();
        let Some((leaf, parents)) = segments.split_last() else {
            tracing::warn!(key = %key, "key has no non-empty path segments, skipping");
            continue;
        };

        insert_path(&mut root, parents, leaf, value);
    }

    Value::Object(root)
}

/// Insert `value` at `leaf` under the object reached by descending `parents`.
///
/// Intermediate objects are created as needed, and any existing non-object
/// value along the path is replaced with a fresh object (matching the lossy
/// behavior documented on [`unflatten`]). Recursion is used so that no mutable
/// borrow of a parent map is held across the descent into its child.
fn insert_path(parent: &mut Map<String, Value>, parents: &[&str], leaf: &str, value: &str) {
    let Some((head, rest)) = parents.split_first() else {
        parent.insert(leaf.to_string(), Value::String(value.to_string()));
        return;
    };

    let slot = parent
        .entry((*head).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(child) = slot {
        insert_path(child, rest, leaf, value);
    }
}
