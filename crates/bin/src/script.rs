//! Mutation scripts: a JSON array of operations applied to a root map.
//!
//! ```json
//! [
//!   {"op": "set", "path": "pages", "value": [{"title": "a", "tags": []}]},
//!   {"op": "push", "path": "pages.[0].tags", "value": "draft"},
//!   {"op": "transact", "ops": [
//!     {"op": "set", "path": "pages.[0].title", "value": "b"},
//!     {"op": "delete", "path": "pages.[0].tags"}
//!   ]}
//! ]
//! ```

use std::{fs, path::Path as FsPath};

use serde::Deserialize;
use tracing::debug;
use treewatch::{
    crdt::{Attributes, Doc, Input, ListRef, MapRef, TextRef, TransactionMut, Value},
    watch::{Path, Segment, parse_path, resolve_path},
};

type BoxError = Box<dyn std::error::Error>;

/// One scripted mutation. Paths are relative to the root map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// Writes a JSON value at a map key or replaces a list element
    Set {
        path: String,
        value: serde_json::Value,
    },
    /// Creates a text container at a map key
    SetText { path: String, text: String },
    /// Removes a map key or a list element
    Delete { path: String },
    /// Appends to the list at `path`
    Push {
        path: String,
        value: serde_json::Value,
    },
    /// Removes `len` elements from the list at `path`
    Remove {
        path: String,
        index: usize,
        #[serde(default = "one")]
        len: usize,
    },
    InsertText {
        path: String,
        index: usize,
        text: String,
    },
    DeleteText {
        path: String,
        index: usize,
        len: usize,
    },
    FormatText {
        path: String,
        index: usize,
        len: usize,
        attributes: Attributes,
    },
    /// Applies the nested operations as a single transaction
    Transact { ops: Vec<Op> },
}

fn one() -> usize {
    1
}

/// Reads a script file.
pub fn load(path: &FsPath) -> Result<Vec<Op>, BoxError> {
    let content = fs::read_to_string(path)?;
    let ops: Vec<Op> = serde_json::from_str(&content)?;
    debug!(ops = ops.len(), file = %path.display(), "loaded script");
    Ok(ops)
}

/// Applies one top-level operation in a transaction of its own. Writes made
/// before a failing operation stay applied.
pub fn apply_step(doc: &Doc, root: &MapRef, op: &Op) -> Result<(), BoxError> {
    let mut txn = doc.transact_mut()?;
    apply(&mut txn, root, op)
}

/// Applies one operation to `root` within `txn`.
pub fn apply(txn: &mut TransactionMut<'_>, root: &MapRef, op: &Op) -> Result<(), BoxError> {
    match op {
        Op::Set { path, value } => set(txn, root, path, Input::from(value.clone())),
        Op::SetText { path, text } => set(txn, root, path, Input::text(text.as_str())),
        Op::Delete { path } => {
            let (parent, last) = split(txn, root, path)?;
            let removed = match (&parent, &last) {
                (Value::Map(map), Segment::Key(key)) => map.remove(txn, key)?.is_some(),
                (Value::List(list), Segment::Index(index)) if *index < list.len(&*txn) => {
                    list.remove(txn, *index)?;
                    true
                }
                (Value::List(_), Segment::Index(_)) => false,
                _ => return Err(mismatch(path, &parent)),
            };
            if !removed {
                debug!(path, "nothing to delete");
            }
            Ok(())
        }
        Op::Push { path, value } => {
            list_at(txn, root, path)?.push(txn, value.clone())?;
            Ok(())
        }
        Op::Remove { path, index, len } => {
            list_at(txn, root, path)?.remove_range(txn, *index, *len)?;
            Ok(())
        }
        Op::InsertText { path, index, text } => {
            Ok(text_at(txn, root, path)?.insert(txn, *index, text)?)
        }
        Op::DeleteText { path, index, len } => {
            Ok(text_at(txn, root, path)?.delete(txn, *index, *len)?)
        }
        Op::FormatText {
            path,
            index,
            len,
            attributes,
        } => Ok(text_at(txn, root, path)?.format(txn, *index, *len, attributes.clone())?),
        Op::Transact { ops } => ops.iter().try_for_each(|op| apply(txn, root, op)),
    }
}

fn set(txn: &mut TransactionMut<'_>, root: &MapRef, path: &str, input: Input) -> Result<(), BoxError> {
    let (parent, last) = split(txn, root, path)?;
    match (&parent, last) {
        (Value::Map(map), Segment::Key(key)) => {
            map.insert(txn, key, input)?;
        }
        (Value::List(list), Segment::Index(index)) => {
            if index < list.len(&*txn) {
                list.remove(txn, index)?;
            }
            list.insert(txn, index, input)?;
        }
        _ => return Err(mismatch(path, &parent)),
    }
    Ok(())
}

/// Resolves everything but the last segment of `path`.
fn split(txn: &TransactionMut<'_>, root: &MapRef, path: &str) -> Result<(Value, Segment), BoxError> {
    let parsed = parse_path(path)?;
    let Some((last, parents)) = parsed.segments().split_last() else {
        return Err(format!("path '{path}' is empty").into());
    };
    if parsed.has_wildcards() {
        return Err(format!("path '{path}' contains a wildcard").into());
    }
    let parent = resolve(txn, root, &Path::new(parents.iter().cloned()), path)?;
    Ok((parent, last.clone()))
}

fn resolve(txn: &TransactionMut<'_>, root: &MapRef, path: &Path, original: &str) -> Result<Value, BoxError> {
    resolve_path(txn, &Value::Map(root.clone()), path)
        .ok_or_else(|| format!("path '{original}' does not resolve").into())
}

fn list_at(txn: &TransactionMut<'_>, root: &MapRef, path: &str) -> Result<ListRef, BoxError> {
    let value = resolve(txn, root, &parse_path(path)?, path)?;
    value.as_list().cloned().ok_or_else(|| mismatch(path, &value))
}

fn text_at(txn: &TransactionMut<'_>, root: &MapRef, path: &str) -> Result<TextRef, BoxError> {
    let value = resolve(txn, root, &parse_path(path)?, path)?;
    value.as_text().cloned().ok_or_else(|| mismatch(path, &value))
}

fn mismatch(path: &str, found: &Value) -> BoxError {
    format!("path '{path}' leads to a {}", found.type_name()).into()
}
