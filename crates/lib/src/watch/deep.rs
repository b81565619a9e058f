//! Deep path watching: a stream of the value found at a path.
//!
//! Each path level watches one container with a shallow observer and
//! re-resolves its segment on every mutation. Distinct child values switch
//! the nested watcher over to the new child, so at any moment exactly one
//! watcher per level is attached, and it is attached to the container
//! currently found at that level.

use std::rc::Rc;

use tracing::{trace, warn};

use super::{Path, PathError, Segment, parse_path};
use crate::{
    crdt::{Container, ReadTxn, Value},
    observable::{Observable, Observer},
};

/// Watches the value at `path` below `root`.
///
/// The stream emits the current value on subscription and again whenever a
/// mutation changes what the path resolves to: a different scalar, or a
/// different container replacing the one found before. Mutations inside a
/// container value found at the path do not re-emit it; watch that
/// container with [`super::observe_deep`] for those. A path leading through a
/// missing entry, a non-container, or a mismatched segment kind (an index
/// into a map, a key into a list) resolves to `None`; the nearest existing
/// container keeps being watched so the value appears once the structure is
/// created.
///
/// ```
/// use treewatch::{crdt::Doc, watch::{Path, watch_path}};
/// use std::{cell::RefCell, rc::Rc};
///
/// let doc = Doc::new();
/// let root = doc.get_or_insert_map("root")?;
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = seen.clone();
/// let _sub = watch_path(root.clone(), &"a.b".parse::<Path>()?)
///     .subscribe(move |value| sink.borrow_mut().push(value.map(|v| v.snapshot().unwrap())));
///
/// root.insert(&mut doc.transact_mut()?, "a", serde_json::json!({"b": 1}))?;
/// assert_eq!(*seen.borrow(), vec![None, Some(serde_json::json!(1))]);
/// # Ok::<(), treewatch::Error>(())
/// ```
pub fn watch_path(root: impl Into<Value>, path: &Path) -> Observable<Option<Value>> {
    // Levels below a switch emit their own first value, which can repeat
    // what the stream already carried
    watch_from(Some(root.into()), path.shared(), 0).distinct_until_changed()
}

/// Parses `path` and watches it below `root`.
pub fn watch_path_str(
    root: impl Into<Value>,
    path: &str,
) -> Result<Observable<Option<Value>>, PathError> {
    Ok(watch_path(root, &parse_path(path)?))
}

fn watch_from(target: Option<Value>, path: Rc<[Segment]>, depth: usize) -> Observable<Option<Value>> {
    let Some(segment) = path.get(depth).cloned() else {
        return Observable::of(target);
    };
    let container = match target {
        Some(Value::Map(map)) => Container::Map(map),
        Some(Value::List(list)) => Container::List(list),
        _ => return Observable::of(None),
    };

    Observable::new(move |observer: Observer<Option<Value>>| {
        observer(read_segment(&container, &segment));

        let weak = container.downgrade();
        let segment = segment.clone();
        container.observe(move |_| {
            if let Some(container) = weak.upgrade() {
                observer(read_segment(&container, &segment));
            }
        })
    })
    .distinct_until_changed()
    .switch_map(move |child| watch_from(child, path.clone(), depth + 1))
}

fn read_segment(container: &Container, segment: &Segment) -> Option<Value> {
    match container.doc().transact() {
        Ok(txn) => resolve_segment(&txn, container, segment),
        Err(err) => {
            warn!(error = %err, segment = %segment, "cannot read watched container");
            None
        }
    }
}

/// Resolves one segment against a container. Mismatched segment kinds and
/// wildcards resolve to `None`.
pub fn resolve_segment<T: ReadTxn>(txn: &T, container: &Container, segment: &Segment) -> Option<Value> {
    let value = match (container, segment) {
        (Container::Map(map), Segment::Key(key)) => map.get(txn, key),
        (Container::List(list), Segment::Index(index)) => list.get(txn, *index),
        _ => None,
    };
    trace!(
        container = %container.kind(),
        segment = %segment,
        found = value.as_ref().map(crate::crdt::Value::type_name),
        "resolved path segment"
    );
    value
}

/// Resolves a whole path once, without watching.
pub fn resolve_path<T: ReadTxn>(txn: &T, root: &Value, path: &Path) -> Option<Value> {
    path.segments()
        .iter()
        .try_fold(root.clone(), |current, segment| {
            resolve_segment(txn, &current.as_container()?, segment)
        })
}
