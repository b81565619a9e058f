//! Subtree change matching: notify when anything under a path pattern
//! changes.

use tracing::trace;

use super::{Path, PathError, parse_path};
use crate::{
    crdt::{Container, Event, EventKind, PathSegment},
    observable::{Observable, Observer, Subscription},
};

/// Emits `root` on subscription and then once for every committed
/// transaction that changed something matching `pattern` below it.
///
/// Unlike [`watch_path`](super::watch_path) there is no deduplication: the
/// stream hands back the root container and the caller re-derives whatever
/// it needs. A `None` root emits `None` once and nothing else.
pub fn watch_path_pattern(root: Option<Container>, pattern: &Path) -> Observable<Option<Container>> {
    let pattern = pattern.clone();
    Observable::new(move |observer: Observer<Option<Container>>| {
        observer(root.clone());
        let Some(container) = &root else {
            return Subscription::empty();
        };

        let weak = container.downgrade();
        let pattern = pattern.clone();
        container.observe_deep(move |events| {
            if batch_matches(&pattern, events) {
                trace!(pattern = %pattern, events = events.len(), "pattern matched");
                observer(weak.upgrade());
            }
        })
    })
}

/// Parses `pattern` and watches it below `root`.
pub fn watch_path_pattern_str(
    root: Option<Container>,
    pattern: &str,
) -> Result<Observable<Option<Container>>, PathError> {
    Ok(watch_path_pattern(root, &parse_path(pattern)?))
}

fn batch_matches(pattern: &Path, events: &[Event]) -> bool {
    events
        .iter()
        .flat_map(changed_paths)
        .any(|changed| path_matches(pattern, &changed))
}

/// The concrete paths an event touched, relative to the observed container.
///
/// A map event yields one path per changed key. A list event yields the
/// list's own path. Text events yield nothing.
pub fn changed_paths(event: &Event) -> Vec<Vec<PathSegment>> {
    match event.kind() {
        EventKind::Map { keys } => keys
            .keys()
            .map(|key| {
                let mut path = event.path().to_vec();
                path.push(PathSegment::Key(key.clone()));
                path
            })
            .collect(),
        EventKind::List { .. } => vec![event.path().to_vec()],
        EventKind::Text { .. } => Vec::new(),
    }
}

/// Whether a changed path falls under `pattern`.
///
/// Segments are compared pairwise over the common prefix; wildcards match
/// anything. Whichever side is longer is ignored: a change below a watched
/// path matches, and so does a change above it.
pub fn path_matches(pattern: &Path, changed: &[PathSegment]) -> bool {
    pattern
        .segments()
        .iter()
        .zip(changed)
        .all(|(expected, actual)| expected.matches(actual))
}
