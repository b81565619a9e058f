//! Mutation events delivered to container observers.
//!
//! `yrs` hands observers borrowed events that are only valid inside the
//! committing transaction. They are converted here into owned [`Event`]s and
//! queued on the document, so callbacks run after the commit has released
//! the document and may read it or write to it again.

use std::{cell::Cell, collections::BTreeMap, fmt, rc::Rc};

use yrs::{
    Any, DeepObservable, Out,
    types::{
        Change, Delta, EntryChange as YEntryChange, Event as YEvent,
        PathSegment as YPathSegment, array::ArrayEvent, map::MapEvent, text::TextEvent,
    },
};

use super::{Container, Doc, ListRef, MapRef, TextRef, Value};
use crate::observable::Subscription;

/// One step of a concrete path from an observed container to a descendant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Entry of a key-map container
    Key(String),
    /// Position in an ordered-list container
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl From<YPathSegment> for PathSegment {
    fn from(segment: YPathSegment) -> Self {
        match segment {
            YPathSegment::Key(key) => PathSegment::Key(key.to_string()),
            YPathSegment::Index(index) => PathSegment::Index(index as usize),
        }
    }
}

/// Who produced a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Edits made through this document handle
    #[default]
    Local,
    /// Edits applied on behalf of a remote peer
    Remote(String),
}

impl Origin {
    fn of(txn: &yrs::TransactionMut) -> Self {
        match txn.origin() {
            Some(origin) => Origin::Remote(String::from_utf8_lossy(origin.as_ref()).into_owned()),
            None => Origin::Local,
        }
    }
}

/// How one map entry changed over a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryChange {
    Inserted(Value),
    Updated(Value, Value),
    Removed(Value),
}

impl EntryChange {
    fn from_yrs(doc: &Doc, change: &YEntryChange) -> Self {
        let value = |out: &Out| Value::from_out(out.clone(), doc);
        match change {
            YEntryChange::Inserted(new) => EntryChange::Inserted(value(new)),
            YEntryChange::Updated(old, new) => EntryChange::Updated(value(old), value(new)),
            YEntryChange::Removed(old) => EntryChange::Removed(value(old)),
        }
    }
}

/// A structural change to a list, in index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    Inserted { index: usize, len: usize },
    Removed { index: usize, len: usize },
}

/// A change to rich text, in index order. Indices and lengths count UTF-16
/// code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextChange {
    Inserted { index: usize, len: usize },
    Deleted { index: usize, len: usize },
    Formatted { index: usize, len: usize },
}

/// Kind-specific payload of an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Map { keys: BTreeMap<String, EntryChange> },
    List { changes: Vec<ListChange> },
    Text { changes: Vec<TextChange> },
}

/// A mutation of one container, as seen from the container being observed.
///
/// `path` leads from the observed container to [`Event::target`]; it is
/// empty for shallow observers.
#[derive(Debug, Clone)]
pub struct Event {
    target: Container,
    path: Vec<PathSegment>,
    kind: EventKind,
    origin: Origin,
}

impl Event {
    /// The container that was mutated.
    pub fn target(&self) -> &Container {
        &self.target
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Keys added, updated or removed by a map event. Empty for other kinds.
    pub fn keys_changed(&self) -> Vec<&str> {
        match &self.kind {
            EventKind::Map { keys } => keys.keys().map(String::as_str).collect(),
            EventKind::List { .. } | EventKind::Text { .. } => Vec::new(),
        }
    }

    /// A map event, or `None` if every key written in the transaction ended
    /// up where it started (inserted and removed again).
    pub(crate) fn from_map(doc: &Doc, txn: &yrs::TransactionMut, event: &MapEvent) -> Option<Self> {
        let keys: BTreeMap<_, _> = event
            .keys(txn)
            .iter()
            .map(|(key, change)| (key.to_string(), EntryChange::from_yrs(doc, change)))
            .collect();
        if keys.is_empty() {
            return None;
        }
        Some(Self {
            target: Container::Map(MapRef::new(doc.clone(), event.target().clone())),
            path: event.path().into_iter().map(PathSegment::from).collect(),
            kind: EventKind::Map { keys },
            origin: Origin::of(txn),
        })
    }

    pub(crate) fn from_array(
        doc: &Doc,
        txn: &yrs::TransactionMut,
        event: &ArrayEvent,
    ) -> Option<Self> {
        let mut changes = Vec::new();
        let mut index = 0;
        for change in event.delta(txn) {
            match change {
                Change::Added(values) => {
                    changes.push(ListChange::Inserted {
                        index,
                        len: values.len(),
                    });
                    index += values.len();
                }
                Change::Removed(len) => changes.push(ListChange::Removed {
                    index,
                    len: *len as usize,
                }),
                Change::Retain(len) => index += *len as usize,
            }
        }
        if changes.is_empty() {
            return None;
        }
        Some(Self {
            target: Container::List(ListRef::new(doc.clone(), event.target().clone())),
            path: event.path().into_iter().map(PathSegment::from).collect(),
            kind: EventKind::List { changes },
            origin: Origin::of(txn),
        })
    }

    pub(crate) fn from_text(doc: &Doc, txn: &yrs::TransactionMut, event: &TextEvent) -> Option<Self> {
        let mut changes = Vec::new();
        let mut index = 0;
        for delta in event.delta(txn) {
            match delta {
                Delta::Inserted(value, _) => {
                    let len = utf16_len(value);
                    changes.push(TextChange::Inserted { index, len });
                    index += len;
                }
                Delta::Deleted(len) => changes.push(TextChange::Deleted {
                    index,
                    len: *len as usize,
                }),
                Delta::Retain(len, attributes) => {
                    let len = *len as usize;
                    if attributes.is_some() {
                        changes.push(TextChange::Formatted { index, len });
                    }
                    index += len;
                }
            }
        }
        if changes.is_empty() {
            return None;
        }
        Some(Self {
            target: Container::Text(TextRef::new(doc.clone(), event.target().clone())),
            path: event.path().into_iter().map(PathSegment::from).collect(),
            kind: EventKind::Text { changes },
            origin: Origin::of(txn),
        })
    }

    /// Converts one event of a deep batch. XML events are not reported.
    fn from_yrs(doc: &Doc, txn: &yrs::TransactionMut, event: &YEvent) -> Option<Self> {
        match event {
            YEvent::Map(event) => Self::from_map(doc, txn, event),
            YEvent::Array(event) => Self::from_array(doc, txn, event),
            YEvent::Text(event) => Self::from_text(doc, txn, event),
            _ => None,
        }
    }
}

fn utf16_len(value: &Out) -> usize {
    match value {
        Out::Any(Any::String(s)) => s.encode_utf16().count(),
        // embeds take one position
        _ => 1,
    }
}

/// A registered observer callback.
///
/// The `yrs` observer owns one strong reference and queues payloads on the
/// document; the returned [`Subscription`] switches the listener off so that
/// payloads already queued are dropped too.
pub(crate) struct Listener<P> {
    active: Cell<bool>,
    callback: Box<dyn Fn(&P)>,
}

impl<P: 'static> Listener<P> {
    /// Creates a listener for `callback` and lets `register` hook it into a
    /// `yrs` observer.
    pub(crate) fn attach(
        callback: impl Fn(&P) + 'static,
        register: impl FnOnce(Rc<Self>) -> yrs::Subscription,
    ) -> Subscription {
        let listener = Rc::new(Self {
            active: Cell::new(true),
            callback: Box::new(callback),
        });
        let handle = register(listener.clone());
        Subscription::new(move || {
            listener.active.set(false);
            drop(handle);
        })
    }

    /// Queues `payload`; it is delivered once the committing transaction has
    /// released the document.
    pub(crate) fn deliver(self: &Rc<Self>, doc: &Doc, payload: P) {
        let listener = self.clone();
        doc.0.enqueue(Box::new(move || {
            if listener.active.get() {
                (listener.callback)(&payload);
            }
        }));
    }
}

/// Subscribes `f` to every transaction that changed `target` or anything
/// nested in it. One batch per transaction, shallower events first.
pub(crate) fn observe_deep<O: DeepObservable>(
    doc: &Doc,
    target: &O,
    f: impl Fn(&[Event]) + 'static,
) -> Subscription {
    let weak = doc.downgrade();
    Listener::attach(
        move |events: &Vec<Event>| f(events),
        |sink| {
            target.observe_deep(move |txn, events| {
                let Some(doc) = Doc::upgrade(&weak) else {
                    return;
                };
                let batch: Vec<Event> = events
                    .iter()
                    .filter_map(|event| Event::from_yrs(&doc, txn, event))
                    .collect();
                if !batch.is_empty() {
                    sink.deliver(&doc, batch);
                }
            })
        },
    )
}
