//! The container kinds, and handles that refer to any of them.

use std::{fmt, rc::Weak};

use yrs::{Out, ReadTxn};

use super::{CRDTError, Doc, Event, ListRef, MapRef, TextRef, Value, doc::DocInner};
use crate::observable::Subscription;

/// The kinds of shared container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Map,
    List,
    Text,
}

impl ContainerKind {
    /// The kind of a `yrs` value, if it is a container this crate handles.
    pub(crate) fn of(out: &Out) -> Option<Self> {
        match out {
            Out::YMap(_) => Some(ContainerKind::Map),
            Out::YArray(_) => Some(ContainerKind::List),
            Out::YText(_) => Some(ContainerKind::Text),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContainerKind::Map => "map",
            ContainerKind::List => "list",
            ContainerKind::Text => "text",
        })
    }
}

/// Any shared container. Equality is identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Container {
    Map(MapRef),
    List(ListRef),
    Text(TextRef),
}

impl Container {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Container::Map(_) => ContainerKind::Map,
            Container::List(_) => ContainerKind::List,
            Container::Text(_) => ContainerKind::Text,
        }
    }

    /// The document this container lives in.
    pub fn doc(&self) -> &Doc {
        match self {
            Container::Map(map) => map.doc(),
            Container::List(list) => list.doc(),
            Container::Text(text) => text.doc(),
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Container::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Container::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextRef> {
        match self {
            Container::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Observes mutations of this container itself.
    pub fn observe(&self, f: impl Fn(&Event) + 'static) -> Subscription {
        match self {
            Container::Map(map) => map.observe(f),
            Container::List(list) => list.observe(f),
            Container::Text(text) => text.observe(f),
        }
    }

    /// Observes mutations anywhere in this container's subtree, one batch per
    /// transaction.
    pub fn observe_deep(&self, f: impl Fn(&[Event]) + 'static) -> Subscription {
        match self {
            Container::Map(map) => map.observe_deep(f),
            Container::List(list) => list.observe_deep(f),
            Container::Text(text) => text.observe_deep(f),
        }
    }

    pub fn to_json<T: ReadTxn>(&self, txn: &T) -> serde_json::Value {
        match self {
            Container::Map(map) => map.to_json(txn),
            Container::List(list) => list.to_json(txn),
            Container::Text(text) => serde_json::Value::String(text.get_string(txn)),
        }
    }

    /// Like [`Container::to_json`], in a read transaction of its own.
    pub fn snapshot(&self) -> Result<serde_json::Value, CRDTError> {
        Ok(self.to_json(&self.doc().transact()?))
    }

    pub(crate) fn downgrade(&self) -> WeakContainer {
        let target = match self {
            Container::Map(map) => Branch::Map(map.raw().clone()),
            Container::List(list) => Branch::List(list.raw().clone()),
            Container::Text(text) => Branch::Text(text.raw().clone()),
        };
        WeakContainer {
            doc: self.doc().downgrade(),
            target,
        }
    }
}

#[derive(Clone)]
enum Branch {
    Map(yrs::MapRef),
    List(yrs::ArrayRef),
    Text(yrs::TextRef),
}

/// Handle to a container that does not keep its document alive.
#[derive(Clone)]
pub(crate) struct WeakContainer {
    doc: Weak<DocInner>,
    target: Branch,
}

impl WeakContainer {
    pub(crate) fn upgrade(&self) -> Option<Container> {
        let doc = Doc::upgrade(&self.doc)?;
        Some(match &self.target {
            Branch::Map(map) => Container::Map(MapRef::new(doc, map.clone())),
            Branch::List(list) => Container::List(ListRef::new(doc, list.clone())),
            Branch::Text(text) => Container::Text(TextRef::new(doc, text.clone())),
        })
    }
}

impl From<MapRef> for Container {
    fn from(map: MapRef) -> Self {
        Container::Map(map)
    }
}

impl From<ListRef> for Container {
    fn from(list: ListRef) -> Self {
        Container::List(list)
    }
}

impl From<TextRef> for Container {
    fn from(text: TextRef) -> Self {
        Container::Text(text)
    }
}

impl From<Container> for Value {
    fn from(container: Container) -> Self {
        match container {
            Container::Map(map) => Value::Map(map),
            Container::List(list) => Value::List(list),
            Container::Text(text) => Value::Text(text),
        }
    }
}
