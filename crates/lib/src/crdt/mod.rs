//! Shared containers: the mutable, observable document tree.
//!
//! A [`Doc`] owns named root containers, backed by a [`yrs`] document.
//! Containers come in three kinds:
//!
//! - [`MapRef`] - unique keys, insertion order irrelevant
//! - [`ListRef`] - insertion-order-significant sequence
//! - [`TextRef`] - rich text with [`StickyIndex`] positions
//!
//! Reads take a transaction and return [`Value`]s; writes take a
//! [`TransactionMut`] and accept [`Input`]s. Each committed transaction is
//! reported to observers: shallow observers ([`Container::observe`]) get one
//! [`Event`] per mutated container, deep observers
//! ([`Container::observe_deep`]) get every event of their subtree in a single
//! batch, each tagged with its [`PathSegment`] path from the observed
//! container.

// Declared first: everything else builds on containers and values
mod container;
pub mod value;

pub mod doc;
pub mod errors;
pub mod event;
pub mod list;
pub mod map;
pub mod text;

pub use container::{Container, ContainerKind};
pub(crate) use container::WeakContainer;
pub use doc::{Doc, TransactionMut};
pub use errors::CRDTError;
pub use event::{EntryChange, Event, EventKind, ListChange, Origin, PathSegment, TextChange};
pub use list::ListRef;
pub use map::MapRef;
pub use text::{Attributes, DeltaInsert, TextRef};
pub use value::{Input, Value};
pub use yrs::{Assoc, ReadTxn, StickyIndex};
