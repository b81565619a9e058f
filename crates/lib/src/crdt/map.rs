//! Key-map shared container.

use std::fmt;

use yrs::{Map as _, Observable as _, ReadTxn};

use super::{
    CRDTError, Container, Doc, Event, Input, TransactionMut, Value,
    event::{self, Listener},
};
use crate::observable::Subscription;

/// Shared handle to a key-map container. Keys are unique and unordered.
///
/// Reads take any transaction; writes take a [`TransactionMut`] of the
/// same document and are reported to observers when it commits.
#[derive(Clone)]
pub struct MapRef {
    doc: Doc,
    inner: yrs::MapRef,
}

impl MapRef {
    pub(crate) fn new(doc: Doc, inner: yrs::MapRef) -> Self {
        Self { doc, inner }
    }

    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    /// The underlying `yrs` handle.
    pub fn raw(&self) -> &yrs::MapRef {
        &self.inner
    }

    pub fn get<T: ReadTxn>(&self, txn: &T, key: &str) -> Option<Value> {
        self.inner
            .get(txn, key)
            .map(|out| Value::from_out(out, &self.doc))
    }

    pub fn contains_key<T: ReadTxn>(&self, txn: &T, key: &str) -> bool {
        self.inner.contains_key(txn, key)
    }

    pub fn len<T: ReadTxn>(&self, txn: &T) -> usize {
        self.inner.len(txn) as usize
    }

    pub fn is_empty<T: ReadTxn>(&self, txn: &T) -> bool {
        self.len(txn) == 0
    }

    /// Keys in sorted order.
    pub fn keys<T: ReadTxn>(&self, txn: &T) -> Vec<String> {
        let mut keys: Vec<_> = self.inner.keys(txn).map(str::to_string).collect();
        keys.sort();
        keys
    }

    /// Entries sorted by key.
    pub fn entries<T: ReadTxn>(&self, txn: &T) -> Vec<(String, Value)> {
        let mut entries: Vec<_> = self
            .inner
            .iter(txn)
            .map(|(key, out)| (key.to_string(), Value::from_out(out, &self.doc)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Writes `value` under `key` and returns the stored value; nested map,
    /// list and text inputs come back as their new containers.
    pub fn insert(
        &self,
        txn: &mut TransactionMut<'_>,
        key: impl Into<String>,
        value: impl Into<Input>,
    ) -> Result<Value, CRDTError> {
        txn.check_owner(&self.doc)?;
        let out = self
            .inner
            .insert(txn.raw(), key.into(), value.into().into_prelim());
        Ok(Value::from_out(out, &self.doc))
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(
        &self,
        txn: &mut TransactionMut<'_>,
        key: &str,
    ) -> Result<Option<Value>, CRDTError> {
        txn.check_owner(&self.doc)?;
        Ok(self
            .inner
            .remove(txn.raw(), key)
            .map(|out| Value::from_out(out, &self.doc)))
    }

    /// Removes every entry.
    pub fn clear(&self, txn: &mut TransactionMut<'_>) -> Result<(), CRDTError> {
        txn.check_owner(&self.doc)?;
        self.inner.clear(txn.raw());
        Ok(())
    }

    /// Observes changes to this map's own entries.
    pub fn observe(&self, f: impl Fn(&Event) + 'static) -> Subscription {
        let weak = self.doc.downgrade();
        Listener::attach(f, |sink| {
            self.inner.observe(move |txn, event| {
                let Some(doc) = Doc::upgrade(&weak) else {
                    return;
                };
                if let Some(event) = Event::from_map(&doc, txn, event) {
                    sink.deliver(&doc, event);
                }
            })
        })
    }

    pub fn observe_deep(&self, f: impl Fn(&[Event]) + 'static) -> Subscription {
        event::observe_deep(&self.doc, &self.inner, f)
    }

    pub fn as_container(&self) -> Container {
        Container::Map(self.clone())
    }

    pub fn to_json<T: ReadTxn>(&self, txn: &T) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries(txn)
                .into_iter()
                .map(|(k, v)| (k, v.to_json(txn)))
                .collect(),
        )
    }

    /// Like [`MapRef::to_json`], in a read transaction of its own.
    pub fn snapshot(&self) -> Result<serde_json::Value, CRDTError> {
        Ok(self.to_json(&self.doc.transact()?))
    }
}

impl PartialEq for MapRef {
    fn eq(&self, other: &Self) -> bool {
        self.doc.same(&other.doc) && self.inner == other.inner
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.snapshot() {
            Ok(json) => write!(f, "MapRef({json})"),
            Err(_) => f.write_str("MapRef(<in transaction>)"),
        }
    }
}
