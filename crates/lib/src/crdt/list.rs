//! Ordered-list shared container.

use std::fmt;

use yrs::{Array as _, Observable as _, ReadTxn};

use super::{
    CRDTError, Container, Doc, Event, Input, TransactionMut, Value,
    event::{self, Listener},
};
use crate::observable::Subscription;

/// Shared handle to an ordered-list container.
#[derive(Clone)]
pub struct ListRef {
    doc: Doc,
    inner: yrs::ArrayRef,
}

impl ListRef {
    pub(crate) fn new(doc: Doc, inner: yrs::ArrayRef) -> Self {
        Self { doc, inner }
    }

    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    /// The underlying `yrs` handle.
    pub fn raw(&self) -> &yrs::ArrayRef {
        &self.inner
    }

    pub fn get<T: ReadTxn>(&self, txn: &T, index: usize) -> Option<Value> {
        let index = u32::try_from(index).ok()?;
        self.inner
            .get(txn, index)
            .map(|out| Value::from_out(out, &self.doc))
    }

    pub fn len<T: ReadTxn>(&self, txn: &T) -> usize {
        self.inner.len(txn) as usize
    }

    pub fn is_empty<T: ReadTxn>(&self, txn: &T) -> bool {
        self.len(&*txn) == 0
    }

    pub fn to_vec<T: ReadTxn>(&self, txn: &T) -> Vec<Value> {
        self.inner
            .iter(txn)
            .map(|out| Value::from_out(out, &self.doc))
            .collect()
    }

    /// Appends `value` and returns the stored value.
    pub fn push(
        &self,
        txn: &mut TransactionMut<'_>,
        value: impl Into<Input>,
    ) -> Result<Value, CRDTError> {
        txn.check_owner(&self.doc)?;
        let out = self.inner.push_back(txn.raw(), value.into().into_prelim());
        Ok(Value::from_out(out, &self.doc))
    }

    /// Inserts `value` before position `index`; `index == len` appends.
    pub fn insert(
        &self,
        txn: &mut TransactionMut<'_>,
        index: usize,
        value: impl Into<Input>,
    ) -> Result<Value, CRDTError> {
        txn.check_owner(&self.doc)?;
        let len = self.len(&*txn);
        if index > len {
            return Err(CRDTError::IndexOutOfBounds { index, len });
        }
        let out = self
            .inner
            .insert(txn.raw(), index as u32, value.into().into_prelim());
        Ok(Value::from_out(out, &self.doc))
    }

    /// Removes `len` items starting at `index` and returns them. Removed
    /// containers read as empty afterwards.
    pub fn remove_range(
        &self,
        txn: &mut TransactionMut<'_>,
        index: usize,
        len: usize,
    ) -> Result<Vec<Value>, CRDTError> {
        txn.check_owner(&self.doc)?;
        let available = self.len(&*txn);
        if index.checked_add(len).is_none_or(|end| end > available) {
            return Err(CRDTError::InvalidRange {
                index,
                len,
                available,
            });
        }
        if len == 0 {
            return Ok(Vec::new());
        }
        let removed: Vec<_> = self
            .inner
            .iter(&*txn)
            .skip(index)
            .take(len)
            .map(|out| Value::from_out(out, &self.doc))
            .collect();
        self.inner.remove_range(txn.raw(), index as u32, len as u32);
        Ok(removed)
    }

    /// Removes the item at `index`.
    pub fn remove(&self, txn: &mut TransactionMut<'_>, index: usize) -> Result<Value, CRDTError> {
        let len = self.len(&*txn);
        self.remove_range(txn, index, 1)?
            .pop()
            .ok_or(CRDTError::IndexOutOfBounds { index, len })
    }

    /// Observes insertions and removals in this list.
    pub fn observe(&self, f: impl Fn(&Event) + 'static) -> Subscription {
        let weak = self.doc.downgrade();
        Listener::attach(f, |sink| {
            self.inner.observe(move |txn, event| {
                let Some(doc) = Doc::upgrade(&weak) else {
                    return;
                };
                if let Some(event) = Event::from_array(&doc, txn, event) {
                    sink.deliver(&doc, event);
                }
            })
        })
    }

    pub fn observe_deep(&self, f: impl Fn(&[Event]) + 'static) -> Subscription {
        event::observe_deep(&self.doc, &self.inner, f)
    }

    pub fn as_container(&self) -> Container {
        Container::List(self.clone())
    }

    pub fn to_json<T: ReadTxn>(&self, txn: &T) -> serde_json::Value {
        serde_json::Value::Array(
            self.to_vec(txn)
                .iter()
                .map(|value| value.to_json(txn))
                .collect(),
        )
    }

    /// Like [`ListRef::to_json`], in a read transaction of its own.
    pub fn snapshot(&self) -> Result<serde_json::Value, CRDTError> {
        Ok(self.to_json(&self.doc.transact()?))
    }
}

impl PartialEq for ListRef {
    fn eq(&self, other: &Self) -> bool {
        self.doc.same(&other.doc) && self.inner == other.inner
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.snapshot() {
            Ok(json) => write!(f, "ListRef({json})"),
            Err(_) => f.write_str("ListRef(<in transaction>)"),
        }
    }
}
