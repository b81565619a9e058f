//! Rich-text shared container.
//!
//! Indices and lengths count UTF-16 code units. Positions that must survive
//! concurrent edits are captured as [`StickyIndex`]es, which point at a
//! character's identity rather than its offset.

use std::{collections::BTreeMap, fmt};

use yrs::{
    Any, Assoc, GetString as _, IndexedSequence as _, Observable as _, Out, ReadTxn,
    StickyIndex, Text as _,
    types::{Attrs, text::YChange},
};

use super::{
    CRDTError, Container, Doc, Event, TransactionMut,
    event::{self, Listener},
};
use crate::observable::Subscription;

/// Formatting attributes attached to a run of text.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// One run of identically formatted text.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeltaInsert {
    pub insert: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

impl DeltaInsert {
    pub fn new(insert: impl Into<String>) -> Self {
        Self {
            insert: insert.into(),
            attributes: None,
        }
    }

    pub fn with_attributes(insert: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            insert: insert.into(),
            attributes: (!attributes.is_empty()).then_some(attributes),
        }
    }
}

/// Shared handle to a rich-text container.
#[derive(Clone)]
pub struct TextRef {
    doc: Doc,
    inner: yrs::TextRef,
}

impl TextRef {
    pub(crate) fn new(doc: Doc, inner: yrs::TextRef) -> Self {
        Self { doc, inner }
    }

    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    /// The underlying `yrs` handle.
    pub fn raw(&self) -> &yrs::TextRef {
        &self.inner
    }

    /// Length in UTF-16 code units.
    pub fn len<T: ReadTxn>(&self, txn: &T) -> usize {
        self.inner.len(txn) as usize
    }

    pub fn is_empty<T: ReadTxn>(&self, txn: &T) -> bool {
        self.len(txn) == 0
    }

    /// Plain content, formatting dropped.
    pub fn get_string<T: ReadTxn>(&self, txn: &T) -> String {
        self.inner.get_string(txn)
    }

    pub fn insert(
        &self,
        txn: &mut TransactionMut<'_>,
        index: usize,
        content: &str,
    ) -> Result<(), CRDTError> {
        self.insert_with_attributes(txn, index, content, Attributes::new())
    }

    pub fn insert_with_attributes(
        &self,
        txn: &mut TransactionMut<'_>,
        index: usize,
        content: &str,
        attributes: Attributes,
    ) -> Result<(), CRDTError> {
        txn.check_owner(&self.doc)?;
        let len = self.len(&*txn);
        if index > len {
            return Err(CRDTError::IndexOutOfBounds { index, len });
        }
        let attributes: Attributes = attributes
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();
        if attributes.is_empty() {
            self.inner.insert(txn.raw(), index as u32, content);
        } else {
            let attrs = to_attrs(attributes)?;
            self.inner
                .insert_with_attributes(txn.raw(), index as u32, content, attrs);
        }
        Ok(())
    }

    /// Appends `content` at the end.
    pub fn push(&self, txn: &mut TransactionMut<'_>, content: &str) -> Result<(), CRDTError> {
        txn.check_owner(&self.doc)?;
        self.inner.push(txn.raw(), content);
        Ok(())
    }

    /// Deletes `len` code units starting at `index`.
    pub fn delete(
        &self,
        txn: &mut TransactionMut<'_>,
        index: usize,
        len: usize,
    ) -> Result<(), CRDTError> {
        txn.check_owner(&self.doc)?;
        self.check_range(&*txn, index, len)?;
        if len > 0 {
            self.inner.remove_range(txn.raw(), index as u32, len as u32);
        }
        Ok(())
    }

    /// Applies `attributes` to a range. A `null` attribute value clears that
    /// attribute.
    pub fn format(
        &self,
        txn: &mut TransactionMut<'_>,
        index: usize,
        len: usize,
        attributes: Attributes,
    ) -> Result<(), CRDTError> {
        txn.check_owner(&self.doc)?;
        self.check_range(&*txn, index, len)?;
        if len == 0 || attributes.is_empty() {
            return Ok(());
        }
        let attrs = to_attrs(attributes)?;
        self.inner.format(txn.raw(), index as u32, len as u32, attrs);
        Ok(())
    }

    /// Content as runs of identically formatted text. Embedded values are
    /// skipped.
    pub fn to_delta<T: ReadTxn>(&self, txn: &T) -> Vec<DeltaInsert> {
        let mut delta: Vec<DeltaInsert> = Vec::new();
        for diff in self.inner.diff(txn, YChange::identity) {
            let Out::Any(Any::String(insert)) = diff.insert else {
                continue;
            };
            let attributes = diff.attributes.map(|attrs| from_attrs(&attrs));
            match delta.last_mut() {
                Some(last) if last.attributes == attributes => last.insert.push_str(&insert),
                _ => delta.push(DeltaInsert {
                    insert: insert.to_string(),
                    attributes,
                }),
            }
        }
        delta
    }

    /// Captures `index` as a position that follows concurrent edits.
    ///
    /// A position at the end of the text sticks to the last character, since
    /// there is nothing after it to attach to. Returns `None` if `index` is
    /// past the end.
    pub fn relative_position<T: ReadTxn>(
        &self,
        txn: &T,
        index: usize,
        assoc: Assoc,
    ) -> Option<StickyIndex> {
        let index = u32::try_from(index).ok()?;
        if index as usize > self.len(txn) {
            return None;
        }
        self.inner
            .sticky_index(txn, index, assoc)
            .or_else(|| self.inner.sticky_index(txn, index, Assoc::Before))
    }

    /// Resolves a relative position back to an offset in the current text.
    ///
    /// Returns `None` if the anchor is unknown to this document or belongs to
    /// another container.
    pub fn resolve<T: ReadTxn>(&self, txn: &T, position: &StickyIndex) -> Option<usize> {
        let offset = position.get_offset(txn)?;
        (yrs::TextRef::from(offset.branch) == self.inner).then_some(offset.index as usize)
    }

    /// Observes edits and formatting of this text.
    pub fn observe(&self, f: impl Fn(&Event) + 'static) -> Subscription {
        let weak = self.doc.downgrade();
        Listener::attach(f, |sink| {
            self.inner.observe(move |txn, event| {
                let Some(doc) = Doc::upgrade(&weak) else {
                    return;
                };
                if let Some(event) = Event::from_text(&doc, txn, event) {
                    sink.deliver(&doc, event);
                }
            })
        })
    }

    pub fn observe_deep(&self, f: impl Fn(&[Event]) + 'static) -> Subscription {
        event::observe_deep(&self.doc, &self.inner, f)
    }

    pub fn as_container(&self) -> Container {
        Container::Text(self.clone())
    }

    /// Plain content, in a read transaction of its own.
    pub fn snapshot(&self) -> Result<String, CRDTError> {
        Ok(self.get_string(&self.doc.transact()?))
    }

    fn check_range<T: ReadTxn>(&self, txn: &T, index: usize, len: usize) -> Result<(), CRDTError> {
        let available = self.len(txn);
        if index.checked_add(len).is_none_or(|end| end > available) {
            return Err(CRDTError::InvalidRange {
                index,
                len,
                available,
            });
        }
        Ok(())
    }
}

fn to_attrs(attributes: Attributes) -> Result<Attrs, CRDTError> {
    attributes
        .into_iter()
        .map(|(key, value)| {
            let value: Any = serde_json::from_value(value).map_err(|err| {
                CRDTError::TypeMismatch {
                    expected: "attribute value".to_string(),
                    actual: err.to_string(),
                }
            })?;
            Ok((key.into(), value))
        })
        .collect()
}

fn from_attrs(attrs: &Attrs) -> Attributes {
    attrs
        .iter()
        .map(|(key, value)| {
            let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
            (key.to_string(), value)
        })
        .collect()
}

impl PartialEq for TextRef {
    fn eq(&self, other: &Self) -> bool {
        self.doc.same(&other.doc) && self.inner == other.inner
    }
}

impl fmt::Debug for TextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.snapshot() {
            Ok(content) => write!(f, "TextRef({content:?})"),
            Err(_) => f.write_str("TextRef(<in transaction>)"),
        }
    }
}
