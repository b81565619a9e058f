//! Selection range tracking across text mutations.

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::crdt::{Assoc, ReadTxn, StickyIndex, TextRef};

/// A selection in UTF-16 code unit offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineRange {
    pub index: usize,
    pub length: usize,
}

impl InlineRange {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    pub fn caret(index: usize) -> Self {
        Self::new(index, 0)
    }

    pub fn end(&self) -> usize {
        self.index + self.length
    }

    pub fn is_collapsed(&self) -> bool {
        self.length == 0
    }
}

#[derive(Debug, Clone)]
struct Anchors {
    anchor: StickyIndex,
    focus: StickyIndex,
}

/// Holds the current selection and keeps it attached to the same characters
/// while the text changes underneath it.
#[derive(Debug, Default)]
pub struct RangeService {
    range: Cell<Option<InlineRange>>,
    anchors: RefCell<Option<Anchors>>,
}

impl RangeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(&self) -> Option<InlineRange> {
        self.range.get()
    }

    /// Sets the selection and captures it as sticky positions in `text`.
    /// A range reaching past the end of `text` is clamped.
    pub fn set_range<T: ReadTxn>(&self, txn: &T, text: &TextRef, range: Option<InlineRange>) {
        let range = range.map(|range| {
            let len = text.len(txn);
            let index = range.index.min(len);
            InlineRange::new(index, range.length.min(len - index))
        });
        let anchors = range.and_then(|range| {
            Some(Anchors {
                anchor: text.relative_position(txn, range.index, Assoc::After)?,
                focus: text.relative_position(txn, range.end(), Assoc::After)?,
            })
        });
        self.range.set(range);
        *self.anchors.borrow_mut() = anchors;
    }

    /// Re-resolves the captured positions against the current content of
    /// `text`. Leaves the stored range untouched if they no longer resolve.
    pub fn sync_range<T: ReadTxn>(&self, txn: &T, text: &TextRef) -> Option<InlineRange> {
        let resolved = self.anchors.borrow().as_ref().and_then(|anchors| {
            let anchor = text.resolve(txn, &anchors.anchor)?;
            let focus = text.resolve(txn, &anchors.focus)?;
            Some(InlineRange::new(anchor, focus.saturating_sub(anchor)))
        });
        match resolved {
            Some(range) => {
                trace!(index = range.index, length = range.length, "selection resynced");
                self.range.set(Some(range));
            }
            None => trace!("selection not resolvable, keeping previous range"),
        }
        self.range.get()
    }

    pub fn clear(&self) {
        self.range.set(None);
        *self.anchors.borrow_mut() = None;
    }
}
