//! Splitting a text delta into renderable lines.

use serde::Serialize;

pub use crate::crdt::DeltaInsert;

/// One line of rich text, keyed by its position.
///
/// The key is the line index, so a renderer can skip lines whose key and
/// content are unchanged since the last pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub key: usize,
    pub inserts: Vec<DeltaInsert>,
}

impl Line {
    fn empty(key: usize) -> Self {
        Self {
            key,
            inserts: Vec::new(),
        }
    }

    /// Plain text of the line, without the line break.
    pub fn text(&self) -> String {
        self.inserts.iter().map(|insert| insert.insert.as_str()).collect()
    }

    /// Length in UTF-16 code units, the unit text offsets are counted in.
    pub fn len(&self) -> usize {
        self.inserts.iter().map(|insert| insert.insert.encode_utf16().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
    }
}

/// Splits `delta` at line breaks.
///
/// Line breaks are dropped; formatting of the surrounding runs is kept on
/// both sides. There is always at least one line, and a trailing break
/// yields a trailing empty line.
pub fn delta_to_lines(delta: &[DeltaInsert]) -> Vec<Line> {
    let mut lines = vec![Line::empty(0)];
    for insert in delta {
        for (i, piece) in insert.insert.split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::empty(lines.len()));
            }
            if piece.is_empty() {
                continue;
            }
            if let Some(line) = lines.last_mut() {
                line.inserts.push(DeltaInsert {
                    insert: piece.to_string(),
                    attributes: insert.attributes.clone(),
                });
            }
        }
    }
    lines
}
