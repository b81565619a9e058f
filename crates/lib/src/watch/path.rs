//! Path patterns for addressing nested container values.
//!
//! A path string is split on `.`. A segment written as `[n]` addresses list
//! position `n`, `[*]` (or a bare `*`) matches any single segment, and
//! anything else is a map key.
//!
//! ```
//! use treewatch::watch::{Path, Segment};
//!
//! let path: Path = "pages.[0].tags".parse()?;
//! assert_eq!(
//!     path.segments(),
//!     &[Segment::key("pages"), Segment::Index(0), Segment::key("tags")]
//! );
//! # Ok::<(), treewatch::watch::PathError>(())
//! ```
//!
//! There is no escape syntax: keys containing `.` or of the form `[...]`
//! cannot be addressed.

use std::{fmt, rc::Rc, str::FromStr};

use super::PathError;
use crate::crdt::PathSegment;

/// One parsed path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Map lookup
    Key(String),
    /// List lookup
    Index(usize),
    /// Matches any single segment
    Wildcard,
}

impl Segment {
    pub fn key(key: impl Into<String>) -> Self {
        Segment::Key(key.into())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard)
    }

    /// Whether this pattern segment accepts the concrete segment `other`.
    /// Keys only match keys and indices only match indices.
    pub fn matches(&self, other: &PathSegment) -> bool {
        match (self, other) {
            (Segment::Wildcard, _) => true,
            (Segment::Key(a), PathSegment::Key(b)) => a == b,
            (Segment::Index(a), PathSegment::Index(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{key}"),
            Segment::Index(index) => write!(f, "[{index}]"),
            Segment::Wildcard => write!(f, "[*]"),
        }
    }
}

impl From<PathSegment> for Segment {
    fn from(segment: PathSegment) -> Self {
        match segment {
            PathSegment::Key(key) => Segment::Key(key),
            PathSegment::Index(index) => Segment::Index(index),
        }
    }
}

/// An immutable, parsed path. Cloning is cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Rc<[Segment]>,
}

impl Path {
    pub fn new(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether any segment is a wildcard. Such a path can only be used as a
    /// pattern; [`watch_path`](super::watch_path) resolves wildcards to `None`.
    pub fn has_wildcards(&self) -> bool {
        self.segments.iter().any(Segment::is_wildcard)
    }

    pub(crate) fn shared(&self) -> Rc<[Segment]> {
        self.segments.clone()
    }
}

/// Parses a path string.
///
/// The empty string is the empty path. Empty components between dots are
/// empty-string keys.
pub fn parse_path(input: &str) -> Result<Path, PathError> {
    if input.is_empty() {
        return Ok(Path::default());
    }

    let segments = input
        .split('.')
        .map(|raw| parse_segment(input, raw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Path::new(segments))
}

fn parse_segment(path: &str, raw: &str) -> Result<Segment, PathError> {
    if raw == "*" {
        return Ok(Segment::Wildcard);
    }
    let Some(token) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) else {
        return Ok(Segment::Key(raw.to_string()));
    };
    if token == "*" {
        return Ok(Segment::Wildcard);
    }
    token
        .parse::<usize>()
        .map(Segment::Index)
        .map_err(|_| PathError::Malformed {
            path: path.to_string(),
            segment: raw.to_string(),
        })
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Path::new(segments)
    }
}
