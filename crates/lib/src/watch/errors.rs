//! Error types for path parsing.

use thiserror::Error;

/// A path string that cannot be parsed.
///
/// This is a programming error in the path literal, not a runtime condition:
/// paths are parsed once, before subscribing.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A bracketed segment whose content is neither `*` nor a non-negative
    /// base-10 integer
    #[error("Malformed path '{path}': segment '{segment}' is not an index or wildcard")]
    Malformed { path: String, segment: String },
}

impl PathError {
    /// The offending segment.
    pub fn segment(&self) -> &str {
        match self {
            PathError::Malformed { segment, .. } => segment,
        }
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}
