//!
//! Treewatch: path-addressed observation of collaborative document trees.
//!
//! ## Core Concepts
//!
//! * **Shared containers (`crdt`)**: a [`crdt::Doc`] owns named maps, lists
//!   and rich texts on top of a `yrs` document. Writes are grouped into
//!   explicit transactions and reported to shallow and deep observers once
//!   they commit.
//! * **Streams (`observable`)**: cold [`observable::Observable`]s that emit
//!   once on subscription and again on change, with a
//!   [`observable::Subscription`] disposer for every subscriber.
//! * **Path watching (`watch`)**: [`watch::watch_path`] follows the value at
//!   a path such as `pages.[0].title`, [`watch::watch_path_pattern`] fires
//!   when anything under a wildcard pattern like `pages.[*].tags` changes.
//! * **Inline rendering (`inline`)**: line-keyed rendering of rich text with
//!   selection ranges that survive concurrent edits.

pub mod crdt;
pub mod inline;
pub mod observable;
pub mod watch;

/// Y-CRDT types re-exported for convenience.
///
/// This module re-exports the `yrs` crate so that client code can reach the
/// underlying document, for example to exchange updates with other peers,
/// without adding `yrs` as a separate dependency.
pub mod y_crdt {
    pub use yrs::*;
}

/// Result type used throughout the Treewatch library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Treewatch library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured CRDT errors from the crdt module
    #[error(transparent)]
    CRDT(crdt::CRDTError),

    /// Path parsing errors from the watch module
    #[error(transparent)]
    Path(watch::PathError),

    /// Renderer errors from the inline module
    #[error(transparent)]
    Render(inline::RenderError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::CRDT(_) => "crdt",
            Error::Path(_) => "watch",
            Error::Render(_) => "inline",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error is a container kind mismatch.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::CRDT(crdt_err) => crdt_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error is an out-of-range index or range.
    pub fn is_bounds_error(&self) -> bool {
        match self {
            Error::CRDT(crdt_err) => crdt_err.is_bounds_error(),
            _ => false,
        }
    }

    /// Check if this error comes from opening or using a transaction.
    pub fn is_transaction_error(&self) -> bool {
        match self {
            Error::CRDT(crdt_err) => crdt_err.is_transaction_error(),
            _ => false,
        }
    }

    /// Check if this error is a malformed path.
    pub fn is_path_error(&self) -> bool {
        matches!(self, Error::Path(_))
    }

    /// Check if this error came from the host renderer.
    pub fn is_render_error(&self) -> bool {
        matches!(self, Error::Render(_))
    }

    /// Check if this error is related to serialization.
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Error::Serialize(_))
    }
}
