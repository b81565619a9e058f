//! Error types for shared container operations.
//!
//! Reads never fail: resolving a missing key or an out-of-range index yields
//! `None`. Errors are reserved for writes whose arguments cannot be applied,
//! root containers requested under a conflicting kind, transactions that
//! cannot be opened, and updates that cannot be decoded.

use thiserror::Error;

/// Structured error types for shared container operations.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CRDTError {
    /// A container was requested as one kind but exists as another
    #[error("CRDT type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Insertion point past the end of a list or text
    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A range reaching past the end of a list or text
    #[error("Range {index}..{} out of bounds for length {available}", .index + .len)]
    InvalidRange {
        index: usize,
        len: usize,
        available: usize,
    },

    /// Another transaction on the same document is still open
    #[error("Transaction unavailable: {reason}")]
    TransactionUnavailable { reason: String },

    /// A write was attempted through a transaction of another document
    #[error("Transaction belongs to a different document")]
    ForeignTransaction,

    /// An encoded update or state vector could not be decoded or applied
    #[error("Invalid update: {reason}")]
    InvalidUpdate { reason: String },
}

impl CRDTError {
    /// Check if this error is related to type mismatches
    pub fn is_type_error(&self) -> bool {
        matches!(self, CRDTError::TypeMismatch { .. })
    }

    /// Check if this error is an out-of-bounds position or range
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            CRDTError::IndexOutOfBounds { .. } | CRDTError::InvalidRange { .. }
        )
    }

    /// Check if this error comes from opening or using a transaction
    pub fn is_transaction_error(&self) -> bool {
        matches!(
            self,
            CRDTError::TransactionUnavailable { .. } | CRDTError::ForeignTransaction
        )
    }

    /// Check if this error is a rejected update or state vector
    pub fn is_update_error(&self) -> bool {
        matches!(self, CRDTError::InvalidUpdate { .. })
    }

    pub(crate) fn invalid_update(err: impl std::fmt::Display) -> Self {
        CRDTError::InvalidUpdate {
            reason: err.to_string(),
        }
    }
}

impl From<yrs::TransactionAcqError> for CRDTError {
    fn from(err: yrs::TransactionAcqError) -> Self {
        CRDTError::TransactionUnavailable {
            reason: err.to_string(),
        }
    }
}

// Conversion from CRDTError to the main Error type
impl From<CRDTError> for crate::Error {
    fn from(err: CRDTError) -> Self {
        crate::Error::CRDT(err)
    }
}
