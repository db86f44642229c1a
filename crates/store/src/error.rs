//! Record Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use folio_records::RecordKind;

/// A record store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for record store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested record does not exist.
    #[display("{kind} not found: {key}")]
    NotFound {
        /// Kind of record that was requested.
        kind: RecordKind,
        /// Key that was requested.
        key: String,
    },
    /// Backend-specific error
    #[display("backend error: {_0}")]
    Backend(#[error(not(source))] String),
    /// The store could not be reached at all.
    #[display("record store unavailable")]
    Unavailable,
}
impl ErrorKind {
    pub fn not_found(kind: RecordKind, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Unavailable)
    }
}
