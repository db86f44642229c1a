//! Compilation Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Errors raised here are fatal for a
//! single record at most; the compiler turns them into
//! [`Skipped`](crate::Skipped) reports rather than failing a batch.

use derive_more::{Display, Error};
use folio_records::RecordKind;

/// A compilation error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for compilation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced record does not exist.
    #[display("{kind} not found: {key}")]
    NotFound {
        /// Kind of the missing record.
        kind: RecordKind,
        /// Key that could not be found.
        key: String,
    },
    /// Following redirects from `key` did not terminate within `depth` hops.
    #[display("redirect chain from {kind} {key} exceeded {depth} hops")]
    RedirectCycle {
        /// Kind of record being resolved.
        kind: RecordKind,
        /// Key resolution started from.
        key: String,
        /// The depth bound that was exceeded.
        depth: usize,
    },
    /// A redirect points at a record that does not exist.
    #[display("redirect chain from {kind} {key} points at missing record {target}")]
    BrokenChain {
        /// Kind of record being resolved.
        kind: RecordKind,
        /// Key resolution started from.
        key: String,
        /// The dangling redirect target.
        target: String,
    },
    /// The assembled document is missing a required field.
    #[display("validation: missing {_0}")]
    Validation(#[error(not(source))] &'static str),
    /// The record store failed for a reason other than a missing record.
    #[display("record store failure")]
    Store,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Catalog data doesn't fix itself; only the store can be flaky.
        matches!(self, Self::Store)
    }
}
