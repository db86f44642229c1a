//! Configuration Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration sources could not be read or merged.
    #[display("could not load configuration")]
    Load,
    /// An explicitly requested configuration file does not exist.
    #[display("configuration file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The file extension doesn't name a supported format.
    #[display("unsupported configuration format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// A value was read successfully but is not usable.
    #[display("invalid configuration for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
