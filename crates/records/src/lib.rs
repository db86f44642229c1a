//! Catalog record models.
//!
//! Immutable snapshots of the records a search document is compiled from:
//! [`Work`](models::Work), [`Edition`](models::Edition) and
//! [`Author`](models::Author), plus the optional rating and availability
//! signals attached to a work. Every record type implements [`Record`] so
//! redirect chains and tombstones can be handled uniformly.

mod consts;
pub mod error;
pub mod models;

use std::fmt::{Debug, Display};
use std::hash::Hash;

pub use crate::models::RecordKind;

/// Behaviour shared by every record that can be redirected or deleted.
pub trait Record {
    /// Strongly-typed key identifying the record.
    type Key: Clone + Debug + Display + Eq + Hash + Ord;
    /// Which kind of record this is (for logging and error messages).
    const KIND: RecordKind;

    fn key(&self) -> &Self::Key;

    /// Key of the record that supersedes this one, if any.
    fn redirect(&self) -> Option<&Self::Key>;

    fn is_deleted(&self) -> bool;
}
