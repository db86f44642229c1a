//! Redirect resolution.
//!
//! Records are held in a [`RecordTable`]: an arena of records plus a key to
//! index lookup. Following a redirect is an index lookup, never a live
//! reference, and a chain is walked with a hop counter so that cycles are
//! caught by the depth bound alone.

use crate::error::{ErrorKind, Result};
use folio_records::Record;
use std::collections::HashMap;

/// Default maximum number of redirect hops followed before a chain is
/// treated as a cycle.
pub const DEFAULT_MAX_REDIRECT_DEPTH: usize = 5;

/// The outcome of successfully walking a redirect chain.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a, R> {
    /// The chain ended at a live, non-redirecting record.
    Resolved(&'a R),
    /// The chain ended at a tombstone.
    Deleted(&'a R),
}
impl<'a, R> Resolution<'a, R> {
    /// The terminal record of the chain.
    pub fn record(&self) -> &'a R {
        match self {
            Self::Resolved(record) | Self::Deleted(record) => record,
        }
    }

    pub fn resolved(self) -> Option<&'a R> {
        match self {
            Self::Resolved(record) => Some(record),
            Self::Deleted(_) => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted(_))
    }
}

/// Index-addressed table of records of one kind.
#[derive(Debug, Clone)]
pub struct RecordTable<R: Record> {
    records: Vec<R>,
    index: HashMap<R::Key, usize>,
}
impl<R: Record> RecordTable<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a record to the table. The first record inserted for a key wins;
    /// returns `false` if the key was already present.
    pub fn insert(&mut self, record: R) -> bool {
        if self.index.contains_key(record.key()) {
            return false;
        }
        self.index.insert(record.key().clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.index.get(key).map(|&idx| &self.records[idx])
    }

    pub fn contains(&self, key: &R::Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.iter()
    }

    /// Follow the redirect chain starting at `key` for at most `max_depth`
    /// hops.
    ///
    /// Resolving a record that doesn't redirect returns that record. Every
    /// link of a chain resolves to the same terminal record, as long as the
    /// remaining chain fits within `max_depth`.
    ///
    /// # Errors
    ///
    /// - [`NotFound`](ErrorKind::NotFound) if `key` is not in the table.
    /// - [`BrokenChain`](ErrorKind::BrokenChain) if a redirect target is
    ///   not in the table.
    /// - [`RedirectCycle`](ErrorKind::RedirectCycle) if the chain is still
    ///   redirecting after `max_depth` hops.
    pub fn resolve(&self, key: &R::Key, max_depth: usize) -> Result<Resolution<'_, R>> {
        let Some(&start) = self.index.get(key) else {
            exn::bail!(ErrorKind::NotFound {
                kind: R::KIND,
                key: key.to_string(),
            });
        };
        let mut current = start;
        let mut hops = 0;
        loop {
            let record = &self.records[current];
            if record.is_deleted() {
                return Ok(Resolution::Deleted(record));
            }
            let Some(target) = record.redirect() else {
                return Ok(Resolution::Resolved(record));
            };
            if hops == max_depth {
                exn::bail!(ErrorKind::RedirectCycle {
                    kind: R::KIND,
                    key: key.to_string(),
                    depth: max_depth,
                });
            }
            let Some(&next) = self.index.get(target) else {
                exn::bail!(ErrorKind::BrokenChain {
                    kind: R::KIND,
                    key: key.to_string(),
                    target: target.to_string(),
                });
            };
            current = next;
            hops += 1;
        }
    }
}
impl<R: Record> Default for RecordTable<R> {
    fn default() -> Self {
        Self::new()
    }
}
impl<R: Record> FromIterator<R> for RecordTable<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}
impl<R: Record> Extend<R> for RecordTable<R> {
    fn extend<I: IntoIterator<Item = R>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}
