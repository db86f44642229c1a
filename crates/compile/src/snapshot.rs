//! Per-compilation input snapshot.
//!
//! A [`Snapshot`] is the immutable set of records one compilation reads:
//! the work redirect chain, the editions and authors it references, and its
//! signal sources. Loading a snapshot is the only part of compilation that
//! talks to the [`RecordStore`]; everything after it is pure.

use crate::error::{ErrorKind, Result};
use crate::resolve::{RecordTable, Resolution};
use exn::ResultExt;
use folio_records::Record;
use folio_records::models::{Author, AuthorKey, Edition, SignalSources, Work, WorkKey};
use folio_store::RecordStore;
use folio_store::error::Result as StoreResult;
use futures::future::BoxFuture;
use std::ops::Deref;
use tracing::instrument;

/// Records that can be fetched one at a time from a [`RecordStore`].
trait Fetch: Record + Sized {
    fn fetch<'a>(store: &'a dyn RecordStore, key: &'a Self::Key) -> BoxFuture<'a, StoreResult<Self>>;
}
impl Fetch for Work {
    fn fetch<'a>(store: &'a dyn RecordStore, key: &'a WorkKey) -> BoxFuture<'a, StoreResult<Self>> {
        store.fetch_work(key)
    }
}
impl Fetch for Author {
    fn fetch<'a>(store: &'a dyn RecordStore, key: &'a AuthorKey) -> BoxFuture<'a, StoreResult<Self>> {
        store.fetch_author(key)
    }
}

/// Immutable input for compiling one work.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The work key compilation was requested for (before redirects).
    pub work: WorkKey,
    pub works: RecordTable<Work>,
    pub editions: RecordTable<Edition>,
    pub authors: RecordTable<Author>,
    pub signals: SignalSources,
}
impl Snapshot {
    /// An empty snapshot for `work`; populate it with the `with_*` builders
    /// when the records are already at hand.
    pub fn new(work: impl Into<WorkKey>) -> Self {
        Self {
            work: work.into(),
            works: RecordTable::new(),
            editions: RecordTable::new(),
            authors: RecordTable::new(),
            signals: SignalSources::default(),
        }
    }

    pub fn with_works(mut self, works: impl IntoIterator<Item = Work>) -> Self {
        self.works.extend(works);
        self
    }

    pub fn with_editions(mut self, editions: impl IntoIterator<Item = Edition>) -> Self {
        self.editions.extend(editions);
        self
    }

    pub fn with_authors(mut self, authors: impl IntoIterator<Item = Author>) -> Self {
        self.authors.extend(authors);
        self
    }

    pub fn with_signals(mut self, signals: SignalSources) -> Self {
        self.signals = signals;
        self
    }

    /// Gather everything needed to compile `work` from `store`.
    ///
    /// Redirect chains are walked through the store for at most
    /// `max_depth + 1` fetches per chain. A missing author is tolerated
    /// here and reported during compilation instead. Only editions filed
    /// under the canonical work are fetched.
    ///
    /// # Errors
    ///
    /// - [`NotFound`](ErrorKind::NotFound) if the requested work itself
    ///   does not exist.
    /// - [`Store`](ErrorKind::Store) for any other store failure.
    #[instrument(skip(store), fields(store = store.name(), editions, authors))]
    pub async fn load(store: &dyn RecordStore, work: &WorkKey, max_depth: usize) -> Result<Self> {
        let mut snapshot = Self::new(work.clone());
        walk(store, &mut snapshot.works, work, max_depth).await?;
        if !snapshot.works.contains(work) {
            exn::bail!(ErrorKind::NotFound {
                kind: Work::KIND,
                key: work.to_string(),
            });
        }
        let resolved = match snapshot.works.resolve(work, max_depth) {
            Ok(Resolution::Resolved(resolved)) => Some((resolved.key.clone(), resolved.authors.clone())),
            _ => None,
        };
        // Unresolvable works are reported by the compiler; nothing else is
        // worth fetching for them.
        let Some((canonical, author_keys)) = resolved else {
            return Ok(snapshot);
        };

        let editions = store.fetch_editions_of(&canonical).await.or_raise(|| ErrorKind::Store)?;
        snapshot.editions.extend(editions);
        for author in &author_keys {
            walk(store, &mut snapshot.authors, author, max_depth).await?;
        }
        snapshot.signals = store.fetch_signals(&canonical).await.or_raise(|| ErrorKind::Store)?;
        if snapshot.signals.is_empty() {
            tracing::debug!(work = %canonical, "No ranking signals");
        }

        tracing::Span::current().record("editions", snapshot.editions.len());
        tracing::Span::current().record("authors", snapshot.authors.len());
        Ok(snapshot)
    }
}

/// Fetch the redirect chain starting at `start` into `table`.
///
/// Stops at the end of the chain, at a key that is already loaded (shared
/// chains and cycles), at a missing record, or after `max_depth + 1`
/// fetches. Resolution against the table later decides what the chain
/// means.
async fn walk<R: Fetch>(
    store: &dyn RecordStore,
    table: &mut RecordTable<R>,
    start: &R::Key,
    max_depth: usize,
) -> Result<()> {
    let mut next = Some(start.clone());
    let mut fetched = 0;
    while let Some(key) = next.take() {
        if fetched > max_depth || table.contains(&key) {
            break;
        }
        match R::fetch(store, &key).await {
            Ok(record) => {
                next = record.redirect().cloned();
                table.insert(record);
            },
            Err(e) if e.deref().is_not_found() => {
                tracing::debug!(kind = %R::KIND, key = %key, "Record not found while following references");
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Store),
        }
        fetched += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::DEFAULT_MAX_REDIRECT_DEPTH;
    use folio_records::models::RatingAggregate;
    use folio_store::store::MockStore;

    #[tokio::test]
    async fn test_load_follows_work_redirects() {
        let store = MockStore::with_records(
            [Work::redirecting("W1", "W2"), Work::new("W2", "Merged").with_authors(["A1"])],
            [Edition::new("E1", "W2"), Edition::new("E2", "W1")],
            [Author::new("A1", "Ada")],
        );
        let snapshot = Snapshot::load(&store, &WorkKey::from("W1"), DEFAULT_MAX_REDIRECT_DEPTH).await.unwrap();
        assert_eq!(snapshot.works.len(), 2);
        // Only editions of the canonical work are fetched.
        assert_eq!(snapshot.editions.len(), 1);
        assert!(snapshot.authors.contains(&AuthorKey::from("A1")));
    }

    #[tokio::test]
    async fn test_load_missing_work_is_not_found() {
        let store = MockStore::default();
        let err = Snapshot::load(&store, &WorkKey::from("W1"), DEFAULT_MAX_REDIRECT_DEPTH).await.unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_load_tolerates_missing_authors() {
        let store = MockStore::with_records([Work::new("W1", "Example").with_authors(["A1", "A2"])], [], [
            Author::redirecting("A1", "A404"),
        ]);
        let snapshot = Snapshot::load(&store, &WorkKey::from("W1"), DEFAULT_MAX_REDIRECT_DEPTH).await.unwrap();
        assert_eq!(snapshot.authors.len(), 1);
    }

    #[tokio::test]
    async fn test_load_stops_on_cycles() {
        let store = MockStore::with_records([Work::redirecting("W1", "W2"), Work::redirecting("W2", "W1")], [], []);
        let snapshot = Snapshot::load(&store, &WorkKey::from("W1"), DEFAULT_MAX_REDIRECT_DEPTH).await.unwrap();
        assert_eq!(snapshot.works.len(), 2);
        assert!(snapshot.editions.is_empty());
    }

    #[tokio::test]
    async fn test_load_bounds_long_chains() {
        let works: Vec<Work> = (0..20).map(|i| Work::redirecting(format!("W{i}"), format!("W{}", i + 1))).collect();
        let store = MockStore::with_records(works, [], []);
        let snapshot = Snapshot::load(&store, &WorkKey::from("W0"), 3).await.unwrap();
        assert_eq!(snapshot.works.len(), 4);
    }

    #[tokio::test]
    async fn test_load_store_failure_is_fatal() {
        let store = MockStore::with_records([Work::new("W1", "Example").with_authors(["A1"])], [], [])
            .with_failure("A1");
        let err = Snapshot::load(&store, &WorkKey::from("W1"), DEFAULT_MAX_REDIRECT_DEPTH).await.unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Store));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_load_fetches_signals() {
        let signals = SignalSources {
            rating: Some(RatingAggregate::new(9, 2)),
            ..Default::default()
        };
        let store =
            MockStore::with_records([Work::new("W1", "Example")], [], []).with_signals("W1", signals.clone());
        let snapshot = Snapshot::load(&store, &WorkKey::from("W1"), DEFAULT_MAX_REDIRECT_DEPTH).await.unwrap();
        assert_eq!(snapshot.signals, signals);
    }
}
