//! In-memory record store for testing.

use crate::RecordStore;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use folio_records::models::{Author, AuthorKey, Edition, EditionKey, SignalSources, Work, WorkKey};
use folio_records::{Record, RecordKind};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// In-memory record store for testing.
///
/// Records are stored in `HashMap`s behind [`RwLock`]s, so all trait
/// methods can operate on `&self` without external synchronisation. Ideal
/// for unit tests that need a [`RecordStore`] without a database.
///
/// # Examples
///
/// ```
/// use folio_records::models::{Edition, Work, WorkKey};
/// use folio_store::{RecordStore, store::MockStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::with_records(
///     [Work::new("W1", "Example")],
///     [Edition::new("E1", "W1")],
///     [],
/// );
/// let key = WorkKey::from("W1");
/// assert_eq!(store.fetch_work(&key).await?.title, "Example");
/// assert_eq!(store.fetch_editions_of(&key).await?.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockStore {
    name: String,
    works: RwLock<HashMap<WorkKey, Work>>,
    editions: RwLock<HashMap<EditionKey, Edition>>,
    authors: RwLock<HashMap<AuthorKey, Author>>,
    signals: RwLock<HashMap<WorkKey, SignalSources>>,
    failing: RwLock<HashSet<String>>,
}

impl MockStore {
    /// Create a mock store pre-populated with records. Later records
    /// replace earlier ones with the same key.
    pub fn with_records(
        works: impl IntoIterator<Item = Work>,
        editions: impl IntoIterator<Item = Edition>,
        authors: impl IntoIterator<Item = Author>,
    ) -> Self {
        Self {
            name: "mock".to_string(),
            works: RwLock::new(keyed(works)),
            editions: RwLock::new(keyed(editions)),
            authors: RwLock::new(keyed(authors)),
            signals: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// Attach signal sources to a work.
    pub fn with_signals(mut self, work: impl Into<WorkKey>, signals: SignalSources) -> Self {
        self.signals.get_mut().insert(work.into(), signals);
        self
    }

    /// Make every lookup of `key` (work, author, or editions-of) fail with
    /// a [`Backend`](ErrorKind::Backend) error.
    pub fn with_failure(mut self, key: impl Into<String>) -> Self {
        self.failing.get_mut().insert(key.into());
        self
    }

    pub async fn insert_work(&self, work: Work) {
        self.works.write().await.insert(work.key.clone(), work);
    }

    async fn check_failure(&self, key: &str) -> Result<()> {
        if self.failing.read().await.contains(key) {
            tracing::debug!(store = %self.name, key, "Injecting failure");
            exn::bail!(ErrorKind::Backend(format!("injected failure for {}", key)));
        }
        Ok(())
    }
}
impl Default for MockStore {
    fn default() -> Self {
        Self::with_records([], [], [])
    }
}

fn keyed<R: Record>(records: impl IntoIterator<Item = R>) -> HashMap<R::Key, R> {
    records.into_iter().map(|record| (record.key().clone(), record)).collect()
}

#[async_trait]
impl RecordStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_work(&self, key: &WorkKey) -> Result<Work> {
        self.check_failure(key.as_str()).await?;
        match self.works.read().await.get(key) {
            Some(work) => Ok(work.clone()),
            None => exn::bail!(ErrorKind::not_found(RecordKind::Work, key)),
        }
    }

    async fn fetch_editions_of(&self, work: &WorkKey) -> Result<Vec<Edition>> {
        self.check_failure(work.as_str()).await?;
        let mut editions: Vec<Edition> =
            self.editions.read().await.values().filter(|edition| edition.work == *work).cloned().collect();
        editions.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(editions)
    }

    async fn fetch_author(&self, key: &AuthorKey) -> Result<Author> {
        self.check_failure(key.as_str()).await?;
        match self.authors.read().await.get(key) {
            Some(author) => Ok(author.clone()),
            None => exn::bail!(ErrorKind::not_found(RecordKind::Author, key)),
        }
    }

    async fn fetch_signals(&self, work: &WorkKey) -> Result<SignalSources> {
        Ok(self.signals.read().await.get(work).cloned().unwrap_or_default())
    }
}
