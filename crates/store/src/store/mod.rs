//! Record store trait and implementations.

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use self::mock::MockStore;
use crate::error::Result;
use async_trait::async_trait;
use folio_records::models::{Author, AuthorKey, Edition, SignalSources, Work, WorkKey};

/// Read-only access to the catalog records a search document is compiled from.
///
/// Every lookup is a pure read; implementations must not assume anything
/// about the order or concurrency of calls. A missing record is reported
/// as [`NotFound`](crate::error::ErrorKind::NotFound), which callers treat
/// differently from transient failures.
///
/// # Examples
///
/// ```
/// use folio_records::models::WorkKey;
/// use folio_store::{RecordStore, error::Result};
///
/// async fn title_of(store: &dyn RecordStore, key: &WorkKey) -> Result<String> {
///     Ok(store.fetch_work(key).await?.title)
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Name of the store (used for logging only).
    fn name(&self) -> &str;

    /// Fetch a single work by key, without following redirects.
    async fn fetch_work(&self, key: &WorkKey) -> Result<Work>;

    /// Fetch every edition record whose parent is `work`, including
    /// redirect stubs and tombstones.
    async fn fetch_editions_of(&self, work: &WorkKey) -> Result<Vec<Edition>>;

    /// Fetch a single author by key, without following redirects.
    async fn fetch_author(&self, key: &AuthorKey) -> Result<Author>;

    /// Fetch rating, reading-log and availability signals for a work.
    ///
    /// Stores that don't track signals can rely on the default
    /// implementation, which reports that no signal data exists.
    async fn fetch_signals(&self, _work: &WorkKey) -> Result<SignalSources> {
        Ok(SignalSources::default())
    }
}
