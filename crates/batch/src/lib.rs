//! Batch compilation.
//!
//! [`compile_all`] compiles many works concurrently against one record
//! store and reports progress as a stream of [`BatchEvent`]s. A work that
//! is skipped never stops the batch.

use async_stream::stream;
use folio_compile::facets::Classifier;
use folio_compile::{Compiled, Compiler, Skipped};
use folio_records::models::WorkKey;
use folio_store::StoreHandle;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::pin;

/// Default number of works compiled at the same time.
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Progress events emitted by [`compile_all`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`Discovered`](Self::Discovered), exactly once, with the number of
///    works in the batch.
/// 3. [`Emitted`](Self::Emitted) or [`Skipped`](Self::Skipped), once per
///    work, in completion order.
/// 4. [`Complete`](Self::Complete), exactly once, as the final event.
#[derive(Debug)]
pub enum BatchEvent {
    Started,
    Discovered(u64),
    Emitted(Compiled),
    Skipped(Skipped),
    Complete(BatchSummary),
}

/// Totals for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub discovered: u64,
    pub emitted: u64,
    pub skipped: u64,
    /// Skips caused by store failures, which may succeed on a later run
    pub retryable: u64,
    /// Warnings across all emitted documents
    pub warnings: u64,
}

/// Streams [`BatchEvent`]s while compiling every work in `keys`.
///
/// At most `concurrency` works are compiled at a time (a concurrency of
/// zero is treated as one); more are started, in `keys` order, as in-flight
/// compilations finish.
pub fn compile_all<'a, C: Classifier + 'a>(
    store: &'a StoreHandle,
    compiler: &'a Compiler<C>,
    keys: Vec<WorkKey>,
    concurrency: usize,
) -> impl Stream<Item = BatchEvent> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield BatchEvent::Started;

        let mut summary = BatchSummary {
            // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
            discovered: u64::try_from(keys.len()).unwrap_or(u64::MAX),
            ..Default::default()
        };
        tracing::info!(works = summary.discovered, concurrency, store = store.name(), "Starting batch");
        yield BatchEvent::Discovered(summary.discovered);

        let mut futures: VecDeque<_> =
            keys.into_iter().map(|key| async move { compiler.compile(store.as_ref(), &key).await }).collect();
        let mut processing = FuturesUnordered::new();
        processing.extend(futures.drain(..concurrency.max(1).min(futures.len())));
        while let Some(result) = processing.next().await {
            // FIFO: promote the oldest waiting work.
            if let Some(next) = futures.pop_front() {
                processing.push(next);
            }
            match result {
                Ok(compiled) => {
                    summary.emitted += 1;
                    summary.warnings += compiled.warnings.len() as u64;
                    yield BatchEvent::Emitted(compiled);
                },
                Err(skipped) => {
                    summary.skipped += 1;
                    if skipped.reason.is_retryable() {
                        summary.retryable += 1;
                    }
                    yield BatchEvent::Skipped(skipped);
                },
            }
        }

        tracing::info!(
            emitted = summary.emitted,
            skipped = summary.skipped,
            retryable = summary.retryable,
            "Batch complete"
        );
        yield BatchEvent::Complete(summary);
    })
}

/// Everything a batch produced, for callers that don't need progress.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub documents: Vec<Compiled>,
    pub skipped: Vec<Skipped>,
    pub summary: BatchSummary,
}
impl BatchReport {
    /// Drain a [`compile_all`] stream.
    pub async fn collect(events: impl Stream<Item = BatchEvent>) -> Self {
        let mut report = Self::default();
        let mut events = pin!(events);
        while let Some(event) = events.next().await {
            match event {
                BatchEvent::Emitted(compiled) => report.documents.push(compiled),
                BatchEvent::Skipped(skipped) => report.skipped.push(skipped),
                BatchEvent::Complete(summary) => report.summary = summary,
                BatchEvent::Started | BatchEvent::Discovered(_) => {},
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use folio_compile::SkipReason;
    use folio_records::models::{Author, AuthorKey, Edition, Work};
    use folio_store::RecordStore;
    use folio_store::error::Result as StoreResult;
    use folio_store::store::MockStore;
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> StoreHandle {
        Arc::new(MockStore::with_records(
            [
                Work::new("W1", "First").with_authors(["A1"]),
                Work::new("W2", "Second"),
                Work::tombstone("W3"),
                Work::redirecting("W4", "W1"),
            ],
            [Edition::new("E1", "W1").with_year(1990), Edition::new("E2", "W2")],
            [Author::new("A1", "Ada")],
        ))
    }

    fn keys(keys: &[&str]) -> Vec<WorkKey> {
        keys.iter().map(|key| WorkKey::from(*key)).collect()
    }

    #[tokio::test]
    async fn test_event_order() {
        let store = store();
        let compiler = Compiler::new();
        let events: Vec<BatchEvent> = compile_all(&store, &compiler, keys(&["W1", "W2"]), 4).collect().await;
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], BatchEvent::Started));
        assert!(matches!(events[1], BatchEvent::Discovered(2)));
        assert!(events[2..4].iter().all(|event| matches!(event, BatchEvent::Emitted(_))));
        assert!(matches!(events[4], BatchEvent::Complete(BatchSummary { emitted: 2, .. })));
    }

    #[tokio::test]
    async fn test_skips_do_not_stop_the_batch() {
        let store = store();
        let compiler = Compiler::new();
        let report = BatchReport::collect(compile_all(&store, &compiler, keys(&["W3", "W404", "W1", "W4"]), 1)).await;
        assert_eq!(report.summary, BatchSummary {
            discovered: 4,
            emitted: 2,
            skipped: 2,
            retryable: 0,
            warnings: 0,
        });
        let mut reasons: Vec<_> = report.skipped.iter().map(|skipped| (skipped.key.as_str(), skipped.reason)).collect();
        reasons.sort_by_key(|(key, _)| *key);
        assert_eq!(reasons, vec![("W3", SkipReason::Deleted), ("W404", SkipReason::NotFound)]);
        // A redirect and its target compile to the same document.
        assert_eq!(report.documents[0].document, report.documents[1].document);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let store = store();
        let compiler = Compiler::new();
        let report = BatchReport::collect(compile_all(&store, &compiler, Vec::new(), DEFAULT_CONCURRENCY)).await;
        assert!(report.documents.is_empty());
        assert_eq!(report.summary, BatchSummary::default());
    }

    /// Wraps a store and records how many works are being fetched at once.
    struct CountingStore {
        inner: MockStore,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl RecordStore for CountingStore {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch_work(&self, key: &WorkKey) -> StoreResult<Work> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let work = self.inner.fetch_work(key).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            work
        }

        async fn fetch_editions_of(&self, work: &WorkKey) -> StoreResult<Vec<Edition>> {
            self.inner.fetch_editions_of(work).await
        }

        async fn fetch_author(&self, key: &AuthorKey) -> StoreResult<Author> {
            self.inner.fetch_author(key).await
        }
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(8)]
    #[tokio::test]
    async fn test_concurrency_is_bounded(#[case] concurrency: usize) {
        let counting = Arc::new(CountingStore {
            inner: MockStore::with_records((0..8).map(|i| Work::new(format!("W{i}"), "Title")), [], []),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let store: StoreHandle = counting.clone();
        let compiler = Compiler::new();
        let keys: Vec<WorkKey> = (0..8).map(|i| WorkKey::from(format!("W{i}"))).collect();
        let report = BatchReport::collect(compile_all(&store, &compiler, keys, concurrency)).await;
        assert_eq!(report.summary.emitted, 8);
        assert!(counting.peak.load(Ordering::SeqCst) <= concurrency);
        assert!(counting.peak.load(Ordering::SeqCst) >= 1);
    }
}
