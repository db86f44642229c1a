//! Per-work compilation pipeline.

use crate::aggregate::{EditionAggregate, in_tie_break_order};
use crate::assemble::{DocumentParts, assemble};
use crate::document::SearchDocument;
use crate::error::ErrorKind;
use crate::facets::{Classifier, FacetExtractor, PrefixClassifier};
use crate::resolve::{DEFAULT_MAX_REDIRECT_DEPTH, Resolution};
use crate::signals::Signals;
use crate::snapshot::Snapshot;
use derive_more::{Display, Error};
use folio_records::models::{Author, AuthorKey, Edition, EditionKey, Work, WorkKey};
use folio_store::RecordStore;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::ops::Deref;
use time::UtcDateTime;
use tracing::instrument;

/// Tunable compilation behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Redirect hops followed before a chain is treated as a cycle.
    pub max_redirect_depth: usize,
}
impl Default for Options {
    fn default() -> Self {
        Self {
            max_redirect_depth: DEFAULT_MAX_REDIRECT_DEPTH,
        }
    }
}

/// Progress of one work through compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Fetched,
    Resolved,
    Aggregated,
    Assembled,
    Emitted,
}
impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetched => "fetched",
            Stage::Resolved => "resolved",
            Stage::Aggregated => "aggregated",
            Stage::Assembled => "assembled",
            Stage::Emitted => "emitted",
        }
    }
}
impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Why a work (or one of its references) was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    Deleted,
    NotFound,
    RedirectCycle,
    BrokenChain,
    /// An edition whose parent is not the work being compiled
    Orphaned,
    MissingKey,
    MissingTitle,
    /// The record store failed; the only reason worth retrying
    Store,
}
impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Deleted => "deleted",
            SkipReason::NotFound => "not found",
            SkipReason::RedirectCycle => "redirect cycle",
            SkipReason::BrokenChain => "broken redirect chain",
            SkipReason::Orphaned => "orphaned edition",
            SkipReason::MissingKey => "validation: missing key",
            SkipReason::MissingTitle => "validation: missing title",
            SkipReason::Store => "record store failure",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SkipReason::Store)
    }
}
impl From<&ErrorKind> for SkipReason {
    fn from(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound { .. } => SkipReason::NotFound,
            ErrorKind::RedirectCycle { .. } => SkipReason::RedirectCycle,
            ErrorKind::BrokenChain { .. } => SkipReason::BrokenChain,
            ErrorKind::Validation("key") => SkipReason::MissingKey,
            ErrorKind::Validation(_) => SkipReason::MissingTitle,
            ErrorKind::Store => SkipReason::Store,
        }
    }
}
impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A work that produced no document.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("skipped {key} after {stage}: {reason}")]
pub struct Skipped {
    /// The key compilation was requested for
    pub key: WorkKey,
    /// The last stage the work reached
    pub stage: Stage,
    pub reason: SkipReason,
}

/// Something left out of an emitted document.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Warning {
    #[display("excluded edition {key}: {reason}")]
    ExcludedEdition { key: EditionKey, reason: SkipReason },
    #[display("excluded author {key}: {reason}")]
    ExcludedAuthor { key: AuthorKey, reason: SkipReason },
    /// A subject string no facet category claimed; it was indexed as a
    /// plain subject.
    #[display("ambiguous facet: {_0}")]
    AmbiguousFacet(String),
}

/// A successfully compiled work.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub document: SearchDocument,
    pub warnings: Vec<Warning>,
    pub compiled_at: UtcDateTime,
}

/// Compiles works into [`SearchDocument`]s.
///
/// A compiler holds no per-work state; one instance can compile any number
/// of works, concurrently.
///
/// # Examples
///
/// ```
/// use folio_compile::{Compiler, Snapshot};
/// use folio_compile::document::fields;
/// use folio_records::models::{Edition, Work};
///
/// let snapshot = Snapshot::new("W1")
///     .with_works([Work::new("W1", "Example")])
///     .with_editions([Edition::new("E1", "W1").with_year(1990)]);
/// let compiled = Compiler::new().compile_snapshot(&snapshot).unwrap();
/// assert_eq!(compiled.document.integer(fields::FIRST_PUBLISH_YEAR), Some(1990));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Compiler<C = PrefixClassifier> {
    options: Options,
    facets: FacetExtractor<C>,
}
impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }
}
impl<C: Classifier> Compiler<C> {
    /// Replace the facet classification rule.
    pub fn with_classifier<D: Classifier>(self, classifier: D) -> Compiler<D> {
        Compiler {
            options: self.options,
            facets: FacetExtractor::new(classifier),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_redirect_depth(mut self, depth: usize) -> Self {
        self.options.max_redirect_depth = depth;
        self
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn classifier(&self) -> &C {
        self.facets.classifier()
    }

    /// Load `key` from `store` and compile it.
    ///
    /// Fails with [`Skipped`] when the work cannot be turned into a
    /// document. A failing store also surfaces as a skip, with
    /// [`SkipReason::Store`]; nothing is retried.
    #[instrument(skip(self, store), fields(store = store.name()))]
    pub async fn compile(&self, store: &dyn RecordStore, key: &WorkKey) -> Result<Compiled, Skipped> {
        let snapshot = match Snapshot::load(store, key, self.options.max_redirect_depth).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                return Err(skip(key, Stage::Fetched, SkipReason::from(err.deref()), &err));
            },
        };
        self.compile_snapshot(&snapshot)
    }

    /// Compile an already-loaded snapshot. Pure: the same snapshot always
    /// produces the same document.
    pub fn compile_snapshot(&self, snapshot: &Snapshot) -> Result<Compiled, Skipped> {
        let depth = self.options.max_redirect_depth;
        let requested = &snapshot.work;
        tracing::trace!(key = %requested, stage = %Stage::Fetched, "Stage reached");

        let work = match snapshot.works.resolve(requested, depth) {
            Ok(Resolution::Resolved(work)) => work,
            Ok(Resolution::Deleted(tombstone)) => {
                return Err(skip(requested, Stage::Fetched, SkipReason::Deleted, &tombstone.key));
            },
            Err(err) => return Err(skip(requested, Stage::Fetched, SkipReason::from(err.deref()), &err)),
        };
        tracing::trace!(key = %requested, resolved = %work.key, stage = %Stage::Resolved, "Stage reached");

        let mut warnings = Vec::new();
        let editions = self.included_editions(snapshot, work, &mut warnings);
        let authors = self.included_authors(snapshot, work, &mut warnings);

        let aggregate = EditionAggregate::compute(work, editions.iter().copied());
        let subjects = work
            .subjects
            .iter()
            .chain(in_tie_break_order(editions.iter().copied()).into_iter().flat_map(|edition| edition.subjects.iter()));
        let facets = self.facets.extract(subjects.map(String::as_str));
        for ambiguous in &facets.ambiguous {
            tracing::warn!(key = %work.key, subject = %ambiguous, "Subject matched no facet category");
            warnings.push(Warning::AmbiguousFacet(ambiguous.clone()));
        }
        let signals = Signals::compute(&snapshot.signals);
        tracing::trace!(key = %requested, stage = %Stage::Aggregated, "Stage reached");

        let document = assemble(DocumentParts {
            work,
            authors: &authors,
            editions: &aggregate,
            facets: &facets,
            signals: &signals,
        })
        .map_err(|err| skip(requested, Stage::Aggregated, SkipReason::from(err.deref()), &err))?;
        tracing::trace!(key = %requested, stage = %Stage::Assembled, fields = document.len(), "Stage reached");

        tracing::trace!(key = %requested, stage = %Stage::Emitted, warnings = warnings.len(), "Stage reached");
        Ok(Compiled {
            document,
            warnings,
            compiled_at: UtcDateTime::now(),
        })
    }

    /// Resolved, live editions filed directly under `work`, one per resolved
    /// key.
    fn included_editions<'a>(&self, snapshot: &'a Snapshot, work: &Work, warnings: &mut Vec<Warning>) -> Vec<&'a Edition> {
        let depth = self.options.max_redirect_depth;
        let mut seen = HashSet::new();
        let mut included = Vec::new();
        for edition in snapshot.editions.iter() {
            let (key, reason) = match snapshot.editions.resolve(&edition.key, depth) {
                Ok(Resolution::Resolved(target)) => {
                    if !seen.insert(&target.key) {
                        continue;
                    }
                    // Editions still filed under a redirect stub belong to the stub.
                    if target.work == work.key {
                        included.push(target);
                        continue;
                    }
                    (target.key.clone(), SkipReason::Orphaned)
                },
                Ok(Resolution::Deleted(_)) => (edition.key.clone(), SkipReason::Deleted),
                Err(err) => (edition.key.clone(), SkipReason::from(err.deref())),
            };
            tracing::warn!(work = %work.key, edition = %key, %reason, "Excluding edition");
            warnings.push(Warning::ExcludedEdition { key, reason });
        }
        included
    }

    /// Resolved, live authors of `work`, deduplicated, in reference order.
    fn included_authors<'a>(&self, snapshot: &'a Snapshot, work: &Work, warnings: &mut Vec<Warning>) -> Vec<&'a Author> {
        let depth = self.options.max_redirect_depth;
        let mut seen = HashSet::new();
        let mut included = Vec::new();
        for key in &work.authors {
            let reason = match snapshot.authors.resolve(key, depth) {
                Ok(Resolution::Resolved(author)) => {
                    if seen.insert(&author.key) {
                        included.push(author);
                    }
                    continue;
                },
                Ok(Resolution::Deleted(_)) => SkipReason::Deleted,
                Err(err) => SkipReason::from(err.deref()),
            };
            tracing::warn!(work = %work.key, author = %key, %reason, "Excluding author");
            warnings.push(Warning::ExcludedAuthor {
                key: key.clone(),
                reason,
            });
        }
        included
    }
}

fn skip(key: &WorkKey, stage: Stage, reason: SkipReason, cause: &dyn Debug) -> Skipped {
    tracing::warn!(key = %key, %stage, %reason, cause = ?cause, "Skipping work");
    Skipped {
        key: key.clone(),
        stage,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fields;
    use crate::facets::FacetKind;
    use folio_records::models::{Availability, RatingAggregate, SignalSources};
    use folio_store::store::MockStore;

    fn clean_work() -> Snapshot {
        Snapshot::new("W1").with_works([Work::new("W1", "Example")]).with_editions([
            Edition::new("E1", "W1").with_year(1990),
            Edition::new("E2", "W1").with_year(1995).with_cover("C1").with_fulltext(true),
        ])
    }

    #[test]
    fn test_clean_work() {
        let compiled = Compiler::new().compile_snapshot(&clean_work()).unwrap();
        let document = &compiled.document;
        assert_eq!(document.key().as_str(), "W1");
        assert_eq!(document.integer(fields::EDITION_COUNT), Some(2));
        assert_eq!(document.integer(fields::EBOOK_COUNT), Some(1));
        assert_eq!(document.integer(fields::FIRST_PUBLISH_YEAR), Some(1990));
        assert_eq!(document.boolean(fields::HAS_FULLTEXT), Some(true));
        assert_eq!(document.text(fields::COVER_ID), Some("C1"));
        assert!(compiled.warnings.is_empty());
    }

    #[test]
    fn test_redirected_author() {
        let snapshot = Snapshot::new("W1")
            .with_works([Work::new("W1", "Example").with_authors(["A1"])])
            .with_authors([Author::redirecting("A1", "A2"), Author::new("A2", "Canonical Name")]);
        let compiled = Compiler::new().compile_snapshot(&snapshot).unwrap();
        assert_eq!(compiled.document.list(fields::AUTHOR_NAME).unwrap(), ["Canonical Name"]);
        assert_eq!(compiled.document.list(fields::AUTHOR_KEY).unwrap(), ["A2"]);
    }

    #[test]
    fn test_deleted_work() {
        let snapshot = Snapshot::new("W2").with_works([Work::tombstone("W2")]);
        let skipped = Compiler::new().compile_snapshot(&snapshot).unwrap_err();
        assert_eq!(skipped.key.as_str(), "W2");
        assert_eq!(skipped.reason, SkipReason::Deleted);
        assert_eq!(skipped.reason.to_string(), "deleted");
    }

    #[test]
    fn test_missing_title() {
        let snapshot = Snapshot::new("W1").with_works([Work::new("W1", "  ")]);
        let skipped = Compiler::new().compile_snapshot(&snapshot).unwrap_err();
        assert_eq!(skipped.reason.to_string(), "validation: missing title");
        assert_eq!(skipped.stage, Stage::Aggregated);
    }

    #[test]
    fn test_work_redirect_is_followed() {
        let snapshot = Snapshot::new("W1")
            .with_works([Work::redirecting("W1", "W2"), Work::new("W2", "Merged")])
            .with_editions([Edition::new("E1", "W2")]);
        let compiled = Compiler::new().compile_snapshot(&snapshot).unwrap();
        assert_eq!(compiled.document.key().as_str(), "W2");
        assert_eq!(compiled.document.integer(fields::EDITION_COUNT), Some(1));
    }

    #[test]
    fn test_every_link_compiles_to_the_same_document() {
        let works = [Work::redirecting("W1", "W2"), Work::redirecting("W2", "W3"), Work::new("W3", "Terminal")];
        let fingerprints: Vec<String> = ["W1", "W2", "W3"]
            .into_iter()
            .map(|key| {
                let snapshot = Snapshot::new(key).with_works(works.clone());
                Compiler::new().compile_snapshot(&snapshot).unwrap().document.fingerprint()
            })
            .collect();
        assert!(fingerprints.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_missing_key() {
        let snapshot = Snapshot::new("").with_works([Work::new("", "Untitled Key")]);
        let skipped = Compiler::new().compile_snapshot(&snapshot).unwrap_err();
        assert_eq!(skipped.reason, SkipReason::MissingKey);
        assert_eq!(skipped.reason.to_string(), "validation: missing key");
        assert_eq!(skipped.stage, Stage::Aggregated);
    }

    #[test]
    fn test_editions_of_a_redirect_stub_are_excluded() {
        let snapshot = Snapshot::new("W1")
            .with_works([Work::redirecting("W1", "W2"), Work::new("W2", "Merged")])
            .with_editions([Edition::new("E1", "W2"), Edition::new("E2", "W1")]);
        let compiled = Compiler::new().compile_snapshot(&snapshot).unwrap();
        assert_eq!(compiled.document.list(fields::EDITION_KEY).unwrap(), ["E1"]);
        assert_eq!(compiled.warnings, vec![Warning::ExcludedEdition {
            key: "E2".into(),
            reason: SkipReason::Orphaned
        }]);
    }

    #[test]
    fn test_redirect_cycle_and_depth() {
        let snapshot = Snapshot::new("W1").with_works([Work::redirecting("W1", "W2"), Work::redirecting("W2", "W1")]);
        let skipped = Compiler::new().compile_snapshot(&snapshot).unwrap_err();
        assert_eq!(skipped.reason, SkipReason::RedirectCycle);
        assert_eq!(skipped.stage, Stage::Fetched);

        let snapshot = Snapshot::new("W1").with_works([Work::redirecting("W1", "W2"), Work::new("W2", "Merged")]);
        let skipped = Compiler::new().with_max_redirect_depth(0).compile_snapshot(&snapshot).unwrap_err();
        assert_eq!(skipped.reason, SkipReason::RedirectCycle);
    }

    #[test]
    fn test_broken_work_chain() {
        let snapshot = Snapshot::new("W1").with_works([Work::redirecting("W1", "W404")]);
        let skipped = Compiler::new().compile_snapshot(&snapshot).unwrap_err();
        assert_eq!(skipped.reason.to_string(), "broken redirect chain");
    }

    #[test]
    fn test_editions_are_filtered_with_warnings() {
        let snapshot = Snapshot::new("W1")
            .with_works([Work::new("W1", "Example"), Work::tombstone("W9")])
            .with_editions([
                Edition::new("E1", "W1"),
                Edition::redirecting("E2", "W1", "E1"),
                Edition::tombstone("E3", "W1"),
                Edition::redirecting("E4", "W1", "E404"),
                Edition::new("E5", "W9"),
                Edition::new("E6", "W8"),
            ]);
        let compiled = Compiler::new().compile_snapshot(&snapshot).unwrap();
        assert_eq!(compiled.document.list(fields::EDITION_KEY).unwrap(), ["E1"]);
        assert_eq!(compiled.warnings, vec![
            Warning::ExcludedEdition {
                key: "E3".into(),
                reason: SkipReason::Deleted
            },
            Warning::ExcludedEdition {
                key: "E4".into(),
                reason: SkipReason::BrokenChain
            },
            Warning::ExcludedEdition {
                key: "E5".into(),
                reason: SkipReason::Orphaned
            },
            Warning::ExcludedEdition {
                key: "E6".into(),
                reason: SkipReason::Orphaned
            },
        ]);
    }

    #[test]
    fn test_missing_and_deleted_authors_are_excluded() {
        let snapshot = Snapshot::new("W1")
            .with_works([Work::new("W1", "Example").with_authors(["A1", "A2", "A3", "A4"])])
            .with_authors([Author::new("A1", "Ada"), Author::tombstone("A2"), Author::redirecting("A4", "A1")]);
        let compiled = Compiler::new().compile_snapshot(&snapshot).unwrap();
        assert_eq!(compiled.document.list(fields::AUTHOR_NAME).unwrap(), ["Ada"]);
        assert_eq!(compiled.warnings, vec![
            Warning::ExcludedAuthor {
                key: "A2".into(),
                reason: SkipReason::Deleted
            },
            Warning::ExcludedAuthor {
                key: "A3".into(),
                reason: SkipReason::NotFound
            },
        ]);
    }

    #[test]
    fn test_determinism() {
        let compiler = Compiler::new();
        let first = compiler.compile_snapshot(&clean_work()).unwrap();
        let second = compiler.compile_snapshot(&clean_work()).unwrap();
        assert_eq!(first.document, second.document);
        assert_eq!(first.document.fingerprint(), second.document.fingerprint());

        // Supplying the same editions in a different order changes nothing.
        let mut editions: Vec<Edition> = clean_work().editions.iter().cloned().collect();
        editions.reverse();
        let reordered = Snapshot::new("W1").with_works([Work::new("W1", "Example")]).with_editions(editions);
        let third = compiler.compile_snapshot(&reordered).unwrap();
        assert_eq!(first.document.fingerprint(), third.document.fingerprint());
    }

    #[test]
    fn test_facets_from_work_and_editions() {
        let snapshot = Snapshot::new("W1")
            .with_works([Work::new("W1", "Example").with_subjects(["Whaling", "place:Nantucket"])])
            .with_editions([Edition::new("E1", "W1").with_subjects(["whaling ", "time:19th century"])]);
        let compiled = Compiler::new().compile_snapshot(&snapshot).unwrap();
        let subjects = compiled.document.facets(fields::SUBJECT).unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!((subjects[0].value.as_str(), subjects[0].count), ("Whaling", 2));
        assert_eq!(compiled.document.list(fields::TIME_KEY).unwrap(), ["19th century"]);
    }

    #[test]
    fn test_custom_classifier_reports_ambiguity() {
        let compiler = Compiler::new().with_classifier(|s: &str| s.starts_with("Nantucket").then_some(FacetKind::Place));
        let snapshot = Snapshot::new("W1").with_works([Work::new("W1", "Example").with_subjects(["Nantucket", "Whaling"])]);
        let compiled = compiler.compile_snapshot(&snapshot).unwrap();
        assert_eq!(compiled.document.list(fields::PLACE_KEY).unwrap(), ["nantucket"]);
        assert_eq!(compiled.warnings, vec![Warning::AmbiguousFacet("Whaling".to_string())]);
    }

    #[test]
    fn test_zero_ratings_do_not_divide() {
        let snapshot = clean_work().with_signals(SignalSources {
            rating: Some(RatingAggregate::new(0, 0)),
            availability: vec![Availability::OpenAccess, Availability::Borrowable],
            ..Default::default()
        });
        let compiled = Compiler::new().compile_snapshot(&snapshot).unwrap();
        assert!(!compiled.document.contains(fields::RATING_AVERAGE));
        assert_eq!(compiled.document.integer(fields::RATING_COUNT), Some(0));
        assert_eq!(compiled.document.text(fields::AVAILABILITY), Some("open-access"));
    }

    #[tokio::test]
    async fn test_compile_from_store() {
        let store = MockStore::with_records(
            [Work::new("W1", "Example").with_authors(["A1"]), Work::tombstone("W2")],
            [Edition::new("E1", "W1").with_year(1990)],
            [Author::redirecting("A1", "A2"), Author::new("A2", "Ada")],
        );
        let compiler = Compiler::new();
        let compiled = compiler.compile(&store, &WorkKey::from("W1")).await.unwrap();
        assert_eq!(compiled.document.list(fields::AUTHOR_NAME).unwrap(), ["Ada"]);

        let skipped = compiler.compile(&store, &WorkKey::from("W2")).await.unwrap_err();
        assert_eq!(skipped.to_string(), "skipped W2 after fetched: deleted");

        let skipped = compiler.compile(&store, &WorkKey::from("W3")).await.unwrap_err();
        assert_eq!(skipped.reason, SkipReason::NotFound);
    }

    #[tokio::test]
    async fn test_store_and_snapshot_agree() {
        let works = [Work::redirecting("W1", "W2"), Work::new("W2", "Merged").with_authors(["A1"])];
        let editions = [
            Edition::new("E1", "W2").with_year(1990),
            Edition::new("E2", "W1").with_year(1980).with_cover("C2"),
        ];
        let authors = [Author::new("A1", "Ada")];
        let store = MockStore::with_records(works.clone(), editions.clone(), authors.clone());
        let compiler = Compiler::new();
        let from_store = compiler.compile(&store, &WorkKey::from("W1")).await.unwrap();
        let snapshot = Snapshot::new("W1").with_works(works).with_editions(editions).with_authors(authors);
        let from_snapshot = compiler.compile_snapshot(&snapshot).unwrap();
        assert_eq!(from_store.document.list(fields::EDITION_KEY).unwrap(), ["E1"]);
        assert_eq!(from_store.document, from_snapshot.document);
        assert_eq!(from_store.document.fingerprint(), from_snapshot.document.fingerprint());
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_as_retryable_skip() {
        let store = MockStore::with_records([Work::new("W1", "Example")], [], []).with_failure("W1");
        let skipped = Compiler::new().compile(&store, &WorkKey::from("W1")).await.unwrap_err();
        assert_eq!(skipped.reason, SkipReason::Store);
        assert!(skipped.reason.is_retryable());
    }
}
