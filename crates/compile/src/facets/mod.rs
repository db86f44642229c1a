//! Facet extraction.
//!
//! Subject strings from a work and its editions are normalized, classified
//! into [`FacetKind`]s by a pluggable [`Classifier`], and tallied into
//! deduplicated [`FacetEntry`] lists.

mod classify;
mod normalize;

use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub use self::classify::{Classified, Classifier, FacetKind, PrefixClassifier};
pub use self::normalize::{fold, normalize};

/// One distinct facet value and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FacetEntry {
    /// First-seen display form
    pub value: String,
    /// Case-folded comparison key
    pub key: String,
    pub count: u64,
}

/// Facet lists for a single work, ordered by descending count then
/// ascending display string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub subject: Vec<FacetEntry>,
    pub place: Vec<FacetEntry>,
    pub time: Vec<FacetEntry>,
    pub person: Vec<FacetEntry>,
    /// Distinct strings the classifier could not place, filed under subjects.
    pub ambiguous: Vec<String>,
}
impl Facets {
    pub fn get(&self, kind: FacetKind) -> &[FacetEntry] {
        match kind {
            FacetKind::Subject => &self.subject,
            FacetKind::Place => &self.place,
            FacetKind::Time => &self.time,
            FacetKind::Person => &self.person,
        }
    }

    fn get_mut(&mut self, kind: FacetKind) -> &mut Vec<FacetEntry> {
        match kind {
            FacetKind::Subject => &mut self.subject,
            FacetKind::Place => &mut self.place,
            FacetKind::Time => &mut self.time,
            FacetKind::Person => &mut self.person,
        }
    }

    pub fn is_empty(&self) -> bool {
        FacetKind::ALL.iter().all(|kind| self.get(*kind).is_empty())
    }
}

/// Builds [`Facets`] from raw subject strings using a [`Classifier`].
#[derive(Debug, Clone, Default)]
pub struct FacetExtractor<C = PrefixClassifier> {
    classifier: C,
}
impl<C: Classifier> FacetExtractor<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Normalize, classify and count `subjects`.
    ///
    /// Strings that differ only in case or whitespace collapse into one
    /// entry whose count is the sum of their occurrences; the display form
    /// is the first one seen. Empty strings are dropped, and empty input
    /// yields empty facets.
    pub fn extract<'a>(&self, subjects: impl IntoIterator<Item = &'a str>) -> Facets {
        let mut facets = Facets::default();
        let mut index: HashMap<(FacetKind, String), usize> = HashMap::new();
        let mut ambiguous: HashSet<String> = HashSet::new();

        for raw in subjects {
            let Some(normalized) = normalize(raw) else {
                continue;
            };
            let (kind, text) = match self.classifier.classify(&normalized) {
                Some(Classified { kind, text }) => (kind, text),
                None => {
                    if ambiguous.insert(fold(&normalized)) {
                        facets.ambiguous.push(normalized.clone());
                    }
                    (FacetKind::Subject, normalized.as_str())
                },
            };
            let Some(display) = normalize(text) else {
                continue;
            };
            let key = fold(&display);
            let entries = facets.get_mut(kind);
            match index.get(&(kind, key.clone())) {
                Some(&idx) => entries[idx].count += 1,
                None => {
                    index.insert((kind, key.clone()), entries.len());
                    entries.push(FacetEntry {
                        value: display,
                        key,
                        count: 1,
                    });
                },
            }
        }

        for kind in FacetKind::ALL {
            facets.get_mut(kind).sort_by(|a, b| {
                b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)).then_with(|| a.key.cmp(&b.key))
            });
        }
        facets
    }
}
