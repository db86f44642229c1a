//! Edition aggregation.
//!
//! Folds the included editions of a work into counts and representative
//! attributes. Every output is independent of the order editions were
//! supplied in: editions are first put into tie-break order (publish year
//! ascending with undated editions last, then key ascending).

use crate::consts::collapse_whitespace;
use folio_records::models::{CoverId, Edition, EditionKey, EditionSource, IdentifierKind, Work};
use std::collections::{BTreeSet, HashSet};

/// Sort editions into the order "first" refers to in aggregate outputs.
pub fn in_tie_break_order<'a>(editions: impl IntoIterator<Item = &'a Edition>) -> Vec<&'a Edition> {
    let mut ordered: Vec<&Edition> = editions.into_iter().collect();
    ordered.sort_by_cached_key(|edition| {
        let year = edition.year();
        (year.is_none(), year, edition.key.clone())
    });
    ordered
}

/// Work-level values derived from the editions of a work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditionAggregate {
    pub edition_count: u64,
    /// Editions with the full-text flag set
    pub ebook_count: u64,
    pub first_publish_year: Option<u32>,
    pub last_publish_year: Option<u32>,
    /// Distinct publish years, ascending
    pub publish_years: Vec<u32>,
    /// Distinct language codes, sorted
    pub languages: Vec<String>,
    pub has_fulltext: bool,
    pub cover_id: Option<CoverId>,
    /// The edition `cover_id` was taken from
    pub cover_edition_key: Option<EditionKey>,
    /// Included editions in tie-break order
    pub edition_keys: Vec<EditionKey>,
    /// ISBN-10 and ISBN-13 forms, sorted
    pub isbn: Vec<String>,
    pub oclc: Vec<String>,
    pub lccn: Vec<String>,
    pub publishers: Vec<String>,
    /// Lower median of the known page counts
    pub number_of_pages_median: Option<u32>,
    /// Edition titles that differ from the work title, sorted
    pub alternative_titles: Vec<String>,
    pub formats: Vec<EditionSource>,
}
impl EditionAggregate {
    /// Aggregate `editions`, which must already be resolved, live, and
    /// belong to `work`.
    pub fn compute<'a>(work: &Work, editions: impl IntoIterator<Item = &'a Edition>) -> Self {
        let ordered = in_tie_break_order(editions);

        let years: BTreeSet<u32> = ordered.iter().filter_map(|edition| edition.year()).collect();
        let languages: BTreeSet<String> = ordered.iter().flat_map(|edition| edition.language_codes()).collect();
        let formats: BTreeSet<EditionSource> = ordered.iter().map(|edition| edition.source).collect();
        let cover = ordered.iter().find_map(|edition| edition.cover.as_ref().map(|cover| (cover, &edition.key)));

        let mut isbn = BTreeSet::new();
        let mut oclc = BTreeSet::new();
        let mut lccn = BTreeSet::new();
        for identifier in ordered.iter().flat_map(|edition| edition.identifiers.iter()) {
            let target = match identifier.kind() {
                IdentifierKind::Isbn => &mut isbn,
                IdentifierKind::Oclc => &mut oclc,
                IdentifierKind::Lccn => &mut lccn,
            };
            target.extend(identifier.forms());
        }

        let mut pages: Vec<u32> = ordered.iter().filter_map(|edition| edition.number_of_pages).collect();
        pages.sort_unstable();

        let work_title = collapse_whitespace(&work.title).map(|title| title.to_lowercase());
        let alternative_titles = distinct_folded(ordered.iter().filter_map(|edition| edition.title.as_deref()))
            .into_iter()
            .filter(|title| Some(title.to_lowercase()) != work_title)
            .collect();

        Self {
            edition_count: ordered.len() as u64,
            ebook_count: ordered.iter().filter(|edition| edition.fulltext).count() as u64,
            first_publish_year: years.first().copied(),
            last_publish_year: years.last().copied(),
            publish_years: years.into_iter().collect(),
            languages: languages.into_iter().collect(),
            has_fulltext: ordered.iter().any(|edition| edition.fulltext),
            cover_id: cover.map(|(cover, _)| cover.clone()),
            cover_edition_key: cover.map(|(_, key)| key.clone()),
            edition_keys: ordered.iter().map(|edition| edition.key.clone()).collect(),
            isbn: isbn.into_iter().collect(),
            oclc: oclc.into_iter().collect(),
            lccn: lccn.into_iter().collect(),
            publishers: distinct_folded(ordered.iter().flat_map(|edition| edition.publishers.iter().map(String::as_str))),
            number_of_pages_median: pages.get(pages.len().saturating_sub(1) / 2).copied(),
            alternative_titles,
            formats: formats.into_iter().collect(),
        }
    }
}

/// Whitespace-collapsed strings, deduplicated case-insensitively (first
/// casing seen wins), sorted.
fn distinct_folded<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut distinct: Vec<String> = values
        .into_iter()
        .filter_map(collapse_whitespace)
        .filter(|value| seen.insert(value.to_lowercase()))
        .collect();
    distinct.sort();
    distinct
}
