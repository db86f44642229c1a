//! Document assembly.

use crate::aggregate::EditionAggregate;
use crate::consts::collapse_whitespace;
use crate::document::{FieldValue, SearchDocument, fields};
use crate::error::{ErrorKind, Result};
use crate::facets::{FacetKind, Facets};
use crate::signals::Signals;
use folio_records::models::{Author, Work};
use std::collections::{BTreeSet, HashSet};

/// Everything a document is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct DocumentParts<'a> {
    /// The resolved work
    pub work: &'a Work,
    /// Resolved authors, deduplicated, in the work's reference order
    pub authors: &'a [&'a Author],
    pub editions: &'a EditionAggregate,
    pub facets: &'a Facets,
    pub signals: &'a Signals,
}

fn facet_fields(kind: FacetKind) -> (&'static str, &'static str) {
    match kind {
        FacetKind::Subject => (fields::SUBJECT, fields::SUBJECT_KEY),
        FacetKind::Place => (fields::PLACE, fields::PLACE_KEY),
        FacetKind::Time => (fields::TIME, fields::TIME_KEY),
        FacetKind::Person => (fields::PERSON, fields::PERSON_KEY),
    }
}

/// Merge `parts` into a [`SearchDocument`] keyed by the work's key.
///
/// # Errors
///
/// [`Validation`](ErrorKind::Validation) if the work key is empty or the
/// title is blank.
pub fn assemble(parts: DocumentParts<'_>) -> Result<SearchDocument> {
    let DocumentParts {
        work,
        authors,
        editions,
        facets,
        signals,
    } = parts;
    if work.key.is_empty() {
        exn::bail!(ErrorKind::Validation("key"));
    }
    let Some(title) = collapse_whitespace(&work.title) else {
        exn::bail!(ErrorKind::Validation("title"));
    };

    let mut document = SearchDocument::new(work.key.clone());
    document.set_text(fields::TITLE, Some(title));
    document.set_text(fields::SUBTITLE, work.subtitle.as_deref().and_then(collapse_whitespace));

    let mut seen_names = HashSet::new();
    let names: Vec<String> = authors
        .iter()
        .filter_map(|author| collapse_whitespace(&author.name))
        .filter(|name| seen_names.insert(name.clone()))
        .collect();
    let alternative_names: BTreeSet<String> = authors
        .iter()
        .flat_map(|author| author.alternate_names.iter())
        .filter_map(|name| collapse_whitespace(name))
        .filter(|name| !seen_names.contains(name))
        .collect();
    document.set_list(fields::AUTHOR_KEY, authors.iter().map(|author| author.key.as_str()));
    document.set_list(fields::AUTHOR_NAME, names);
    document.set_list(fields::AUTHOR_ALTERNATIVE_NAME, alternative_names);

    document.set_integer(fields::EDITION_COUNT, Some(editions.edition_count));
    document.set_integer(fields::EBOOK_COUNT, Some(editions.ebook_count));
    document.set(fields::HAS_FULLTEXT, FieldValue::Bool(editions.has_fulltext));
    document.set_list(fields::EDITION_KEY, editions.edition_keys.iter().map(|key| key.as_str()));
    document.set_integer(fields::FIRST_PUBLISH_YEAR, editions.first_publish_year.map(u64::from));
    document.set_integer(fields::LAST_PUBLISH_YEAR, editions.last_publish_year.map(u64::from));
    document.set_integers(fields::PUBLISH_YEAR, editions.publish_years.iter().copied().map(u64::from));
    document.set_list(fields::LANGUAGE, editions.languages.iter().map(String::as_str));
    document.set_text(fields::COVER_ID, editions.cover_id.as_ref().map(|cover| cover.as_str()));
    document.set_text(fields::COVER_EDITION_KEY, editions.cover_edition_key.as_ref().map(|key| key.as_str()));
    document.set_list(fields::ISBN, editions.isbn.iter().map(String::as_str));
    document.set_list(fields::OCLC, editions.oclc.iter().map(String::as_str));
    document.set_list(fields::LCCN, editions.lccn.iter().map(String::as_str));
    document.set_list(fields::PUBLISHER, editions.publishers.iter().map(String::as_str));
    document.set_integer(fields::NUMBER_OF_PAGES_MEDIAN, editions.number_of_pages_median.map(u64::from));
    document.set_list(fields::ALTERNATIVE_TITLE, editions.alternative_titles.iter().map(String::as_str));
    document.set_list(fields::EDITION_FORMAT, editions.formats.iter().map(|format| format.as_str()));

    for kind in FacetKind::ALL {
        let (field, key_field) = facet_fields(kind);
        let entries = facets.get(kind);
        document.set_facets(field, entries);
        document.set_list(key_field, entries.iter().map(|entry| entry.key.as_str()));
    }

    document.set_float(fields::RATING_AVERAGE, signals.rating_average);
    document.set_integer(fields::RATING_COUNT, signals.rating_count);
    document.set_integer(fields::WANT_COUNT, signals.want_count);
    document.set_integer(fields::READ_COUNT, signals.read_count);
    document.set_integer(fields::READINGLOG_COUNT, signals.readinglog_count);
    document.set_text(fields::AVAILABILITY, signals.availability.map(|availability| availability.as_str()));

    Ok(document)
}
