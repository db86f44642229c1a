//! The flat search document emitted for one work.

use crate::facets::FacetEntry;
use folio_records::models::WorkKey;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Names of the fields a [`SearchDocument`] can carry.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const SUBTITLE: &str = "subtitle";
    pub const AUTHOR_KEY: &str = "author_key";
    pub const AUTHOR_NAME: &str = "author_name";
    pub const AUTHOR_ALTERNATIVE_NAME: &str = "author_alternative_name";

    pub const EDITION_COUNT: &str = "edition_count";
    pub const EBOOK_COUNT: &str = "ebook_count";
    pub const EDITION_KEY: &str = "edition_key";
    pub const FIRST_PUBLISH_YEAR: &str = "first_publish_year";
    pub const LAST_PUBLISH_YEAR: &str = "last_publish_year";
    pub const PUBLISH_YEAR: &str = "publish_year";
    pub const LANGUAGE: &str = "language";
    pub const HAS_FULLTEXT: &str = "has_fulltext";
    pub const COVER_ID: &str = "cover_id";
    pub const COVER_EDITION_KEY: &str = "cover_edition_key";
    pub const ISBN: &str = "isbn";
    pub const OCLC: &str = "oclc";
    pub const LCCN: &str = "lccn";
    pub const PUBLISHER: &str = "publisher";
    pub const NUMBER_OF_PAGES_MEDIAN: &str = "number_of_pages_median";
    pub const ALTERNATIVE_TITLE: &str = "alternative_title";
    pub const EDITION_FORMAT: &str = "edition_format";

    pub const SUBJECT: &str = "subject";
    pub const PLACE: &str = "place";
    pub const TIME: &str = "time";
    pub const PERSON: &str = "person";
    pub const SUBJECT_KEY: &str = "subject_key";
    pub const PLACE_KEY: &str = "place_key";
    pub const TIME_KEY: &str = "time_key";
    pub const PERSON_KEY: &str = "person_key";

    pub const RATING_AVERAGE: &str = "rating_average";
    pub const RATING_COUNT: &str = "rating_count";
    pub const WANT_COUNT: &str = "want_count";
    pub const READ_COUNT: &str = "read_count";
    pub const READINGLOG_COUNT: &str = "readinglog_count";
    pub const AVAILABILITY: &str = "availability";
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(u64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
    Integers(Vec<u64>),
    Facets(Vec<FacetEntry>),
}
impl FieldValue {
    fn tag(&self) -> u8 {
        match self {
            FieldValue::Text(_) => 0,
            FieldValue::Integer(_) => 1,
            FieldValue::Float(_) => 2,
            FieldValue::Bool(_) => 3,
            FieldValue::List(_) => 4,
            FieldValue::Integers(_) => 5,
            FieldValue::Facets(_) => 6,
        }
    }
}

/// Flat, denormalized document for a search index, keyed by the resolved
/// work key.
///
/// Fields are kept in name order, so iterating or serializing a document
/// always produces the same sequence. Absent values and empty lists are
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDocument {
    key: WorkKey,
    fields: BTreeMap<&'static str, FieldValue>,
}
impl SearchDocument {
    pub fn new(key: WorkKey) -> Self {
        Self {
            key,
            fields: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> &WorkKey {
        &self.key
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.get(field)? {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn integer(&self, field: &str) -> Option<u64> {
        match self.get(field)? {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn float(&self, field: &str) -> Option<f64> {
        match self.get(field)? {
            FieldValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        match self.get(field)? {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn list(&self, field: &str) -> Option<&[String]> {
        match self.get(field)? {
            FieldValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn integers(&self, field: &str) -> Option<&[u64]> {
        match self.get(field)? {
            FieldValue::Integers(values) => Some(values),
            _ => None,
        }
    }

    pub fn facets(&self, field: &str) -> Option<&[FacetEntry]> {
        match self.get(field)? {
            FieldValue::Facets(entries) => Some(entries),
            _ => None,
        }
    }

    /// Fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn set(&mut self, field: &'static str, value: FieldValue) {
        self.fields.insert(field, value);
    }

    pub(crate) fn set_text(&mut self, field: &'static str, value: Option<impl Into<String>>) {
        if let Some(value) = value.map(Into::into).filter(|value: &String| !value.is_empty()) {
            self.set(field, FieldValue::Text(value));
        }
    }

    pub(crate) fn set_integer(&mut self, field: &'static str, value: Option<u64>) {
        if let Some(value) = value {
            self.set(field, FieldValue::Integer(value));
        }
    }

    pub(crate) fn set_float(&mut self, field: &'static str, value: Option<f64>) {
        if let Some(value) = value.filter(|value| value.is_finite()) {
            self.set(field, FieldValue::Float(value));
        }
    }

    pub(crate) fn set_list<S: Into<String>>(&mut self, field: &'static str, values: impl IntoIterator<Item = S>) {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.set(field, FieldValue::List(values));
        }
    }

    pub(crate) fn set_integers(&mut self, field: &'static str, values: impl IntoIterator<Item = u64>) {
        let values: Vec<u64> = values.into_iter().collect();
        if !values.is_empty() {
            self.set(field, FieldValue::Integers(values));
        }
    }

    pub(crate) fn set_facets(&mut self, field: &'static str, entries: &[FacetEntry]) {
        if !entries.is_empty() {
            self.set(field, FieldValue::Facets(entries.to_vec()));
        }
    }

    /// BLAKE3 digest (hex) of the document's canonical encoding.
    ///
    /// Two documents have the same fingerprint exactly when they have the
    /// same key and the same fields with the same values.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        write_str(&mut hasher, self.key.as_str());
        for (name, value) in &self.fields {
            write_str(&mut hasher, name);
            hasher.update(&[value.tag()]);
            match value {
                FieldValue::Text(text) => write_str(&mut hasher, text),
                FieldValue::Integer(value) => write_u64(&mut hasher, *value),
                FieldValue::Float(value) => write_u64(&mut hasher, value.to_bits()),
                FieldValue::Bool(value) => {
                    hasher.update(&[u8::from(*value)]);
                },
                FieldValue::List(values) => {
                    write_u64(&mut hasher, values.len() as u64);
                    values.iter().for_each(|value| write_str(&mut hasher, value));
                },
                FieldValue::Integers(values) => {
                    write_u64(&mut hasher, values.len() as u64);
                    values.iter().for_each(|value| write_u64(&mut hasher, *value));
                },
                FieldValue::Facets(entries) => {
                    write_u64(&mut hasher, entries.len() as u64);
                    for entry in entries {
                        write_str(&mut hasher, &entry.value);
                        write_str(&mut hasher, &entry.key);
                        write_u64(&mut hasher, entry.count);
                    }
                },
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

// Length-prefixed so that adjacent strings can't run into each other.
fn write_str(hasher: &mut blake3::Hasher, value: &str) {
    write_u64(hasher, value.len() as u64);
    hasher.update(value.as_bytes());
}

fn write_u64(hasher: &mut blake3::Hasher, value: u64) {
    hasher.update(&value.to_le_bytes());
}

impl Serialize for SearchDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("key", self.key.as_str())?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> SearchDocument {
        let mut document = SearchDocument::new(WorkKey::from("W1"));
        document.set_text(fields::TITLE, Some("Example"));
        document.set_integer(fields::EDITION_COUNT, Some(2));
        document.set_list(fields::LANGUAGE, ["eng", "fre"]);
        document.set(fields::HAS_FULLTEXT, FieldValue::Bool(true));
        document
    }

    #[test]
    fn test_absent_values_are_omitted() {
        let mut document = SearchDocument::new(WorkKey::from("W1"));
        document.set_text(fields::SUBTITLE, None::<String>);
        document.set_text(fields::TITLE, Some(""));
        document.set_integer(fields::WANT_COUNT, None);
        document.set_float(fields::RATING_AVERAGE, Some(f64::NAN));
        document.set_list::<String>(fields::ISBN, []);
        document.set_facets(fields::SUBJECT, &[]);
        assert!(document.is_empty());
    }

    #[test]
    fn test_zero_is_not_absent() {
        let mut document = SearchDocument::new(WorkKey::from("W1"));
        document.set_integer(fields::WANT_COUNT, Some(0));
        assert_eq!(document.integer(fields::WANT_COUNT), Some(0));
    }

    #[test]
    fn test_typed_accessors() {
        let document = document();
        assert_eq!(document.text(fields::TITLE), Some("Example"));
        assert_eq!(document.integer(fields::EDITION_COUNT), Some(2));
        assert_eq!(document.list(fields::LANGUAGE), Some(&["eng".to_string(), "fre".to_string()][..]));
        assert_eq!(document.boolean(fields::HAS_FULLTEXT), Some(true));
        // Wrong type reads as absent.
        assert_eq!(document.text(fields::EDITION_COUNT), None);
    }

    #[test]
    fn test_serializes_key_first_then_fields_in_name_order() {
        let json = serde_json::to_string(&document()).unwrap();
        assert_eq!(
            json,
            r#"{"key":"W1","edition_count":2,"has_fulltext":true,"language":["eng","fre"],"title":"Example"}"#
        );
    }

    #[test]
    fn test_facets_serialize_as_objects() {
        let mut document = SearchDocument::new(WorkKey::from("W1"));
        document.set_facets(fields::PLACE, &[FacetEntry {
            value: "London".to_string(),
            key: "london".to_string(),
            count: 2,
        }]);
        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["place"][0]["value"], "London");
        assert_eq!(json["place"][0]["count"], 2);
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        assert_eq!(document().fingerprint(), document().fingerprint());
        assert_eq!(document().fingerprint().len(), 64);

        let mut changed = document();
        changed.set_integer(fields::EDITION_COUNT, Some(3));
        assert_ne!(document().fingerprint(), changed.fingerprint());

        let mut rekeyed = SearchDocument::new(WorkKey::from("W2"));
        rekeyed.fields = document().fields;
        assert_ne!(document().fingerprint(), rekeyed.fingerprint());
    }
}
