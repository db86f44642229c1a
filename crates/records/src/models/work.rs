use super::{AuthorKey, RecordKind, WorkKey};
use crate::Record;

/// The canonical bibliographic entity: an abstract book, independent of
/// any particular edition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    pub key: WorkKey,
    pub title: String,
    pub subtitle: Option<String>,
    /// Free-text subject strings, possibly tagged for classification.
    pub subjects: Vec<String>,
    /// Authors in credited order.
    pub authors: Vec<AuthorKey>,
    /// Key of the work this record was merged into.
    pub redirect: Option<WorkKey>,
    pub deleted: bool,
}
impl Work {
    pub fn new(key: impl Into<WorkKey>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            subtitle: None,
            subjects: Vec::new(),
            authors: Vec::new(),
            redirect: None,
            deleted: false,
        }
    }

    /// A stub record whose content now lives under `target`.
    pub fn redirecting(key: impl Into<WorkKey>, target: impl Into<WorkKey>) -> Self {
        Self {
            redirect: Some(target.into()),
            ..Self::new(key, "")
        }
    }

    /// A tombstone for a permanently deleted work.
    pub fn tombstone(key: impl Into<WorkKey>) -> Self {
        Self {
            deleted: true,
            ..Self::new(key, "")
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_subjects<S: Into<String>>(mut self, subjects: impl IntoIterator<Item = S>) -> Self {
        self.subjects = subjects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_authors<K: Into<AuthorKey>>(mut self, authors: impl IntoIterator<Item = K>) -> Self {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }
}
impl Record for Work {
    type Key = WorkKey;
    const KIND: RecordKind = RecordKind::Work;

    fn key(&self) -> &WorkKey {
        &self.key
    }

    fn redirect(&self) -> Option<&WorkKey> {
        self.redirect.as_ref()
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
