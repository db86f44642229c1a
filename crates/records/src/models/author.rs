use super::{AuthorKey, RecordKind};
use crate::Record;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A person credited on a work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Author {
    pub key: AuthorKey,
    /// Display name
    pub name: String,
    /// Other spellings, pen names, transliterations
    pub alternate_names: Vec<String>,
    pub redirect: Option<AuthorKey>,
    pub deleted: bool,
}
impl Author {
    pub fn new(key: impl Into<AuthorKey>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            alternate_names: Vec::new(),
            redirect: None,
            deleted: false,
        }
    }

    pub fn redirecting(key: impl Into<AuthorKey>, target: impl Into<AuthorKey>) -> Self {
        Self {
            redirect: Some(target.into()),
            ..Self::new(key, "")
        }
    }

    pub fn tombstone(key: impl Into<AuthorKey>) -> Self {
        Self {
            deleted: true,
            ..Self::new(key, "")
        }
    }

    pub fn with_alternate_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        // The primary name is never repeated as an alternate.
        let primary = self.name.clone();
        self.alternate_names = names.into_iter().map(Into::into).filter(|n: &String| *n != primary).collect();
        self
    }
}
impl Record for Author {
    type Key = AuthorKey;
    const KIND: RecordKind = RecordKind::Author;

    fn key(&self) -> &AuthorKey {
        &self.key
    }

    fn redirect(&self) -> Option<&AuthorKey> {
        self.redirect.as_ref()
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl Display for Author {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} ({})", self.name, self.key)
    }
}
