use std::collections::BTreeSet;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::{CoverId, EditionKey, Identifier, RecordKind, WorkKey, sanitize};
use crate::Record;
use crate::consts::YEAR_REGEX;
use crate::error::{Error, ErrorKind};

/// One concrete published manifestation of a work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edition {
    pub key: EditionKey,
    /// The work this edition belongs to
    pub work: WorkKey,
    pub title: Option<String>,
    pub publish_year: Option<u32>,
    /// Free-text publication date as catalogued ("c1995", "June 2001")
    pub publish_date: Option<String>,
    pub languages: Vec<String>,
    pub identifiers: BTreeSet<Identifier>,
    pub cover: Option<CoverId>,
    /// Whether the full text of this edition can be accessed
    pub fulltext: bool,
    pub source: EditionSource,
    pub publishers: Vec<String>,
    pub number_of_pages: Option<u32>,
    pub subjects: Vec<String>,
    pub redirect: Option<EditionKey>,
    pub deleted: bool,
}
impl Edition {
    pub fn new(key: impl Into<EditionKey>, work: impl Into<WorkKey>) -> Self {
        Self {
            key: key.into(),
            work: work.into(),
            title: None,
            publish_year: None,
            publish_date: None,
            languages: Vec::new(),
            identifiers: BTreeSet::new(),
            cover: None,
            fulltext: false,
            source: EditionSource::default(),
            publishers: Vec::new(),
            number_of_pages: None,
            subjects: Vec::new(),
            redirect: None,
            deleted: false,
        }
    }

    pub fn redirecting(key: impl Into<EditionKey>, work: impl Into<WorkKey>, target: impl Into<EditionKey>) -> Self {
        Self {
            redirect: Some(target.into()),
            ..Self::new(key, work)
        }
    }

    pub fn tombstone(key: impl Into<EditionKey>, work: impl Into<WorkKey>) -> Self {
        Self {
            deleted: true,
            ..Self::new(key, work)
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_year(mut self, year: u32) -> Self {
        self.publish_year = Some(year);
        self
    }

    pub fn with_publish_date(mut self, date: impl Into<String>) -> Self {
        self.publish_date = Some(date.into());
        self
    }

    pub fn with_languages<S: Into<String>>(mut self, languages: impl IntoIterator<Item = S>) -> Self {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_identifier(mut self, identifier: Identifier) -> Self {
        self.identifiers.insert(identifier);
        self
    }

    pub fn with_cover(mut self, cover: impl Into<CoverId>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    pub fn with_fulltext(mut self, fulltext: bool) -> Self {
        self.fulltext = fulltext;
        self
    }

    pub fn with_source(mut self, source: EditionSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_publishers<S: Into<String>>(mut self, publishers: impl IntoIterator<Item = S>) -> Self {
        self.publishers = publishers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pages(mut self, pages: u32) -> Self {
        self.number_of_pages = Some(pages);
        self
    }

    pub fn with_subjects<S: Into<String>>(mut self, subjects: impl IntoIterator<Item = S>) -> Self {
        self.subjects = subjects.into_iter().map(Into::into).collect();
        self
    }

    /// Year of publication: the explicit year if catalogued, otherwise the
    /// first four-digit year found in the free-text publish date.
    pub fn year(&self) -> Option<u32> {
        self.publish_year.or_else(|| {
            let date = self.publish_date.as_deref()?;
            YEAR_REGEX.captures(date)?.get(1)?.as_str().parse().ok()
        })
    }

    /// Language codes, lowercased and stripped of any `/languages/` prefix.
    pub fn language_codes(&self) -> impl Iterator<Item = String> + '_ {
        self.languages
            .iter()
            .map(|code| code.trim().trim_start_matches("/languages/").trim().to_lowercase())
            .filter(|code| !code.is_empty())
    }
}
impl Record for Edition {
    type Key = EditionKey;
    const KIND: RecordKind = RecordKind::Edition;

    fn key(&self) -> &EditionKey {
        &self.key
    }

    fn redirect(&self) -> Option<&EditionKey> {
        self.redirect.as_ref()
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Physical or digital format of an edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EditionSource {
    #[default]
    Print,
    Ebook,
    Audio,
}
impl EditionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditionSource::Print => "print",
            EditionSource::Ebook => "ebook",
            EditionSource::Audio => "audio",
        }
    }
}
impl FromStr for EditionSource {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sanitized = sanitize(s);
        Ok(match sanitized.as_str() {
            "print" | "book" | "paperback" | "hardcover" | "massmarketpaperback" => Self::Print,
            "ebook" | "electronic" | "electronicresource" | "digital" => Self::Ebook,
            "audio" | "audiobook" | "audiocd" | "audiocassette" => Self::Audio,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "source",
                value: format!("unknown edition source: {}", s)
            }),
        })
    }
}
impl Display for EditionSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
