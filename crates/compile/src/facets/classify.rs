use std::fmt::{Display, Formatter, Result as FmtResult};

/// Facet category a subject string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FacetKind {
    /// Topics ("Science fiction", "Cooking")
    Subject,
    /// Geographic places ("London", "Mars")
    Place,
    /// Time periods ("19th century")
    Time,
    /// People the work is about (not its authors)
    Person,
}
impl FacetKind {
    pub const ALL: [FacetKind; 4] = [FacetKind::Subject, FacetKind::Place, FacetKind::Time, FacetKind::Person];

    pub fn as_str(&self) -> &'static str {
        match self {
            FacetKind::Subject => "subject",
            FacetKind::Place => "place",
            FacetKind::Time => "time",
            FacetKind::Person => "person",
        }
    }
}
impl Display for FacetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A subject string assigned to a facet category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified<'a> {
    pub kind: FacetKind,
    /// Text to index, with any category tag removed.
    pub text: &'a str,
}

/// Assigns subject strings to facet categories.
///
/// Returning `None` means the string matches no category. The extractor
/// files such strings under [`FacetKind::Subject`] and reports them.
///
/// Any `Fn(&str) -> Option<FacetKind>` is a classifier that keeps the text
/// as-is:
///
/// ```
/// use folio_compile::facets::{Classifier, FacetKind};
///
/// let by_suffix = |s: &str| s.ends_with("century").then_some(FacetKind::Time);
/// assert_eq!(by_suffix.classify("19th century").map(|c| c.kind), Some(FacetKind::Time));
/// assert!(by_suffix.classify("Whales").is_none());
/// ```
pub trait Classifier: Send + Sync {
    fn classify<'a>(&self, raw: &'a str) -> Option<Classified<'a>>;
}
impl<F> Classifier for F
where
    F: Fn(&str) -> Option<FacetKind> + Send + Sync,
{
    fn classify<'a>(&self, raw: &'a str) -> Option<Classified<'a>> {
        self(raw).map(|kind| Classified { kind, text: raw })
    }
}

/// Classifies strings by a leading tag such as `place:London`.
///
/// Tags are matched case-insensitively and stripped from the indexed text.
/// Untagged strings fall back to [`FacetKind::Subject`] unless the
/// classifier is [strict](PrefixClassifier::strict).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixClassifier {
    // Longest prefix first, so "time:" never shadows "timeline:".
    prefixes: Vec<(String, FacetKind)>,
    fallback: Option<FacetKind>,
}
impl PrefixClassifier {
    /// The `subject:`, `place:`, `time:` and `person:` convention.
    pub fn new() -> Self {
        FacetKind::ALL
            .iter()
            .fold(Self::empty(), |classifier, kind| classifier.with_prefix(format!("{}:", kind), *kind))
    }

    /// A classifier that recognizes no tags at all.
    pub fn empty() -> Self {
        Self {
            prefixes: Vec::new(),
            fallback: Some(FacetKind::Subject),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, kind: FacetKind) -> Self {
        let prefix = prefix.into().trim().to_lowercase();
        if !prefix.is_empty() && !self.prefixes.iter().any(|(existing, _)| *existing == prefix) {
            self.prefixes.push((prefix, kind));
            self.prefixes.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        }
        self
    }

    /// Report untagged strings as unclassifiable instead of filing them
    /// under subjects.
    pub fn strict(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.fallback.is_none()
    }
}
impl Default for PrefixClassifier {
    fn default() -> Self {
        Self::new()
    }
}
impl Classifier for PrefixClassifier {
    fn classify<'a>(&self, raw: &'a str) -> Option<Classified<'a>> {
        let raw = raw.trim_start();
        for (prefix, kind) in &self.prefixes {
            if let Some(head) = raw.get(..prefix.len())
                && head.to_lowercase() == *prefix
            {
                return Some(Classified {
                    kind: *kind,
                    text: raw[prefix.len()..].trim(),
                });
            }
        }
        self.fallback.map(|kind| Classified { kind, text: raw })
    }
}
