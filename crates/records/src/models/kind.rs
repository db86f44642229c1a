use std::fmt::{Display, Formatter, Result as FmtResult};

/// The kinds of catalog record the compiler reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Work,
    Edition,
    Author,
}
impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Work => "work",
            RecordKind::Edition => "edition",
            RecordKind::Author => "author",
        }
    }
}
impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
