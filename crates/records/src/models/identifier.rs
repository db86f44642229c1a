//! Strongly-typed bibliographic identifiers.
//!
//! Identifiers are normalized on construction so that two spellings of the
//! same number (`0-306-40615-2`, `0306406152`) compare equal:
//!
//! - **ISBN**: separators removed, check character uppercased. Both the 10-
//!   and 13-digit forms are accepted; [`Identifier::forms`] yields both.
//! - **OCLC**: `ocm`/`ocn`/`on` prefixes and leading zeros removed.
//! - **LCCN**: normalized per the Library of Congress rules (blanks removed,
//!   anything after `/` dropped, hyphenated serials zero-padded to 6 digits).

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::sanitize;
use crate::consts::WHITESPACE_REGEX;
use crate::error::{Error, ErrorKind, Result};

/// Identifier scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IdentifierKind {
    Isbn,
    Oclc,
    Lccn,
}
impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Isbn => "isbn",
            IdentifierKind::Oclc => "oclc",
            IdentifierKind::Lccn => "lccn",
        }
    }
}
impl FromStr for IdentifierKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let sanitized = sanitize(s);
        Ok(match sanitized.as_str() {
            "isbn" | "isbn10" | "isbn13" => Self::Isbn,
            "oclc" | "oclcnumber" | "oclcnumbers" => Self::Oclc,
            "lccn" => Self::Lccn,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "identifier kind",
                value: format!("unknown identifier scheme: {}", s)
            }),
        })
    }
}
impl Display for IdentifierKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized `(scheme, value)` identifier tuple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
    kind: IdentifierKind,
    value: String,
}
impl Identifier {
    pub fn new(kind: IdentifierKind, raw: &str) -> Result<Self> {
        let value = match kind {
            IdentifierKind::Isbn => normalize_isbn(raw),
            IdentifierKind::Oclc => normalize_oclc(raw),
            IdentifierKind::Lccn => normalize_lccn(raw),
        };
        match value {
            Some(value) => Ok(Self { kind, value }),
            None => exn::bail!(ErrorKind::ParseError {
                field: kind.as_str(),
                value: raw.to_string(),
            }),
        }
    }

    pub fn isbn(raw: &str) -> Result<Self> {
        Self::new(IdentifierKind::Isbn, raw)
    }

    pub fn oclc(raw: &str) -> Result<Self> {
        Self::new(IdentifierKind::Oclc, raw)
    }

    pub fn lccn(raw: &str) -> Result<Self> {
        Self::new(IdentifierKind::Lccn, raw)
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Every searchable spelling of this identifier.
    ///
    /// For ISBNs this is the stored form plus its 10/13-digit counterpart
    /// (ISBN-13s outside the `978` prefix have no 10-digit form). Other
    /// schemes only have the one form.
    pub fn forms(&self) -> Vec<String> {
        let mut forms = vec![self.value.clone()];
        if self.kind == IdentifierKind::Isbn {
            let other = match self.value.len() {
                10 => Some(isbn10_to_isbn13(&self.value)),
                _ => isbn13_to_isbn10(&self.value),
            };
            forms.extend(other);
        }
        forms
    }
}
impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

fn normalize_isbn(raw: &str) -> Option<String> {
    let isbn: String = raw.chars().filter(|c| !matches!(c, '-' | ' ')).collect::<String>().to_uppercase();
    let valid = match isbn.len() {
        10 => {
            let (body, check) = isbn.split_at(9);
            body.bytes().all(|b| b.is_ascii_digit()) && (check == "X" || check.bytes().all(|b| b.is_ascii_digit()))
        },
        13 => isbn.bytes().all(|b| b.is_ascii_digit()),
        _ => false,
    };
    valid.then_some(isbn)
}

fn isbn10_to_isbn13(isbn10: &str) -> String {
    let body = format!("978{}", &isbn10[..9]);
    let sum: u32 = body
        .bytes()
        .zip([1, 3].into_iter().cycle())
        .map(|(digit, weight)| u32::from(digit - b'0') * weight)
        .sum();
    format!("{}{}", body, (10 - sum % 10) % 10)
}

fn isbn13_to_isbn10(isbn13: &str) -> Option<String> {
    let body = isbn13.strip_prefix("978")?.get(..9)?;
    let sum: u32 = body.bytes().zip((2..=10).rev()).map(|(digit, weight)| u32::from(digit - b'0') * weight).sum();
    let check = match (11 - sum % 11) % 11 {
        10 => 'X',
        n => char::from_digit(n, 10)?,
    };
    Some(format!("{}{}", body, check))
}

fn normalize_oclc(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let digits = ["(ocolc)", "ocm", "ocn", "on"]
        .iter()
        .find_map(|prefix| lowered.strip_prefix(prefix))
        .unwrap_or(&lowered)
        .trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn normalize_lccn(raw: &str) -> Option<String> {
    let compact = WHITESPACE_REGEX.replace_all(raw, "").to_lowercase();
    let compact = compact.split('/').next().unwrap_or_default();
    let lccn = match compact.split_once('-') {
        Some((prefix, serial)) => format!("{}{:0>6}", prefix, serial),
        None => compact.to_string(),
    };
    (!lccn.is_empty() && lccn.bytes().all(|b| b.is_ascii_alphanumeric())).then_some(lccn)
}
