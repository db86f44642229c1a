use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// How a reader can get at a work's content.
///
/// Variants are declared in ascending precedence, so the derived [`Ord`]
/// picks the most permissive indicator with [`Iterator::max`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Availability {
    /// No digital copy can be read or borrowed.
    Unavailable,
    /// A digital copy can be borrowed.
    Borrowable,
    /// A digital copy is freely readable.
    OpenAccess,
}
impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Unavailable => "unavailable",
            Availability::Borrowable => "borrowable",
            Availability::OpenAccess => "open-access",
        }
    }
}
impl FromStr for Availability {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sanitized = sanitize(s);
        Ok(match sanitized.as_str() {
            "unavailable" | "none" | "noebook" | "printdisabled" => Self::Unavailable,
            "borrowable" | "borrow" | "lendable" | "lending" => Self::Borrowable,
            "openaccess" | "open" | "public" | "fulltext" => Self::OpenAccess,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "availability",
                value: format!("unknown availability: {}", s)
            }),
        })
    }
}

impl Display for Availability {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("open-access", Availability::OpenAccess)]
    #[case("public", Availability::OpenAccess)]
    #[case("Borrowable", Availability::Borrowable)]
    #[case("lendable", Availability::Borrowable)]
    #[case("no_ebook", Availability::Unavailable)]
    #[case(" printdisabled ", Availability::Unavailable)]
    fn test_parse_availability(#[case] input: &str, #[case] expected: Availability) {
        assert_eq!(input.parse::<Availability>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_availability_is_an_error() {
        assert!("sometimes".parse::<Availability>().is_err());
    }

    #[test]
    fn test_precedence_order() {
        let indicators = [Availability::Borrowable, Availability::OpenAccess, Availability::Unavailable];
        assert_eq!(indicators.into_iter().max(), Some(Availability::OpenAccess));
        assert!(Availability::Borrowable > Availability::Unavailable);
    }
}
