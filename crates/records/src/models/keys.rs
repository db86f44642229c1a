use std::borrow::Borrow;
use std::fmt::{Display, Formatter, Result as FmtResult};

macro_rules! key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);
        impl $name {
            pub fn new(key: impl Into<String>) -> Self {
                let key = key.into();
                let trimmed = key.trim();
                if trimmed.len() == key.len() { Self(key) } else { Self(trimmed.to_string()) }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }
        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self::new(key)
            }
        }
        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self::new(key)
            }
        }
        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                write!(f, "{}", self.0)
            }
        }
    };
}

key!(
    /// Stable identifier of a work (e.g. `/works/OL45804W`).
    WorkKey
);
key!(
    /// Stable identifier of an edition (e.g. `/books/OL7353617M`).
    EditionKey
);
key!(
    /// Stable identifier of an author (e.g. `/authors/OL34184A`).
    AuthorKey
);
key!(
    /// Reference to a cover image.
    CoverId
);
