use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// First plausible four-digit year in a free-text publish date ("c1995", "June 1, 2001").
regex!(YEAR_REGEX, r"(?:^|\D)(\d{4})(?:\D|$)");
regex!(WHITESPACE_REGEX, r"\s+");
