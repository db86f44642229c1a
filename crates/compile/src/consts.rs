use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(WHITESPACE_REGEX, r"\s+");

/// Collapse runs of whitespace into single spaces and trim the ends.
///
/// Returns `None` when nothing but whitespace remains.
pub(crate) fn collapse_whitespace(raw: &str) -> Option<String> {
    let collapsed = WHITESPACE_REGEX.replace_all(raw.trim(), " ");
    (!collapsed.is_empty()).then(|| collapsed.into_owned())
}
