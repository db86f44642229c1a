use crate::consts::collapse_whitespace;

/// Display form of a facet string: trimmed, with internal whitespace
/// collapsed. `None` for strings with no content.
pub fn normalize(raw: &str) -> Option<String> {
    collapse_whitespace(raw)
}

/// Comparison key of a normalized facet string.
pub fn fold(display: &str) -> String {
    display.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Whales", Some("Whales"))]
    #[case("  Sea   stories\t", Some("Sea stories"))]
    #[case("Fiction,\nhistorical", Some("Fiction, historical"))]
    #[case("", None)]
    #[case(" \t\n ", None)]
    fn test_normalize(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize(raw).as_deref(), expected);
    }

    #[rstest]
    #[case("Sea stories", "sea stories")]
    #[case("ÉCOLE", "école")]
    fn test_fold(#[case] display: &str, #[case] expected: &str) {
        assert_eq!(fold(display), expected);
    }
}
