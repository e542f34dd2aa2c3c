use regex::Regex;

fn tag_prefix_pattern() -> &'static Regex {
    use std::sync::OnceLock;

    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]*$").expect("invalid tag prefix regex"))
}

/// Determine whether a configured tag prefix is safe to embed in file names and URLs.
///
/// Tags become both the stem of the bundle file and part of its public URL, so the prefix is
/// restricted to characters that need no escaping in either place.
pub fn is_valid_tag_prefix(value: &str) -> bool {
    tag_prefix_pattern().is_match(value)
}

#[cfg(test)]
mod tests {
    use super::is_valid_tag_prefix;

    #[test]
    fn accepts_version_strings() {
        assert!(is_valid_tag_prefix("v2."));
        assert!(is_valid_tag_prefix("release-2024_10"));
        assert!(is_valid_tag_prefix(""));
    }

    #[test]
    fn rejects_path_separators() {
        assert!(!is_valid_tag_prefix("../v2"));
        assert!(!is_valid_tag_prefix("v2\\"));
    }

    #[test]
    fn rejects_url_sensitive_characters() {
        assert!(!is_valid_tag_prefix("v2?x"));
        assert!(!is_valid_tag_prefix("v 2"));
        assert!(!is_valid_tag_prefix("v#2"));
    }
}
