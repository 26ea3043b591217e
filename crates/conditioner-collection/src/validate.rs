use std::sync::OnceLock;

use regex::Regex;

fn subreddit_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{2,30}$").expect("subreddit name pattern is valid"))
}

/// §4.3 step 1: `r/`-prefixed or otherwise malformed names fail collection
/// entirely, before any scraping begins.
#[must_use]
pub fn is_valid_subreddit_name(name: &str) -> bool {
    subreddit_name().is_match(name)
}

#[cfg(test)]
mod tests {
    use super::is_valid_subreddit_name;

    #[test]
    fn accepts_plain_names() {
        assert!(is_valid_subreddit_name("rust"));
        assert!(is_valid_subreddit_name("ask_programming"));
    }

    #[test]
    fn rejects_r_slash_prefix() {
        assert!(!is_valid_subreddit_name("r/rust"));
    }

    #[test]
    fn rejects_too_short_or_too_long() {
        assert!(!is_valid_subreddit_name("a"));
        assert!(!is_valid_subreddit_name(&"a".repeat(31)));
    }

    #[test]
    fn rejects_special_characters() {
        assert!(!is_valid_subreddit_name("rust!"));
        assert!(!is_valid_subreddit_name("rust lang"));
    }
}
