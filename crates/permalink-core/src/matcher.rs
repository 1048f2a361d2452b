//! Permalink grammar matching.
//!
//! A permalink is an optional leading `/`, a literal segment (`page` by
//! default), `/`, one or more ASCII digits, an optional trailing `/`, and
//! nothing else. Absolute URLs never match because the grammar is anchored
//! at the start of the string.

use crate::error::{PermalinkError, PermalinkResult};
use crate::page::PageId;
use regex::Regex;
use std::sync::OnceLock;

/// Literal segment used by the default grammar.
pub const DEFAULT_SEGMENT: &str = "page";

static DEFAULT_REGEX: OnceLock<Regex> = OnceLock::new();

fn grammar(segment: &str) -> Result<Regex, regex::Error> {
    // `[0-9]` rather than `\d`: Unicode digits are not page ids.
    Regex::new(&format!(r"^/?{}/([0-9]+)/?$", regex::escape(segment)))
}

/// Tests request paths against the permalink grammar.
///
/// # Example
///
/// ```
/// use permalink_core::PermalinkMatcher;
///
/// let matcher = PermalinkMatcher::new();
/// assert_eq!(matcher.match_path("/page/123/").map(|id| id.get()), Some(123));
/// assert!(matcher.match_path("/somepage/page/123/").is_none());
/// assert!(matcher.match_path("http://www.test.com/page/123/").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PermalinkMatcher {
    segment: String,
    regex: Regex,
}

impl PermalinkMatcher {
    /// Creates a matcher for `/page/<id>/`.
    #[must_use]
    pub fn new() -> Self {
        let regex = DEFAULT_REGEX
            .get_or_init(|| grammar(DEFAULT_SEGMENT).expect("default permalink grammar is valid"))
            .clone();
        Self {
            segment: DEFAULT_SEGMENT.to_string(),
            regex,
        }
    }

    /// Creates a matcher for `/<segment>/<id>/`.
    ///
    /// The segment must be non-empty and must not contain `/` or whitespace.
    pub fn with_segment(segment: &str) -> PermalinkResult<Self> {
        if segment.is_empty() {
            return Err(PermalinkError::invalid_segment(segment, "must not be empty"));
        }
        if segment.contains('/') {
            return Err(PermalinkError::invalid_segment(segment, "must not contain '/'"));
        }
        if segment.chars().any(char::is_whitespace) {
            return Err(PermalinkError::invalid_segment(
                segment,
                "must not contain whitespace",
            ));
        }

        let regex =
            grammar(segment).map_err(|e| PermalinkError::invalid_segment(segment, e.to_string()))?;
        Ok(Self {
            segment: segment.to_string(),
            regex,
        })
    }

    /// Returns the literal segment of the grammar.
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Extracts the page id if the whole path is a permalink.
    ///
    /// Returns `None` for non-matching paths and for ids that are zero or
    /// overflow `u64`.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<PageId> {
        let captures = self.regex.captures(path)?;
        captures.get(1)?.as_str().parse().ok()
    }
}

impl Default for PermalinkMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pid(path: &str) -> Option<u64> {
        PermalinkMatcher::new().match_path(path).map(PageId::get)
    }

    #[test]
    fn test_relative_permalinks_match() {
        assert_eq!(pid("/page/123/"), Some(123));
        assert_eq!(pid("page/123/"), Some(123));
        assert_eq!(pid("/page/123"), Some(123));
        assert_eq!(pid("page/123"), Some(123));
    }

    #[test]
    fn test_absolute_urls_never_match() {
        for url in [
            "http://www.test.com/page/123/",
            "http://www.test.com/page/123",
            "http://www.test.com/somepageurl",
            "http://www.test.com/",
            "http://www.test.com",
            "http://www.test.com/page/",
            "http://www.test.com/page",
            "http://www.test.com/somepage/page/123/",
            "http://www.test.com/somepage/page/123",
        ] {
            assert_eq!(pid(url), None, "{url}");
        }
    }

    #[test]
    fn test_non_permalink_paths() {
        for path in [
            "/somepageurl",
            "/",
            "",
            "/page/",
            "/page",
            "/somepage/page/123/",
            "/somepage/page/123",
            "/page/123//",
            "//page/123/",
            "/page/12a/",
            "/page/-1/",
            "/Page/123/",
        ] {
            assert_eq!(pid(path), None, "{path:?}");
        }
    }

    #[test]
    fn test_zero_and_overflow_are_rejected() {
        assert_eq!(pid("/page/0/"), None);
        assert_eq!(pid("/page/000/"), None);
        assert_eq!(pid("/page/99999999999999999999999/"), None);
        assert_eq!(pid("/page/007/"), Some(7));
    }

    #[test]
    fn test_unicode_digits_do_not_match() {
        assert_eq!(pid("/page/١٢٣/"), None);
    }

    #[test]
    fn test_custom_segment() {
        let matcher = PermalinkMatcher::with_segment("p").unwrap();
        assert_eq!(matcher.segment(), "p");
        assert_eq!(matcher.match_path("/p/9/").map(PageId::get), Some(9));
        assert!(matcher.match_path("/page/9/").is_none());
    }

    #[test]
    fn test_custom_segment_is_escaped() {
        let matcher = PermalinkMatcher::with_segment("a.b").unwrap();
        assert!(matcher.match_path("/a.b/1/").is_some());
        assert!(matcher.match_path("/axb/1/").is_none());
    }

    #[test]
    fn test_invalid_segments() {
        assert!(PermalinkMatcher::with_segment("").is_err());
        assert!(PermalinkMatcher::with_segment("a/b").is_err());
        assert!(PermalinkMatcher::with_segment("a b").is_err());
    }

    proptest! {
        #[test]
        fn prop_numeric_permalinks_round_trip(
            id in 1u64..u64::MAX,
            leading in any::<bool>(),
            trailing in any::<bool>(),
        ) {
            let path = format!(
                "{}page/{}{}",
                if leading { "/" } else { "" },
                id,
                if trailing { "/" } else { "" },
            );
            prop_assert_eq!(pid(&path), Some(id));
        }

        #[test]
        fn prop_prefixed_paths_never_match(prefix in "[a-z]{1,8}", id in 1u64..1_000_000) {
            let path = format!("/{prefix}/page/{id}/");
            prop_assert_eq!(pid(&path), None);
        }

        #[test]
        fn prop_absolute_urls_never_match(host in "[a-z]{1,10}\\.com", id in 1u64..1_000_000) {
            let url = format!("https://{host}/page/{id}/");
            prop_assert_eq!(pid(&url), None);
        }
    }
}
