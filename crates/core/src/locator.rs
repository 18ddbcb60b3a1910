//! Media link grammar and canonical locator extraction.
//!
//! A submitted link is accepted when it matches
//! `[scheme://][www.]<host>/<segment>/<id>[/][?query]` for one of the
//! configured hosts and path segments, with `<id>` drawn from the configured
//! character set. The canonical locator is the `<id>` capture.

use regex::Regex;

use crate::env;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Hosts accepted when `LOCATOR_HOSTS` is not set.
pub const DEFAULT_HOSTS: &[&str] = &["instagram.com"];

/// Path segments accepted when `LOCATOR_PATH_SEGMENTS` is not set.
pub const DEFAULT_PATH_SEGMENTS: &[&str] = &["p", "reel"];

/// Regex character-class body for locator ids when `LOCATOR_ID_CHARSET` is
/// not set.
pub const DEFAULT_ID_CHARSET: &str = "A-Za-z0-9_-";

// ---------------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------------

/// Configurable description of which links are valid media links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorGrammar {
    /// Bare host names; a `www.` prefix is always optional.
    pub hosts: Vec<String>,
    /// First path segment naming the media kind (e.g. `p`, `reel`).
    pub path_segments: Vec<String>,
    /// Body of the regex character class used for the id.
    pub id_charset: String,
}

impl Default for LocatorGrammar {
    fn default() -> Self {
        Self {
            hosts: DEFAULT_HOSTS.iter().map(|s| s.to_string()).collect(),
            path_segments: DEFAULT_PATH_SEGMENTS.iter().map(|s| s.to_string()).collect(),
            id_charset: DEFAULT_ID_CHARSET.to_string(),
        }
    }
}

impl LocatorGrammar {
    /// Load the grammar from environment variables with defaults.
    ///
    /// | Env Var                 | Default         |
    /// |-------------------------|-----------------|
    /// | `LOCATOR_HOSTS`         | `instagram.com` |
    /// | `LOCATOR_PATH_SEGMENTS` | `p,reel`        |
    /// | `LOCATOR_ID_CHARSET`    | `A-Za-z0-9_-`   |
    pub fn from_env() -> Self {
        Self {
            hosts: env::list_or("LOCATOR_HOSTS", DEFAULT_HOSTS),
            path_segments: env::list_or("LOCATOR_PATH_SEGMENTS", DEFAULT_PATH_SEGMENTS),
            id_charset: std::env::var("LOCATOR_ID_CHARSET")
                .unwrap_or_else(|_| DEFAULT_ID_CHARSET.to_string()),
        }
    }

    /// Compile the grammar into a reusable matcher.
    pub fn compile(&self) -> Result<LocatorMatcher, CoreError> {
        if self.hosts.is_empty() {
            return Err(CoreError::Config("Locator grammar needs at least one host".into()));
        }
        if self.path_segments.is_empty() {
            return Err(CoreError::Config(
                "Locator grammar needs at least one path segment".into(),
            ));
        }
        if self.id_charset.is_empty() {
            return Err(CoreError::Config("Locator id charset must not be empty".into()));
        }

        let hosts = alternation(&self.hosts, |h| h.trim_start_matches("www."));
        let segments = alternation(&self.path_segments, |s| s.trim_matches('/'));
        let pattern = format!(
            r"^(?i:https?://)?(?i:www\.)?(?i:{hosts})/(?:{segments})/([{charset}]+)/?(?:\?\S*)?$",
            charset = self.id_charset,
        );

        let regex = Regex::new(&pattern)
            .map_err(|e| CoreError::Config(format!("Invalid locator grammar: {e}")))?;
        Ok(LocatorMatcher { regex })
    }
}

/// Escape each entry and join them into a regex alternation.
fn alternation(items: &[String], normalize: impl Fn(&str) -> &str) -> String {
    items
        .iter()
        .map(|item| regex::escape(normalize(item)))
        .collect::<Vec<_>>()
        .join("|")
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// Compiled [`LocatorGrammar`].
#[derive(Debug, Clone)]
pub struct LocatorMatcher {
    regex: Regex,
}

impl LocatorMatcher {
    /// Extract the canonical locator from a raw link.
    ///
    /// Surrounding whitespace is ignored. Returns `None` when the link does
    /// not match the grammar.
    pub fn extract(&self, raw_link: &str) -> Option<String> {
        self.regex
            .captures(raw_link.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn matcher() -> LocatorMatcher {
        LocatorGrammar::default().compile().unwrap()
    }

    // -- accepted links ------------------------------------------------------

    #[test]
    fn extracts_reel_id_with_trailing_slash() {
        assert_eq!(
            matcher().extract("https://instagram.com/reel/ABC123/").as_deref(),
            Some("ABC123")
        );
    }

    #[test]
    fn extracts_post_id_without_scheme_or_slash() {
        assert_eq!(
            matcher().extract("www.instagram.com/p/Xy_z-9").as_deref(),
            Some("Xy_z-9")
        );
    }

    #[test]
    fn tolerates_share_query_string_and_whitespace() {
        assert_eq!(
            matcher()
                .extract("  http://www.instagram.com/reel/C0de/?igsh=abc123  ")
                .as_deref(),
            Some("C0de")
        );
    }

    #[test]
    fn host_and_scheme_are_case_insensitive_but_id_is_not() {
        assert_eq!(
            matcher().extract("HTTPS://Instagram.COM/p/AbC").as_deref(),
            Some("AbC")
        );
    }

    // -- rejected links ------------------------------------------------------

    #[test]
    fn rejects_missing_id_segment() {
        assert_eq!(matcher().extract("https://instagram.com/reel/"), None);
        assert_eq!(matcher().extract("https://instagram.com/p"), None);
    }

    #[test]
    fn rejects_wrong_host() {
        assert_eq!(matcher().extract("https://example.com/reel/ABC123/"), None);
        assert_eq!(matcher().extract("https://notinstagram.com/p/ABC123"), None);
    }

    #[test]
    fn rejects_wrong_path_segment() {
        assert_eq!(matcher().extract("https://instagram.com/stories/ABC123"), None);
    }

    #[test]
    fn rejects_disallowed_characters() {
        assert_eq!(matcher().extract("https://instagram.com/p/AB$C/"), None);
        assert_eq!(matcher().extract("https://instagram.com/p/AB C"), None);
    }

    // -- custom grammars -----------------------------------------------------

    #[test]
    fn custom_grammar_uses_configured_host_and_segments() {
        let grammar = LocatorGrammar {
            hosts: vec!["media.example.org".into()],
            path_segments: vec!["v".into()],
            id_charset: "0-9".into(),
        };
        let m = grammar.compile().unwrap();
        assert_eq!(m.extract("media.example.org/v/42").as_deref(), Some("42"));
        assert_eq!(m.extract("media.example.org/v/4a2"), None);
        assert_eq!(m.extract("mediaXexample.org/v/42"), None);
    }

    #[test]
    fn empty_host_list_is_a_config_error() {
        let grammar = LocatorGrammar {
            hosts: vec![],
            ..LocatorGrammar::default()
        };
        assert_matches!(grammar.compile(), Err(CoreError::Config(_)));
    }
}
