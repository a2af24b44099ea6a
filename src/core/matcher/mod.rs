//! Pattern-set matching for policy fields
//!
//! A policy declares its actions, resources and scopes as optional lists of
//! patterns. An absent list (`None`) matches any value; a present but empty
//! list matches nothing. Two interchangeable strategies are provided:
//! - [`WildcardMatcher`] - `*` / `?` globbing only
//! - [`RegexMatcher`] - delimited regex fragments (`<...>`) with a compile cache,
//!   falling back to wildcard matching for undelimited patterns

mod delimited;
mod glob;

pub use self::delimited::{
    delimited_source, DefaultCompiler, DelimitedRegex, PatternCompiler, DEFAULT_START,
    DEFAULT_STOP,
};
pub use self::glob::wildcard;

use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Pattern syntax a matcher understands, as seen by store pre-filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSyntax {
    /// Plain `*` / `?` globs; wildcard pre-filtering is exact
    Glob,
    /// Globs plus regex fragments opened by `start`
    Delimited { start: char },
    /// Unknown syntax; a pre-filter may only drop empty lists
    Opaque,
}

impl Default for PatternSyntax {
    fn default() -> Self {
        PatternSyntax::Delimited {
            start: DEFAULT_START,
        }
    }
}

/// Strategy used to compare a candidate against a policy pattern list
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Check if `candidate` matches a single pattern
    fn matches_one(&self, pattern: &str, candidate: &str) -> Result<bool>;

    /// Check if `candidate` matches at least one pattern in `patterns`
    fn matches(&self, patterns: Option<&[String]>, candidate: &str) -> Result<bool> {
        let Some(patterns) = patterns else {
            return Ok(true);
        };

        for pattern in patterns {
            if self.matches_one(pattern, candidate)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Syntax of the patterns this matcher accepts
    fn syntax(&self) -> PatternSyntax {
        PatternSyntax::Opaque
    }
}

/// Wildcard-only matcher
#[derive(Debug, Default, Clone, Copy)]
pub struct WildcardMatcher;

impl WildcardMatcher {
    pub fn new() -> Self {
        WildcardMatcher
    }
}

impl Matcher for WildcardMatcher {
    fn matches_one(&self, pattern: &str, candidate: &str) -> Result<bool> {
        Ok(wildcard(pattern, candidate))
    }

    fn syntax(&self) -> PatternSyntax {
        PatternSyntax::Glob
    }
}

/// Delimited-regex matcher
#[derive(Debug, Default)]
pub struct RegexMatcher {
    regex: DelimitedRegex,
}

impl RegexMatcher {
    pub fn new() -> Self {
        RegexMatcher {
            regex: DelimitedRegex::new(),
        }
    }

    pub fn with_delimiters(start: char, stop: char) -> Self {
        RegexMatcher {
            regex: DelimitedRegex::with_delimiters(start, stop),
        }
    }

    /// Build a matcher around a preconfigured evaluator
    pub fn from_regex(regex: DelimitedRegex) -> Self {
        RegexMatcher { regex }
    }

    pub fn regex(&self) -> &DelimitedRegex {
        &self.regex
    }
}

impl Matcher for RegexMatcher {
    fn matches_one(&self, pattern: &str, candidate: &str) -> Result<bool> {
        self.regex.is_match(pattern, candidate)
    }

    fn syntax(&self) -> PatternSyntax {
        PatternSyntax::Delimited {
            start: self.regex.delimiters().0,
        }
    }
}

/// Shared default matcher handle (delimited regex with `<` / `>`)
pub fn default_matcher() -> Arc<dyn Matcher> {
    Arc::new(RegexMatcher::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_absent_list_matches_anything() {
        assert!(WildcardMatcher.matches(None, "read").unwrap());
        assert!(WildcardMatcher.matches(None, "").unwrap());
        assert!(RegexMatcher::new().matches(None, "read").unwrap());
    }

    #[test]
    fn test_empty_list_matches_nothing() {
        let empty: Vec<String> = Vec::new();
        assert!(!WildcardMatcher.matches(Some(empty.as_slice()), "read").unwrap());
        assert!(!WildcardMatcher.matches(Some(empty.as_slice()), "").unwrap());
        assert!(!RegexMatcher::new().matches(Some(empty.as_slice()), "read").unwrap());
    }

    #[test]
    fn test_any_pattern_matches() {
        let actions = list(&["create", "read*"]);
        assert!(WildcardMatcher.matches(Some(actions.as_slice()), "create").unwrap());
        assert!(WildcardMatcher.matches(Some(actions.as_slice()), "read_all").unwrap());
        assert!(!WildcardMatcher.matches(Some(actions.as_slice()), "delete").unwrap());
    }

    #[test]
    fn test_regex_matcher_mixes_strategies() {
        let resources = list(&["db:<(orders|users)>", "cache:*"]);
        let m = RegexMatcher::new();

        assert!(m.matches(Some(resources.as_slice()), "db:users").unwrap());
        assert!(m.matches(Some(resources.as_slice()), "cache:hot").unwrap());
        assert!(!m.matches(Some(resources.as_slice()), "db:payments").unwrap());
    }

    #[test]
    fn test_wildcard_matcher_treats_delimiters_literally() {
        let resources = list(&["db:<(orders|users)>"]);
        assert!(!WildcardMatcher.matches(Some(resources.as_slice()), "db:users").unwrap());
        assert!(WildcardMatcher
            .matches(Some(resources.as_slice()), "db:<(orders|users)>")
            .unwrap());
    }

    #[test]
    fn test_syntax_follows_delimiters() {
        assert_eq!(WildcardMatcher.syntax(), PatternSyntax::Glob);
        assert_eq!(
            RegexMatcher::new().syntax(),
            PatternSyntax::Delimited { start: '<' }
        );
        assert_eq!(
            RegexMatcher::with_delimiters('{', '}').syntax(),
            PatternSyntax::Delimited { start: '{' }
        );
    }

    #[test]
    fn test_matches_one() {
        let m = RegexMatcher::new();
        assert!(m.matches_one("db:<(orders|users)>", "db:users").unwrap());
        assert!(!m.matches_one("db:<(orders|users)>", "db:payments").unwrap());
        assert!(WildcardMatcher.matches_one("svc-*", "svc-a").unwrap());
    }

    #[test]
    fn test_regex_error_propagates() {
        let resources = list(&["db:<[>"]);
        assert!(RegexMatcher::new().matches(Some(resources.as_slice()), "db:x").is_err());
    }
}
