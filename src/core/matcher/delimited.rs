//! Delimited regular expressions inside policy patterns
//!
//! A pattern such as `urn:<[a-z]+>:read` is literal text with one or more
//! regex fragments between the start/stop delimiters. The whole pattern is
//! compiled once into an anchored expression (`^urn:([a-z]+):read$`) and cached
//! under the source pattern string. Patterns without a start delimiter fall
//! back to wildcard matching.

use super::glob::wildcard;
use crate::error::{Result, WardenError};
use ahash::AHashMap;
use parking_lot::RwLock;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Default opening delimiter for regex fragments
pub const DEFAULT_START: char = '<';

/// Default closing delimiter for regex fragments
pub const DEFAULT_STOP: char = '>';

/// Compiles regex source produced from a delimited pattern
///
/// The seam exists so callers can swap in an instrumented compiler.
pub trait PatternCompiler: Send + Sync + fmt::Debug {
    fn compile(&self, source: &str) -> std::result::Result<Regex, regex::Error>;
}

/// Compiler backed directly by `Regex::new`
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCompiler;

impl PatternCompiler for DefaultCompiler {
    fn compile(&self, source: &str) -> std::result::Result<Regex, regex::Error> {
        Regex::new(source)
    }
}

/// Delimited regex evaluator with a compile cache
///
/// The cache has no eviction; it grows with the number of distinct patterns
/// ever evaluated, which tracks the (small) policy pattern vocabulary.
pub struct DelimitedRegex {
    start: char,
    stop: char,
    compiler: Arc<dyn PatternCompiler>,
    cache: RwLock<AHashMap<String, Regex>>,
}

impl DelimitedRegex {
    /// Create an evaluator using `<` and `>` as delimiters
    pub fn new() -> Self {
        Self::with_delimiters(DEFAULT_START, DEFAULT_STOP)
    }

    /// Create an evaluator with custom delimiters
    pub fn with_delimiters(start: char, stop: char) -> Self {
        DelimitedRegex {
            start,
            stop,
            compiler: Arc::new(DefaultCompiler),
            cache: RwLock::new(AHashMap::new()),
        }
    }

    /// Replace the regex compiler
    pub fn with_compiler(mut self, compiler: Arc<dyn PatternCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn delimiters(&self) -> (char, char) {
        (self.start, self.stop)
    }

    /// Check if `candidate` matches `pattern`
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` when the delimiters are unbalanced or the
    /// fragment is not a valid regular expression.
    pub fn is_match(&self, pattern: &str, candidate: &str) -> Result<bool> {
        if !pattern.contains(self.start) {
            return Ok(wildcard(pattern, candidate));
        }

        if let Some(re) = self.cache.read().get(pattern) {
            return Ok(re.is_match(candidate));
        }

        let mut cache = self.cache.write();
        // Another caller may have compiled it while we waited for the lock
        if let Some(re) = cache.get(pattern) {
            return Ok(re.is_match(candidate));
        }

        let source = delimited_source(pattern, self.start, self.stop)?;
        let re = self
            .compiler
            .compile(&source)
            .map_err(|e| WardenError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        let matched = re.is_match(candidate);
        cache.insert(pattern.to_string(), re);

        Ok(matched)
    }

    /// Number of compiled patterns held in the cache
    pub fn cached_patterns(&self) -> usize {
        self.cache.read().len()
    }
}

impl Default for DelimitedRegex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DelimitedRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelimitedRegex")
            .field("start", &self.start)
            .field("stop", &self.stop)
            .field("cached", &self.cached_patterns())
            .finish()
    }
}

/// Build anchored regex source from a delimited pattern
///
/// Literal text is escaped; text between delimiters is copied verbatim as a
/// capture group. Balanced delimiters inside a fragment are kept as regex
/// text, so `<(x|<y>)>` compiles to `^((x|<y>))$`.
pub fn delimited_source(pattern: &str, start: char, stop: char) -> Result<String> {
    let invalid = |reason: &str| WardenError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut source = String::with_capacity(pattern.len() + 8);
    let mut literal = String::new();
    let mut fragment = String::new();
    let mut depth = 0usize;

    source.push('^');

    for c in pattern.chars() {
        if depth == 0 {
            if c == start {
                source.push_str(&regex::escape(&literal));
                literal.clear();
                depth = 1;
            } else if c == stop {
                return Err(invalid("closing delimiter without opening delimiter"));
            } else {
                literal.push(c);
            }
            continue;
        }

        if c == start {
            depth += 1;
        } else if c == stop {
            depth -= 1;
            if depth == 0 {
                source.push('(');
                source.push_str(&fragment);
                source.push(')');
                fragment.clear();
                continue;
            }
        }
        fragment.push(c);
    }

    if depth != 0 {
        return Err(invalid("unbalanced delimiters"));
    }

    source.push_str(&regex::escape(&literal));
    source.push('$');

    Ok(source)
}
