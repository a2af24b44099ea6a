//! Engine configuration
//!
//! Everything that would otherwise be a process-wide default is carried
//! here and handed to the engine at construction: the default effect, the
//! matcher strategy and its delimiters, the optional policy cache and the
//! audit filter.

use crate::core::audit::{AuditFilter, Auditor, ConsoleAuditor};
use crate::core::matcher::{Matcher, RegexMatcher, WildcardMatcher, DEFAULT_START, DEFAULT_STOP};
use crate::core::policy::Effect;
use crate::error::{Result, WardenError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Pattern strategy used by the enforcer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// `*` / `?` globbing only
    Wildcard,
    /// Delimited regex fragments with wildcard fallback
    #[default]
    Regex,
}

/// Engine configuration
///
/// # Examples
///
/// ```
/// use warden_rs::core::config::{EngineConfig, MatcherKind};
/// use warden_rs::core::policy::Effect;
///
/// let config = EngineConfig::from_toml_str(r#"
///     default_effect = "deny"
///     matcher = "wildcard"
///     cache_ttl_secs = 30
/// "#).unwrap();
///
/// assert_eq!(config.default_effect, Effect::Deny);
/// assert_eq!(config.matcher, MatcherKind::Wildcard);
/// assert_eq!(config.regex_start, '<');
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Effect applied when no policy votes
    pub default_effect: Effect,

    pub matcher: MatcherKind,

    /// Opening delimiter of a regex fragment
    pub regex_start: char,

    /// Closing delimiter of a regex fragment
    pub regex_stop: char,

    /// Wrap the policy store in an expiring cache with this lifetime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,

    pub audit: AuditFilter,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_effect: Effect::Deny,
            matcher: MatcherKind::Regex,
            regex_start: DEFAULT_START,
            regex_stop: DEFAULT_STOP,
            cache_ttl_secs: None,
            audit: AuditFilter::All,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| WardenError::InvalidConfig(e.to_string()))
    }

    /// Check field combinations
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the delimiters coincide or are wildcard
    /// characters, or when the cache lifetime is zero.
    pub fn validate(&self) -> Result<()> {
        if self.regex_start == self.regex_stop {
            return Err(WardenError::InvalidConfig(format!(
                "regex delimiters must differ, both are {:?}",
                self.regex_start
            )));
        }

        for c in [self.regex_start, self.regex_stop] {
            if c == '*' || c == '?' {
                return Err(WardenError::InvalidConfig(format!(
                    "regex delimiter {:?} collides with wildcard syntax",
                    c
                )));
            }
        }

        if self.cache_ttl_secs == Some(0) {
            return Err(WardenError::InvalidConfig(
                "cache_ttl_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    /// Matcher described by this configuration
    pub fn build_matcher(&self) -> Arc<dyn Matcher> {
        match self.matcher {
            MatcherKind::Wildcard => Arc::new(WildcardMatcher),
            MatcherKind::Regex => Arc::new(RegexMatcher::with_delimiters(
                self.regex_start,
                self.regex_stop,
            )),
        }
    }

    /// Console auditor honoring the configured filter
    pub fn build_auditor(&self) -> Arc<dyn Auditor> {
        Arc::new(ConsoleAuditor::with_filter(self.audit))
    }
}
