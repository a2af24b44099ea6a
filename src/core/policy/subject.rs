//! Policy subjects
//!
//! A subject pairs a caller-identifier pattern with the conditions that must
//! hold for the policy to apply to that caller.

use crate::core::condition::{ConditionOptions, ConditionRegistry, Conditions};
use crate::core::matcher::Matcher;
use crate::core::request::Request;
use crate::error::Result;

/// Caller pattern plus its required conditions
#[derive(Debug, Default)]
pub struct Subject {
    kind: String,
    conditions: Conditions,
}

impl Subject {
    /// Create a subject with no conditions
    pub fn new(kind: impl Into<String>) -> Self {
        Subject {
            kind: kind.into(),
            conditions: Conditions::new(),
        }
    }

    pub fn with_conditions(kind: impl Into<String>, conditions: Conditions) -> Self {
        Subject {
            kind: kind.into(),
            conditions,
        }
    }

    pub fn builder(kind: impl Into<String>) -> SubjectBuilder {
        SubjectBuilder {
            kind: kind.into(),
            conditions: Vec::new(),
            registry: None,
        }
    }

    /// Pattern matched against request subject identifiers
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    /// Check if any of the request's identifiers matches this subject's pattern
    pub fn matches_request(&self, matcher: &dyn Matcher, request: &Request) -> Result<bool> {
        for id in request.subjects() {
            if matcher.matches_one(&self.kind, id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Identifier match and every condition met
    pub fn is_satisfied_by(&self, matcher: &dyn Matcher, request: &Request) -> Result<bool> {
        Ok(self.matches_request(matcher, request)? && self.conditions.meets(request))
    }
}

/// Builder for [`Subject`] from declarative condition options
#[derive(Debug)]
pub struct SubjectBuilder {
    kind: String,
    conditions: Vec<ConditionOptions>,
    registry: Option<ConditionRegistry>,
}

impl SubjectBuilder {
    pub fn condition(mut self, options: ConditionOptions) -> Self {
        self.conditions.push(options);
        self
    }

    pub fn conditions(mut self, options: impl IntoIterator<Item = ConditionOptions>) -> Self {
        self.conditions.extend(options);
        self
    }

    /// Registry used to resolve condition types (built-ins when unset)
    pub fn registry(mut self, registry: ConditionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<Subject> {
        let registry = self.registry.unwrap_or_default();
        let conditions = Conditions::from_options(&self.conditions, &registry)?;
        Ok(Subject::with_conditions(self.kind, conditions))
    }
}
