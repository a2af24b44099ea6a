//! Policy documents
//!
//! A policy grants or denies a set of actions on resources within scopes to
//! matching subjects. Each pattern list is optional: `None` matches any value,
//! `Some(vec![])` matches nothing. Policies are immutable once built; changing
//! one means replacing it in the store.

mod document;
mod subject;

pub use document::{PolicyDocument, SubjectDocument};
pub use subject::{Subject, SubjectBuilder};

use crate::error::{Result, WardenError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Effect of a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Effect {
    /// Allow the request
    Allow,
    /// Deny the request (takes precedence over Allow)
    #[default]
    Deny,
}

impl Effect {
    /// Parse an effect; anything but `"allow"` is `Deny`
    pub fn parse(s: &str) -> Self {
        match s {
            "allow" => Effect::Allow,
            _ => Effect::Deny,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        }
    }
}

impl From<String> for Effect {
    fn from(s: String) -> Self {
        Effect::parse(&s)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored access rule
#[derive(Debug)]
pub struct Policy {
    id: String,
    name: String,
    description: String,
    subjects: Vec<Subject>,
    resources: Option<Vec<String>>,
    actions: Option<Vec<String>>,
    scopes: Option<Vec<String>>,
    effect: Effect,
}

impl Policy {
    pub fn builder(id: impl Into<String>) -> PolicyBuilder {
        PolicyBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn resources(&self) -> Option<&[String]> {
        self.resources.as_deref()
    }

    pub fn actions(&self) -> Option<&[String]> {
        self.actions.as_deref()
    }

    pub fn scopes(&self) -> Option<&[String]> {
        self.scopes.as_deref()
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }
}

/// Builder for [`Policy`]
#[derive(Debug)]
pub struct PolicyBuilder {
    policy: Policy,
}

impl PolicyBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        PolicyBuilder {
            policy: Policy {
                id: id.into(),
                name: String::new(),
                description: String::new(),
                subjects: Vec::new(),
                resources: None,
                actions: None,
                scopes: None,
                effect: Effect::Deny,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.policy.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.policy.description = description.into();
        self
    }

    pub fn resources<I, S>(self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_resources(Some(collect(resources)))
    }

    pub fn actions<I, S>(self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_actions(Some(collect(actions)))
    }

    pub fn scopes<I, S>(self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_scopes(Some(collect(scopes)))
    }

    /// Set the resource list directly; `None` matches any resource
    pub fn set_resources(mut self, resources: Option<Vec<String>>) -> Self {
        self.policy.resources = resources;
        self
    }

    /// Set the action list directly; `None` matches any action
    pub fn set_actions(mut self, actions: Option<Vec<String>>) -> Self {
        self.policy.actions = actions;
        self
    }

    /// Set the scope list directly; `None` matches any scope
    pub fn set_scopes(mut self, scopes: Option<Vec<String>>) -> Self {
        self.policy.scopes = scopes;
        self
    }

    pub fn subject(mut self, subject: Subject) -> Self {
        self.policy.subjects.push(subject);
        self
    }

    pub fn subjects(mut self, subjects: impl IntoIterator<Item = Subject>) -> Self {
        self.policy.subjects.extend(subjects);
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.policy.effect = effect;
        self
    }

    pub fn allow(self) -> Self {
        self.effect(Effect::Allow)
    }

    pub fn deny(self) -> Self {
        self.effect(Effect::Deny)
    }

    /// Validate and produce the policy
    ///
    /// # Errors
    ///
    /// Returns `InvalidPolicy` if the id is empty.
    pub fn build(self) -> Result<Policy> {
        if self.policy.id.trim().is_empty() {
            return Err(WardenError::InvalidPolicy("policy id cannot be empty".to_string()));
        }
        Ok(self.policy)
    }
}

fn collect<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
