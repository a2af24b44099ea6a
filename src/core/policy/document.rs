//! Serialized policy form
//!
//! Policies are persisted and exchanged as JSON documents. Conditions are
//! stored declaratively (`{name, type, options}`) and rebuilt through a
//! [`ConditionRegistry`] on load.

use super::{Effect, Policy, Subject};
use crate::core::condition::{ConditionOptions, ConditionRegistry, Conditions};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// JSON shape of a [`Policy`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subjects: Vec<SubjectDocument>,
    #[serde(default)]
    pub resources: Option<Vec<String>>,
    #[serde(default)]
    pub actions: Option<Vec<String>>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    #[serde(default)]
    pub effect: Effect,
}

/// JSON shape of a [`Subject`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectDocument {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub conditions: Vec<ConditionOptions>,
}

impl Policy {
    /// Declarative form of this policy
    pub fn to_document(&self) -> Result<PolicyDocument> {
        let subjects = self
            .subjects
            .iter()
            .map(|s| -> Result<SubjectDocument> {
                Ok(SubjectDocument {
                    kind: s.kind().to_string(),
                    conditions: s.conditions().to_options()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PolicyDocument {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            subjects,
            resources: self.resources.clone(),
            actions: self.actions.clone(),
            scopes: self.scopes.clone(),
            effect: self.effect,
        })
    }

    /// Rebuild a policy, resolving condition types through `registry`
    ///
    /// # Errors
    ///
    /// Fails on an empty id or on any condition that cannot be built.
    pub fn from_document(doc: PolicyDocument, registry: &ConditionRegistry) -> Result<Policy> {
        let mut subjects = Vec::with_capacity(doc.subjects.len());
        for s in doc.subjects {
            let conditions = Conditions::from_options(&s.conditions, registry)?;
            subjects.push(Subject::with_conditions(s.kind, conditions));
        }

        Policy::builder(doc.id)
            .name(doc.name)
            .description(doc.description)
            .subjects(subjects)
            .set_resources(doc.resources)
            .set_actions(doc.actions)
            .set_scopes(doc.scopes)
            .effect(doc.effect)
            .build()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_document()?)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document()?)?)
    }

    pub fn from_json(json: &str, registry: &ConditionRegistry) -> Result<Policy> {
        let doc: PolicyDocument = serde_json::from_str(json)?;
        Policy::from_document(doc, registry)
    }
}
