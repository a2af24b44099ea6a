//! In-memory policy store

use super::{prefilter, PolicyStore};
use crate::core::matcher::{wildcard, PatternSyntax, DEFAULT_START};
use crate::core::policy::Policy;
use crate::core::request::Request;
use crate::error::{Result, WardenError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Policy store backed by a `RwLock<HashMap>`
///
/// Queries copy the matching `Arc`s out under the read lock and release it
/// before any pattern matching. Results are returned in id order.
#[derive(Debug)]
pub struct MemoryPolicyStore {
    policies: RwLock<HashMap<String, Arc<Policy>>>,
    regex_start: char,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::with_regex_start(DEFAULT_START)
    }

    /// Store whose pre-filter admits patterns containing `regex_start`
    pub fn with_regex_start(regex_start: char) -> Self {
        MemoryPolicyStore {
            policies: RwLock::new(HashMap::new()),
            regex_start,
        }
    }

    pub fn len(&self) -> usize {
        self.policies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.read().is_empty()
    }

    pub fn clear(&self) {
        self.policies.write().clear();
    }

    fn snapshot(&self) -> Vec<Arc<Policy>> {
        let mut all: Vec<Arc<Policy>> = self.policies.read().values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    fn syntax(&self) -> PatternSyntax {
        PatternSyntax::Delimited {
            start: self.regex_start,
        }
    }

    fn filtered<F>(&self, keep: F) -> Vec<Arc<Policy>>
    where
        F: Fn(&Policy) -> bool,
    {
        self.snapshot().into_iter().filter(|p| keep(&**p)).collect()
    }
}

impl Default for MemoryPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn create(&self, policy: Arc<Policy>) -> Result<()> {
        let mut policies = self.policies.write();
        if policies.contains_key(policy.id()) {
            return Err(WardenError::PolicyAlreadyExists(policy.id().to_string()));
        }
        policies.insert(policy.id().to_string(), policy);
        Ok(())
    }

    fn update(&self, policy: Arc<Policy>) -> Result<()> {
        self.policies.write().insert(policy.id().to_string(), policy);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Arc<Policy>> {
        self.policies
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| WardenError::PolicyNotFound(id.to_string()))
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.policies.write().remove(id);
        Ok(())
    }

    fn all(&self) -> Result<Vec<Arc<Policy>>> {
        Ok(self.snapshot())
    }

    fn find_by_request(&self, request: &Request) -> Result<Vec<Arc<Policy>>> {
        self.find_candidates(request, self.syntax())
    }

    fn find_candidates(
        &self,
        request: &Request,
        syntax: PatternSyntax,
    ) -> Result<Vec<Arc<Policy>>> {
        if request.action().is_empty() {
            return Err(WardenError::InvalidRequest("action"));
        }
        if request.resource().is_empty() {
            return Err(WardenError::InvalidRequest("resource"));
        }
        if request.scope().is_empty() {
            return Err(WardenError::InvalidRequest("scope"));
        }

        Ok(self.filtered(|p| {
            prefilter(p.actions(), request.action(), syntax)
                && prefilter(p.resources(), request.resource(), syntax)
                && prefilter(p.scopes(), request.scope(), syntax)
        }))
    }

    fn find_by_resource(&self, resource: &str) -> Result<Vec<Arc<Policy>>> {
        let syntax = self.syntax();
        Ok(self.filtered(|p| prefilter(p.resources(), resource, syntax)))
    }

    fn find_by_scope(&self, scope: &str) -> Result<Vec<Arc<Policy>>> {
        let syntax = self.syntax();
        Ok(self.filtered(|p| prefilter(p.scopes(), scope, syntax)))
    }

    fn find_by_role(&self, role_id: &str) -> Result<Vec<Arc<Policy>>> {
        let start = self.regex_start;
        Ok(self.filtered(|p| {
            p.subjects()
                .iter()
                .any(|s| s.kind().contains(start) || wildcard(s.kind(), role_id))
        }))
    }
}
