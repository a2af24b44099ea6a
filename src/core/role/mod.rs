//! Hierarchical roles
//!
//! A role may contain sub-roles, forming a rooted DAG. The effective roles of
//! a role are itself plus every descendant. Sub-roles are shared through
//! `Arc`, so a role placed inside a parent is frozen; graphs are assembled
//! bottom-up and mutation only happens through [`Role::add_role`] before a
//! role is shared.
//!
//! `add_role` rejects self-references, duplicate direct edges and any edge
//! that would make the receiver reachable from the new child. The same role
//! may still be reachable along two different paths.

mod manager;

pub use manager::{MemoryRoleManager, RoleManager};

use super::matcher::{wildcard, Matcher};
use crate::error::{Result, WardenError};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// A named node in the role graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: String,
    name: String,
    description: String,
    subroles: Vec<Arc<Role>>,
}

impl Role {
    /// Create a role whose name is its id
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Role {
            name: id.clone(),
            id,
            description: String::new(),
            subroles: Vec::new(),
        }
    }

    pub fn with_details(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Role {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            subroles: Vec::new(),
        }
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

    /// Direct sub-roles, in insertion order
    pub fn subroles(&self) -> &[Arc<Role>] {
        &self.subroles
    }

    /// Add a direct sub-role
    ///
    /// # Errors
    ///
    /// - `SelfReference` if `child` has the receiver's id
    /// - `DuplicateSubrole` if `child` is already a direct sub-role
    /// - `RoleCycle` if the receiver is reachable from `child`
    ///
    /// The role is unchanged when an error is returned.
    pub fn add_role(&mut self, child: Arc<Role>) -> Result<()> {
        if child.id == self.id {
            return Err(WardenError::SelfReference(self.id.clone()));
        }

        if self.subroles.iter().any(|r| r.id == child.id) {
            return Err(WardenError::DuplicateSubrole {
                parent: self.id.clone(),
                child: child.id.clone(),
            });
        }

        if child.effective_roles().iter().any(|r| r.id == self.id) {
            return Err(WardenError::RoleCycle {
                parent: self.id.clone(),
                child: child.id.clone(),
            });
        }

        self.subroles.push(child);
        Ok(())
    }

    /// The role itself followed by every descendant, each id once
    pub fn effective_roles(&self) -> Vec<&Role> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_effective(&mut seen, &mut out);
        out
    }

    fn collect_effective<'a>(&'a self, seen: &mut HashSet<&'a str>, out: &mut Vec<&'a Role>) {
        if !seen.insert(self.id.as_str()) {
            return;
        }
        out.push(self);
        for sub in &self.subroles {
            sub.collect_effective(seen, out);
        }
    }

    /// Ids of the effective roles, sorted
    pub fn effective_role_ids(&self) -> BTreeSet<String> {
        self.effective_roles()
            .into_iter()
            .map(|r| r.id.clone())
            .collect()
    }
}

/// Check if `candidate` wildcard-matches any effective role id of `role`
///
/// `candidate` is the pattern: `match_role(&admin, "org-*")`.
pub fn match_role(role: &Role, candidate: &str) -> bool {
    role.effective_roles()
        .iter()
        .any(|r| wildcard(candidate, &r.id))
}

/// Role matching through a configurable pattern strategy
#[derive(Debug, Clone)]
pub struct RoleMatcher {
    matcher: Arc<dyn Matcher>,
}

impl RoleMatcher {
    pub fn new(matcher: Arc<dyn Matcher>) -> Self {
        RoleMatcher { matcher }
    }

    /// Check if `candidate` matches any effective role id of `role`
    pub fn matches(&self, role: &Role, candidate: &str) -> Result<bool> {
        for r in role.effective_roles() {
            if self.matcher.matches_one(candidate, &r.id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
