//! Role storage

use super::{match_role, Role};
use crate::error::{Result, WardenError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Storage contract for roles
pub trait RoleManager: Send + Sync {
    /// Store a new role, failing if the id exists
    fn create(&self, role: Arc<Role>) -> Result<()>;

    /// Insert or replace a role
    fn update(&self, role: Arc<Role>) -> Result<()>;

    fn get(&self, id: &str) -> Result<Arc<Role>>;

    /// First role in id order carrying `name`
    fn get_by_name(&self, name: &str) -> Result<Arc<Role>>;

    /// Remove a role; unknown ids are not an error
    fn delete(&self, id: &str) -> Result<()>;

    /// One page of roles in id order
    fn all(&self, limit: usize, offset: usize) -> Result<Vec<Arc<Role>>>;

    /// Roles whose effective roles match `candidate`, in id order
    fn find_matching(&self, candidate: &str) -> Result<Vec<Arc<Role>>>;
}

/// In-memory role manager
#[derive(Debug, Default)]
pub struct MemoryRoleManager {
    roles: RwLock<HashMap<String, Arc<Role>>>,
}

impl MemoryRoleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.roles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.read().is_empty()
    }

    fn sorted(&self) -> Vec<Arc<Role>> {
        let roles = self.roles.read();
        let mut all: Vec<Arc<Role>> = roles.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }
}

impl RoleManager for MemoryRoleManager {
    fn create(&self, role: Arc<Role>) -> Result<()> {
        let mut roles = self.roles.write();
        if roles.contains_key(role.id()) {
            return Err(WardenError::RoleAlreadyExists(role.id().to_string()));
        }
        roles.insert(role.id().to_string(), role);
        Ok(())
    }

    fn update(&self, role: Arc<Role>) -> Result<()> {
        self.roles.write().insert(role.id().to_string(), role);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Arc<Role>> {
        self.roles
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| WardenError::RoleNotFound(id.to_string()))
    }

    fn get_by_name(&self, name: &str) -> Result<Arc<Role>> {
        self.sorted()
            .into_iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| WardenError::RoleNotFound(name.to_string()))
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.roles.write().remove(id);
        Ok(())
    }

    fn all(&self, limit: usize, offset: usize) -> Result<Vec<Arc<Role>>> {
        let all = self.sorted();
        let (start, end) = page_bounds(limit, offset, all.len());
        Ok(all[start..end].to_vec())
    }

    fn find_matching(&self, candidate: &str) -> Result<Vec<Arc<Role>>> {
        Ok(self
            .sorted()
            .into_iter()
            .filter(|r| match_role(r, candidate))
            .collect())
    }
}

/// Clamp a `limit`/`offset` page to `len`
fn page_bounds(limit: usize, offset: usize, len: usize) -> (usize, usize) {
    if offset > len {
        return (len, len);
    }
    (offset, offset.saturating_add(limit).min(len))
}
