//! # Roles
//!
//! Coarse global roles (`user`, `editor`, `admin`), many-to-many with
//! users. Distinct from per-resource rights: a role applies system-wide,
//! a right is scoped to one resource.

use std::collections::HashSet;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::errors::{AccessError, AccessResult};

/// Role assigned to every fresh account
pub const DEFAULT_ROLE: &str = "user";

/// Built-in role names seeded at startup
pub const BUILTIN_ROLES: [&str; 3] = ["user", "editor", "admin"];

/// A global role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Accepts either a role's primary key or its name
#[derive(Debug, Clone)]
pub enum RoleRef {
    Id(Uuid),
    Name(String),
}

impl From<&str> for RoleRef {
    fn from(name: &str) -> Self {
        RoleRef::Name(name.to_string())
    }
}

impl From<Uuid> for RoleRef {
    fn from(id: Uuid) -> Self {
        RoleRef::Id(id)
    }
}

/// Repository for roles and user-role assignments
pub trait RoleRepository: Send + Sync {
    fn list(&self) -> AccessResult<Vec<Role>>;
    fn find(&self, role: &RoleRef) -> AccessResult<Option<Role>>;
    fn roles_of(&self, user_id: Uuid) -> AccessResult<Vec<Role>>;
    /// Insert the join row; a repeat assignment is a no-op
    fn assign(&self, user_id: Uuid, role_id: Uuid) -> AccessResult<()>;
    fn revoke(&self, user_id: Uuid, role_id: Uuid) -> AccessResult<bool>;
}

/// In-memory role repository, seeded with the built-in roles
#[derive(Debug)]
pub struct InMemoryRoleRepository {
    roles: Vec<Role>,
    assignments: RwLock<HashSet<(Uuid, Uuid)>>, // (user_id, role_id)
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self {
            roles: BUILTIN_ROLES.iter().map(|n| Role::new(n)).collect(),
            assignments: RwLock::new(HashSet::new()),
        }
    }
}

impl Default for InMemoryRoleRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleRepository for InMemoryRoleRepository {
    fn list(&self) -> AccessResult<Vec<Role>> {
        Ok(self.roles.clone())
    }

    fn find(&self, role: &RoleRef) -> AccessResult<Option<Role>> {
        Ok(match role {
            RoleRef::Id(id) => self.roles.iter().find(|r| r.id == *id).cloned(),
            RoleRef::Name(name) => self.roles.iter().find(|r| r.name == *name).cloned(),
        })
    }

    fn roles_of(&self, user_id: Uuid) -> AccessResult<Vec<Role>> {
        let assignments = self
            .assignments
            .read()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        Ok(self
            .roles
            .iter()
            .filter(|r| assignments.contains(&(user_id, r.id)))
            .cloned()
            .collect())
    }

    fn assign(&self, user_id: Uuid, role_id: Uuid) -> AccessResult<()> {
        let mut assignments = self
            .assignments
            .write()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        assignments.insert((user_id, role_id));
        Ok(())
    }

    fn revoke(&self, user_id: Uuid, role_id: Uuid) -> AccessResult<bool> {
        let mut assignments = self
            .assignments
            .write()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        Ok(assignments.remove(&(user_id, role_id)))
    }
}

/// Service for role assignment and checks
#[derive(Clone)]
pub struct RoleService {
    repo: std::sync::Arc<dyn RoleRepository>,
}

impl RoleService {
    pub fn new(repo: std::sync::Arc<dyn RoleRepository>) -> Self {
        Self { repo }
    }

    pub fn list_roles(&self) -> AccessResult<Vec<Role>> {
        self.repo.list()
    }

    pub fn user_roles(&self, user_id: Uuid) -> AccessResult<Vec<Role>> {
        self.repo.roles_of(user_id)
    }

    pub fn assign_role(&self, user_id: Uuid, role: impl Into<RoleRef>) -> AccessResult<Role> {
        let role_ref = role.into();
        let role = self
            .repo
            .find(&role_ref)?
            .ok_or_else(|| AccessError::RoleNotFound(format!("{:?}", role_ref)))?;
        self.repo.assign(user_id, role.id)?;
        debug!(%user_id, role = %role.name, "role assigned");
        Ok(role)
    }

    pub fn revoke_role(&self, user_id: Uuid, role: impl Into<RoleRef>) -> AccessResult<bool> {
        let role_ref = role.into();
        let role = self
            .repo
            .find(&role_ref)?
            .ok_or_else(|| AccessError::RoleNotFound(format!("{:?}", role_ref)))?;
        self.repo.revoke(user_id, role.id)
    }

    /// One-time default-role assignment after account creation.
    ///
    /// Assigns `user` only when the account currently holds zero roles, so
    /// repeated calls (or calls against accounts that were already promoted)
    /// never overwrite existing assignments.
    pub fn ensure_default_role(&self, user_id: Uuid) -> AccessResult<()> {
        if self.repo.roles_of(user_id)?.is_empty() {
            self.assign_role(user_id, DEFAULT_ROLE)?;
        }
        Ok(())
    }

    /// True if the user holds at least one of `required` (OR semantics).
    ///
    /// An empty requirement list means no role constraint and passes
    /// vacuously.
    pub fn user_has_role(&self, user_id: Uuid, required: &[&str]) -> AccessResult<bool> {
        if required.is_empty() {
            return Ok(true);
        }
        let held = self.repo.roles_of(user_id)?;
        Ok(held.iter().any(|r| required.contains(&r.name.as_str())))
    }
}
