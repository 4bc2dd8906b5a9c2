//! # Resources and Grants
//!
//! Access-control records decoupled from domain tables. A `Resource` points
//! at one domain entity via `reference_id`; `ResourceAccess` rows grant
//! per-user rights on it. The owner of a resource holds all rights without
//! a grant row existing (owner bypass), so the grants table stays
//! proportional to actual sharing, not to entity count.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{AccessError, AccessResult};

/// Kinds of domain entities that participate in access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Pattern,
    Tag,
    File,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Pattern => "pattern",
            ResourceType::Tag => "tag",
            ResourceType::File => "file",
        }
    }
}

/// A single right on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Right {
    Read,
    Write,
    Delete,
}

impl Right {
    /// All three rights, for owner grants
    pub fn all() -> BTreeSet<Right> {
        BTreeSet::from([Right::Read, Right::Write, Right::Delete])
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Right::Read => "read",
            Right::Write => "write",
            Right::Delete => "delete",
        }
    }

    pub fn parse(s: &str) -> Option<Right> {
        match s {
            "read" => Some(Right::Read),
            "write" => Some(Right::Write),
            "delete" => Some(Right::Delete),
            _ => None,
        }
    }
}

/// Access-control record for one domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub resource_type: ResourceType,
    pub owner_id: Uuid,
    /// Domain row this resource protects (often equals the domain id)
    pub reference_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    pub fn new(resource_type: ResourceType, reference_id: Uuid, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            resource_type,
            owner_id,
            reference_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-user rights grant on a resource, keyed `(user_id, resource_id)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAccess {
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub rights: BTreeSet<Right>,
    pub granted_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResourceAccess {
    pub fn new(
        resource_id: Uuid,
        user_id: Uuid,
        rights: BTreeSet<Right>,
        granted_by: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            resource_id,
            user_id,
            rights,
            granted_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set-containment check: every requested right must be held
    pub fn covers(&self, requested: &[Right]) -> bool {
        requested.iter().all(|r| self.rights.contains(r))
    }
}

/// Repository for Resource rows
///
/// Lookup is by `reference_id` alone: domain ids are uuids, so the
/// `(type, reference_id)` uniqueness constraint never yields two rows for
/// one reference in practice.
pub trait ResourceRepository: Send + Sync {
    fn find_by_reference(&self, reference_id: Uuid) -> AccessResult<Option<Resource>>;

    /// Insert unless a row for `(type, reference_id)` already exists.
    ///
    /// On conflict the existing row is returned untouched, which is what
    /// makes concurrent backfills harmless.
    fn insert_if_absent(&self, resource: Resource) -> AccessResult<Resource>;

    fn delete_by_reference(&self, reference_id: Uuid) -> AccessResult<Option<Resource>>;
}

/// Repository for ResourceAccess rows
pub trait ResourceAccessRepository: Send + Sync {
    fn find(&self, user_id: Uuid, resource_id: Uuid) -> AccessResult<Option<ResourceAccess>>;

    /// Insert or replace the grant for `(user_id, resource_id)`
    fn upsert(&self, grant: ResourceAccess) -> AccessResult<()>;

    /// Insert only if no grant exists yet (owner grants are never downgraded)
    fn insert_if_absent(&self, grant: ResourceAccess) -> AccessResult<()>;

    fn remove(&self, user_id: Uuid, resource_id: Uuid) -> AccessResult<bool>;

    fn list_for_resource(&self, resource_id: Uuid) -> AccessResult<Vec<ResourceAccess>>;

    /// Cascade used when a resource is deleted
    fn remove_all_for_resource(&self, resource_id: Uuid) -> AccessResult<()>;
}

/// In-memory resource repository
#[derive(Debug, Default)]
pub struct InMemoryResourceRepository {
    rows: RwLock<HashMap<Uuid, Resource>>, // key: reference_id
}

impl InMemoryResourceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceRepository for InMemoryResourceRepository {
    fn find_by_reference(&self, reference_id: Uuid) -> AccessResult<Option<Resource>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        Ok(rows.get(&reference_id).cloned())
    }

    fn insert_if_absent(&self, resource: Resource) -> AccessResult<Resource> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        Ok(rows
            .entry(resource.reference_id)
            .or_insert(resource)
            .clone())
    }

    fn delete_by_reference(&self, reference_id: Uuid) -> AccessResult<Option<Resource>> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        Ok(rows.remove(&reference_id))
    }
}

/// In-memory grants repository
#[derive(Debug, Default)]
pub struct InMemoryResourceAccessRepository {
    rows: RwLock<HashMap<(Uuid, Uuid), ResourceAccess>>, // key: (user_id, resource_id)
}

impl InMemoryResourceAccessRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceAccessRepository for InMemoryResourceAccessRepository {
    fn find(&self, user_id: Uuid, resource_id: Uuid) -> AccessResult<Option<ResourceAccess>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        Ok(rows.get(&(user_id, resource_id)).cloned())
    }

    fn upsert(&self, grant: ResourceAccess) -> AccessResult<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        rows.insert((grant.user_id, grant.resource_id), grant);
        Ok(())
    }

    fn insert_if_absent(&self, grant: ResourceAccess) -> AccessResult<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        rows.entry((grant.user_id, grant.resource_id)).or_insert(grant);
        Ok(())
    }

    fn remove(&self, user_id: Uuid, resource_id: Uuid) -> AccessResult<bool> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        Ok(rows.remove(&(user_id, resource_id)).is_some())
    }

    fn list_for_resource(&self, resource_id: Uuid) -> AccessResult<Vec<ResourceAccess>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        Ok(rows
            .values()
            .filter(|g| g.resource_id == resource_id)
            .cloned()
            .collect())
    }

    fn remove_all_for_resource(&self, resource_id: Uuid) -> AccessResult<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| AccessError::Repository("Lock poisoned".to_string()))?;
        rows.retain(|_, g| g.resource_id != resource_id);
        Ok(())
    }
}
