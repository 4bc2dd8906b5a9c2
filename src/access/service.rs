//! # Access Control Service
//!
//! Evaluates "does user U have right R on resource X" against the
//! resource/grants repositories. Owners always pass without a stored grant;
//! non-owners need a grant whose rights contain every requested right.
//!
//! `ensure_resource` is idempotent get-or-create, which is what lets the
//! authorize middleware backfill resources for domain rows that predate the
//! access-control tables without serializing concurrent requests.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::errors::{AccessError, AccessResult};
use super::resource::{
    Resource, ResourceAccess, ResourceAccessRepository, ResourceRepository, ResourceType, Right,
};

/// Parameters for the explicit creation path used by backfill
#[derive(Debug, Clone)]
pub struct CreateResourceParams {
    pub resource_type: ResourceType,
    pub reference_id: Uuid,
    pub owner_id: Uuid,
}

/// Service evaluating per-resource rights
#[derive(Clone)]
pub struct AccessControlService {
    resources: Arc<dyn ResourceRepository>,
    grants: Arc<dyn ResourceAccessRepository>,
}

impl AccessControlService {
    pub fn new(
        resources: Arc<dyn ResourceRepository>,
        grants: Arc<dyn ResourceAccessRepository>,
    ) -> Self {
        Self { resources, grants }
    }

    /// Idempotent get-or-create of the Resource for `(type, reference_id)`.
    ///
    /// On first creation the owner receives a grant with all three rights.
    /// An existing resource is returned untouched; in particular the owner
    /// is never reassigned.
    pub fn ensure_resource(
        &self,
        resource_type: ResourceType,
        reference_id: Uuid,
        owner_id: Uuid,
    ) -> AccessResult<Resource> {
        if let Some(existing) = self.resources.find_by_reference(reference_id)? {
            return Ok(existing);
        }

        let resource = self
            .resources
            .insert_if_absent(Resource::new(resource_type, reference_id, owner_id))?;

        // A concurrent ensure may have won the insert; the owner grant is
        // insert-if-absent for the same reason.
        self.grants.insert_if_absent(ResourceAccess::new(
            resource.id,
            resource.owner_id,
            Right::all(),
            resource.owner_id,
        ))?;

        debug!(
            resource_type = resource_type.as_str(),
            %reference_id,
            "resource ensured"
        );
        Ok(resource)
    }

    /// Explicit creation path used by the middleware backfill flow
    pub fn create_resource(&self, params: CreateResourceParams) -> AccessResult<Resource> {
        self.ensure_resource(params.resource_type, params.reference_id, params.owner_id)
    }

    /// Assert that `user_id` holds every right in `rights` on the resource
    /// referencing `reference_id`.
    ///
    /// Fails `ResourceNotFound` if no Resource row exists. When
    /// `allow_owner` is set the resource owner passes unconditionally,
    /// regardless of stored grants. Otherwise the `(user, resource)` grant
    /// must exist and contain every requested right.
    pub fn assert_has_rights(
        &self,
        user_id: Uuid,
        reference_id: Uuid,
        rights: &[Right],
        allow_owner: bool,
    ) -> AccessResult<()> {
        let resource = self
            .resources
            .find_by_reference(reference_id)?
            .ok_or(AccessError::ResourceNotFound(reference_id))?;

        if allow_owner && resource.owner_id == user_id {
            return Ok(());
        }

        match self.grants.find(user_id, resource.id)? {
            Some(grant) if grant.covers(rights) => Ok(()),
            _ => {
                debug!(%user_id, %reference_id, "rights check failed");
                Err(AccessError::Forbidden)
            }
        }
    }

    /// Grant `rights` on the referenced resource to `user_id`.
    ///
    /// Sharing path: replaces any previous grant for the pair. The resource
    /// must already exist.
    pub fn grant_rights(
        &self,
        reference_id: Uuid,
        user_id: Uuid,
        rights: BTreeSet<Right>,
        granted_by: Uuid,
    ) -> AccessResult<ResourceAccess> {
        if rights.is_empty() {
            return Err(AccessError::EmptyRights);
        }

        let resource = self
            .resources
            .find_by_reference(reference_id)?
            .ok_or(AccessError::ResourceNotFound(reference_id))?;

        let grant = ResourceAccess::new(resource.id, user_id, rights, granted_by);
        self.grants.upsert(grant.clone())?;
        Ok(grant)
    }

    /// Remove the grant for `(user_id, resource)`; returns false if none existed
    pub fn revoke_rights(&self, reference_id: Uuid, user_id: Uuid) -> AccessResult<bool> {
        let resource = self
            .resources
            .find_by_reference(reference_id)?
            .ok_or(AccessError::ResourceNotFound(reference_id))?;
        self.grants.remove(user_id, resource.id)
    }

    /// All grants on the referenced resource
    pub fn list_grants(&self, reference_id: Uuid) -> AccessResult<Vec<ResourceAccess>> {
        let resource = self
            .resources
            .find_by_reference(reference_id)?
            .ok_or(AccessError::ResourceNotFound(reference_id))?;
        self.grants.list_for_resource(resource.id)
    }

    /// Delete the resource and cascade its grants; no-op if absent
    pub fn delete_resource(&self, reference_id: Uuid) -> AccessResult<()> {
        if let Some(resource) = self.resources.delete_by_reference(reference_id)? {
            self.grants.remove_all_for_resource(resource.id)?;
        }
        Ok(())
    }
}
