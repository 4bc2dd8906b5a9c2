//! # Access Control
//!
//! Resource-rights model decoupled from domain tables, plus global roles.
//!
//! Any entity type (pattern, tag, file) shares one authorization mechanism:
//! a `Resource` row addresses the entity, `ResourceAccess` rows grant
//! per-user rights on it, and the owner always holds all rights without a
//! stored grant. Roles are orthogonal and system-wide.

pub mod errors;
pub mod resource;
pub mod roles;
pub mod service;

pub use errors::{AccessError, AccessResult};
pub use resource::{Resource, ResourceAccess, ResourceType, Right};
pub use roles::{Role, RoleService};
pub use service::AccessControlService;
