//! # File Storage
//!
//! Pluggable byte store with three interchangeable backends (local
//! filesystem, HTTP object store, database blob) behind one trait,
//! selected once at startup by the factory.

pub mod backend;
pub mod database;
pub mod errors;
pub mod factory;
pub mod local;
pub mod metadata;
pub mod object;

pub use backend::FileStorage;
pub use errors::{StorageError, StorageResult};
pub use factory::{build_storage, StorageConfig, StorageKind};
pub use metadata::FileMetadata;
