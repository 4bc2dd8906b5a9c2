//! # HTTP Server
//!
//! axum surface: authentication boundary, per-route authorization
//! policies, file delivery, pattern CRUD/sharing and admin endpoints.

pub mod admin_routes;
pub mod auth;
pub mod authorize;
pub mod config;
pub mod error;
pub mod file_routes;
pub mod pattern_routes;
pub mod server;

pub use auth::AuthUser;
pub use authorize::AuthorizePolicy;
pub use config::HttpServerConfig;
pub use error::ApiError;
pub use server::{build_router, AppState, HttpServer};
