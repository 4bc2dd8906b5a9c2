//! # HTTP Server
//!
//! Wires repositories, services, storage and routers into one axum app.

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::access::resource::{InMemoryResourceAccessRepository, InMemoryResourceRepository};
use crate::access::roles::InMemoryRoleRepository;
use crate::access::{AccessControlService, RoleService};
use crate::config::AppConfig;
use crate::delivery::FileDeliveryService;
use crate::patterns::{InMemoryPatternRepository, PatternRepository};
use crate::storage::{build_storage, FileStorage, StorageResult};

use super::admin_routes::admin_routes;
use super::auth::require_auth;
use super::config::HttpServerConfig;
use super::file_routes::file_routes;
use super::pattern_routes::pattern_routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub access: AccessControlService,
    pub roles: RoleService,
    pub patterns: Arc<dyn PatternRepository>,
    pub storage: Arc<dyn FileStorage>,
    pub delivery: FileDeliveryService,
    pub settings: Arc<RwLock<serde_json::Value>>,
    pub jwt_secret: String,
}

impl AppState {
    /// Build the state over the configured storage backend and in-memory
    /// repositories
    pub async fn new(config: &AppConfig) -> StorageResult<Self> {
        let storage = build_storage(&config.storage).await?;
        Ok(Self::with_storage(storage, &config.jwt_secret))
    }

    /// Build the state over an explicit backend (tests inject tempdir-backed
    /// local storage here)
    pub fn with_storage(storage: Arc<dyn FileStorage>, jwt_secret: &str) -> Self {
        let access = AccessControlService::new(
            Arc::new(InMemoryResourceRepository::new()),
            Arc::new(InMemoryResourceAccessRepository::new()),
        );
        let roles = RoleService::new(Arc::new(InMemoryRoleRepository::new()));
        let patterns: Arc<dyn PatternRepository> = Arc::new(InMemoryPatternRepository::new());
        let delivery = FileDeliveryService::new(patterns.clone(), access.clone(), storage.clone());

        Self {
            access,
            roles,
            patterns,
            storage,
            delivery,
            settings: Arc::new(RwLock::new(serde_json::json!({}))),
            jwt_secret: jwt_secret.to_string(),
        }
    }
}

/// Build the full application router
pub fn build_router(state: AppState, config: &HttpServerConfig) -> Router {
    let cors = if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api = Router::new()
        .nest("/files", file_routes(state.clone()))
        .nest("/patterns", pattern_routes(state.clone()))
        .nest("/admin", admin_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

/// HTTP server for the pattern library API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, config: HttpServerConfig) -> Self {
        let router = build_router(state, &config);
        Self { config, router }
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process is stopped
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        info!(%addr, "listening");
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await
    }
}
