pub mod config;
pub mod db;
pub mod dtos;
pub mod grpc;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use service_core::axum::{extract::State, routing::get, Json, Router};
use service_core::error::AppError;
use std::sync::Arc;

use crate::config::SsoConfig;
use crate::services::{
    AuthService, Cache, CredentialStore, Database, JwtService, PermissionService, PermissionStore,
    StatusService, UserStatusStore,
};

/// Everything the gRPC and HTTP surfaces need, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: SsoConfig,
    pub jwt: JwtService,
    pub auth_service: AuthService,
    pub permission_service: PermissionService,
    pub status_service: StatusService,
    pub cache: Arc<dyn Cache>,
    /// `None` when running on in-memory storage.
    pub db: Option<Database>,
}

impl AppState {
    /// Wire the business services over one store implementing every storage
    /// capability.
    pub fn new<T>(
        config: SsoConfig,
        jwt: JwtService,
        store: Arc<T>,
        cache: Arc<dyn Cache>,
        db: Option<Database>,
    ) -> Self
    where
        T: CredentialStore + PermissionStore + UserStatusStore + 'static,
    {
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let permissions: Arc<dyn PermissionStore> = store.clone();
        let statuses: Arc<dyn UserStatusStore> = store;

        Self {
            auth_service: AuthService::new(credentials, jwt.clone()),
            permission_service: PermissionService::new(permissions, cache.clone()),
            status_service: StatusService::new(statuses),
            config,
            jwt,
            cache,
            db,
        }
    }

    /// Postgres-backed state.
    pub fn with_database(
        config: SsoConfig,
        jwt: JwtService,
        db: Database,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self::new(config, jwt, Arc::new(db.clone()), cache, Some(db))
    }
}

/// HTTP status router: `/health` and `/metrics`.
pub fn build_http_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Service health check
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let database = match &state.db {
        Some(db) => {
            db.health_check().await?;
            "up"
        }
        None => "in-memory",
    };

    state.cache.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Redis health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "postgres": database,
            "redis": "up"
        }
    })))
}

pub async fn metrics() -> String {
    crate::services::metrics::get_metrics()
}
