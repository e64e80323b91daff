//! Application bootstrap: connections, listeners, and the gRPC plus HTTP
//! servers.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use service_core::error::AppError;
use service_core::grpc::{
    create_health_service, create_reflection_service, spawn_http_server,
    trace_context_interceptor, GrpcServerBuilder,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;

use crate::config::SsoConfig;
use crate::grpc::proto::{
    auth::auth_server::AuthServer, permissions::permissions_server::PermissionsServer,
    status::status_server::StatusServer, FILE_DESCRIPTOR_SET,
};
use crate::grpc::{AuthServiceImpl, PermissionServiceImpl, StatusServiceImpl};
use crate::middleware::RequestGateLayer;
use crate::services::{Database, JwtService, RedisCache};
use crate::{build_http_router, db, AppState};

/// Fully-qualified names of the hosted gRPC services.
pub const GRPC_SERVICES: &[&str] = &[
    "sso.auth.v1.Auth",
    "sso.permissions.v1.Permissions",
    "sso.status.v1.Status",
];

/// Infrastructure methods that stay reachable without a token.
const INFRA_METHODS: &[&str] = &[
    "/grpc.health.v1.Health/Check",
    "/grpc.health.v1.Health/Watch",
    "/grpc.reflection.v1.ServerReflection/ServerReflectionInfo",
];

pub struct Application {
    http_port: u16,
    grpc_port: u16,
    http_listener: TcpListener,
    grpc_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connect to Postgres and Redis, run migrations, and bind listeners.
    pub async fn build(config: SsoConfig) -> Result<Self, AppError> {
        tracing::info!("Initializing database connections");
        let pool = db::connect(&config.database).await?;
        let database = Database::new(pool);

        let cache = RedisCache::new(&config.redis)
            .await
            .map_err(AppError::InternalError)?;
        tracing::info!("Redis cache initialized");

        let jwt = JwtService::new(&config.jwt).map_err(AppError::ConfigError)?;

        let state = AppState::with_database(config, jwt, database, Arc::new(cache));
        Self::with_state(state).await
    }

    /// Bind listeners for an already wired state. Port 0 picks a free port.
    pub async fn with_state(state: AppState) -> Result<Self, AppError> {
        let http_addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.http_port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        let grpc_addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.grpc_port));
        let grpc_listener = TcpListener::bind(grpc_addr).await.map_err(|e| {
            tracing::error!("Failed to bind gRPC listener to {}: {}", grpc_addr, e);
            AppError::from(e)
        })?;
        let grpc_port = grpc_listener.local_addr()?.port();

        tracing::info!(http_port = http_port, grpc_port = grpc_port, "Listeners bound");

        Ok(Self {
            http_port,
            grpc_port,
            http_listener,
            grpc_listener,
            state,
        })
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn grpc_port(&self) -> u16 {
        self.grpc_port
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves. In-flight calls are drained before
    /// returning.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let state = self.state;

        let http_handle = spawn_http_server(self.http_listener, build_http_router(state.clone()));

        let health = create_health_service(
            GRPC_SERVICES.iter().map(|name| name.to_string()).collect(),
        )
        .await;

        let reflection_service = create_reflection_service(&[FILE_DESCRIPTOR_SET]).map_err(|e| {
            AppError::InternalError(anyhow::anyhow!(
                "Failed to build reflection service: {}",
                e
            ))
        })?;

        let gate = INFRA_METHODS.iter().fold(
            RequestGateLayer::sso_defaults(Arc::new(state.jwt.clone())),
            |gate, method| gate.with_public_method(*method),
        );

        let layer = ServiceBuilder::new()
            .layer(tonic::service::interceptor(trace_context_interceptor))
            .layer(gate)
            .into_inner();

        let server = GrpcServerBuilder::new(state.config.service_name.clone())
            .with_timeout(Duration::from_secs(state.config.grpc.request_timeout_seconds));

        let incoming = tokio_stream::wrappers::TcpListenerStream::new(self.grpc_listener);
        let grpc_server = server
            .build_server()
            .layer(layer)
            .add_service(health.server)
            .add_optional_service(server.reflection_enabled().then_some(reflection_service))
            .add_service(AuthServer::new(AuthServiceImpl::new(
                state.auth_service.clone(),
            )))
            .add_service(PermissionsServer::new(PermissionServiceImpl::new(
                state.permission_service.clone(),
            )))
            .add_service(StatusServer::new(StatusServiceImpl::new(
                state.status_service.clone(),
            )))
            .serve_with_incoming_shutdown(incoming, shutdown);

        health.reporter.set_serving().await;
        tracing::info!(grpc_port = self.grpc_port, "gRPC server started");

        let result = grpc_server.await;

        health.reporter.set_not_serving().await;
        http_handle.abort();

        result.map_err(|e| {
            tracing::error!("gRPC server error: {}", e);
            AppError::from(e)
        })?;

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
