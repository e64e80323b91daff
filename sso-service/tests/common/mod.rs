//! Test helpers for sso-service integration tests.
//!
//! Everything runs on the in-memory `MockStore` and `MockCache`; no Postgres
//! or Redis is needed.

#![allow(dead_code)]

use service_core::config::Config as CoreConfig;
use sso_service::{
    config::{DatabaseConfig, Environment, GrpcConfig, JwtConfig, RedisConfig, SsoConfig},
    grpc::proto::{
        auth::auth_client::AuthClient, permissions::permissions_client::PermissionsClient,
        status::status_client::StatusClient,
    },
    services::{AuthService, JwtService, MockCache, MockStore},
    startup::Application,
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tonic::transport::Channel;

pub const TEST_SECRET: &str = "test-secret-please-change";
pub const TEST_APP_ID: i64 = 1;

pub fn test_config(access_ttl_seconds: i64) -> SsoConfig {
    SsoConfig {
        common: CoreConfig {
            grpc_port: 0,
            http_port: 0,
        },
        environment: Environment::Dev,
        service_name: "sso-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_ttl_seconds: access_ttl_seconds,
        },
        grpc: GrpcConfig {
            request_timeout_seconds: 5,
        },
    }
}

pub fn test_jwt(secret: &str, access_ttl_seconds: i64) -> JwtService {
    JwtService::new(&JwtConfig {
        secret: secret.to_string(),
        access_token_ttl_seconds: access_ttl_seconds,
    })
    .expect("Failed to create JWT service")
}

/// Store with the default test app registered.
pub fn test_store() -> Arc<MockStore> {
    Arc::new(MockStore::new().with_app(TEST_APP_ID, "web"))
}

pub fn auth_service(store: Arc<MockStore>) -> AuthService {
    AuthService::new(store, test_jwt(TEST_SECRET, 3600))
}

/// In-process gRPC server on a free port, backed by mocks.
pub struct TestApp {
    pub grpc_port: u16,
    pub http_port: u16,
    pub state: AppState,
    pub store: Arc<MockStore>,
    pub cache: Arc<MockCache>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = test_config(3600);
        let store = test_store();
        let cache = Arc::new(MockCache::new());
        let jwt = JwtService::new(&config.jwt).expect("Failed to create JWT service");

        let state = AppState::new(config, jwt, store.clone(), cache.clone(), None);
        let app = Application::with_state(state.clone())
            .await
            .expect("Failed to bind listeners");
        let grpc_port = app.grpc_port();
        let http_port = app.http_port();

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = app
                .run_until(async move {
                    let _ = rx.await;
                })
                .await;
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        TestApp {
            grpc_port,
            http_port,
            state,
            store,
            cache,
            shutdown: Some(tx),
        }
    }

    pub fn grpc_addr(&self) -> String {
        format!("http://127.0.0.1:{}", self.grpc_port)
    }

    /// Base URL of the HTTP status server.
    pub fn http_address(&self) -> String {
        format!("http://127.0.0.1:{}", self.http_port)
    }

    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::new()
    }

    async fn channel(&self) -> Channel {
        Channel::from_shared(self.grpc_addr())
            .expect("Invalid address")
            .connect()
            .await
            .expect("Failed to connect to gRPC server")
    }

    pub async fn auth_client(&self) -> AuthClient<Channel> {
        AuthClient::new(self.channel().await)
    }

    pub async fn permissions_client(&self) -> PermissionsClient<Channel> {
        PermissionsClient::new(self.channel().await)
    }

    pub async fn status_client(&self) -> StatusClient<Channel> {
        StatusClient::new(self.channel().await)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Attach `authorization: Bearer <token>` to a request.
pub fn with_token<T>(message: T, token: &str) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    request.metadata_mut().insert(
        "authorization",
        format!("Bearer {}", token)
            .parse()
            .expect("Invalid metadata value"),
    );
    request
}
