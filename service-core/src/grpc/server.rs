//! gRPC server builder utilities.
//!
//! Provides a builder pattern for configuring gRPC servers with standard
//! transport settings and services (health, reflection), plus the plain HTTP
//! listener used for container health checks and metrics scraping.

use std::time::Duration;

use tonic::transport::Server;
use tonic_reflection::server::Builder as ReflectionBuilder;

/// Builder for configuring a gRPC server with standard transport settings.
pub struct GrpcServerBuilder {
    service_name: String,
    enable_reflection: bool,
    request_timeout: Option<Duration>,
    http2_keepalive_interval: Option<Duration>,
    http2_keepalive_timeout: Option<Duration>,
}

impl GrpcServerBuilder {
    /// Create a new server builder for the given service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            enable_reflection: true,
            request_timeout: None,
            http2_keepalive_interval: Some(Duration::from_secs(30)),
            http2_keepalive_timeout: Some(Duration::from_secs(10)),
        }
    }

    /// Enable or disable gRPC reflection (enabled by default).
    pub fn with_reflection(mut self, enable: bool) -> Self {
        self.enable_reflection = enable;
        self
    }

    /// Bound every call; an expired call is answered with `CANCELLED` and
    /// its handler future is dropped.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn reflection_enabled(&self) -> bool {
        self.enable_reflection
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Build a tonic Server with the configured settings.
    pub fn build_server(&self) -> Server {
        let mut server = Server::builder();

        if let Some(timeout) = self.request_timeout {
            server = server.timeout(timeout);
        }

        if let Some(interval) = self.http2_keepalive_interval {
            server = server.http2_keepalive_interval(Some(interval));
        }

        if let Some(timeout) = self.http2_keepalive_timeout {
            server = server.http2_keepalive_timeout(Some(timeout));
        }

        server
    }
}

/// Create a reflection service from encoded file descriptor sets.
///
/// ```ignore
/// let reflection = create_reflection_service(&[proto::FILE_DESCRIPTOR_SET])?;
/// ```
pub fn create_reflection_service(
    file_descriptor_sets: &[&[u8]],
) -> Result<
    tonic_reflection::server::ServerReflectionServer<
        impl tonic_reflection::server::ServerReflection,
    >,
    tonic_reflection::server::Error,
> {
    let mut builder = ReflectionBuilder::configure();

    for fds in file_descriptor_sets {
        builder = builder.register_encoded_file_descriptor_set(fds);
    }

    builder.build_v1()
}

/// Serve an HTTP router (`/health`, `/metrics`) on an already bound
/// listener until the task is aborted.
pub fn spawn_http_server(
    listener: tokio::net::TcpListener,
    app: axum::Router,
) -> tokio::task::JoinHandle<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, "Starting HTTP status server");
    }

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "HTTP status server error");
        }
    })
}
