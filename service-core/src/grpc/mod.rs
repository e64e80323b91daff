//! gRPC utilities shared by service binaries.
//!
//! - Error conversion between `AppError` and `tonic::Status`
//! - Interceptors for request correlation
//! - Health check service implementation
//! - Server builder utilities

pub mod error;
pub mod health;
pub mod interceptors;
pub mod server;

pub use error::{GrpcResult, IntoStatus};
pub use health::{HealthComponents, HealthReporter, HealthStatus, create_health_service};
pub use interceptors::{
    REQUEST_ID_KEY, RequestContext, TRACEPARENT_KEY, extract_request_id, extract_traceparent,
    trace_context_interceptor,
};
pub use server::{GrpcServerBuilder, create_reflection_service, spawn_http_server};

pub use tonic::{Code, Request, Response, Status};
