//! service-core: shared infrastructure for the SSO service binaries.
pub mod config;
pub mod error;
pub mod grpc;
pub mod observability;

pub use axum;
pub use prost;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tonic;
pub use tower;
pub use tracing;
pub use validator;
