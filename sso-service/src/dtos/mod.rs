//! Validated request payloads. Every gRPC handler converts its proto message
//! into one of these and calls `validate()` before touching a service.

pub mod auth;
pub mod permission;
pub mod status;

pub use auth::{LoginRequest, RegisterRequest};
pub use permission::PermissionRequest;
pub use status::UserIdRequest;
