//! gRPC service implementations for sso-service.

pub mod auth_service;
pub mod permission_service;
pub mod status_service;

// Include the generated proto code
pub mod proto {
    pub mod auth {
        tonic::include_proto!("sso.auth.v1");
    }

    pub mod permissions {
        tonic::include_proto!("sso.permissions.v1");
    }

    pub mod status {
        tonic::include_proto!("sso.status.v1");
    }

    // File descriptor set for gRPC reflection
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("sso_service_descriptor");
}

pub use auth_service::AuthServiceImpl;
pub use permission_service::PermissionServiceImpl;
pub use status_service::StatusServiceImpl;
