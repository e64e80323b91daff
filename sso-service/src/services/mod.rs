//! Services layer for sso-service.
//!
//! Business services (`AuthService`, `PermissionService`, `StatusService`)
//! depend only on the capability traits in `store`, `redis` and `jwt`.

pub mod auth;
mod database;
pub mod error;
mod jwt;
pub mod metrics;
pub mod permission;
pub mod redis;
pub mod status;
pub mod store;

pub use auth::AuthService;
pub use database::Database;
pub use error::{ServiceError, StoreError};
pub use jwt::{
    Claims, JwtService, TokenValidator, MAX_ACCESS_TTL_SECONDS, REFRESH_TTL_MULTIPLIER,
};
pub use permission::PermissionService;
pub use redis::{Cache, MockCache, RedisCache};
pub use status::StatusService;
pub use store::{CredentialStore, MockFailure, MockStore, PermissionStore, UserStatusStore};
