pub mod app;
pub mod permission;
pub mod refresh_token;
pub mod status;
pub mod user;

pub use app::App;
pub use permission::{Permission, PermissionKind};
pub use refresh_token::RefreshToken;
pub use status::{BanStatus, RoleStatus};
pub use user::{NewUser, User};
