use validator::Validate;

use crate::grpc::proto::permissions as pb;

/// Payload shared by all four permission checks.
#[derive(Debug, Clone, Copy, Validate)]
pub struct PermissionRequest {
    #[validate(range(min = 1, message = "user_id must be positive"))]
    pub user_id: i64,

    #[validate(range(min = 1, message = "app_id must be positive"))]
    pub app_id: i64,
}

impl From<pb::PermissionRequest> for PermissionRequest {
    fn from(req: pb::PermissionRequest) -> Self {
        Self {
            user_id: req.user_id,
            app_id: req.app_id,
        }
    }
}
