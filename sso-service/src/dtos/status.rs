use validator::Validate;

/// Payload for lookups keyed by a single user id (IsAdmin and the status
/// queries).
#[derive(Debug, Clone, Copy, Validate)]
pub struct UserIdRequest {
    #[validate(range(min = 1, message = "user_id must be positive"))]
    pub user_id: i64,
}

impl From<crate::grpc::proto::auth::IsAdminRequest> for UserIdRequest {
    fn from(req: crate::grpc::proto::auth::IsAdminRequest) -> Self {
        Self {
            user_id: req.user_id,
        }
    }
}

impl From<crate::grpc::proto::status::UserRequest> for UserIdRequest {
    fn from(req: crate::grpc::proto::status::UserRequest) -> Self {
        Self {
            user_id: req.user_id,
        }
    }
}
