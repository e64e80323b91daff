use validator::Validate;

use crate::grpc::proto::auth as pb;

#[derive(Debug, Clone, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 20, message = "Username must be 3 to 20 characters"))]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(min = 4, max = 50, message = "Email must be 4 to 50 characters")
    )]
    pub email: String,

    #[validate(length(min = 6, max = 100, message = "Password must be 6 to 100 characters"))]
    pub password: String,
}

impl From<pb::RegisterRequest> for RegisterRequest {
    fn from(req: pb::RegisterRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct LoginRequest {
    #[validate(
        email(message = "Invalid email format"),
        length(min = 4, max = 50, message = "Email must be 4 to 50 characters")
    )]
    pub email: String,

    #[validate(length(min = 8, max = 50, message = "Password must be 8 to 50 characters"))]
    pub password: String,

    #[validate(range(min = 1, message = "app_id must be positive"))]
    pub app_id: i64,
}

impl From<pb::LoginRequest> for LoginRequest {
    fn from(req: pb::LoginRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
            app_id: req.app_id,
        }
    }
}
