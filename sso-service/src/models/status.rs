/// Ban state of a user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanStatus {
    pub is_banned: bool,
    pub message: String,
}

impl BanStatus {
    pub fn new(is_banned: bool) -> Self {
        Self {
            is_banned,
            message: "account status has been checked".to_string(),
        }
    }
}

/// Username and current role of a user.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RoleStatus {
    pub username: String,
    pub role: String,
}
