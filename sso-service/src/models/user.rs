//! User accounts.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User entity as stored in `users`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string; never logged or returned to callers.
    pub password_hash: String,
    pub role: String,
    pub is_banned: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub login_attempts: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl User {
    /// Build the in-memory record for a freshly registered user.
    pub fn from_new(user_id: i64, new_user: NewUser) -> Self {
        Self {
            user_id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: "user".to_string(),
            is_banned: false,
            last_login: None,
            login_attempts: 0,
            created_at: Utc::now(),
        }
    }
}
