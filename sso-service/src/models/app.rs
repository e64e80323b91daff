use sqlx::FromRow;

/// Client application a token is issued for. Read-only to this service.
#[derive(Debug, Clone, FromRow)]
pub struct App {
    pub app_id: i64,
    pub name: String,
    pub secret: String,
}
