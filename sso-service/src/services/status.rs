use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::models::{BanStatus, RoleStatus};
use crate::services::{ServiceError, StoreError, UserStatusStore};

/// Read-only status lookups. One store call per operation, no caching.
#[derive(Clone)]
pub struct StatusService {
    store: Arc<dyn UserStatusStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn UserStatusStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn is_banned(&self, user_id: i64) -> Result<BanStatus, ServiceError> {
        self.store.ban_status(user_id).await.map_err(map_store_error)
    }

    #[tracing::instrument(skip(self))]
    pub async fn last_login(&self, user_id: i64) -> Result<DateTime<Utc>, ServiceError> {
        self.store
            .last_login(user_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                tracing::info!("User has never logged in");
                ServiceError::NotFound("user has never logged in".to_string())
            })
    }

    #[tracing::instrument(skip(self))]
    pub async fn current_role(&self, user_id: i64) -> Result<RoleStatus, ServiceError> {
        self.store
            .current_role(user_id)
            .await
            .map_err(map_store_error)
    }
}

fn map_store_error(err: StoreError) -> ServiceError {
    match err {
        StoreError::UserNotFound => {
            tracing::warn!("User not found");
            ServiceError::NotFound("user not found".to_string())
        }
        other => {
            tracing::error!(error = %other, "Status lookup failed");
            ServiceError::from(other)
        }
    }
}
