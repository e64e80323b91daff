//! Cache-aside permission decisions.
//!
//! Every check consults the cache first and falls back to durable storage on
//! a miss, writing the decision back with the kind's TTL. Cache read errors,
//! undecodable entries and cache write errors are logged and never fail the
//! check.
//!
//! Concurrent misses for the same key each query storage; there is no
//! single-flight deduplication.

use std::sync::Arc;

use crate::models::{Permission, PermissionKind};
use crate::services::{metrics, Cache, PermissionStore, ServiceError, StoreError};

#[derive(Clone)]
pub struct PermissionService {
    store: Arc<dyn PermissionStore>,
    cache: Arc<dyn Cache>,
}

impl PermissionService {
    pub fn new(store: Arc<dyn PermissionStore>, cache: Arc<dyn Cache>) -> Self {
        Self { store, cache }
    }

    pub async fn check_delete(&self, user_id: i64, app_id: i64) -> Result<bool, ServiceError> {
        self.check(PermissionKind::Delete, user_id, app_id).await
    }

    pub async fn check_update(&self, user_id: i64, app_id: i64) -> Result<bool, ServiceError> {
        self.check(PermissionKind::Update, user_id, app_id).await
    }

    pub async fn check_download(&self, user_id: i64, app_id: i64) -> Result<bool, ServiceError> {
        self.check(PermissionKind::Download, user_id, app_id).await
    }

    pub async fn check_change_option(
        &self,
        user_id: i64,
        app_id: i64,
    ) -> Result<bool, ServiceError> {
        self.check(PermissionKind::ChangeOption, user_id, app_id)
            .await
    }

    #[tracing::instrument(skip(self), fields(kind = %kind))]
    async fn check(
        &self,
        kind: PermissionKind,
        user_id: i64,
        app_id: i64,
    ) -> Result<bool, ServiceError> {
        let key = kind.cache_key(user_id, app_id);

        if let Some(perm) = self.cached(&key).await {
            metrics::record_permission_cache(kind.as_str(), true);
            tracing::debug!(perm = perm, "Permission served from cache");
            return Ok(perm);
        }
        metrics::record_permission_cache(kind.as_str(), false);

        let perm = self
            .load(kind, user_id, app_id)
            .await
            .map_err(|e| match e {
                StoreError::AppNotFound => {
                    tracing::warn!("App not found");
                    ServiceError::Forbidden
                }
                other => {
                    tracing::error!(error = %other, "Failed to load permission");
                    ServiceError::from(other)
                }
            })?;

        match serde_json::to_string(&Permission { perm }) {
            Ok(value) => {
                if let Err(e) = self.cache.set(&key, &value, kind.ttl_seconds()).await {
                    tracing::warn!(key = %key, error = %e, "Failed to cache permission");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode permission"),
        }

        tracing::info!(perm = perm, "Permission resolved from storage");
        Ok(perm)
    }

    /// Cached decision, or `None` on a miss, a cache error or a bad entry.
    async fn cached(&self, key: &str) -> Option<bool> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Permission>(&raw) {
                Ok(permission) => Some(permission.perm),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, falling back to storage");
                None
            }
        }
    }

    async fn load(
        &self,
        kind: PermissionKind,
        user_id: i64,
        app_id: i64,
    ) -> Result<bool, StoreError> {
        match kind {
            PermissionKind::Delete => self.store.delete_permission(user_id, app_id).await,
            PermissionKind::Download => self.store.download_permission(user_id, app_id).await,
            PermissionKind::Update => self.store.update_permission(user_id, app_id).await,
            PermissionKind::ChangeOption => {
                self.store.change_option_permission(user_id, app_id).await
            }
        }
    }
}
