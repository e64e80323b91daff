//! Storage capabilities used by the business services, plus an in-memory
//! implementation for tests and local runs.
//!
//! Each service receives only the trait it needs as `Arc<dyn Trait>`; the
//! Postgres adapter in `database` implements all three.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::error::StoreError;
use crate::models::{App, BanStatus, NewUser, PermissionKind, RefreshToken, RoleStatus, User};

/// Users, apps and refresh-token records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new user and return its id. `UserExists` if the email is taken.
    async fn save_user(&self, new_user: NewUser) -> Result<i64, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<User, StoreError>;
    async fn app(&self, app_id: i64) -> Result<App, StoreError>;
    async fn is_user_admin(&self, user_id: i64) -> Result<bool, StoreError>;
    async fn save_refresh_token(&self, token: RefreshToken) -> Result<(), StoreError>;
    /// Set `last_login = now` and reset the failed-attempt counter.
    async fn record_login_success(&self, user_id: i64) -> Result<(), StoreError>;
    async fn record_login_failure(&self, user_id: i64) -> Result<(), StoreError>;
}

/// Durable permission lookups. An absent permission is `Ok(false)`; an
/// unknown app is `AppNotFound`.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn delete_permission(&self, user_id: i64, app_id: i64) -> Result<bool, StoreError>;
    async fn download_permission(&self, user_id: i64, app_id: i64) -> Result<bool, StoreError>;
    async fn update_permission(&self, user_id: i64, app_id: i64) -> Result<bool, StoreError>;
    async fn change_option_permission(
        &self,
        user_id: i64,
        app_id: i64,
    ) -> Result<bool, StoreError>;
}

/// Read-only user status lookups.
#[async_trait]
pub trait UserStatusStore: Send + Sync {
    async fn ban_status(&self, user_id: i64) -> Result<BanStatus, StoreError>;
    /// `Ok(None)` when the user exists but has never logged in.
    async fn last_login(&self, user_id: i64) -> Result<Option<DateTime<Utc>>, StoreError>;
    async fn current_role(&self, user_id: i64) -> Result<RoleStatus, StoreError>;
}

/// Failure to inject into the next matching `MockStore` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockFailure {
    SaveRefreshToken,
    PermissionLookup,
    StatusLookup,
    RecordLogin,
}

#[derive(Default)]
struct MockData {
    users: HashMap<i64, User>,
    apps: HashMap<i64, App>,
    admins: HashSet<i64>,
    refresh_tokens: Vec<RefreshToken>,
    permissions: HashSet<(i64, i64, PermissionKind)>,
    next_user_id: i64,
    failures: HashSet<MockFailure>,
}

/// In-memory store implementing every storage capability.
///
/// Counters let tests assert how often durable storage was consulted.
#[derive(Default)]
pub struct MockStore {
    data: Mutex<MockData>,
    permission_queries: AtomicUsize,
    save_user_calls: AtomicUsize,
    /// Log of mutating calls in invocation order, e.g. `save_refresh_token`.
    calls: Mutex<Vec<&'static str>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MockData>, StoreError> {
        self.data
            .lock()
            .map_err(|e| StoreError::Other(anyhow::anyhow!("Mock store mutex poisoned: {}", e)))
    }

    fn record_call(&self, name: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(name);
        }
    }

    pub fn with_app(self, app_id: i64, name: &str) -> Self {
        if let Ok(mut data) = self.data.lock() {
            data.apps.insert(
                app_id,
                App {
                    app_id,
                    name: name.to_string(),
                    secret: format!("{}-secret", name),
                },
            );
        }
        self
    }

    pub fn grant(&self, user_id: i64, app_id: i64, kind: PermissionKind) {
        if let Ok(mut data) = self.data.lock() {
            data.permissions.insert((user_id, app_id, kind));
        }
    }

    pub fn make_admin(&self, user_id: i64) {
        if let Ok(mut data) = self.data.lock() {
            data.admins.insert(user_id);
        }
    }

    pub fn ban(&self, user_id: i64) {
        if let Ok(mut data) = self.data.lock() {
            if let Some(user) = data.users.get_mut(&user_id) {
                user.is_banned = true;
            }
        }
    }

    pub fn set_role(&self, user_id: i64, role: &str) {
        if let Ok(mut data) = self.data.lock() {
            if let Some(user) = data.users.get_mut(&user_id) {
                user.role = role.to_string();
            }
        }
    }

    /// Make every subsequent call of the given kind fail until cleared.
    pub fn fail(&self, failure: MockFailure) {
        if let Ok(mut data) = self.data.lock() {
            data.failures.insert(failure);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut data) = self.data.lock() {
            data.failures.clear();
        }
    }

    pub fn permission_queries(&self) -> usize {
        self.permission_queries.load(Ordering::SeqCst)
    }

    pub fn save_user_calls(&self) -> usize {
        self.save_user_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn refresh_tokens(&self) -> Vec<RefreshToken> {
        self.data
            .lock()
            .map(|d| d.refresh_tokens.clone())
            .unwrap_or_default()
    }

    pub fn user(&self, user_id: i64) -> Option<User> {
        self.data
            .lock()
            .ok()
            .and_then(|d| d.users.get(&user_id).cloned())
    }

    fn check_failure(&self, failure: MockFailure) -> Result<(), StoreError> {
        if self.lock()?.failures.contains(&failure) {
            return Err(StoreError::Other(anyhow::anyhow!(
                "injected {:?} failure",
                failure
            )));
        }
        Ok(())
    }

    fn permission(&self, user_id: i64, app_id: i64, kind: PermissionKind) -> Result<bool, StoreError> {
        self.permission_queries.fetch_add(1, Ordering::SeqCst);
        self.check_failure(MockFailure::PermissionLookup)?;

        let data = self.lock()?;
        if !data.apps.contains_key(&app_id) {
            return Err(StoreError::AppNotFound);
        }
        Ok(data.permissions.contains(&(user_id, app_id, kind)))
    }

    fn user_by_id(&self, user_id: i64) -> Result<User, StoreError> {
        self.check_failure(MockFailure::StatusLookup)?;
        self.lock()?
            .users
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::UserNotFound)
    }
}

#[async_trait]
impl CredentialStore for MockStore {
    async fn save_user(&self, new_user: NewUser) -> Result<i64, StoreError> {
        self.save_user_calls.fetch_add(1, Ordering::SeqCst);
        self.record_call("save_user");

        let mut data = self.lock()?;
        if data.users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::UserExists);
        }
        data.next_user_id += 1;
        let user_id = data.next_user_id;
        data.users.insert(user_id, User::from_new(user_id, new_user));
        Ok(user_id)
    }

    async fn user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::UserNotFound)
    }

    async fn app(&self, app_id: i64) -> Result<App, StoreError> {
        self.lock()?
            .apps
            .get(&app_id)
            .cloned()
            .ok_or(StoreError::AppNotFound)
    }

    async fn is_user_admin(&self, user_id: i64) -> Result<bool, StoreError> {
        let data = self.lock()?;
        if !data.users.contains_key(&user_id) {
            return Err(StoreError::UserNotFound);
        }
        Ok(data.admins.contains(&user_id))
    }

    async fn save_refresh_token(&self, token: RefreshToken) -> Result<(), StoreError> {
        self.record_call("save_refresh_token");
        self.check_failure(MockFailure::SaveRefreshToken)?;
        self.lock()?.refresh_tokens.push(token);
        Ok(())
    }

    async fn record_login_success(&self, user_id: i64) -> Result<(), StoreError> {
        self.record_call("record_login_success");
        self.check_failure(MockFailure::RecordLogin)?;
        let mut data = self.lock()?;
        let user = data
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound)?;
        user.last_login = Some(Utc::now());
        user.login_attempts = 0;
        Ok(())
    }

    async fn record_login_failure(&self, user_id: i64) -> Result<(), StoreError> {
        self.record_call("record_login_failure");
        self.check_failure(MockFailure::RecordLogin)?;
        let mut data = self.lock()?;
        let user = data
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound)?;
        user.login_attempts += 1;
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for MockStore {
    async fn delete_permission(&self, user_id: i64, app_id: i64) -> Result<bool, StoreError> {
        self.permission(user_id, app_id, PermissionKind::Delete)
    }

    async fn download_permission(&self, user_id: i64, app_id: i64) -> Result<bool, StoreError> {
        self.permission(user_id, app_id, PermissionKind::Download)
    }

    async fn update_permission(&self, user_id: i64, app_id: i64) -> Result<bool, StoreError> {
        self.permission(user_id, app_id, PermissionKind::Update)
    }

    async fn change_option_permission(
        &self,
        user_id: i64,
        app_id: i64,
    ) -> Result<bool, StoreError> {
        self.permission(user_id, app_id, PermissionKind::ChangeOption)
    }
}

#[async_trait]
impl UserStatusStore for MockStore {
    async fn ban_status(&self, user_id: i64) -> Result<BanStatus, StoreError> {
        let user = self.user_by_id(user_id)?;
        Ok(BanStatus::new(user.is_banned))
    }

    async fn last_login(&self, user_id: i64) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.user_by_id(user_id)?.last_login)
    }

    async fn current_role(&self, user_id: i64) -> Result<RoleStatus, StoreError> {
        let user = self.user_by_id(user_id)?;
        Ok(RoleStatus {
            username: user.username,
            role: user.role,
        })
    }
}
