use std::sync::Arc;

use crate::{
    models::{NewUser, RefreshToken},
    services::{metrics, CredentialStore, JwtService, ServiceError, StoreError},
    utils::{hash_password, verify_password, Password, PasswordHashString},
};

/// Registration, login and the admin lookup.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, jwt: JwtService) -> Self {
        Self { store, jwt }
    }

    /// Create a user and return its id.
    #[tracing::instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: Password,
    ) -> Result<i64, ServiceError> {
        // Argon2 runs on the blocking pool
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
            .map_err(|e| {
                ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
            })?;

        let user_id = self
            .store
            .save_user(NewUser {
                username,
                email,
                password_hash: password_hash.into_string(),
            })
            .await
            .map_err(|e| match e {
                StoreError::UserExists => {
                    tracing::warn!("User already exists");
                    ServiceError::UserAlreadyExists
                }
                other => {
                    tracing::error!(error = %other, "Failed to save user");
                    ServiceError::from(other)
                }
            })?;

        metrics::record_registration();
        tracing::info!(user_id = user_id, "User registered");

        Ok(user_id)
    }

    /// Verify credentials and return an access token for `app_id`.
    ///
    /// A refresh token is issued and persisted before the access token; if
    /// persisting it fails the login fails.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: Password,
        app_id: i64,
    ) -> Result<String, ServiceError> {
        let user = self.store.user_by_email(email).await.map_err(|e| match e {
            StoreError::UserNotFound => {
                tracing::warn!("User not found");
                metrics::record_login(false);
                ServiceError::InvalidCredentials
            }
            other => {
                tracing::error!(error = %other, "Failed to get user");
                ServiceError::from(other)
            }
        })?;

        let stored_hash = PasswordHashString::new(user.password_hash.clone());
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
                .await
                .map_err(|e| {
                    ServiceError::Internal(anyhow::anyhow!("Verification task failed: {}", e))
                })?
                .map_err(|e| {
                    tracing::error!(
                        user_id = user.user_id,
                        error = %e,
                        "Stored password hash unreadable"
                    );
                    ServiceError::Internal(e)
                })?;

        if !matches {
            tracing::warn!(user_id = user.user_id, "Invalid credentials");
            metrics::record_login(false);
            if let Err(e) = self.store.record_login_failure(user.user_id).await {
                tracing::warn!(user_id = user.user_id, error = %e, "Failed to record failed login");
            }
            return Err(ServiceError::InvalidCredentials);
        }

        let app = self.store.app(app_id).await.map_err(|e| match e {
            StoreError::AppNotFound => {
                tracing::warn!("App not found");
                ServiceError::InvalidAppId
            }
            other => {
                tracing::error!(error = %other, "Failed to get app");
                ServiceError::from(other)
            }
        })?;

        let refresh_token = self.jwt.issue(&user, &app, self.jwt.refresh_ttl())?;

        self.store
            .save_refresh_token(RefreshToken::new(
                user.user_id,
                &refresh_token,
                self.jwt.refresh_ttl(),
            ))
            .await
            .map_err(|e| {
                tracing::error!(user_id = user.user_id, error = %e, "Failed to save refresh token");
                ServiceError::from(e)
            })?;

        let access_token = self.jwt.issue(&user, &app, self.jwt.access_ttl())?;

        if let Err(e) = self.store.record_login_success(user.user_id).await {
            tracing::warn!(user_id = user.user_id, error = %e, "Failed to record login");
        }

        metrics::record_login(true);
        tracing::info!(user_id = user.user_id, "User logged in successfully");

        Ok(access_token)
    }

    #[tracing::instrument(skip(self))]
    pub async fn is_admin(&self, user_id: i64) -> Result<bool, ServiceError> {
        let is_admin = self
            .store
            .is_user_admin(user_id)
            .await
            .map_err(|e| match e {
                StoreError::UserNotFound => {
                    tracing::warn!("User not found");
                    ServiceError::NotFound("user not found".to_string())
                }
                other => {
                    tracing::error!(error = %other, "Failed to check admin flag");
                    ServiceError::from(other)
                }
            })?;

        tracing::info!(is_admin = is_admin, "Checked if user is admin");
        Ok(is_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::services::{MockFailure, MockStore};

    fn setup() -> (Arc<MockStore>, AuthService) {
        let store = Arc::new(MockStore::new().with_app(1, "web"));
        let jwt = JwtService::new(&JwtConfig {
            secret: "s3cret".to_string(),
            access_token_ttl_seconds: 3600,
        })
        .unwrap();
        (store.clone(), AuthService::new(store, jwt))
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let (store, auth) = setup();
        let id = auth
            .register("alice".into(), "a@x.io".into(), Password::new("correct-horse"))
            .await
            .unwrap();

        let user = store.user(id).unwrap();
        assert_ne!(user.password_hash, "correct-horse");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_login_wrong_password_counts_attempt() {
        let (store, auth) = setup();
        let id = auth
            .register("alice".into(), "a@x.io".into(), Password::new("correct-horse"))
            .await
            .unwrap();

        let err = auth
            .login("a@x.io", Password::new("battery-staple"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
        assert_eq!(store.user(id).unwrap().login_attempts, 1);
        assert!(store.refresh_tokens().is_empty());
    }

    #[tokio::test]
    async fn test_login_survives_failed_bookkeeping() {
        let (store, auth) = setup();
        auth.register("alice".into(), "a@x.io".into(), Password::new("correct-horse"))
            .await
            .unwrap();
        store.fail(MockFailure::RecordLogin);

        let token = auth.login("a@x.io", Password::new("correct-horse"), 1).await;
        assert!(token.is_ok());
    }

    #[tokio::test]
    async fn test_hashing_yields_to_other_tasks() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (_, auth) = setup();
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = ticks.clone();
            async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            }
        });

        auth.register("alice".into(), "a@x.io".into(), Password::new("correct-horse"))
            .await
            .unwrap();
        ticker.abort();

        assert!(ticks.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_is_admin_unknown_user_is_not_found() {
        let (_, auth) = setup();
        let err = auth.is_admin(99).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "user not found"));
    }
}
