use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::error::ServiceError;
use crate::config::JwtConfig;
use crate::models::{App, User};

/// Refresh tokens live this many access-token lifetimes.
pub const REFRESH_TTL_MULTIPLIER: i64 = 400;

/// Upper bound on the access-token lifetime (30 days).
pub const MAX_ACCESS_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Resolves a bearer token to the user id it was issued for.
pub trait TokenValidator: Send + Sync {
    fn validate_token(&self, token: &str) -> Result<i64, ServiceError>;
}

/// HS256 token issuer and validator sharing one secret.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_seconds: i64,
}

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub uid: i64,
    pub email: String,
    /// App the token was issued for
    pub app_id: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        if config.secret.is_empty() {
            return Err(anyhow::anyhow!("JWT secret must not be empty"));
        }
        if config.access_token_ttl_seconds <= 0 {
            return Err(anyhow::anyhow!("Access token TTL must be positive"));
        }
        if config.access_token_ttl_seconds > MAX_ACCESS_TTL_SECONDS {
            return Err(anyhow::anyhow!(
                "Access token TTL must not exceed {} seconds",
                MAX_ACCESS_TTL_SECONDS
            ));
        }

        tracing::info!(
            access_ttl_seconds = config.access_token_ttl_seconds,
            "JWT service initialized with HS256 secret"
        );

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl_seconds: config.access_token_ttl_seconds,
        })
    }

    pub fn access_ttl(&self) -> i64 {
        self.access_ttl_seconds
    }

    pub fn refresh_ttl(&self) -> i64 {
        self.access_ttl_seconds * REFRESH_TTL_MULTIPLIER
    }

    /// Sign a token for `user` on `app` that expires `ttl_seconds` from now.
    pub fn issue(&self, user: &User, app: &App, ttl_seconds: i64) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();

        let claims = Claims {
            uid: user.user_id,
            email: user.email.clone(),
            app_id: app.app_id,
            exp: now + ttl_seconds,
            iat: now,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Signing(anyhow::anyhow!("Failed to sign token: {}", e)))
    }

    /// Verify signature, algorithm and expiry with zero leeway.
    pub fn validate(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                ServiceError::InvalidToken
            })
    }
}

impl TokenValidator for JwtService {
    fn validate_token(&self, token: &str) -> Result<i64, ServiceError> {
        self.validate(token).map(|claims| claims.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: secret.to_string(),
            access_token_ttl_seconds: 3600,
        })
        .unwrap()
    }

    fn alice() -> (User, App) {
        let user = User::from_new(
            42,
            crate::models::NewUser {
                username: "alice".to_string(),
                email: "a@x.io".to_string(),
                password_hash: String::new(),
            },
        );
        let app = App {
            app_id: 7,
            name: "web".to_string(),
            secret: "web-secret".to_string(),
        };
        (user, app)
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = JwtService::new(&JwtConfig {
            secret: String::new(),
            access_token_ttl_seconds: 3600,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_issue_and_validate() {
        let jwt = service("s3cret");
        let (user, app) = alice();

        let token = jwt.issue(&user, &app, jwt.access_ttl()).unwrap();
        let claims = jwt.validate(&token).unwrap();

        assert_eq!(claims.uid, 42);
        assert_eq!(claims.email, "a@x.io");
        assert_eq!(claims.app_id, 7);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(jwt.validate_token(&token).unwrap(), 42);
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let result = JwtService::new(&JwtConfig {
            secret: "s3cret".to_string(),
            access_token_ttl_seconds: i64::MAX,
        });
        assert!(result.is_err());

        let jwt = JwtService::new(&JwtConfig {
            secret: "s3cret".to_string(),
            access_token_ttl_seconds: MAX_ACCESS_TTL_SECONDS,
        })
        .unwrap();
        let record = crate::models::RefreshToken::new(1, "a.b.c", jwt.refresh_ttl());
        assert!(!record.is_expired());
    }

    #[test]
    fn test_refresh_ttl_is_400_access_lifetimes() {
        let jwt = service("s3cret");
        assert_eq!(jwt.refresh_ttl(), 1_440_000);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (user, app) = alice();
        let token = service("one").issue(&user, &app, 3600).unwrap();
        assert!(matches!(
            service("two").validate(&token),
            Err(ServiceError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = service("s3cret");
        let (user, app) = alice();
        let token = jwt.issue(&user, &app, -1).unwrap();
        assert!(matches!(
            jwt.validate_token(&token),
            Err(ServiceError::InvalidToken)
        ));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            uid: 42,
            email: "a@x.io".to_string(),
            app_id: 7,
            exp: now + 60,
            iat: now,
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();
        assert!(service("s3cret").validate(&token).is_err());
    }

    #[test]
    fn test_missing_uid_rejected() {
        #[derive(Serialize)]
        struct Partial {
            email: String,
            exp: i64,
        }
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Partial {
                email: "a@x.io".to_string(),
                exp: Utc::now().timestamp() + 60,
            },
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();
        assert!(service("s3cret").validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(service("s3cret").validate_token("not-a-jwt").is_err());
        assert!(service("s3cret").validate_token("").is_err());
    }
}
