use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

use crate::services::MAX_ACCESS_TTL_SECONDS;

#[derive(Debug, Clone, Deserialize)]
pub struct SsoConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub grpc: GrpcConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrpcConfig {
    pub request_timeout_seconds: u64,
}

impl SsoConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let mut common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        if let Ok(port) = env::var("SSO_GRPC_PORT") {
            common_config.grpc_port = parse_var("SSO_GRPC_PORT", &port)?;
        }
        if let Ok(port) = env::var("SSO_HTTP_PORT") {
            common_config.http_port = parse_var("SSO_HTTP_PORT", &port)?;
        }

        let config = SsoConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("sso-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_var(
                    "DATABASE_MAX_CONNECTIONS",
                    &get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?,
                )?,
                min_connections: parse_var(
                    "DATABASE_MIN_CONNECTIONS",
                    &get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?,
                )?,
            },
            redis: RedisConfig {
                url: get_env("REDIS_URL", None, is_prod)?,
            },
            jwt: JwtConfig {
                // Required in every environment
                secret: get_env("JWT_SECRET", None, true)?,
                access_token_ttl_seconds: parse_var(
                    "JWT_ACCESS_TOKEN_TTL_SECONDS",
                    &get_env("JWT_ACCESS_TOKEN_TTL_SECONDS", Some("3600"), false)?,
                )?,
            },
            grpc: GrpcConfig {
                request_timeout_seconds: parse_var(
                    "SSO_GRPC_TIMEOUT_SECONDS",
                    &get_env("SSO_GRPC_TIMEOUT_SECONDS", Some("10"), false)?,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.grpc_port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SSO_GRPC_PORT must be greater than 0"
            )));
        }

        if self.jwt.secret.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must not be empty"
            )));
        }

        if self.jwt.access_token_ttl_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_ACCESS_TOKEN_TTL_SECONDS must be positive"
            )));
        }

        if self.jwt.access_token_ttl_seconds > MAX_ACCESS_TTL_SECONDS {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_ACCESS_TOKEN_TTL_SECONDS must not exceed {}",
                MAX_ACCESS_TTL_SECONDS
            )));
        }

        if self.grpc.request_timeout_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SSO_GRPC_TIMEOUT_SECONDS must be positive"
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        if self.environment == Environment::Prod && self.jwt.secret.len() < 32 {
            tracing::error!("JWT_SECRET is shorter than 32 bytes in production");
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
