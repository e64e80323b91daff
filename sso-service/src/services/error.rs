use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid app id")]
    InvalidAppId,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("{0}")]
    NotFound(String),

    #[error("forbidden option")]
    Forbidden,

    #[error("invalid token")]
    InvalidToken,

    #[error("Token signing error: {0}")]
    Signing(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => {
                AppError::BadRequest(anyhow::anyhow!("invalid credentials"))
            }
            ServiceError::InvalidAppId => AppError::BadRequest(anyhow::anyhow!("invalid app id")),
            ServiceError::UserAlreadyExists => {
                AppError::Conflict(anyhow::anyhow!("user already exists"))
            }
            ServiceError::NotFound(e) => AppError::NotFound(anyhow::anyhow!(e)),
            ServiceError::Forbidden => AppError::Forbidden(anyhow::anyhow!("forbidden option")),
            ServiceError::InvalidToken => AppError::Unauthorized(anyhow::anyhow!("invalid token")),
            ServiceError::Signing(e) => AppError::InternalError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

/// Failures reported by the storage adapters.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("user already exists")]
    UserExists,

    #[error("user not found")]
    UserNotFound,

    #[error("app not found")]
    AppNotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl From<StoreError> for ServiceError {
    /// Fallback for store failures a caller has no specific mapping for.
    fn from(err: StoreError) -> Self {
        ServiceError::Internal(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::grpc::IntoStatus;
    use tonic::Code;

    fn code(err: ServiceError) -> Code {
        AppError::from(err).into_status().code()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(code(ServiceError::InvalidCredentials), Code::InvalidArgument);
        assert_eq!(code(ServiceError::InvalidAppId), Code::InvalidArgument);
        assert_eq!(code(ServiceError::UserAlreadyExists), Code::AlreadyExists);
        assert_eq!(
            code(ServiceError::NotFound("user not found".into())),
            Code::NotFound
        );
        assert_eq!(code(ServiceError::Forbidden), Code::PermissionDenied);
        assert_eq!(code(ServiceError::InvalidToken), Code::Unauthenticated);
        assert_eq!(
            code(ServiceError::Signing(anyhow::anyhow!("bad key"))),
            Code::Internal
        );
    }

    #[test]
    fn test_caller_messages() {
        let status = AppError::from(ServiceError::InvalidCredentials).into_status();
        assert_eq!(status.message(), "invalid credentials");

        let status = AppError::from(ServiceError::InvalidAppId).into_status();
        assert_eq!(status.message(), "invalid app id");
    }

    #[test]
    fn test_store_error_becomes_internal() {
        let err: ServiceError = StoreError::Other(anyhow::anyhow!("connection reset")).into();
        let status = AppError::from(err).into_status();
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), "Internal server error");
    }
}
