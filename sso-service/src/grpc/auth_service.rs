//! gRPC implementation of `sso.auth.v1.Auth`.

use service_core::error::AppError;
use service_core::grpc::IntoStatus;
use tonic::{Request, Response, Status};
use validator::Validate;

use crate::dtos;
use crate::grpc::proto::auth::{
    auth_server::Auth, IsAdminRequest, IsAdminResponse, LoginRequest, LoginResponse,
    RegisterRequest, RegisterResponse,
};
use crate::middleware::authenticated_user;
use crate::services::AuthService;
use crate::utils::Password;

pub struct AuthServiceImpl {
    auth: AuthService,
}

impl AuthServiceImpl {
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }
}

#[tonic::async_trait]
impl Auth for AuthServiceImpl {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let req = dtos::RegisterRequest::from(request.into_inner());
        req.validate()
            .map_err(|e| AppError::from(e).into_status())?;

        let user_id = self
            .auth
            .register(req.username, req.email, Password::new(req.password))
            .await
            .map_err(|e| AppError::from(e).into_status())?;

        Ok(Response::new(RegisterResponse { user_id }))
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let req = dtos::LoginRequest::from(request.into_inner());
        req.validate()
            .map_err(|e| AppError::from(e).into_status())?;

        let token = self
            .auth
            .login(&req.email, Password::new(req.password), req.app_id)
            .await
            .map_err(|e| AppError::from(e).into_status())?;

        Ok(Response::new(LoginResponse { token }))
    }

    async fn is_admin(
        &self,
        request: Request<IsAdminRequest>,
    ) -> Result<Response<IsAdminResponse>, Status> {
        authenticated_user(&request)?;
        let req = dtos::UserIdRequest::from(request.into_inner());
        req.validate()
            .map_err(|e| AppError::from(e).into_status())?;

        let is_admin = self
            .auth
            .is_admin(req.user_id)
            .await
            .map_err(|e| AppError::from(e).into_status())?;

        Ok(Response::new(IsAdminResponse { is_admin }))
    }
}
