//! gRPC implementation of `sso.status.v1.Status`.

use service_core::error::AppError;
use service_core::grpc::IntoStatus;
use tonic::{Request, Response, Status};
use validator::Validate;

use crate::dtos::UserIdRequest;
use crate::grpc::proto::status::{
    status_server::Status as StatusApi, CurrentRoleResponse, IsBannedResponse, LastLoginResponse,
    UserRequest,
};
use crate::middleware::authenticated_user;
use crate::services::StatusService;

pub struct StatusServiceImpl {
    status: StatusService,
}

impl StatusServiceImpl {
    pub fn new(status: StatusService) -> Self {
        Self { status }
    }
}

#[allow(clippy::result_large_err)]
fn validated(request: Request<UserRequest>) -> Result<i64, Status> {
    authenticated_user(&request)?;
    let req = UserIdRequest::from(request.into_inner());
    req.validate()
        .map_err(|e| AppError::from(e).into_status())?;
    Ok(req.user_id)
}

#[tonic::async_trait]
impl StatusApi for StatusServiceImpl {
    async fn is_banned(
        &self,
        request: Request<UserRequest>,
    ) -> Result<Response<IsBannedResponse>, Status> {
        let user_id = validated(request)?;

        let ban = self
            .status
            .is_banned(user_id)
            .await
            .map_err(|e| AppError::from(e).into_status())?;

        Ok(Response::new(IsBannedResponse {
            is_banned: ban.is_banned,
            message: ban.message,
        }))
    }

    async fn last_login(
        &self,
        request: Request<UserRequest>,
    ) -> Result<Response<LastLoginResponse>, Status> {
        let user_id = validated(request)?;

        let last_login = self
            .status
            .last_login(user_id)
            .await
            .map_err(|e| AppError::from(e).into_status())?;

        Ok(Response::new(LastLoginResponse {
            last_login: Some(prost_types::Timestamp {
                seconds: last_login.timestamp(),
                nanos: last_login.timestamp_subsec_nanos() as i32,
            }),
        }))
    }

    async fn current_role(
        &self,
        request: Request<UserRequest>,
    ) -> Result<Response<CurrentRoleResponse>, Status> {
        let user_id = validated(request)?;

        let role = self
            .status
            .current_role(user_id)
            .await
            .map_err(|e| AppError::from(e).into_status())?;

        Ok(Response::new(CurrentRoleResponse {
            username: role.username,
            role: role.role,
        }))
    }
}
