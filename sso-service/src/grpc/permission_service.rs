//! gRPC implementation of `sso.permissions.v1.Permissions`.

use service_core::error::AppError;
use service_core::grpc::{GrpcResult, IntoStatus};
use tonic::{Request, Response, Status};
use validator::Validate;

use crate::dtos::PermissionRequest as ValidatedRequest;
use crate::grpc::proto::permissions::{
    permissions_server::Permissions, PermissionRequest, PermissionResponse,
};
use crate::middleware::authenticated_user;
use crate::models::PermissionKind;
use crate::services::PermissionService;

pub struct PermissionServiceImpl {
    permissions: PermissionService,
}

impl PermissionServiceImpl {
    pub fn new(permissions: PermissionService) -> Self {
        Self { permissions }
    }

    async fn check(
        &self,
        kind: PermissionKind,
        request: Request<PermissionRequest>,
    ) -> GrpcResult<PermissionResponse> {
        let caller = authenticated_user(&request)?;
        let req = ValidatedRequest::from(request.into_inner());
        req.validate()
            .map_err(|e| AppError::from(e).into_status())?;

        tracing::debug!(
            caller = caller.user_id(),
            user_id = req.user_id,
            app_id = req.app_id,
            kind = %kind,
            "Permission check"
        );

        let result = match kind {
            PermissionKind::Delete => self.permissions.check_delete(req.user_id, req.app_id).await,
            PermissionKind::Update => self.permissions.check_update(req.user_id, req.app_id).await,
            PermissionKind::Download => {
                self.permissions
                    .check_download(req.user_id, req.app_id)
                    .await
            }
            PermissionKind::ChangeOption => {
                self.permissions
                    .check_change_option(req.user_id, req.app_id)
                    .await
            }
        };

        let permission = result.map_err(|e| AppError::from(e).into_status())?;
        Ok(Response::new(PermissionResponse { permission }))
    }
}

#[tonic::async_trait]
impl Permissions for PermissionServiceImpl {
    async fn check_delete(
        &self,
        request: Request<PermissionRequest>,
    ) -> Result<Response<PermissionResponse>, Status> {
        self.check(PermissionKind::Delete, request).await
    }

    async fn check_update(
        &self,
        request: Request<PermissionRequest>,
    ) -> Result<Response<PermissionResponse>, Status> {
        self.check(PermissionKind::Update, request).await
    }

    async fn check_download(
        &self,
        request: Request<PermissionRequest>,
    ) -> Result<Response<PermissionResponse>, Status> {
        self.check(PermissionKind::Download, request).await
    }

    async fn check_change_option(
        &self,
        request: Request<PermissionRequest>,
    ) -> Result<Response<PermissionResponse>, Status> {
        self.check(PermissionKind::ChangeOption, request).await
    }
}
