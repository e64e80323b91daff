//! End-to-end tests through the real tonic server, gate included.

mod common;

use common::{with_token, TestApp, TEST_APP_ID};
use sso_service::grpc::proto::{
    auth::{IsAdminRequest, LoginRequest, RegisterRequest},
    permissions::PermissionRequest,
    status::UserRequest,
};
use sso_service::models::PermissionKind;
use tonic::Code;

async fn register_and_login(app: &TestApp) -> (i64, String) {
    let mut client = app.auth_client().await;

    let user_id = client
        .register(RegisterRequest {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "password123".to_string(),
        })
        .await
        .expect("Register failed")
        .into_inner()
        .user_id;

    let token = client
        .login(LoginRequest {
            email: "alice@x.com".to_string(),
            password: "password123".to_string(),
            app_id: TEST_APP_ID,
        })
        .await
        .expect("Login failed")
        .into_inner()
        .token;

    (user_id, token)
}

#[tokio::test]
async fn test_register_login_and_is_admin() {
    let app = TestApp::spawn().await;
    let (user_id, token) = register_and_login(&app).await;
    assert!(user_id > 0);
    assert!(!token.is_empty());

    app.store.make_admin(user_id);

    let mut client = app.auth_client().await;
    let response = client
        .is_admin(with_token(IsAdminRequest { user_id }, &token))
        .await
        .expect("IsAdmin failed");
    assert!(response.into_inner().is_admin);
}

#[tokio::test]
async fn test_register_rejects_invalid_input() {
    let app = TestApp::spawn().await;
    let mut client = app.auth_client().await;

    let status = client
        .register(RegisterRequest {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(app.store.save_user_calls(), 0);
}

#[tokio::test]
async fn test_duplicate_register_is_already_exists() {
    let app = TestApp::spawn().await;
    register_and_login(&app).await;

    let mut client = app.auth_client().await;
    let status = client
        .register(RegisterRequest {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "password123".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::AlreadyExists);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_invalid_argument() {
    let app = TestApp::spawn().await;
    register_and_login(&app).await;

    let mut client = app.auth_client().await;
    let status = client
        .login(LoginRequest {
            email: "alice@x.com".to_string(),
            password: "wrong-password".to_string(),
            app_id: TEST_APP_ID,
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "invalid credentials");
}

#[tokio::test]
async fn test_protected_calls_without_token_are_unauthenticated() {
    let app = TestApp::spawn().await;

    let mut permissions = app.permissions_client().await;
    let status = permissions
        .check_delete(PermissionRequest {
            user_id: 1,
            app_id: TEST_APP_ID,
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
    assert_eq!(app.store.permission_queries(), 0);

    let mut auth = app.auth_client().await;
    let status = auth
        .is_admin(with_token(IsAdminRequest { user_id: 1 }, "garbage"))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
}

#[tokio::test]
async fn test_permission_checks_use_cache() {
    let app = TestApp::spawn().await;
    let (user_id, token) = register_and_login(&app).await;
    app.store.grant(user_id, TEST_APP_ID, PermissionKind::Download);

    let mut client = app.permissions_client().await;
    let request = PermissionRequest {
        user_id,
        app_id: TEST_APP_ID,
    };

    for _ in 0..2 {
        let allowed = client
            .check_download(with_token(request.clone(), &token))
            .await
            .expect("CheckDownload failed")
            .into_inner()
            .permission;
        assert!(allowed);
    }
    assert_eq!(app.store.permission_queries(), 1);

    let denied = client
        .check_change_option(with_token(request, &token))
        .await
        .unwrap()
        .into_inner()
        .permission;
    assert!(!denied);
}

#[tokio::test]
async fn test_permission_check_for_unknown_app_is_permission_denied() {
    let app = TestApp::spawn().await;
    let (user_id, token) = register_and_login(&app).await;

    let mut client = app.permissions_client().await;
    let status = client
        .check_update(with_token(
            PermissionRequest {
                user_id,
                app_id: 404,
            },
            &token,
        ))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::PermissionDenied);
}

#[tokio::test]
async fn test_status_queries() {
    let app = TestApp::spawn().await;
    let (user_id, token) = register_and_login(&app).await;

    let mut client = app.status_client().await;

    let banned = client
        .is_banned(with_token(UserRequest { user_id }, &token))
        .await
        .unwrap()
        .into_inner();
    assert!(!banned.is_banned);
    assert!(!banned.message.is_empty());

    let last_login = client
        .last_login(with_token(UserRequest { user_id }, &token))
        .await
        .unwrap()
        .into_inner()
        .last_login
        .expect("last_login should be set after login");
    assert!(last_login.seconds > 0);

    let role = client
        .current_role(with_token(UserRequest { user_id }, &token))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(role.username, "alice");
    assert_eq!(role.role, "user");

    let status = client
        .current_role(with_token(UserRequest { user_id: 404 }, &token))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn test_grpc_health_is_public() {
    let app = TestApp::spawn().await;

    let channel = tonic::transport::Channel::from_shared(app.grpc_addr())
        .unwrap()
        .connect()
        .await
        .unwrap();
    let mut client = tonic_health::pb::health_client::HealthClient::new(channel);

    let response = client
        .check(tonic_health::pb::HealthCheckRequest {
            service: "sso.auth.v1.Auth".to_string(),
        })
        .await
        .expect("Health check should not require a token");
    assert_eq!(
        response.into_inner().status,
        tonic_health::pb::health_check_response::ServingStatus::Serving as i32
    );
}

#[tokio::test]
async fn test_http_health_endpoint() {
    // Arrange
    let app = TestApp::spawn().await;
    let client = app.client();

    // Act
    let response = client
        .get(format!("{}/health", app.http_address()))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "sso-service");
    assert_eq!(body["checks"]["postgres"], "in-memory");
    assert_eq!(body["checks"]["redis"], "up");
}

#[tokio::test]
async fn test_http_metrics_endpoint() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .get(format!("{}/metrics", app.http_address()))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
}
