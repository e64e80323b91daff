mod common;

use common::{test_store, TEST_APP_ID};
use sso_service::models::PermissionKind;
use sso_service::services::{Cache, MockCache, MockFailure, PermissionService, ServiceError};
use std::sync::Arc;
use std::time::Duration;

const USER_ID: i64 = 7;

fn setup() -> (
    PermissionService,
    Arc<sso_service::services::MockStore>,
    Arc<MockCache>,
) {
    let store = test_store();
    let cache = Arc::new(MockCache::new());
    let service = PermissionService::new(store.clone(), cache.clone());
    (service, store, cache)
}

async fn check(
    service: &PermissionService,
    kind: PermissionKind,
    user_id: i64,
    app_id: i64,
) -> Result<bool, ServiceError> {
    match kind {
        PermissionKind::Delete => service.check_delete(user_id, app_id).await,
        PermissionKind::Download => service.check_download(user_id, app_id).await,
        PermissionKind::Update => service.check_update(user_id, app_id).await,
        PermissionKind::ChangeOption => service.check_change_option(user_id, app_id).await,
    }
}

#[tokio::test]
async fn test_second_check_is_served_from_cache() {
    for kind in PermissionKind::ALL {
        let (service, store, _cache) = setup();
        store.grant(USER_ID, TEST_APP_ID, kind);

        assert!(check(&service, kind, USER_ID, TEST_APP_ID).await.unwrap());
        assert_eq!(store.permission_queries(), 1, "{} first check", kind);

        assert!(check(&service, kind, USER_ID, TEST_APP_ID).await.unwrap());
        assert_eq!(store.permission_queries(), 1, "{} second check", kind);
    }
}

#[tokio::test]
async fn test_denied_decision_is_cached_too() {
    let (service, store, cache) = setup();

    assert!(!service.check_delete(USER_ID, TEST_APP_ID).await.unwrap());
    assert!(!service.check_delete(USER_ID, TEST_APP_ID).await.unwrap());
    assert_eq!(store.permission_queries(), 1);

    let cached = cache
        .get(&PermissionKind::Delete.cache_key(USER_ID, TEST_APP_ID))
        .await
        .unwrap();
    assert_eq!(cached.as_deref(), Some(r#"{"perm":false}"#));
}

#[tokio::test]
async fn test_kinds_are_cached_independently() {
    let (service, store, _cache) = setup();
    store.grant(USER_ID, TEST_APP_ID, PermissionKind::Download);

    assert!(service.check_download(USER_ID, TEST_APP_ID).await.unwrap());
    assert!(!service.check_update(USER_ID, TEST_APP_ID).await.unwrap());
    assert_eq!(store.permission_queries(), 2);
}

#[tokio::test]
async fn test_cached_entry_wins_over_storage() {
    let (service, store, cache) = setup();
    cache.insert_raw(
        &PermissionKind::Update.cache_key(USER_ID, TEST_APP_ID),
        r#"{"perm":true}"#,
        Duration::from_secs(60),
    );

    assert!(service.check_update(USER_ID, TEST_APP_ID).await.unwrap());
    assert_eq!(store.permission_queries(), 0);
}

#[tokio::test]
async fn test_expired_entry_goes_back_to_storage() {
    let (service, store, cache) = setup();
    cache.insert_raw(
        &PermissionKind::Delete.cache_key(USER_ID, TEST_APP_ID),
        r#"{"perm":true}"#,
        Duration::from_millis(10),
    );
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert!(!service.check_delete(USER_ID, TEST_APP_ID).await.unwrap());
    assert_eq!(store.permission_queries(), 1);
}

#[tokio::test]
async fn test_unknown_app_is_forbidden() {
    let (service, _store, cache) = setup();

    let result = service.check_delete(USER_ID, 404).await;
    assert!(matches!(result, Err(ServiceError::Forbidden)));
    assert_eq!(cache.set_count(), 0);
}

#[tokio::test]
async fn test_cache_read_error_falls_back_to_storage() {
    let (service, store, cache) = setup();
    store.grant(USER_ID, TEST_APP_ID, PermissionKind::ChangeOption);
    cache.fail_reads(true);

    assert!(service
        .check_change_option(USER_ID, TEST_APP_ID)
        .await
        .unwrap());
    assert!(service
        .check_change_option(USER_ID, TEST_APP_ID)
        .await
        .unwrap());
    assert_eq!(store.permission_queries(), 2);
}

#[tokio::test]
async fn test_cache_write_error_still_returns_decision() {
    let (service, store, cache) = setup();
    store.grant(USER_ID, TEST_APP_ID, PermissionKind::Download);
    cache.fail_writes(true);

    assert!(service.check_download(USER_ID, TEST_APP_ID).await.unwrap());
    assert_eq!(cache.set_count(), 1);
}

#[tokio::test]
async fn test_storage_error_is_internal() {
    let (service, store, _cache) = setup();
    store.fail(MockFailure::PermissionLookup);

    let result = service.check_update(USER_ID, TEST_APP_ID).await;
    assert!(matches!(result, Err(ServiceError::Internal(_))));

    store.clear_failures();
    assert!(!service.check_update(USER_ID, TEST_APP_ID).await.unwrap());
}
