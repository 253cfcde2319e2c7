//! Service registry over HTTP: flag map, admin updates and error mapping.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use gameverse::registry::names::{ANALYTICS, FEEDBACK, USER_LIBRARY};

mod common;
use common::{build_app, fast_config, get, json_request, send, FlakyStore};

const SERVICES: &str = "/api/admin/services";

#[tokio::test]
async fn test_health() {
    let (router, _) = build_app(&fast_config(), Arc::new(FlakyStore::new())).await;
    let (status, body) = send(&router, get("/api")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_seeded_flags_are_all_on() {
    let (router, _) = build_app(&fast_config(), Arc::new(FlakyStore::new())).await;
    let (status, body) = send(&router, get(SERVICES)).await;

    assert_eq!(status, StatusCode::OK);
    let map = body.as_object().unwrap();
    assert_eq!(map.len(), 5);
    assert!(map.values().all(|v| v == &json!(1)));
}

#[tokio::test]
async fn test_set_flag_requires_bearer_key() {
    let (router, _) = build_app(&fast_config(), Arc::new(FlakyStore::new())).await;
    let uri = "/api/admin/services/User%20Library";

    let (status, _) = send(&router, json_request("PUT", uri, json!({ "status": 0 }), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, json_request("PUT", uri, json!({ "status": 0 }), Some("wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(&router, get(SERVICES)).await;
    assert_eq!(body[USER_LIBRARY], json!(1));
}

#[tokio::test]
async fn test_set_flag_updates_snapshot() {
    let (router, state) = build_app(&fast_config(), Arc::new(FlakyStore::new())).await;

    let (status, body) = send(
        &router,
        json_request("PUT", "/api/admin/services/user%20library", json!({ "status": 0 }), Some("test-key")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service_name"], json!(USER_LIBRARY));
    assert_eq!(body["status"], json!(0));

    let (_, body) = send(&router, get(SERVICES)).await;
    assert_eq!(body[USER_LIBRARY], json!(0));
    assert_eq!(body[FEEDBACK], json!(1));
    assert_eq!(state.registry.cached().get(USER_LIBRARY).map(|s| s.is_on()), Some(false));
}

#[tokio::test]
async fn test_unknown_flag_is_404_and_changes_nothing() {
    let (router, _) = build_app(&fast_config(), Arc::new(FlakyStore::new())).await;
    let (_, before) = send(&router, get(SERVICES)).await;

    let (status, body) = send(
        &router,
        json_request("PUT", "/api/admin/services/Unknown%20Service", json!({ "status": 1 }), Some("test-key")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("NOT_FOUND"));

    let (_, after) = send(&router, get(SERVICES)).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_invalid_status_is_rejected() {
    let (router, _) = build_app(&fast_config(), Arc::new(FlakyStore::new())).await;
    let (status, _) = send(
        &router,
        json_request("PUT", "/api/admin/services/User%20Library", json!({ "status": 7 }), Some("test-key")),
    )
    .await;
    assert!(status.is_client_error());

    let (_, body) = send(&router, get(SERVICES)).await;
    assert_eq!(body[ANALYTICS], json!(1));
}

#[tokio::test]
async fn test_registry_outage_is_503() {
    let config = fast_config();
    let store = FlakyStore::new();
    let (router, _) = build_app(&config, Arc::new(store.clone())).await;

    store.set_down(&config.store.registry_db, true);
    let (status, body) = send(&router, get(SERVICES)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "error": "SERVICE_UNAVAILABLE" }));

    // Breaker now open: fast-fail without touching the store.
    let calls = store.calls();
    let (status, _) = send(&router, get(SERVICES)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(store.calls(), calls);
}

#[tokio::test]
async fn test_breakers_endpoint_lists_every_breaker() {
    let (router, _) = build_app(&fast_config(), Arc::new(FlakyStore::new())).await;

    let (status, _) = send(&router, get("/api/admin/breakers")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = axum::http::Request::builder()
        .uri("/api/admin/breakers")
        .header("authorization", "Bearer test-key")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);

    let categories: Vec<&str> = body.as_array().unwrap().iter().map(|b| b["category"].as_str().unwrap()).collect();
    assert_eq!(categories, vec!["game_api", "user_store", "comment_store", "none"]);
    assert!(body.as_array().unwrap().iter().all(|b| b["state"] == json!("CLOSED")));
}
