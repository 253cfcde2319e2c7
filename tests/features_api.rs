//! Features behind the category breakers, and the flags they flip.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use gameverse::registry::names::{ANALYTICS, FEEDBACK, GAME_CATALOG, SEARCH_CATEGORY, USER_LIBRARY};
use gameverse::resilience::BreakerState;

mod common;
use common::{build_app, fast_config, get, json_request, send, start_programmable_backend, FlakyStore};

const SERVICES: &str = "/api/admin/services";

#[tokio::test]
async fn test_library_routes() {
    let (router, _) = build_app(&fast_config(), Arc::new(FlakyStore::new())).await;
    let games = "/api/users/alice/games";
    let portal = json!({ "gameName": "Portal 2", "image": null, "slug": "portal-2", "status": 0 });

    let (status, body) = send(&router, json_request("POST", games, portal.clone(), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&router, json_request("POST", games, portal, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("CONFLICT"));

    let update = json!({ "gameName": "Portal 2", "status": 2 });
    let (status, _) = send(&router, json_request("PUT", "/api/users/alice/games/status", update, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&router, get("/api/users/alice/games?status=2")).await;
    assert_eq!(body[0]["slug"], json!("portal-2"));

    let request = axum::http::Request::builder()
        .method("DELETE")
        .uri("/api/users/alice/games?game=Portal%202")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let missing = json!({ "gameName": "Hades", "status": 1 });
    let (status, _) = send(&router, json_request("PUT", "/api/users/alice/games/status", missing, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_routes() {
    let (router, _) = build_app(&fast_config(), Arc::new(FlakyStore::new())).await;

    let (_, body) = send(&router, get("/api/game/42/rating")).await;
    assert_eq!(body["average"], json!(null));

    for (user, rating) in [("alice", 5), ("bob", 2)] {
        let comment = json!({ "username": user, "comment": "played it", "rating": rating });
        let (status, _) = send(&router, json_request("POST", "/api/game/42/comments", comment, None)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let empty = json!({ "username": "carol", "comment": "  " });
    let (status, _) = send(&router, json_request("POST", "/api/game/42/comments", empty, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&router, get("/api/game/42/comments")).await;
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);

    let (_, body) = send(&router, get("/api/game/42/rating")).await;
    assert_eq!(body["average"], json!(3.5));

    let id = comments[0]["_id"].as_str().unwrap();
    let rev = comments[0]["_rev"].as_str().unwrap();
    let request = axum::http::Request::builder()
        .method("DELETE")
        .uri(format!("/api/comments/{id}?rev={rev}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&router, get("/api/game/42/comments")).await;
    assert_eq!(body["comments"].as_array().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_user_store_outage_turns_library_off_then_on() {
    let config = fast_config();
    let store = FlakyStore::new();
    let (router, _) = build_app(&config, Arc::new(store.clone())).await;

    store.set_down(&config.store.users_db, true);
    let (status, body) = send(&router, get("/api/users/alice/games")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "error": "SERVICE_UNAVAILABLE" }));

    let (_, flags) = send(&router, get(SERVICES)).await;
    assert_eq!(flags[USER_LIBRARY], json!(0));
    assert_eq!(flags[FEEDBACK], json!(1));
    assert_eq!(flags[GAME_CATALOG], json!(1));

    store.set_down(&config.store.users_db, false);
    let (status, _) = send(&router, get("/api/users/alice/games")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "still cooling down");

    tokio::time::sleep(Duration::from_millis(config.breakers.user_store.cooldown_ms)).await;
    let (status, body) = send(&router, get("/api/users/alice/games")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, flags) = send(&router, get(SERVICES)).await;
    assert_eq!(flags[USER_LIBRARY], json!(1));
}

#[tokio::test]
async fn test_catalog_passes_upstream_json_through() {
    let addr = start_programmable_backend(|request_line| async move {
        if request_line.contains("ordering=-added") && request_line.contains("key=catalog-key") {
            (200, r#"{"count":1,"results":[{"id":3498,"name":"Grand Theft Auto V"}]}"#.to_string())
        } else if request_line.contains("/api/games/3498?") {
            (200, r#"{"id":3498,"slug":"grand-theft-auto-v"}"#.to_string())
        } else {
            (404, "{}".to_string())
        }
    })
    .await;

    let mut config = fast_config();
    config.catalog.base_url = format!("http://{addr}/api");
    let (router, _) = build_app(&config, Arc::new(FlakyStore::new())).await;

    let (status, body) = send(&router, get("/api/discover")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["id"], json!(3498));

    let (status, body) = send(&router, get("/api/game/3498")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], json!("grand-theft-auto-v"));

    let (status, _) = send(&router, get("/api/search?q=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_outage_turns_off_game_api_flags() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let addr = start_programmable_backend(move |_| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (503, "{}".to_string())
        }
    })
    .await;

    let mut config = fast_config();
    config.catalog.base_url = format!("http://{addr}/api");
    let (router, _) = build_app(&config, Arc::new(FlakyStore::new())).await;

    let (status, _) = send(&router, get("/api/search?q=zelda")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(hits.load(Ordering::SeqCst), config.breakers.game_api.max_retries + 1);

    let (_, flags) = send(&router, get(SERVICES)).await;
    assert_eq!(flags[SEARCH_CATEGORY], json!(0));
    assert_eq!(flags[GAME_CATALOG], json!(0));
    assert_eq!(flags[ANALYTICS], json!(0));
    assert_eq!(flags[USER_LIBRARY], json!(1));
    assert_eq!(flags[FEEDBACK], json!(1));

    let (status, _) = send(&router, get("/api/discover")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(hits.load(Ordering::SeqCst), config.breakers.game_api.max_retries + 1);
}

#[tokio::test]
async fn test_unknown_game_is_404_and_keeps_catalog_on() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let addr = start_programmable_backend(move |request_line| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            if request_line.contains("/api/games/3498?") {
                (200, r#"{"id":3498,"slug":"grand-theft-auto-v"}"#.to_string())
            } else {
                (404, r#"{"detail":"Not found."}"#.to_string())
            }
        }
    })
    .await;

    let mut config = fast_config();
    config.catalog.base_url = format!("http://{addr}/api");
    let (router, state) = build_app(&config, Arc::new(FlakyStore::new())).await;

    for _ in 0..3 {
        let (status, body) = send(&router, get("/api/game/no-such-game")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("NOT_FOUND"));
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3, "a 404 is not retried");
    assert_eq!(state.catalog.breaker().state(), BreakerState::Closed);

    let (_, flags) = send(&router, get(SERVICES)).await;
    assert_eq!(flags[GAME_CATALOG], json!(1));
    assert_eq!(flags[SEARCH_CATEGORY], json!(1));
    assert_eq!(flags[ANALYTICS], json!(1));

    let (status, body) = send(&router, get("/api/game/3498")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(3498));
}

#[tokio::test]
async fn test_stale_comment_rev_is_409_and_keeps_feedback_on() {
    let (router, state) = build_app(&fast_config(), Arc::new(FlakyStore::new())).await;

    let comment = json!({ "username": "alice", "comment": "played it", "rating": 4 });
    let (_, added) = send(&router, json_request("POST", "/api/game/42/comments", comment, None)).await;
    let id = added["_id"].as_str().unwrap();

    for _ in 0..3 {
        let request = axum::http::Request::builder()
            .method("DELETE")
            .uri(format!("/api/comments/{id}?rev=bogus"))
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], json!("CONFLICT"));
    }
    assert_eq!(state.comments.breaker().state(), BreakerState::Closed);

    let (_, flags) = send(&router, get(SERVICES)).await;
    assert_eq!(flags[FEEDBACK], json!(1));

    let (status, body) = send(&router, get("/api/game/42/comments")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comments"].as_array().unwrap().len(), 1);
}
