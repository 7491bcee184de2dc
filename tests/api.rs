//! REST 엔드포인트 통합 테스트

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use codeshare_sync::config::Config;
use codeshare_sync::error::StoreError;
use codeshare_sync::server::build_router;
use codeshare_sync::state::AppState;
use codeshare_sync::store::{MemoryStore, RoomPatch, RoomRecord, RoomStore, StoreResult};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(store: Arc<dyn RoomStore>) -> Router {
    let mut config = Config::for_testing();
    config.max_code_bytes = 32;
    build_router(AppState::with_store(config, store))
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// 모든 연산이 실패하는 저장소
struct DownStore;

#[async_trait]
impl RoomStore for DownStore {
    async fn get(&self, _: &str) -> StoreResult<Option<RoomRecord>> {
        Err(StoreError::Backend("connection refused".into()))
    }
    async fn merge(&self, _: &str, _: RoomPatch) -> StoreResult<()> {
        Err(StoreError::Backend("connection refused".into()))
    }
    async fn delete(&self, _: &str) -> StoreResult<()> {
        Err(StoreError::Backend("connection refused".into()))
    }
    async fn list(&self) -> StoreResult<Vec<(String, RoomRecord)>> {
        Err(StoreError::Backend("connection refused".into()))
    }
}

#[tokio::test]
async fn absent_room_reads_as_empty_code() {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone());

    let (status, body) = call(&app, get("/api/code/nowhere")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "code": "" }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn saved_code_is_read_back_exactly() {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone());

    let (status, body) = call(
        &app,
        post_json("/api/code/room-1", json!({ "code": "print('hi')\n" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Code saved successfully" }));

    let (_, body) = call(&app, get("/api/code/room-1")).await;
    assert_eq!(body, json!({ "code": "print('hi')\n" }));
    assert!(store.get("room-1").await.unwrap().unwrap().is_timestamped());
}

#[tokio::test]
async fn last_write_wins_without_merging() {
    let app = app_with(Arc::new(MemoryStore::new()));

    call(&app, post_json("/api/code/r", json!({ "code": "first" }))).await;
    call(&app, post_json("/api/code/r", json!({ "code": "second" }))).await;

    let (_, body) = call(&app, get("/api/code/r")).await;
    assert_eq!(body, json!({ "code": "second" }));
}

#[tokio::test]
async fn write_to_untimestamped_record_keeps_it_untimestamped() {
    let store = Arc::new(MemoryStore::new());
    store.insert_raw(
        "manual",
        RoomRecord {
            code: Some("seed".into()),
            last_accessed_at: None,
        },
    );
    let app = app_with(store.clone());

    call(&app, post_json("/api/code/manual", json!({ "code": "edited" }))).await;
    call(&app, get("/api/code/manual")).await;

    let record = store.get("manual").await.unwrap().unwrap();
    assert_eq!(record.text(), "edited");
    assert!(!record.is_timestamped());
}

#[tokio::test]
async fn oversized_code_is_rejected_with_413() {
    let app = app_with(Arc::new(MemoryStore::new()));

    let (status, body) = call(
        &app,
        post_json("/api/code/r", json!({ "code": "x".repeat(33) })),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({ "error": "code is 33 bytes, limit is 32" }));
}

#[tokio::test]
async fn malformed_save_body_gets_json_error() {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone());

    let (status, body) = call(&app, post_json("/api/code/r", json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("code"));

    let request = Request::builder()
        .method("POST")
        .uri("/api/code/r")
        .body(Body::from("code=1"))
        .unwrap();
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["error"].is_string());
    assert!(store.is_empty());
}

#[tokio::test]
async fn new_room_ids_are_valid_and_distinct() {
    let app = app_with(Arc::new(MemoryStore::new()));

    let (status, first) = call(&app, get("/api/new")).await;
    let (_, second) = call(&app, get("/api/new")).await;

    assert_eq!(status, StatusCode::OK);
    let first = first["roomId"].as_str().unwrap().to_string();
    let second = second["roomId"].as_str().unwrap().to_string();
    assert!(!first.is_empty());
    assert!(uuid::Uuid::parse_str(&first).is_ok());
    assert_ne!(first, second);
}

#[tokio::test]
async fn keep_alive_sweeps_empty_and_stale_rooms() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    let record = |code: &str, age: i64| RoomRecord {
        code: Some(code.to_string()),
        last_accessed_at: Some(now - Duration::days(age)),
    };
    store.insert_raw("stale-full", record("content", 31));
    store.insert_raw("fresh-blank", record("  ", 1));
    store.insert_raw("stale-blank", record("", 60));
    store.insert_raw("fresh-full", record("content", 1));
    store.insert_raw(
        "untimed",
        RoomRecord {
            code: None,
            last_accessed_at: None,
        },
    );
    let app = app_with(store.clone());

    let (status, body) = call(&app, get("/api/keep-alive")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "Server is alive", "deletedCount": 3, "failedCount": 0 })
    );
    let mut remaining: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    remaining.sort();
    assert_eq!(remaining, vec!["fresh-full", "untimed"]);
}

#[tokio::test]
async fn storage_faults_return_500_json() {
    let app = app_with(Arc::new(DownStore));

    let (status, body) = call(&app, get("/api/code/r")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch code" }));

    let (status, body) = call(&app, post_json("/api/code/r", json!({ "code": "x" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to save code" }));

    let (status, body) = call(&app, get("/api/keep-alive")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Server is alive but error in cleanup");
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app_with(Arc::new(MemoryStore::new()));

    let (status, body) = call(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["peers"], 0);
}
