//! REST 핸들러 (비실시간 클라이언트용)

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct CodeResponse {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveCodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoomResponse {
    pub room_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeepAliveResponse {
    pub message: String,
    pub deleted_count: usize,
    pub failed_count: usize,
}

pub async fn index_handler() -> Html<&'static str> {
    Html("<h1>Codeshare Sync Server</h1><p>WebSocket endpoint: /ws</p>")
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "server": "codeshare-sync-rs",
        "peers": state.hub.peer_count(),
        "rooms": state.hub.room_count(),
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}

/// GET /api/code/:room_id
pub async fn get_code(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<CodeResponse>, ApiError> {
    match state.sync.read_room(&room_id).await {
        Ok(code) => Ok(Json(CodeResponse { code })),
        Err(e) => {
            tracing::error!(room_id = %room_id, error = %e, "Error fetching code");
            Err(ApiError::new("Failed to fetch code", e))
        }
    }
}

/// POST /api/code/:room_id
pub async fn save_code(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    body: Result<Json<SaveCodeRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::warn!(room_id = %room_id, error = %rejection, "Rejected save request body");
        ApiError::from(rejection)
    })?;

    match state.sync.write_room(&room_id, body.code).await {
        Ok(()) => Ok(Json(MessageResponse {
            message: "Code saved successfully".to_string(),
        })),
        Err(e) => {
            tracing::error!(room_id = %room_id, error = %e, "Error saving code");
            Err(ApiError::new("Failed to save code", e))
        }
    }
}

/// GET /api/new
pub async fn new_room() -> Json<NewRoomResponse> {
    Json(NewRoomResponse {
        room_id: Uuid::new_v4().to_string(),
    })
}

/// GET /api/keep-alive: 생존 확인 겸 보존 정리 실행
pub async fn keep_alive(State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("Keep-alive request accepted");

    match state.sweeper.sweep().await {
        Ok(report) => Json(KeepAliveResponse {
            message: "Server is alive".to_string(),
            deleted_count: report.deleted_count,
            failed_count: report.failed_count,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Error in keep-alive cleanup");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "message": "Server is alive but error in cleanup",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
