//! 에러 타입 정의

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// 영구 저장소 장애
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("corrupt record for room '{room_id}': {reason}")]
    Corrupt { room_id: String, reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// 방 동기화 처리 중 발생하는 에러
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("code is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("room id must not be empty")]
    InvalidRoomId,
}

impl SyncError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidRoomId => StatusCode::BAD_REQUEST,
        }
    }

    /// 클라이언트에 노출할 메시지. 저장소 장애 내용은 로그에만 남긴다.
    pub fn public_message(&self, fallback: &str) -> String {
        match self {
            Self::Store(_) => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

/// REST 응답용 에러. 본문은 항상 `{"error": ...}`
#[derive(Debug)]
pub enum ApiError {
    /// 동기화 실패 (클라이언트 메시지 + 원인)
    Sync {
        message: &'static str,
        source: SyncError,
    },
    /// 요청 본문 파싱 실패
    Body(JsonRejection),
}

impl ApiError {
    pub fn new(message: &'static str, source: impl Into<SyncError>) -> Self {
        Self::Sync {
            message,
            source: source.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Sync { source, .. } => source.status_code(),
            Self::Body(rejection) => rejection.status(),
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            Self::Sync { message, source } => source.public_message(message),
            Self::Body(rejection) => rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.public_message(),
        }));
        (self.status_code(), body).into_response()
    }
}
