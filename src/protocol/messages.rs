//! 클라이언트-서버 메시지 프로토콜 정의
//!
//! 모든 프레임은 `{"type": "<event>", "payload": ...}` 형태의 JSON 텍스트.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 클라이언트 → 서버 메시지
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    // Connection
    Heartbeat,

    // Room Management
    JoinRoom(String),
    LeaveRoom(String),

    // Editing
    CodeChange { room_id: String, code: String },

    // WebRTC Signaling
    Offer {
        #[serde(default)]
        room_id: Option<String>,
        offer: Value,
        to: String,
    },
    Answer {
        #[serde(default)]
        room_id: Option<String>,
        answer: Value,
        to: String,
    },
    IceCandidate {
        #[serde(default)]
        room_id: Option<String>,
        candidate: Value,
        to: String,
    },
}

/// 서버 → 클라이언트 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    // Connection
    Connected { socket_id: String },
    HeartbeatAck,
    Error(String),

    // Room Events
    LoadCode(String),
    CodeChange(String),
    UserConnected(String),
    UserDisconnected(String),

    // WebRTC Signaling
    Offer { offer: Value, from: String },
    Answer { answer: Value, from: String },
    IceCandidate { candidate: Value, from: String },
}

impl ServerMessage {
    /// 이벤트 이름 (로그용)
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::HeartbeatAck => "heartbeat-ack",
            Self::Error(_) => "error",
            Self::LoadCode(_) => "load-code",
            Self::CodeChange(_) => "code-change",
            Self::UserConnected(_) => "user-connected",
            Self::UserDisconnected(_) => "user-disconnected",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
        }
    }
}
