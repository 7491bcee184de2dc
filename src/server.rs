//! 라우터 및 WebSocket 연결 루프

use crate::handlers::{self, api};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::sync::EditWriter;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// 라우터 설정
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::index_handler))
        .route("/health", get(api::health_handler))
        .route("/ws", get(ws_handler))
        .route("/api/code/:room_id", get(api::get_code).post(api::save_code))
        .route("/api/new", get(api::new_room))
        .route("/api/keep-alive", get(api::keep_alive))
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins = if state.config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            state
                .config
                .cors_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // 연결 처리
    let peer_id = handlers::handle_connection(&state, tx);
    let writer = EditWriter::spawn(state.sync.clone(), state.hub.clone(), peer_id.clone());

    // 송신 태스크
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to encode server message"),
            }
        }
    });

    // 수신 처리
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => handle_client_message(&state, &peer_id, &writer, msg).await,
                Err(e) => {
                    tracing::debug!(peer_id = %peer_id, error = %e, "Ignoring malformed frame");
                }
            },
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!(peer_id = %peer_id, error = %e, "WebSocket receive error");
                break;
            }
            _ => {}
        }
    }

    // 연결 해제
    handlers::handle_disconnect(&state, &peer_id);
    writer.finish().await;
    send_task.abort();
}

async fn handle_client_message(
    state: &AppState,
    peer_id: &str,
    writer: &EditWriter,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::Heartbeat => {
            handlers::handle_heartbeat(state, peer_id);
        }
        ClientMessage::JoinRoom(room_id) => {
            handlers::handle_join_room(state, peer_id, &room_id).await;
        }
        ClientMessage::LeaveRoom(room_id) => {
            handlers::handle_leave_room(state, peer_id, &room_id);
        }
        ClientMessage::CodeChange { room_id, code } => {
            handlers::handle_code_change(state, writer, peer_id, &room_id, code);
        }
        ClientMessage::Offer { offer, to, .. } => {
            handlers::handle_offer(state, peer_id, &to, offer);
        }
        ClientMessage::Answer { answer, to, .. } => {
            handlers::handle_answer(state, peer_id, &to, answer);
        }
        ClientMessage::IceCandidate { candidate, to, .. } => {
            handlers::handle_ice_candidate(state, peer_id, &to, candidate);
        }
    }
}
