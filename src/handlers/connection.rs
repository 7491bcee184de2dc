//! 연결 핸들러

use crate::protocol::ServerMessage;
use crate::state::AppState;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// 새 연결 처리
pub fn handle_connection(state: &AppState, sender: UnboundedSender<ServerMessage>) -> String {
    let peer_id = Uuid::new_v4().to_string();

    state.hub.register(&peer_id, sender);
    state.hub.send_to_connection(
        &peer_id,
        ServerMessage::Connected {
            socket_id: peer_id.clone(),
        },
    );

    tracing::info!(peer_id = %peer_id, "New connection established");
    peer_id
}

/// 연결 해제 처리
pub fn handle_disconnect(state: &AppState, peer_id: &str) {
    let rooms = state.hub.unregister(peer_id);
    tracing::info!(peer_id = %peer_id, rooms = ?rooms, "Connection closed");
}

/// Heartbeat 처리
pub fn handle_heartbeat(state: &AppState, peer_id: &str) {
    state
        .hub
        .send_to_connection(peer_id, ServerMessage::HeartbeatAck);
}
