//! 방 참여 및 편집 핸들러

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::sync::EditWriter;

/// 방 참여 처리: 현재 코드를 참여자에게, 입장 알림을 나머지에게
pub async fn handle_join_room(state: &AppState, peer_id: &str, room_id: &str) {
    match state.sync.join_room(&state.hub, peer_id, room_id).await {
        Ok(code) => {
            let room_id = room_id.trim();
            state
                .hub
                .send_to_connection(peer_id, ServerMessage::LoadCode(code));
            let notified = state.hub.broadcast_to_room(
                room_id,
                Some(peer_id),
                ServerMessage::UserConnected(peer_id.to_string()),
            );

            tracing::info!(
                peer_id = %peer_id,
                room_id = %room_id,
                notified = notified,
                "User joined room"
            );
        }
        Err(e) => {
            tracing::error!(peer_id = %peer_id, room_id = %room_id, error = %e, "Error joining room");
            state.hub.send_to_connection(
                peer_id,
                ServerMessage::Error(e.public_message("Failed to join room")),
            );
        }
    }
}

/// 방 나가기 처리
pub fn handle_leave_room(state: &AppState, peer_id: &str, room_id: &str) {
    if state.hub.leave(peer_id, room_id.trim()) {
        tracing::info!(peer_id = %peer_id, room_id = %room_id, "User left room");
    }
}

/// 코드 변경: 나머지 멤버에게 즉시 중계하고 저장은 연결별 큐에 맡긴다
pub fn handle_code_change(
    state: &AppState,
    writer: &EditWriter,
    peer_id: &str,
    room_id: &str,
    code: String,
) {
    let room_id = match state.sync.validate_edit(room_id, &code) {
        Ok(room_id) => room_id,
        Err(e) => {
            tracing::warn!(peer_id = %peer_id, error = %e, "Rejected code change");
            state
                .hub
                .send_to_connection(peer_id, ServerMessage::Error(e.to_string()));
            return;
        }
    };

    let relayed = state.hub.broadcast_to_room(
        &room_id,
        Some(peer_id),
        ServerMessage::CodeChange(code.clone()),
    );

    if !writer.submit(room_id.clone(), code) {
        tracing::error!(peer_id = %peer_id, room_id = %room_id, "Edit writer is closed");
        state.hub.send_to_connection(
            peer_id,
            ServerMessage::Error("Failed to save code".to_string()),
        );
    }

    tracing::debug!(peer_id = %peer_id, room_id = %room_id, relayed = relayed, "Relayed code change");
}
