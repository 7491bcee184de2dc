//! WebRTC 시그널링 핸들러
//!
//! 대상 연결에게만 전달하며, 응답할 수 있도록 보낸 쪽 ID를 붙인다.

use crate::protocol::ServerMessage;
use crate::state::AppState;
use serde_json::Value;

/// Offer 처리
pub fn handle_offer(state: &AppState, from_peer_id: &str, target: &str, offer: Value) {
    let message = ServerMessage::Offer {
        offer,
        from: from_peer_id.to_string(),
    };
    relay(state, from_peer_id, target, message);
}

/// Answer 처리
pub fn handle_answer(state: &AppState, from_peer_id: &str, target: &str, answer: Value) {
    let message = ServerMessage::Answer {
        answer,
        from: from_peer_id.to_string(),
    };
    relay(state, from_peer_id, target, message);
}

/// ICE Candidate 처리
pub fn handle_ice_candidate(state: &AppState, from_peer_id: &str, target: &str, candidate: Value) {
    let message = ServerMessage::IceCandidate {
        candidate,
        from: from_peer_id.to_string(),
    };
    relay(state, from_peer_id, target, message);
}

fn relay(state: &AppState, from_peer_id: &str, target: &str, message: ServerMessage) {
    let event = message.event_name();
    let delivered = state.hub.send_to_connection(target, message);

    tracing::debug!(
        from = %from_peer_id,
        to = %target,
        event = event,
        delivered = delivered,
        "Relayed signaling message"
    );
}
