//! 방 그룹 멤버십 및 메시지 팬아웃
//!
//! 한 연결은 여러 방에 동시에 속할 수 있다. 모든 연산은 동기식이며
//! 전송은 피어별 unbounded 채널에 넣는 것으로 끝난다 (best-effort, 재시도 없음).

use crate::protocol::ServerMessage;
use dashmap::DashMap;
use std::collections::HashSet;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// 피어 세션 정보
pub struct PeerSession {
    pub id: String,
    pub sender: UnboundedSender<ServerMessage>,
    pub rooms: HashSet<String>,
    pub connected_at: Instant,
}

#[derive(Default)]
pub struct Hub {
    /// 피어 세션 (peer_id -> PeerSession)
    peers: DashMap<String, PeerSession>,
    /// 방 멤버 (room_id -> peer_id 집합)
    rooms: DashMap<String, HashSet<String>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, peer_id: &str, sender: UnboundedSender<ServerMessage>) {
        self.peers.insert(
            peer_id.to_string(),
            PeerSession {
                id: peer_id.to_string(),
                sender,
                rooms: HashSet::new(),
                connected_at: Instant::now(),
            },
        );
    }

    /// 연결 해제: 속한 모든 방의 남은 멤버에게 퇴장 알림. 알림을 보낸 방 목록 반환
    pub fn unregister(&self, peer_id: &str) -> Vec<String> {
        let Some((_, session)) = self.peers.remove(peer_id) else {
            return Vec::new();
        };

        tracing::debug!(
            peer_id = %peer_id,
            connected_secs = session.connected_at.elapsed().as_secs(),
            "Unregistering peer"
        );

        let mut rooms: Vec<String> = session.rooms.into_iter().collect();
        rooms.sort();
        for room_id in &rooms {
            self.remove_member(room_id, peer_id);
            self.broadcast_to_room(
                room_id,
                Some(peer_id),
                ServerMessage::UserDisconnected(peer_id.to_string()),
            );
        }
        rooms
    }

    /// 방 참여. 등록되지 않은 피어면 false
    pub fn join(&self, peer_id: &str, room_id: &str) -> bool {
        match self.peers.get_mut(peer_id) {
            Some(mut session) => {
                session.rooms.insert(room_id.to_string());
            }
            None => return false,
        }

        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(peer_id.to_string());

        // 그 사이 연결이 끊겼다면 되돌림
        if !self.peers.contains_key(peer_id) {
            self.remove_member(room_id, peer_id);
            return false;
        }
        true
    }

    /// 방 나가기. 멤버였다면 남은 멤버에게 퇴장 알림 후 true
    pub fn leave(&self, peer_id: &str, room_id: &str) -> bool {
        let was_member = self
            .peers
            .get_mut(peer_id)
            .map(|mut session| session.rooms.remove(room_id))
            .unwrap_or(false);
        if !was_member {
            return false;
        }

        self.remove_member(room_id, peer_id);
        self.broadcast_to_room(
            room_id,
            Some(peer_id),
            ServerMessage::UserDisconnected(peer_id.to_string()),
        );
        true
    }

    /// 방의 특정 피어를 제외하고 브로드캐스트. 전달된 피어 수 반환
    pub fn broadcast_to_room(
        &self,
        room_id: &str,
        except_peer_id: Option<&str>,
        message: ServerMessage,
    ) -> usize {
        // 샤드 락을 잡은 채로 peers에 접근하지 않도록 먼저 복사
        let targets: Vec<String> = match self.rooms.get(room_id) {
            Some(members) => members
                .iter()
                .filter(|id| Some(id.as_str()) != except_peer_id)
                .cloned()
                .collect(),
            None => return 0,
        };

        targets
            .iter()
            .filter(|id| self.send_to_connection(id, message.clone()))
            .count()
    }

    /// 특정 피어에게 메시지 전송. 피어가 없으면 조용히 버림
    pub fn send_to_connection(&self, peer_id: &str, message: ServerMessage) -> bool {
        match self.peers.get(peer_id) {
            Some(session) => session.sender.send(message).is_ok(),
            None => false,
        }
    }

    pub fn members(&self, room_id: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .rooms
            .get(room_id)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    pub fn rooms_of(&self, peer_id: &str) -> Vec<String> {
        let mut rooms: Vec<String> = self
            .peers
            .get(peer_id)
            .map(|s| s.rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    pub fn is_connected(&self, peer_id: &str) -> bool {
        self.peers.contains_key(peer_id)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn remove_member(&self, room_id: &str, peer_id: &str) {
        if let Some(mut members) = self.rooms.get_mut(room_id) {
            members.remove(peer_id);
        }
        self.rooms.remove_if(room_id, |_, members| members.is_empty());
    }
}
