//! 방 텍스트 동기화 및 영속화
//!
//! 타임스탬프 규칙:
//! - 읽기: 레코드에 `last_accessed_at`이 이미 있을 때만 갱신. 없는 방은 만들지 않는다.
//! - 쓰기: 새 레코드이거나 이미 타임스탬프가 있는 레코드일 때만 `last_accessed_at` 기록.
//!   타임스탬프 없이 존재하는 레코드는 텍스트만 바뀐다.

use crate::error::SyncError;
use crate::hub::Hub;
use crate::protocol::ServerMessage;
use crate::store::{RoomPatch, RoomStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct Synchronizer {
    store: Arc<dyn RoomStore>,
    max_code_bytes: usize,
    clock: Clock,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn RoomStore>, max_code_bytes: usize) -> Self {
        Self {
            store,
            max_code_bytes,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &Arc<dyn RoomStore> {
        &self.store
    }

    /// 방 참여: 전송 계층 그룹 참여는 저장소 결과와 무관하게 먼저 수행
    pub async fn join_room(
        &self,
        hub: &Hub,
        peer_id: &str,
        room_id: &str,
    ) -> Result<String, SyncError> {
        let room_id = normalize_room_id(room_id)?;
        hub.join(peer_id, &room_id);
        self.load(&room_id).await
    }

    /// REST 읽기. 없는 방은 빈 문자열
    pub async fn read_room(&self, room_id: &str) -> Result<String, SyncError> {
        let room_id = normalize_room_id(room_id)?;
        self.load(&room_id).await
    }

    /// 동기식 쓰기 (REST 및 편집 큐 소비자가 사용)
    pub async fn write_room(&self, room_id: &str, code: String) -> Result<(), SyncError> {
        let room_id = self.validate_edit(room_id, &code)?;

        let existing = self.store.get(&room_id).await?;
        let stamp = match &existing {
            None => true,
            Some(record) => record.is_timestamped(),
        };

        let patch = RoomPatch {
            code: Some(code),
            last_accessed_at: stamp.then(|| (self.clock)()),
        };
        self.store.merge(&room_id, patch).await?;
        Ok(())
    }

    /// 편집 검증 후 정규화된 방 ID 반환
    pub fn validate_edit(&self, room_id: &str, code: &str) -> Result<String, SyncError> {
        if code.len() > self.max_code_bytes {
            return Err(SyncError::TooLarge {
                size: code.len(),
                limit: self.max_code_bytes,
            });
        }
        normalize_room_id(room_id)
    }

    async fn load(&self, room_id: &str) -> Result<String, SyncError> {
        let Some(record) = self.store.get(room_id).await? else {
            return Ok(String::new());
        };

        if record.is_timestamped() {
            self.store
                .merge(room_id, RoomPatch::touch((self.clock)()))
                .await?;
        }

        Ok(record.code.unwrap_or_default())
    }
}

/// 앞뒤 공백 제거, 빈 ID 거부
pub fn normalize_room_id(raw: &str) -> Result<String, SyncError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(SyncError::InvalidRoomId)
    } else {
        Ok(trimmed.to_string())
    }
}

struct PendingEdit {
    room_id: String,
    code: String,
}

/// 연결별 편집 저장 큐
///
/// 브로드캐스트는 기다리지 않고, 같은 연결의 편집은 도착 순서대로 저장된다.
/// 저장 실패는 해당 연결에만 `error` 이벤트로 알린다.
pub struct EditWriter {
    tx: mpsc::UnboundedSender<PendingEdit>,
    task: JoinHandle<()>,
}

impl EditWriter {
    pub fn spawn(sync: Synchronizer, hub: Arc<Hub>, peer_id: String) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<PendingEdit>();

        let task = tokio::spawn(async move {
            while let Some(edit) = rx.recv().await {
                match sync.write_room(&edit.room_id, edit.code).await {
                    Ok(()) => {
                        tracing::debug!(peer_id = %peer_id, room_id = %edit.room_id, "Code saved");
                    }
                    Err(e) => {
                        tracing::error!(
                            peer_id = %peer_id,
                            room_id = %edit.room_id,
                            error = %e,
                            "Error saving code"
                        );
                        hub.send_to_connection(
                            &peer_id,
                            ServerMessage::Error(e.public_message("Failed to save code")),
                        );
                    }
                }
            }
        });

        Self { tx, task }
    }

    /// 저장 요청을 큐에 넣고 즉시 반환
    pub fn submit(&self, room_id: String, code: String) -> bool {
        self.tx.send(PendingEdit { room_id, code }).is_ok()
    }

    /// 남은 편집을 모두 저장한 뒤 종료
    pub async fn finish(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Edit writer task ended abnormally");
        }
    }
}
