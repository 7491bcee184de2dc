//! 프로세스 내 저장소 (dashmap)

use super::{RoomPatch, RoomRecord, RoomStore, StoreResult};
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, RoomRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 레코드를 그대로 넣는다 (타임스탬프 규칙을 거치지 않음)
    pub fn insert_raw(&self, room_id: impl Into<String>, record: RoomRecord) {
        self.records.insert(room_id.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn get(&self, room_id: &str) -> StoreResult<Option<RoomRecord>> {
        Ok(self.records.get(room_id).map(|r| r.value().clone()))
    }

    async fn merge(&self, room_id: &str, patch: RoomPatch) -> StoreResult<()> {
        self.records
            .entry(room_id.to_string())
            .or_default()
            .apply(patch);
        Ok(())
    }

    async fn delete(&self, room_id: &str) -> StoreResult<()> {
        self.records.remove(room_id);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<(String, RoomRecord)>> {
        Ok(self
            .records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }
}
