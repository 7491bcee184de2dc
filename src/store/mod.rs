//! 방 문서 영구 저장소
//!
//! 방 ID를 키로 `{code, lastAccessedAt}` 레코드를 보관한다.
//! `merge`는 문서 저장소의 "merge set" 의미를 따른다: 패치에 없는 필드는 그대로 둔다.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::StoreConfig;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

/// 저장된 방 레코드
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl RoomRecord {
    pub fn text(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }

    pub fn is_timestamped(&self) -> bool {
        self.last_accessed_at.is_some()
    }

    /// 패치 적용 (Some 필드만 덮어씀)
    pub fn apply(&mut self, patch: RoomPatch) {
        if let Some(code) = patch.code {
            self.code = Some(code);
        }
        if let Some(at) = patch.last_accessed_at {
            self.last_accessed_at = Some(at);
        }
    }
}

/// 부분 갱신
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomPatch {
    pub code: Option<String>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl RoomPatch {
    pub fn touch(at: DateTime<Utc>) -> Self {
        Self {
            code: None,
            last_accessed_at: Some(at),
        }
    }
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn get(&self, room_id: &str) -> StoreResult<Option<RoomRecord>>;

    async fn merge(&self, room_id: &str, patch: RoomPatch) -> StoreResult<()>;

    /// 없는 키 삭제도 성공으로 처리
    async fn delete(&self, room_id: &str) -> StoreResult<()>;

    async fn list(&self) -> StoreResult<Vec<(String, RoomRecord)>>;

    async fn close(&self) {}
}

/// 설정에 맞는 저장소 열기
pub async fn open(config: &StoreConfig) -> StoreResult<Arc<dyn RoomStore>> {
    if config.is_memory() {
        tracing::info!("Using in-memory room store");
        Ok(Arc::new(MemoryStore::new()))
    } else {
        tracing::info!(url = %config.url, "Opening SQLite room store");
        Ok(Arc::new(SqliteStore::connect(&config.url).await?))
    }
}
