//! SQLite 기반 영구 저장소 (sqlx)
//!
//! 방 하나당 한 행: `rooms(room_id, code, last_accessed_at)`.
//! 타임스탬프는 ISO-8601 (RFC 3339, UTC) 문자열로 저장한다.

use super::{RoomPatch, RoomRecord, RoomStore, StoreResult};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS rooms (
    room_id TEXT PRIMARY KEY NOT NULL,
    code TEXT,
    last_accessed_at TEXT
)";

const UPSERT: &str = "INSERT INTO rooms (room_id, code, last_accessed_at) VALUES (?1, ?2, ?3)
    ON CONFLICT(room_id) DO UPDATE SET
        code = COALESCE(excluded.code, rooms.code),
        last_accessed_at = COALESCE(excluded.last_accessed_at, rooms.last_accessed_at)";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// 접속 후 스키마 생성
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let in_memory = is_memory_url(url);

        let mut options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = pool_options(in_memory).connect_with(options).await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }

    fn row_to_record(row: &SqliteRow) -> StoreResult<(String, RoomRecord)> {
        let room_id: String = row.try_get("room_id")?;
        let code: Option<String> = row.try_get("code")?;
        let raw_at: Option<String> = row.try_get("last_accessed_at")?;

        let last_accessed_at = match raw_at {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| StoreError::Corrupt {
                        room_id: room_id.clone(),
                        reason: format!("bad lastAccessedAt '{}': {}", raw, e),
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok((
            room_id,
            RoomRecord {
                code,
                last_accessed_at,
            },
        ))
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// 메모리 DB는 연결마다 별도 DB가 되므로 단일 연결로 고정하고 회수하지 않는다
fn pool_options(in_memory: bool) -> SqlitePoolOptions {
    if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl RoomStore for SqliteStore {
    async fn get(&self, room_id: &str) -> StoreResult<Option<RoomRecord>> {
        let row = sqlx::query(
            "SELECT room_id, code, last_accessed_at FROM rooms WHERE room_id = ?1",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(Self::row_to_record)
            .transpose()
            .map(|found| found.map(|(_, record)| record))
    }

    async fn merge(&self, room_id: &str, patch: RoomPatch) -> StoreResult<()> {
        sqlx::query(UPSERT)
            .bind(room_id)
            .bind(patch.code)
            .bind(patch.last_accessed_at.map(format_timestamp))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, room_id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM rooms WHERE room_id = ?1")
            .bind(room_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<(String, RoomRecord)>> {
        let rows = sqlx::query("SELECT room_id, code, last_accessed_at FROM rooms")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
