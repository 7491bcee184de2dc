//! 오래되었거나 비어 있는 방 정리
//!
//! `last_accessed_at`이 있는 레코드만 대상이며, 보존 기간보다 오래되었거나
//! 텍스트가 공백뿐이면 삭제한다. 삭제는 동시에 실행되고 개별 실패는 배치를 멈추지 않는다.

use crate::error::StoreError;
use crate::store::{RoomRecord, RoomStore};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;

/// 정리 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted_count: usize,
    pub failed_count: usize,
}

#[derive(Clone)]
pub struct RetentionSweeper {
    store: Arc<dyn RoomStore>,
    window: Duration,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn RoomStore>, window_days: i64) -> Self {
        Self {
            store,
            window: Duration::days(window_days),
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        self.sweep_at(Utc::now()).await
    }

    /// 목록 조회 실패만 에러로 반환. 개별 삭제 실패는 `failed_count`에 집계
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, StoreError> {
        let cutoff = now - self.window;
        let records = self.store.list().await?;
        let scanned = records.len();

        let doomed: Vec<String> = records
            .into_iter()
            .filter_map(|(room_id, record)| {
                if should_evict(&record, cutoff) {
                    tracing::info!(room_id = %room_id, "Deleting expired or empty room");
                    Some(room_id)
                } else {
                    if !record.is_timestamped() {
                        tracing::debug!(room_id = %room_id, "Skipping room without lastAccessedAt");
                    }
                    None
                }
            })
            .collect();

        let results = join_all(doomed.iter().map(|room_id| async move {
            let result = self.store.delete(room_id).await;
            if let Err(e) = &result {
                tracing::warn!(room_id = %room_id, error = %e, "Failed to delete room");
            }
            result
        }))
        .await;

        let failed_count = results.iter().filter(|r| r.is_err()).count();
        let report = SweepReport {
            scanned,
            deleted_count: results.len() - failed_count,
            failed_count,
        };

        tracing::info!(
            scanned = report.scanned,
            deleted = report.deleted_count,
            failed = report.failed_count,
            "Retention sweep completed"
        );
        Ok(report)
    }
}

/// 삭제 대상 여부: 타임스탬프가 있고, (cutoff 이전이거나 텍스트가 공백뿐)
pub fn should_evict(record: &RoomRecord, cutoff: DateTime<Utc>) -> bool {
    let Some(last_accessed_at) = record.last_accessed_at else {
        return false;
    };
    let is_stale = last_accessed_at < cutoff;
    let is_empty = record.code.as_deref().map_or(true, |c| c.trim().is_empty());
    is_stale || is_empty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, RoomPatch, StoreResult};
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    fn record(code: Option<&str>, age_days: Option<i64>) -> RoomRecord {
        RoomRecord {
            code: code.map(str::to_string),
            last_accessed_at: age_days.map(|d| now() - Duration::days(d)),
        }
    }

    #[test]
    fn eviction_predicate_matrix() {
        let cutoff = now() - Duration::days(30);

        assert!(should_evict(&record(Some("code"), Some(31)), cutoff));
        assert!(should_evict(&record(Some(" \n\t "), Some(1)), cutoff));
        assert!(should_evict(&record(Some(""), Some(45)), cutoff));
        assert!(should_evict(&record(None, Some(0)), cutoff));
        assert!(!should_evict(&record(Some("code"), Some(29)), cutoff));
        assert!(!should_evict(&record(Some(""), None), cutoff));
        assert!(!should_evict(&record(None, None), cutoff));
    }

    #[tokio::test]
    async fn sweep_deletes_only_evictable_records() {
        let store = Arc::new(MemoryStore::new());
        store.insert_raw("old-full", record(Some("keep me?"), Some(40)));
        store.insert_raw("new-blank", record(Some("   "), Some(2)));
        store.insert_raw("old-blank", record(Some(""), Some(40)));
        store.insert_raw("untimed", record(Some(""), None));
        store.insert_raw("fresh", record(Some("hello"), Some(1)));

        let sweeper = RetentionSweeper::new(store.clone(), 30);
        let report = sweeper.sweep_at(now()).await.unwrap();

        assert_eq!(report.scanned, 5);
        assert_eq!(report.deleted_count, 3);
        assert_eq!(report.failed_count, 0);

        let mut remaining: Vec<String> =
            store.list().await.unwrap().into_iter().map(|(id, _)| id).collect();
        remaining.sort();
        assert_eq!(remaining, vec!["fresh", "untimed"]);
    }

    /// 특정 방 삭제만 실패하는 저장소
    struct FlakyStore {
        inner: MemoryStore,
        poisoned: &'static str,
    }

    #[async_trait]
    impl RoomStore for FlakyStore {
        async fn get(&self, room_id: &str) -> StoreResult<Option<RoomRecord>> {
            self.inner.get(room_id).await
        }
        async fn merge(&self, room_id: &str, patch: RoomPatch) -> StoreResult<()> {
            self.inner.merge(room_id, patch).await
        }
        async fn delete(&self, room_id: &str) -> StoreResult<()> {
            if room_id == self.poisoned {
                return Err(StoreError::Backend("permission denied".into()));
            }
            self.inner.delete(room_id).await
        }
        async fn list(&self) -> StoreResult<Vec<(String, RoomRecord)>> {
            self.inner.list().await
        }
    }

    #[tokio::test]
    async fn single_failed_delete_does_not_abort_batch() {
        let inner = MemoryStore::new();
        inner.insert_raw("a", record(Some(""), Some(1)));
        inner.insert_raw("b", record(Some(""), Some(1)));
        inner.insert_raw("c", record(Some(""), Some(1)));
        let store = Arc::new(FlakyStore {
            inner,
            poisoned: "b",
        });

        let report = RetentionSweeper::new(store.clone(), 30)
            .sweep_at(now())
            .await
            .unwrap();

        assert_eq!(report.deleted_count, 2);
        assert_eq!(report.failed_count, 1);
        assert!(store.get("b").await.unwrap().is_some());
    }
}
