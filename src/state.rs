//! 애플리케이션 상태 관리
//!
//! 시작 시 한 번 생성되어 모든 핸들러에 전달되는 서비스 컨텍스트.

use crate::config::Config;
use crate::error::StoreError;
use crate::hub::Hub;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::store::{self, RoomStore};
use crate::sweeper::RetentionSweeper;
use crate::sync::Synchronizer;
use std::sync::Arc;
use std::time::Duration;

pub struct AppState {
    pub hub: Arc<Hub>,
    pub sync: Synchronizer,
    pub sweeper: RetentionSweeper,
    pub scheduler: Scheduler,
    /// 주기 정리 작업 (비활성화 시 None)
    pub sweep_task: Option<TaskHandle>,
    pub config: Arc<Config>,
}

impl AppState {
    /// 설정에 맞는 저장소를 열고 백그라운드 작업 등록
    pub async fn open(config: Config) -> Result<Arc<Self>, StoreError> {
        let store = store::open(&config.store).await?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn RoomStore>) -> Arc<Self> {
        let sweeper = RetentionSweeper::new(store.clone(), config.retention.window_days);
        let scheduler = Scheduler::new();
        let sweep_task = schedule_sweeps(
            &scheduler,
            &sweeper,
            config.retention.sweep_interval_secs,
        );

        Arc::new(Self {
            hub: Arc::new(Hub::new()),
            sync: Synchronizer::new(store, config.max_code_bytes),
            sweeper,
            scheduler,
            sweep_task,
            config: Arc::new(config),
        })
    }

    /// 백그라운드 작업 취소 후 저장소 닫기
    pub async fn close(&self) {
        self.scheduler.shutdown();
        self.sync.store().close().await;
        tracing::info!("Application state closed");
    }
}

fn schedule_sweeps(
    scheduler: &Scheduler,
    sweeper: &RetentionSweeper,
    interval_secs: u64,
) -> Option<TaskHandle> {
    if interval_secs == 0 {
        tracing::info!("Periodic retention sweep disabled");
        return None;
    }

    let sweeper = sweeper.clone();
    let handle = scheduler.every("retention-sweep", Duration::from_secs(interval_secs), move || {
        let sweeper = sweeper.clone();
        async move {
            if let Err(e) = sweeper.sweep().await {
                tracing::error!(error = %e, "Scheduled retention sweep failed");
            }
        }
    });
    Some(handle)
}
