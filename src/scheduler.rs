//! 주기 작업 스케줄러

use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// 주기 작업 핸들
#[derive(Debug, Clone)]
pub struct TaskHandle {
    name: &'static str,
    token: CancellationToken,
}

impl TaskHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// 프로세스 수명 동안 주기 작업을 소유한다
#[derive(Default)]
pub struct Scheduler {
    root: CancellationToken,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// `period`마다 `job` 실행. 첫 실행은 한 주기 뒤
    pub fn every<F, Fut>(&self, name: &'static str, period: Duration, mut job: F) -> TaskHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.root.child_token();
        let handle = TaskHandle {
            name,
            token: token.clone(),
        };

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        tracing::debug!(task = name, "Running scheduled task");
                        job().await;
                    }
                }
            }
            tracing::info!(task = name, "Scheduled task stopped");
        });

        tracing::info!(task = name, period_secs = period.as_secs(), "Scheduled task registered");
        handle
    }

    /// 모든 작업 취소
    pub fn shutdown(&self) {
        self.root.cancel();
    }
}
