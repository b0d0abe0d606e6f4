//! 샘플링 스케줄러.
//!
//! 폴링 간격마다 포그라운드 프로세스를 샘플링해 추적기에 넘긴다.
//! 틱 하나는 `tick_timeout` 안에 끝나야 하며, 실패한 틱은 로그만 남기고 건너뛴다.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};
use winwatch_core::config::AppConfig;
use winwatch_core::error::CoreError;
use winwatch_core::ports::monitor::ForegroundSampler;

use crate::tracker::{TickOutcome, UsageTracker};

/// 스케줄러 설정
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// 샘플링 간격
    pub poll_interval: Duration,
    /// 틱 하나의 최대 실행 시간
    pub tick_timeout: Duration,
}

impl SchedulerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            tick_timeout: config.tick_timeout(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default_config())
    }
}

/// 실행 요약 (종료 시 로그용)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 실행한 틱 수
    pub ticks: u64,
    /// 기록한 샘플 수
    pub samples: u64,
    /// 실패한 틱 수
    pub failures: u64,
}

/// 샘플링 스케줄러
pub struct Scheduler {
    config: SchedulerConfig,
    sampler: Arc<dyn ForegroundSampler>,
    tracker: Arc<UsageTracker>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        sampler: Arc<dyn ForegroundSampler>,
        tracker: Arc<UsageTracker>,
    ) -> Self {
        Self {
            config,
            sampler,
            tracker,
        }
    }

    /// 종료 신호까지 샘플링 루프 실행
    ///
    /// 종료 신호는 틱 사이에만 확인하므로 진행 중인 틱은 끝까지 실행된다.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> RunSummary {
        info!(
            "스케줄러 시작: 폴링={}ms, 틱 타임아웃={}ms",
            self.config.poll_interval.as_millis(),
            self.config.tick_timeout.as_millis(),
        );

        let mut summary = RunSummary::default();
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    summary.ticks += 1;
                    match self.tick_once().await {
                        Ok(TickOutcome::Sampled { id }) => {
                            summary.samples += 1;
                            trace!("샘플 기록: id={id}");
                        }
                        Ok(TickOutcome::Registered { id }) => debug!("새 프로세스 등록: id={id}"),
                        Ok(TickOutcome::Excluded { id }) => trace!("제외된 프로세스: id={id}"),
                        Ok(TickOutcome::Idle) => trace!("포그라운드 프로세스 없음"),
                        Err(e) if e.is_recoverable() => {
                            summary.failures += 1;
                            debug!("틱 건너뜀: {e}");
                        }
                        Err(e) => {
                            summary.failures += 1;
                            warn!("틱 실패: {e}");
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("샘플링 루프 종료");
                    break;
                }
            }
        }

        info!(
            "스케줄러 종료: 틱 {}회, 샘플 {}건, 실패 {}회",
            summary.ticks, summary.samples, summary.failures
        );
        summary
    }

    /// 틱 한 번 (타임아웃 적용)
    pub async fn tick_once(&self) -> Result<TickOutcome, CoreError> {
        let timeout = self.config.tick_timeout;
        let tick = async {
            let sample = self.sampler.sample_foreground().await?;
            self.tracker.tick(sample, Utc::now()).await
        };

        match tokio::time::timeout(timeout, tick).await {
            Ok(result) => result,
            Err(_) => {
                warn!("틱 타임아웃: {}ms 초과", timeout.as_millis());
                Err(CoreError::ExecutionTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}
