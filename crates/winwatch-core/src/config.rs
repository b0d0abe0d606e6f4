//! 애플리케이션 설정 구조체.
//!
//! 샘플링 주기, 틱 타임아웃, 저장소 경로 등 런타임 설정을 정의한다.
//! [`crate::config_manager::ConfigManager`]가 JSON 파일로 로드/저장한다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 모니터링 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 로컬 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

/// 포그라운드 샘플링 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 샘플링 틱 간격 (밀리초). 샘플 1건이 이 시간만큼의 사용으로 집계된다.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 틱 하나가 쓸 수 있는 최대 시간 (밀리초)
    #[serde(default = "default_tick_timeout_ms")]
    pub tick_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            tick_timeout_ms: default_tick_timeout_ms(),
        }
    }
}

/// 로컬 저장소 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite DB 파일 경로 (None이면 플랫폼 기본 경로)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// 샘플링 주기를 Duration으로 반환
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.monitor.poll_interval_ms)
    }

    /// 틱 타임아웃을 Duration으로 반환
    pub fn tick_timeout(&self) -> Duration {
        Duration::from_millis(self.monitor.tick_timeout_ms)
    }

    /// 설정값 검증
    ///
    /// 샘플링은 초 단위 해상도만 지원하고, 틱 타임아웃은 틱 간격보다 짧아야 한다.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.monitor.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(CoreError::Config(format!(
                "poll_interval_ms는 {MIN_POLL_INTERVAL_MS} 이상이어야 합니다 (현재 {})",
                self.monitor.poll_interval_ms
            )));
        }
        if self.monitor.tick_timeout_ms == 0
            || self.monitor.tick_timeout_ms >= self.monitor.poll_interval_ms
        {
            return Err(CoreError::Config(format!(
                "tick_timeout_ms는 1 이상, poll_interval_ms({}) 미만이어야 합니다 (현재 {})",
                self.monitor.poll_interval_ms, self.monitor.tick_timeout_ms
            )));
        }
        Ok(())
    }
}

/// 최소 샘플링 간격. 초 미만 해상도는 지원하지 않음
pub const MIN_POLL_INTERVAL_MS: u64 = 1_000;

fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_tick_timeout_ms() -> u64 {
    800
}
