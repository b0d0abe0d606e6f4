//! 사용 기록 모델.
//!
//! 샘플 한 건 = 포그라운드 유지 1틱. 통계는 샘플 수로 계산한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 사용 샘플 (틱당 최대 1건, 추가 전용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSample {
    /// ProcessIdentity 참조
    pub identity_id: i64,
    /// 샘플 시각
    pub timestamp: DateTime<Utc>,
}

/// 프로세스별 사용 통계 (샘플 수 내림차순 뷰의 한 행)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStat {
    /// 실행 파일 이름
    pub name: String,
    /// 버전 리소스 설명
    pub description: String,
    /// 실행 파일 경로
    pub path: String,
    /// 샘플 수
    pub sample_count: u64,
}

impl UsageStat {
    /// 누적 포그라운드 시간 (샘플 수 × 틱 간격)
    pub fn foreground_time(&self, tick: Duration) -> Duration {
        tick.saturating_mul(u32::try_from(self.sample_count).unwrap_or(u32::MAX))
    }

    /// 표시용 이름. 설명이 비어 있으면 실행 파일 이름
    pub fn display_name(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.name
        } else {
            &self.description
        }
    }
}
