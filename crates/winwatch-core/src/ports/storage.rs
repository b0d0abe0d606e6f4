//! 로컬 저장소 포트.
//!
//! 구현: `winwatch-storage` crate (rusqlite)
//!
//! 모든 연산은 단일 연결을 통해 직렬화되며 문 단위로 원자적이다.
//! `path` 고유 제약 위반은 `CoreError::Conflict`로 보고된다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::models::process::IdentityRef;
use crate::models::usage::UsageStat;

/// 프로세스 식별 정보 + 사용 샘플 저장소
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// 경로로 식별 정보 조회
    async fn find_identity_by_path(&self, path: &str) -> Result<Option<IdentityRef>, CoreError>;

    /// 식별 정보 생성, 새 ID 반환
    async fn create_identity(
        &self,
        name: &str,
        path: &str,
        description: &str,
        tracked: bool,
    ) -> Result<i64, CoreError>;

    /// 추적 여부 변경. 해당 경로가 없으면 `false`
    async fn set_tracked(&self, tracked: bool, path: &str) -> Result<bool, CoreError>;

    /// 사용 샘플 추가
    async fn append_sample(&self, identity_id: i64, timestamp: DateTime<Utc>)
        -> Result<(), CoreError>;

    /// 제외된(추적 안 함) 경로 목록
    async fn list_excluded_paths(&self) -> Result<Vec<String>, CoreError>;

    /// 샘플 수 내림차순 사용 통계
    async fn usage_by_identity_descending(&self) -> Result<Vec<UsageStat>, CoreError>;

    /// 경로의 사용 기록 삭제 (식별 정보는 유지), 삭제된 샘플 수 반환
    async fn delete_samples_for_path(&self, path: &str) -> Result<usize, CoreError>;

    /// 모든 식별 정보와 샘플 삭제 후 저장 공간 회수
    async fn reset_all(&self) -> Result<(), CoreError>;
}
