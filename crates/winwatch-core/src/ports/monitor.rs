//! 포그라운드 프로세스 모니터링 포트.
//!
//! 구현: `winwatch-monitor` crate (Win32 FFI + 버전 리소스 파서)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::process::{ForegroundProcess, ResolvedProcess};

/// 현재 포그라운드 창을 소유한 프로세스 조회
#[async_trait]
pub trait ForegroundSampler: Send + Sync {
    /// 포그라운드 프로세스 샘플링
    ///
    /// 포커스된 창이 없으면 `Ok(None)`. 권한 부족 등 OS 호출 실패는
    /// 복구 가능한 `CoreError::ProcessAccess`로 반환한다.
    async fn sample_foreground(&self) -> Result<Option<ForegroundProcess>, CoreError>;
}

/// PID/경로 → 안정적인 프로세스 메타데이터
#[async_trait]
pub trait ProcessResolver: Send + Sync {
    /// PID로 모듈 이름, 설명, 경로 조회
    ///
    /// 설명을 얻지 못해도 실패하지 않고 빈 설명을 돌려준다.
    async fn resolve_identity(&self, pid: u32) -> Result<ResolvedProcess, CoreError>;

    /// 실행 파일 경로의 버전 리소스에서 FileDescription 조회
    async fn resolve_description(&self, path: &str) -> Result<String, CoreError>;
}
