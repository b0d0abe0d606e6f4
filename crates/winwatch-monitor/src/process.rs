//! 포그라운드 프로세스 샘플링 및 메타데이터 조회.
//!
//! `ForegroundSampler` + `ProcessResolver` 포트 구현.
//! OS 호출은 블로킹이므로 `spawn_blocking`으로 실행한다.

use async_trait::async_trait;
use tracing::debug;
use winwatch_core::error::CoreError;
use winwatch_core::models::process::{ForegroundProcess, ResolvedProcess};
use winwatch_core::ports::monitor::{ForegroundSampler, ProcessResolver};

/// 포그라운드 추적기 (`ForegroundSampler` + `ProcessResolver` 포트 구현)
#[derive(Debug, Default)]
pub struct ForegroundTracker;

impl ForegroundTracker {
    /// 새 추적기 생성
    pub fn new() -> Self {
        Self
    }
}

/// 블로킹 OS 호출을 별도 스레드에서 실행
async fn run_blocking<T, F>(f: F) -> Result<T, CoreError>
where
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CoreError::Internal(format!("블로킹 작업 실패: {e}")))?
}

#[async_trait]
impl ForegroundSampler for ForegroundTracker {
    async fn sample_foreground(&self) -> Result<Option<ForegroundProcess>, CoreError> {
        #[cfg(target_os = "windows")]
        {
            run_blocking(crate::windows::foreground_process).await
        }
        #[cfg(not(target_os = "windows"))]
        {
            // 기타 플랫폼: 포그라운드 창 감지 미지원
            debug!("포그라운드 창 감지는 Windows 전용");
            Ok(None)
        }
    }
}

#[async_trait]
impl ProcessResolver for ForegroundTracker {
    async fn resolve_identity(&self, pid: u32) -> Result<ResolvedProcess, CoreError> {
        let (name, path) = run_blocking(move || module_name_and_path(pid)).await?;

        let description = match self.resolve_description(&path).await {
            Ok(description) => description,
            Err(e) => {
                debug!("설명 조회 실패, 빈 설명 사용: {e}");
                String::new()
            }
        };

        debug!("프로세스 식별: {name} ({path}): {description:?}");
        Ok(ResolvedProcess {
            name,
            description,
            path,
        })
    }

    async fn resolve_description(&self, path: &str) -> Result<String, CoreError> {
        let path = path.to_string();
        run_blocking(move || description_of(&path)).await
    }
}

#[cfg(target_os = "windows")]
fn module_name_and_path(pid: u32) -> Result<(String, String), CoreError> {
    crate::windows::module_name_and_path(pid)
}

/// 기타 플랫폼: sysinfo로 프로세스 이름/경로 조회
#[cfg(not(target_os = "windows"))]
fn module_name_and_path(pid: u32) -> Result<(String, String), CoreError> {
    use sysinfo::{Pid, ProcessesToUpdate, System};

    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);

    let process = sys
        .process(Pid::from_u32(pid))
        .ok_or_else(|| CoreError::ProcessAccess {
            pid,
            message: "프로세스 없음".to_string(),
        })?;
    let name = process.name().to_string_lossy().to_string();
    let path = process
        .exe()
        .map(|p| p.to_string_lossy().to_string())
        .ok_or_else(|| CoreError::ProcessAccess {
            pid,
            message: "실행 파일 경로 조회 실패".to_string(),
        })?;
    if name.is_empty() {
        return Err(CoreError::ProcessAccess {
            pid,
            message: "빈 프로세스 이름".to_string(),
        });
    }
    Ok((name, path))
}

#[cfg(target_os = "windows")]
fn description_of(path: &str) -> Result<String, CoreError> {
    let block = crate::windows::read_version_block(path).map_err(|e| e.into_core(path))?;
    crate::version_info::describe(&block).map_err(|e| e.into_core(path))
}

/// 기타 플랫폼: PE 버전 리소스 없음
#[cfg(not(target_os = "windows"))]
fn description_of(path: &str) -> Result<String, CoreError> {
    Err(crate::version_info::VersionInfoError::Missing(
        "버전 리소스는 Windows 실행 파일에서만 조회 가능".to_string(),
    )
    .into_core(path))
}
