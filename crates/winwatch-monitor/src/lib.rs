//! # winwatch-monitor
//!
//! 포그라운드 프로세스 모니터링 어댑터.
//! 활성 창의 프로세스를 샘플링하고, 실행 파일 버전 리소스에서 설명을 조회한다.
//! Windows 네이티브 API 기반이며, 기타 플랫폼은 sysinfo로 대체한다.

pub mod process;
pub mod version_info;

#[cfg(target_os = "windows")]
pub mod windows;
