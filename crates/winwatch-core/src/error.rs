//! winwatch 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 에러 타입을 `CoreError`로 변환해 포트 경계를 넘긴다.
//! "포그라운드 창 없음"은 에러가 아니라 `Ok(None)`으로 표현한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 프로세스 열기/조회 실패 (권한 부족, 이미 종료된 프로세스 등)
    #[error("프로세스 접근 실패 (PID {pid}): {message}")]
    ProcessAccess {
        /// 대상 PID
        pid: u32,
        /// 실패한 OS 호출과 사유
        message: String,
    },

    /// 버전 리소스에서 설명을 얻지 못함
    #[error("설명 없음 ({path}): {reason}")]
    DescriptionUnavailable {
        /// 실행 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 고유 제약 위반 (동시 생성 경합)
    #[error("이미 존재함 ({resource_type}): {id}")]
    Conflict {
        /// 리소스 종류 (예: "ProcessIdentity")
        resource_type: String,
        /// 충돌한 키
        id: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 저장소 에러 (SQLite I/O, 쿼리 실패)
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// 틱 실행 시간 초과
    #[error("실행 타임아웃: {timeout_ms}ms 초과")]
    ExecutionTimeout {
        /// 초과된 타임아웃 시간 (밀리초)
        timeout_ms: u64,
    },

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// 틱을 건너뛰고 다음 틱에서 계속해도 되는 에러인지
    ///
    /// 프로세스 접근 실패, 설명 없음, 동시 생성 경합, 틱 타임아웃이 해당한다.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::ProcessAccess { .. }
                | CoreError::DescriptionUnavailable { .. }
                | CoreError::Conflict { .. }
                | CoreError::ExecutionTimeout { .. }
        )
    }
}
