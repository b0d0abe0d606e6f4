//! 프로세스 식별 모델.
//!
//! 포그라운드 샘플 결과, 리졸버 결과, 영속 저장되는 프로세스 식별 정보를 표현.
//! 식별 기준은 항상 실행 파일 경로이며, PID는 재사용되므로 식별자로 쓰지 않는다.

use serde::{Deserialize, Serialize};

/// 포그라운드 창을 소유한 프로세스 (샘플러 결과)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundProcess {
    /// 프로세스 ID (휘발성)
    pub pid: u32,
    /// 실행 파일 전체 경로
    pub path: String,
}

/// 리졸버가 PID로부터 얻은 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedProcess {
    /// 모듈 기본 이름 (예: "Code.exe")
    pub name: String,
    /// 버전 리소스의 FileDescription (없으면 빈 문자열)
    pub description: String,
    /// 실행 파일 전체 경로
    pub path: String,
}

/// 영속 저장된 프로세스 식별 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIdentity {
    /// 대리 키
    pub id: i64,
    /// 실행 파일 이름
    pub name: String,
    /// 실행 파일 경로 (고유)
    pub path: String,
    /// 사람이 읽을 수 있는 설명
    pub description: String,
    /// 추적 여부 (false면 제외 목록)
    pub tracked: bool,
}

/// 경로 조회 결과 (틱마다 필요한 최소 필드)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityRef {
    pub id: i64,
    pub tracked: bool,
}

/// 경로에서 파일 이름 부분 추출
///
/// `\`와 `/` 구분자를 모두 인식한다 (Windows 경로를 다른 플랫폼에서 다룰 때도 동일 결과).
pub fn file_name_of(path: &str) -> String {
    path.rsplit(['\\', '/'])
        .next()
        .unwrap_or_default()
        .to_string()
}
