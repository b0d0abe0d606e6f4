//! SQLite 저장소 어댑터.
//!
//! `UsageStore` 포트 구현.
//!
//! # 모듈 구조
//! - `identities`: 프로세스 식별 정보 (경로 고유)
//! - `samples`: 사용 샘플 추가, 통계, 경로별 삭제
//! - `maintenance`: 전체 초기화 + VACUUM
//! - `store`: `UsageStore` 포트 구현

mod identities;
mod maintenance;
mod samples;
mod store;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;
use winwatch_core::error::CoreError;

use crate::migration;

/// SQLite 저장소 (`UsageStore` 포트 구현)
///
/// 단일 연결을 `Mutex`로 직렬화한다. 샘플러 루프와 제어 콘솔이
/// `Arc<SqliteStorage>`로 공유하며, 종료 시 [`SqliteStorage::close`]로 한 번 닫는다.
pub struct SqliteStorage {
    pub(super) conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// 파일 기반 SQLite 저장소 생성
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path)
            .map_err(|e| CoreError::Storage(format!("SQLite 열기 실패: {e}")))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            PRAGMA foreign_keys=ON;
            ",
        )
        .map_err(|e| CoreError::Storage(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        info!("SQLite 저장소 초기화: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 인메모리 SQLite 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Storage(format!("인메모리 SQLite 생성 실패: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| CoreError::Storage(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 연결 닫기
    ///
    /// 소유권을 가져가므로 한 번만 호출된다.
    pub fn close(self) -> Result<(), CoreError> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        conn.close()
            .map_err(|(_, e)| CoreError::Storage(format!("SQLite 닫기 실패: {e}")))?;
        info!("SQLite 저장소 종료");
        Ok(())
    }

    pub(super) fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))
    }
}

/// 샘플 시각 → 고정 폭 RFC3339 (마이크로초, `Z`)
///
/// 고정 폭이라 문자열 정렬이 시간 순서와 같다.
pub(crate) fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// 제약 위반 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Constraint {
    /// UNIQUE 또는 PRIMARY KEY
    Unique,
    /// FOREIGN KEY
    ForeignKey,
}

/// rusqlite 에러에서 제약 위반 종류 추출
pub(super) fn constraint_violation(e: &rusqlite::Error) -> Option<Constraint> {
    match e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            match err.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Some(Constraint::Unique),
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
                _ => None,
            }
        }
        _ => None,
    }
}
