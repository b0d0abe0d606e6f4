//! 프로세스 식별 정보 스토리지.
//!
//! 실행 파일 경로가 자연 키이며 `path` 고유 제약으로 중복 생성을 막는다.

use rusqlite::OptionalExtension;
use tracing::debug;
use winwatch_core::error::CoreError;
use winwatch_core::models::process::{IdentityRef, ProcessIdentity};

use super::{constraint_violation, Constraint, SqliteStorage};

impl SqliteStorage {
    /// 경로로 ID + 추적 여부 조회
    pub(super) fn find_identity(&self, path: &str) -> Result<Option<IdentityRef>, CoreError> {
        let conn = self.lock_conn()?;

        conn.query_row(
            "SELECT id, tracked FROM process_identities WHERE path = ?1",
            rusqlite::params![path],
            |row| {
                Ok(IdentityRef {
                    id: row.get(0)?,
                    tracked: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(|e| CoreError::Storage(format!("식별 정보 조회 실패: {e}")))
    }

    /// 식별 정보 삽입
    ///
    /// 같은 경로가 이미 있으면 `CoreError::Conflict`.
    pub(super) fn insert_identity(
        &self,
        name: &str,
        path: &str,
        description: &str,
        tracked: bool,
    ) -> Result<i64, CoreError> {
        let conn = self.lock_conn()?;

        conn.execute(
            "INSERT INTO process_identities (name, path, description, tracked) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![name, path, description, tracked],
        )
        .map_err(|e| match constraint_violation(&e) {
            Some(Constraint::Unique) => CoreError::Conflict {
                resource_type: "ProcessIdentity".to_string(),
                id: path.to_string(),
            },
            _ => CoreError::Storage(format!("식별 정보 생성 실패: {e}")),
        })?;

        let id = conn.last_insert_rowid();
        debug!("식별 정보 생성: id={id}, path={path}, tracked={tracked}");
        Ok(id)
    }

    /// 추적 여부 변경
    pub(super) fn update_tracked(&self, tracked: bool, path: &str) -> Result<bool, CoreError> {
        let conn = self.lock_conn()?;

        let updated = conn
            .execute(
                "UPDATE process_identities SET tracked = ?1 WHERE path = ?2",
                rusqlite::params![tracked, path],
            )
            .map_err(|e| CoreError::Storage(format!("추적 여부 변경 실패: {e}")))?;

        debug!("추적 여부 변경: path={path}, tracked={tracked}, affected={updated}");
        Ok(updated > 0)
    }

    /// 제외된 경로 목록 (경로 순)
    pub(super) fn excluded_paths(&self) -> Result<Vec<String>, CoreError> {
        let conn = self.lock_conn()?;

        let mut stmt = conn
            .prepare("SELECT path FROM process_identities WHERE tracked = 0 ORDER BY path")
            .map_err(|e| CoreError::Storage(format!("쿼리 준비 실패: {e}")))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| CoreError::Storage(format!("쿼리 실행 실패: {e}")))?;

        let mut paths = Vec::new();
        for row in rows {
            paths.push(row.map_err(|e| CoreError::Storage(format!("행 읽기 실패: {e}")))?);
        }
        Ok(paths)
    }

    /// 경로로 전체 식별 정보 조회
    pub fn get_identity(&self, path: &str) -> Result<Option<ProcessIdentity>, CoreError> {
        let conn = self.lock_conn()?;

        conn.query_row(
            "SELECT id, name, path, description, tracked FROM process_identities WHERE path = ?1",
            rusqlite::params![path],
            |row| {
                Ok(ProcessIdentity {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    path: row.get(2)?,
                    description: row.get(3)?,
                    tracked: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(|e| CoreError::Storage(format!("식별 정보 조회 실패: {e}")))
    }
}
