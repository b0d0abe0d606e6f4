//! 저장소 전체 초기화.

use tracing::info;
use winwatch_core::error::CoreError;

use super::SqliteStorage;

impl SqliteStorage {
    /// 모든 샘플과 식별 정보 삭제 후 VACUUM
    pub(super) fn reset(&self) -> Result<(), CoreError> {
        let mut conn = self.lock_conn()?;

        let tx = conn
            .transaction()
            .map_err(|e| CoreError::Storage(format!("트랜잭션 시작 실패: {e}")))?;

        let samples = tx
            .execute("DELETE FROM usage_samples", [])
            .map_err(|e| CoreError::Storage(format!("샘플 삭제 실패: {e}")))?;
        let identities = tx
            .execute("DELETE FROM process_identities", [])
            .map_err(|e| CoreError::Storage(format!("식별 정보 삭제 실패: {e}")))?;
        tx.execute(
            "DELETE FROM sqlite_sequence WHERE name = 'process_identities'",
            [],
        )
        .map_err(|e| CoreError::Storage(format!("시퀀스 초기화 실패: {e}")))?;

        tx.commit()
            .map_err(|e| CoreError::Storage(format!("트랜잭션 커밋 실패: {e}")))?;

        // VACUUM은 트랜잭션 밖에서만 가능
        conn.execute_batch("VACUUM;")
            .map_err(|e| CoreError::Storage(format!("VACUUM 실패: {e}")))?;

        info!("저장소 초기화: 샘플 {samples}건, 식별 정보 {identities}건 삭제");
        Ok(())
    }
}
