//! 사용 샘플 스토리지.
//!
//! 샘플 추가, 샘플 수 기반 통계, 경로별 기록 삭제.

use tracing::debug;
use winwatch_core::error::CoreError;
use winwatch_core::models::usage::{UsageSample, UsageStat};

use super::{constraint_violation, encode_timestamp, Constraint, SqliteStorage};

impl SqliteStorage {
    /// 샘플 추가
    ///
    /// 같은 시각의 샘플이 이미 있으면 `Conflict`, 식별 정보가 없으면 `NotFound`.
    pub(super) fn insert_sample(&self, sample: &UsageSample) -> Result<(), CoreError> {
        let timestamp = encode_timestamp(sample.timestamp);
        let conn = self.lock_conn()?;

        conn.execute(
            "INSERT INTO usage_samples (timestamp, identity_id) VALUES (?1, ?2)",
            rusqlite::params![timestamp, sample.identity_id],
        )
        .map_err(|e| match constraint_violation(&e) {
            Some(Constraint::Unique) => CoreError::Conflict {
                resource_type: "UsageSample".to_string(),
                id: timestamp.clone(),
            },
            Some(Constraint::ForeignKey) => CoreError::NotFound {
                resource_type: "ProcessIdentity".to_string(),
                id: sample.identity_id.to_string(),
            },
            None => CoreError::Storage(format!("샘플 저장 실패: {e}")),
        })?;

        debug!("샘플 저장: id={}, {timestamp}", sample.identity_id);
        Ok(())
    }

    /// 식별 정보별 샘플 수 (내림차순, 동률은 ID 오름차순)
    pub(super) fn usage_stats(&self) -> Result<Vec<UsageStat>, CoreError> {
        let conn = self.lock_conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT p.name, p.description, p.path, COUNT(s.timestamp) AS sample_count
                 FROM process_identities p
                 JOIN usage_samples s ON s.identity_id = p.id
                 GROUP BY p.id
                 ORDER BY sample_count DESC, p.id ASC",
            )
            .map_err(|e| CoreError::Storage(format!("쿼리 준비 실패: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(UsageStat {
                    name: row.get(0)?,
                    description: row.get(1)?,
                    path: row.get(2)?,
                    sample_count: row.get::<_, i64>(3)? as u64,
                })
            })
            .map_err(|e| CoreError::Storage(format!("쿼리 실행 실패: {e}")))?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row.map_err(|e| CoreError::Storage(format!("행 읽기 실패: {e}")))?);
        }
        Ok(stats)
    }

    /// 경로의 샘플 전체 삭제 (식별 정보는 유지)
    pub(super) fn delete_samples(&self, path: &str) -> Result<usize, CoreError> {
        let conn = self.lock_conn()?;

        let deleted = conn
            .execute(
                "DELETE FROM usage_samples
                 WHERE identity_id IN (SELECT id FROM process_identities WHERE path = ?1)",
                rusqlite::params![path],
            )
            .map_err(|e| CoreError::Storage(format!("샘플 삭제 실패: {e}")))?;

        debug!("샘플 삭제: path={path}, deleted={deleted}");
        Ok(deleted)
    }

    /// 경로의 샘플 수
    pub fn sample_count_for_path(&self, path: &str) -> Result<u64, CoreError> {
        let conn = self.lock_conn()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM usage_samples s
                 JOIN process_identities p ON s.identity_id = p.id
                 WHERE p.path = ?1",
                rusqlite::params![path],
                |row| row.get(0),
            )
            .map_err(|e| CoreError::Storage(format!("샘플 수 조회 실패: {e}")))?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn sample(identity_id: i64, offset_secs: i64) -> UsageSample {
        UsageSample {
            identity_id,
            timestamp: base_time() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn same_timestamp_is_conflict() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let a = storage.insert_identity("a.exe", r"C:\a.exe", "", true).unwrap();
        let b = storage.insert_identity("b.exe", r"C:\b.exe", "", true).unwrap();

        storage.insert_sample(&sample(a, 0)).unwrap();
        let err = storage.insert_sample(&sample(b, 0)).unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn sample_for_missing_identity_is_not_found() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let err = storage.insert_sample(&sample(42, 0)).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn stats_ordered_by_count_then_id() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let a = storage.insert_identity("a.exe", r"C:\a.exe", "A", true).unwrap();
        let b = storage.insert_identity("b.exe", r"C:\b.exe", "B", true).unwrap();
        let c = storage.insert_identity("c.exe", r"C:\c.exe", "C", true).unwrap();
        // 샘플 없는 식별 정보는 통계에 없음
        storage.insert_identity("d.exe", r"C:\d.exe", "D", true).unwrap();

        let mut offset = 0;
        for (id, count) in [(c, 2), (b, 3), (a, 2)] {
            for _ in 0..count {
                storage.insert_sample(&sample(id, offset)).unwrap();
                offset += 1;
            }
        }

        let stats = storage.usage_stats().unwrap();
        let order: Vec<(&str, u64)> = stats
            .iter()
            .map(|s| (s.name.as_str(), s.sample_count))
            .collect();
        assert_eq!(order, vec![("b.exe", 3), ("a.exe", 2), ("c.exe", 2)]);
    }

    #[test]
    fn delete_samples_keeps_identity() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let a = storage.insert_identity("a.exe", r"C:\a.exe", "", true).unwrap();
        let b = storage.insert_identity("b.exe", r"C:\b.exe", "", true).unwrap();
        storage.insert_sample(&sample(a, 0)).unwrap();
        storage.insert_sample(&sample(a, 1)).unwrap();
        storage.insert_sample(&sample(b, 2)).unwrap();

        assert_eq!(storage.delete_samples(r"C:\a.exe").unwrap(), 2);
        assert_eq!(storage.sample_count_for_path(r"C:\a.exe").unwrap(), 0);
        assert_eq!(storage.sample_count_for_path(r"C:\b.exe").unwrap(), 1);
        assert!(storage.find_identity(r"C:\a.exe").unwrap().is_some());

        // 알 수 없는 경로는 0건
        assert_eq!(storage.delete_samples(r"C:\nope.exe").unwrap(), 0);
    }
}
