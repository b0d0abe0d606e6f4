//! `UsageStore` 포트 구현.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use winwatch_core::error::CoreError;
use winwatch_core::models::process::IdentityRef;
use winwatch_core::models::usage::{UsageSample, UsageStat};
use winwatch_core::ports::storage::UsageStore;

use super::SqliteStorage;

#[async_trait]
impl UsageStore for SqliteStorage {
    async fn find_identity_by_path(&self, path: &str) -> Result<Option<IdentityRef>, CoreError> {
        self.find_identity(path)
    }

    async fn create_identity(
        &self,
        name: &str,
        path: &str,
        description: &str,
        tracked: bool,
    ) -> Result<i64, CoreError> {
        self.insert_identity(name, path, description, tracked)
    }

    async fn set_tracked(&self, tracked: bool, path: &str) -> Result<bool, CoreError> {
        self.update_tracked(tracked, path)
    }

    async fn append_sample(
        &self,
        identity_id: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.insert_sample(&UsageSample {
            identity_id,
            timestamp,
        })
    }

    async fn list_excluded_paths(&self) -> Result<Vec<String>, CoreError> {
        self.excluded_paths()
    }

    async fn usage_by_identity_descending(&self) -> Result<Vec<UsageStat>, CoreError> {
        self.usage_stats()
    }

    async fn delete_samples_for_path(&self, path: &str) -> Result<usize, CoreError> {
        self.delete_samples(path)
    }

    async fn reset_all(&self) -> Result<(), CoreError> {
        self.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    const EDITOR: &str = r"C:\Windows\System32\notepad.exe";

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_create_yields_one_row() {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage
                        .create_identity("notepad.exe", EDITOR, "Notepad", true)
                        .await
                })
            })
            .collect();

        let mut created = Vec::new();
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(id) => created.push(id),
                Err(CoreError::Conflict { .. }) => conflicts += 1,
                Err(e) => panic!("예상치 못한 에러: {e}"),
            }
        }
        assert_eq!(created.len(), 1);
        assert_eq!(conflicts, 1);

        let found = storage.find_identity_by_path(EDITOR).await.unwrap().unwrap();
        assert_eq!(found.id, created[0]);
    }

    #[tokio::test]
    async fn tracked_toggle_preserves_identity() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage
            .create_identity("notepad.exe", EDITOR, "Notepad", true)
            .await
            .unwrap();
        let before = storage.get_identity(EDITOR).unwrap().unwrap();

        assert!(storage.set_tracked(false, EDITOR).await.unwrap());
        assert_eq!(storage.list_excluded_paths().await.unwrap(), vec![EDITOR]);
        assert!(!storage.find_identity_by_path(EDITOR).await.unwrap().unwrap().tracked);

        assert!(storage.set_tracked(true, EDITOR).await.unwrap());
        let after = storage.get_identity(EDITOR).unwrap().unwrap();
        assert_eq!(after, before);
        assert!(storage.list_excluded_paths().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn samples_flow_through_port() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let id = storage
            .create_identity("notepad.exe", EDITOR, "Notepad", true)
            .await
            .unwrap();

        let now = Utc::now();
        for i in 0..3 {
            storage
                .append_sample(id, now + Duration::seconds(i))
                .await
                .unwrap();
        }

        let stats = storage.usage_by_identity_descending().await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].display_name(), "Notepad");
        assert_eq!(stats[0].sample_count, 3);

        assert_eq!(storage.delete_samples_for_path(EDITOR).await.unwrap(), 3);
        assert!(storage.usage_by_identity_descending().await.unwrap().is_empty());

        storage.reset_all().await.unwrap();
        assert!(storage.find_identity_by_path(EDITOR).await.unwrap().is_none());
    }
}
