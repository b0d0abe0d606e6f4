//! Cross-crate 에러 경로 테스트.
//!
//! 어댑터 에러가 `CoreError`로 변환되어 복구 가능 여부가 올바르게 분류되는지 검증한다.

use chrono::Utc;
use winwatch_core::error::CoreError;
use winwatch_core::ports::monitor::ProcessResolver;
use winwatch_core::ports::storage::UsageStore;
use winwatch_monitor::process::ForegroundTracker;
use winwatch_monitor::version_info::{describe, VersionInfoError};
use winwatch_storage::sqlite::SqliteStorage;

#[test]
fn truncated_version_block_is_recoverable() {
    // wLength가 블록 크기보다 큼
    let block = [0x40, 0x00, 0x00, 0x00];
    let err = describe(&block).unwrap_err();
    assert!(matches!(err, VersionInfoError::OutOfBounds { .. }));

    let core = err.into_core(r"C:\apps\broken.exe");
    assert!(matches!(core, CoreError::DescriptionUnavailable { .. }));
    assert!(core.is_recoverable());
}

#[test]
fn empty_version_block_is_recoverable() {
    let err = describe(&[]).unwrap_err();
    assert!(err.into_core("x.exe").is_recoverable());
}

#[tokio::test]
async fn description_of_missing_file_is_recoverable() {
    let tracker = ForegroundTracker::new();
    let err = tracker
        .resolve_description("/no/such/dir/app.exe")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DescriptionUnavailable { .. }));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn duplicate_identity_is_conflict() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage
        .create_identity("a.exe", r"C:\a.exe", "", true)
        .await
        .unwrap();
    let err = storage
        .create_identity("a.exe", r"C:\a.exe", "", true)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));
    assert!(err.to_string().contains(r"C:\a.exe"));
}

#[tokio::test]
async fn sample_for_unknown_identity_is_not_found() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let err = storage.append_sample(999, Utc::now()).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn set_tracked_on_unknown_path_reports_no_match() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    assert!(!storage.set_tracked(true, r"C:\ghost.exe").await.unwrap());
}
