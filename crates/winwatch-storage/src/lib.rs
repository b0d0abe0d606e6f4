//! # winwatch-storage
//!
//! 로컬 저장소 어댑터.
//! SQLite 기반 프로세스 식별 정보와 사용 샘플 저장, 스키마 마이그레이션을 관리한다.
//!
//! ## 모듈
//! - `sqlite`: 사용 기록 저장소 (UsageStore 구현)
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod sqlite;
