//! winwatch 도메인 모델.
//!
//! 어댑터 crate 간에 공유하는 데이터 구조체를 정의한다.

pub mod process;
pub mod usage;
