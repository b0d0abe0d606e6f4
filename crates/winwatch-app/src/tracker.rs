//! 추적 상태 머신.
//!
//! 경로별 상태: 미확인 → 추적 중 ⇄ 제외됨.
//! 처음 본 경로는 등록만 하고 샘플은 다음 틱부터 기록한다.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use winwatch_core::error::CoreError;
use winwatch_core::models::process::{file_name_of, ForegroundProcess, IdentityRef};
use winwatch_core::ports::monitor::ProcessResolver;
use winwatch_core::ports::storage::UsageStore;

/// 틱 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 포그라운드 프로세스 없음
    Idle,
    /// 처음 본 경로 등록 (샘플 없음)
    Registered { id: i64 },
    /// 제외된 경로 (기록 안 함)
    Excluded { id: i64 },
    /// 샘플 1건 기록
    Sampled { id: i64 },
}

/// 사용 기록 추적기
pub struct UsageTracker {
    store: Arc<dyn UsageStore>,
    resolver: Arc<dyn ProcessResolver>,
}

impl UsageTracker {
    pub fn new(store: Arc<dyn UsageStore>, resolver: Arc<dyn ProcessResolver>) -> Self {
        Self { store, resolver }
    }

    /// 샘플 하나 처리
    pub async fn tick(
        &self,
        sample: Option<ForegroundProcess>,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, CoreError> {
        let Some(process) = sample.filter(|p| !p.path.is_empty()) else {
            return Ok(TickOutcome::Idle);
        };

        match self.store.find_identity_by_path(&process.path).await? {
            None => {
                let id = self.register(&process).await?;
                Ok(TickOutcome::Registered { id })
            }
            Some(IdentityRef { id, tracked: false }) => Ok(TickOutcome::Excluded { id }),
            Some(IdentityRef { id, tracked: true }) => {
                self.store.append_sample(id, now).await?;
                Ok(TickOutcome::Sampled { id })
            }
        }
    }

    /// 경로를 추적 대상에서 제외 (처음 보는 경로면 제외 상태로 등록)
    pub async fn exclude_path(&self, path: &str) -> Result<(), CoreError> {
        if self.store.set_tracked(false, path).await? {
            info!("추적 제외: {path}");
            return Ok(());
        }

        let description = self.describe_path(path).await;

        match self
            .store
            .create_identity(&file_name_of(path), path, &description, false)
            .await
        {
            Ok(id) => {
                info!("제외 상태로 등록: id={id}, {path}");
                Ok(())
            }
            Err(CoreError::Conflict { .. }) => {
                // 그 사이 샘플러가 등록함
                self.store.set_tracked(false, path).await?;
                info!("추적 제외: {path}");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// 제외된 경로를 다시 추적
    pub async fn include_path(&self, path: &str) -> Result<(), CoreError> {
        if !self.store.set_tracked(true, path).await? {
            return Err(CoreError::NotFound {
                resource_type: "ProcessIdentity".to_string(),
                id: path.to_string(),
            });
        }
        info!("추적 재개: {path}");
        Ok(())
    }

    async fn register(&self, process: &ForegroundProcess) -> Result<i64, CoreError> {
        // 프로세스 조회가 실패해도 설명은 디스크의 실행 파일에서 읽는다
        let (name, description) = match self.resolver.resolve_identity(process.pid).await {
            Ok(resolved) if !resolved.name.is_empty() => (resolved.name, resolved.description),
            Ok(_) => (
                file_name_of(&process.path),
                self.describe_path(&process.path).await,
            ),
            Err(e) => {
                debug!("프로세스 식별 실패 (PID {}), 파일 이름 사용: {e}", process.pid);
                (
                    file_name_of(&process.path),
                    self.describe_path(&process.path).await,
                )
            }
        };

        match self
            .store
            .create_identity(&name, &process.path, &description, true)
            .await
        {
            Ok(id) => {
                info!("새 프로세스 등록: id={id}, {name} ({})", process.path);
                Ok(id)
            }
            Err(CoreError::Conflict { .. }) => {
                debug!("동시 등록 감지, 기존 행 사용: {}", process.path);
                let existing = self
                    .store
                    .find_identity_by_path(&process.path)
                    .await?
                    .ok_or_else(|| CoreError::NotFound {
                        resource_type: "ProcessIdentity".to_string(),
                        id: process.path.clone(),
                    })?;
                Ok(existing.id)
            }
            Err(e) => Err(e),
        }
    }

    /// 경로의 실행 파일 설명 (실패하면 빈 문자열)
    async fn describe_path(&self, path: &str) -> String {
        match self.resolver.resolve_description(path).await {
            Ok(description) => description,
            Err(e) => {
                debug!("설명 조회 실패, 빈 설명 사용: {e}");
                String::new()
            }
        }
    }
}
