//! # winwatch-app
//!
//! winwatch 바이너리 진입점.
//! DI 와이어링, 라이프사이클 관리, 샘플링 스케줄러와 제어 콘솔 오케스트레이션.

mod control;
mod lifecycle;
mod scheduler;
mod tracker;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use winwatch_core::config_manager::ConfigManager;
use winwatch_monitor::process::ForegroundTracker;
use winwatch_storage::sqlite::SqliteStorage;

use crate::control::{spawn_stdin_reader, ConsoleExit, ControlCommand, ControlSurface};
use crate::lifecycle::LifecycleManager;
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::tracker::UsageTracker;

/// winwatch: 포그라운드 프로세스 사용 시간 추적기
#[derive(Parser, Debug)]
#[command(name = "winwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 샘플링 간격 (밀리초, 설정 파일 값 덮어쓰기)
    #[arg(long)]
    poll_interval: Option<u64>,

    /// 데이터 저장 디렉토리 (기본: 플랫폼 데이터 디렉토리)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// 한 번 실행할 명령 (없으면 샘플러 + 콘솔 실행)
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 사용 시간 통계
    Stats,
    /// 제외된 경로 목록
    Exclusions,
    /// 경로 추적 제외
    Exclude { path: String },
    /// 경로 추적 재개
    Include { path: String },
    /// 경로의 사용 기록 삭제
    Delete { path: String },
    /// 모든 기록 삭제
    Reset {
        /// 확인 (없으면 실행하지 않음)
        #[arg(long)]
        yes: bool,
    },
}

impl From<Command> for ControlCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Stats => ControlCommand::Stats,
            Command::Exclusions => ControlCommand::Exclusions,
            Command::Exclude { path } => ControlCommand::Exclude(path),
            Command::Include { path } => ControlCommand::Include(path),
            Command::Delete { path } => ControlCommand::Delete(path),
            Command::Reset { .. } => ControlCommand::Reset,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "winwatch={0},winwatch_app={0},winwatch_core={0},winwatch_monitor={0},winwatch_storage={0}",
        args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    // 설정 로드
    let config_manager = match args.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .context("설정 로드 실패")?;
    info!("설정 파일: {}", config_manager.config_path().display());
    let mut config = config_manager.get();

    // CLI 인자로 설정 오버라이드
    if let Some(poll_interval) = args.poll_interval {
        config.monitor.poll_interval_ms = poll_interval;
    }
    config.validate().context("설정 검증 실패")?;

    // 저장소 열기
    let db_path = ConfigManager::resolve_db_path(args.data_dir.as_deref(), &config)?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("데이터 디렉토리 생성 실패: {}", parent.display()))?;
    }
    let storage = Arc::new(
        SqliteStorage::open(&db_path)
            .with_context(|| format!("저장소 열기 실패: {}", db_path.display()))?,
    );

    // DI 와이어링 (블록을 벗어나면 저장소 참조는 main의 것만 남음)
    {
        let foreground = Arc::new(ForegroundTracker::new());
        let tracker = Arc::new(UsageTracker::new(storage.clone(), foreground.clone()));
        let control =
            ControlSurface::new(storage.clone(), tracker.clone(), config.poll_interval());

        match args.command {
            Some(command) => run_once(&control, command).await,
            None => {
                let scheduler = Scheduler::new(
                    SchedulerConfig::from_app_config(&config),
                    foreground,
                    tracker,
                );
                run_sampler(scheduler, control).await;
            }
        }
    }

    close_storage(storage);
    Ok(())
}

/// 하위 명령 한 번 실행
async fn run_once(control: &ControlSurface, command: Command) {
    if let Command::Reset { yes: false } = command {
        println!("모든 기록이 삭제됩니다. 계속하려면 --yes 를 지정하세요.");
        return;
    }

    match control.execute(&command.into()).await {
        Ok(output) => println!("{output}"),
        Err(e) => eprintln!("오류: {e}"),
    }
}

/// 샘플러 + 콘솔 실행, 종료 신호까지 대기
async fn run_sampler(scheduler: Scheduler, control: ControlSurface) {
    let lifecycle = LifecycleManager::new();

    let shutdown_rx = lifecycle.subscribe();
    let scheduler_task = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    info!("winwatch 실행 중 (help: 명령 목록, quit 또는 Ctrl+C: 종료)");

    {
        let console = control.run_console(spawn_stdin_reader(), tokio::io::stdout());
        tokio::pin!(console);

        tokio::select! {
            _ = lifecycle.wait_for_signal() => {}
            exit = &mut console => {
                match exit {
                    Ok(ConsoleExit::Quit) => lifecycle.shutdown(),
                    Ok(ConsoleExit::Eof) => {
                        info!("콘솔 입력 종료, 시그널 대기");
                        lifecycle.wait_for_signal().await;
                    }
                    Err(e) => {
                        warn!("콘솔 오류, 시그널 대기: {e}");
                        lifecycle.wait_for_signal().await;
                    }
                }
            }
        }
    }

    match scheduler_task.await {
        Ok(summary) => info!("샘플 {}건 기록", summary.samples),
        Err(e) => warn!("스케줄러 태스크 실패: {e}"),
    }
}

/// 남은 참조가 없을 때 저장소를 한 번 닫음
fn close_storage(storage: Arc<SqliteStorage>) {
    match Arc::try_unwrap(storage) {
        Ok(storage) => {
            if let Err(e) = storage.close() {
                warn!("저장소 닫기 실패: {e}");
            }
        }
        Err(_) => warn!("저장소 참조가 남아 있어 닫기 생략"),
    }
    info!("winwatch 종료");
}
