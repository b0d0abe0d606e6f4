//! 대화형 제어 콘솔.
//!
//! 사용 통계 조회, 추적 제외/재개, 기록 삭제, 전체 초기화.
//! 샘플러 실행 중에는 stdin 줄 단위 콘솔로, 그 외에는 CLI 하위 명령으로 실행된다.
//! 실패한 명령은 오류 메시지만 출력하고 세션은 계속된다.

use std::fmt::Write as _;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use winwatch_core::error::CoreError;
use winwatch_core::ports::storage::UsageStore;

use crate::tracker::UsageTracker;

/// 콘솔 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// 사용 시간 내림차순 통계
    Stats,
    /// 제외된 경로 목록
    Exclusions,
    /// 경로 추적 제외
    Exclude(String),
    /// 경로 추적 재개
    Include(String),
    /// 경로의 사용 기록 삭제
    Delete(String),
    /// 전체 초기화
    Reset,
    /// 도움말
    Help,
    /// 콘솔 종료 (앱 종료)
    Quit,
}

/// 명령 파싱 에러
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("알 수 없는 명령: {0}")]
    Unknown(String),

    #[error("'{0}' 명령에는 경로가 필요합니다")]
    MissingPath(&'static str),
}

impl FromStr for ControlCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        // 공백이 들어간 경로는 따옴표로 감쌀 수 있음
        let path = |command: &'static str| {
            let path = rest.trim_matches('"');
            if path.is_empty() {
                Err(ParseCommandError::MissingPath(command))
            } else {
                Ok(path.to_string())
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "stats" => Ok(Self::Stats),
            "exclusions" => Ok(Self::Exclusions),
            "exclude" => path("exclude").map(Self::Exclude),
            "include" => path("include").map(Self::Include),
            "delete" => path("delete").map(Self::Delete),
            "reset" => Ok(Self::Reset),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(ParseCommandError::Unknown(word.to_string())),
        }
    }
}

/// 콘솔 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// `quit` 명령
    Quit,
    /// 입력 스트림 종료
    Eof,
}

const HELP: &str = "\
명령:
  stats              사용 시간 통계
  exclusions         제외된 경로 목록
  exclude <경로>     경로 추적 제외
  include <경로>     경로 추적 재개
  delete <경로>      경로의 사용 기록 삭제
  reset              모든 기록 삭제
  help               도움말
  quit               종료";

/// 제어 콘솔
pub struct ControlSurface {
    store: Arc<dyn UsageStore>,
    tracker: Arc<UsageTracker>,
    /// 샘플 하나가 나타내는 시간
    tick: Duration,
}

impl ControlSurface {
    pub fn new(store: Arc<dyn UsageStore>, tracker: Arc<UsageTracker>, tick: Duration) -> Self {
        Self {
            store,
            tracker,
            tick,
        }
    }

    /// 명령 실행, 출력 텍스트 반환
    pub async fn execute(&self, command: &ControlCommand) -> Result<String, CoreError> {
        debug!("제어 명령: {command:?}");
        match command {
            ControlCommand::Stats => {
                let stats = self.store.usage_by_identity_descending().await?;
                if stats.is_empty() {
                    return Ok("기록 없음".to_string());
                }
                let mut out = format!("{:>12}  {:<32}  {}", "시간", "이름", "경로");
                for stat in &stats {
                    let _ = write!(
                        out,
                        "\n{:>12}  {:<32}  {}",
                        format_duration(stat.foreground_time(self.tick)),
                        stat.display_name(),
                        stat.path
                    );
                }
                Ok(out)
            }
            ControlCommand::Exclusions => {
                let paths = self.store.list_excluded_paths().await?;
                if paths.is_empty() {
                    Ok("제외된 경로 없음".to_string())
                } else {
                    Ok(paths.join("\n"))
                }
            }
            ControlCommand::Exclude(path) => {
                self.tracker.exclude_path(path).await?;
                Ok(format!("추적 제외: {path}"))
            }
            ControlCommand::Include(path) => {
                self.tracker.include_path(path).await?;
                Ok(format!("추적 재개: {path}"))
            }
            ControlCommand::Delete(path) => {
                let deleted = self.store.delete_samples_for_path(path).await?;
                Ok(format!("기록 {deleted}건 삭제: {path}"))
            }
            ControlCommand::Reset => {
                self.store.reset_all().await?;
                Ok("모든 기록을 삭제했습니다".to_string())
            }
            ControlCommand::Help => Ok(HELP.to_string()),
            ControlCommand::Quit => Ok("종료합니다".to_string()),
        }
    }

    /// 줄 단위 콘솔 실행 (`quit` 또는 입력 종료까지)
    pub async fn run_console<W>(
        &self,
        mut lines: mpsc::Receiver<String>,
        mut output: W,
    ) -> Result<ConsoleExit, CoreError>
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(line) = lines.recv().await {
            if line.trim().is_empty() {
                continue;
            }

            let reply = match line.parse::<ControlCommand>() {
                Ok(ControlCommand::Quit) => return Ok(ConsoleExit::Quit),
                Ok(command) => match self.execute(&command).await {
                    Ok(text) => text,
                    Err(e) => format!("오류: {e}"),
                },
                Err(e) => format!("오류: {e} (help 참고)"),
            };

            output.write_all(reply.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok(ConsoleExit::Eof)
    }
}

/// stdin 줄을 채널로 전달하는 리더 스레드 시작
///
/// 블로킹 읽기는 취소할 수 없으므로 런타임 밖의 분리된 스레드에서 읽는다.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    let spawned = std::thread::Builder::new()
        .name("winwatch-console".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("stdin 읽기 실패: {e}");
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!("콘솔 스레드 시작 실패: {e}");
    }
    rx
}

/// 사람이 읽기 쉬운 시간 (예: `1h 02m 03s`)
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use winwatch_core::models::process::ResolvedProcess;
    use winwatch_core::ports::monitor::ProcessResolver;
    use winwatch_storage::sqlite::SqliteStorage;

    const EDITOR: &str = r"C:\Tools\editor.exe";
    const GAME: &str = r"D:\Games\game.exe";

    struct NoResolver;

    #[async_trait]
    impl ProcessResolver for NoResolver {
        async fn resolve_identity(&self, pid: u32) -> Result<ResolvedProcess, CoreError> {
            Err(CoreError::ProcessAccess {
                pid,
                message: "테스트".to_string(),
            })
        }

        async fn resolve_description(&self, path: &str) -> Result<String, CoreError> {
            Err(CoreError::DescriptionUnavailable {
                path: path.to_string(),
                reason: "테스트".to_string(),
            })
        }
    }

    fn surface() -> (Arc<SqliteStorage>, ControlSurface) {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let tracker = Arc::new(UsageTracker::new(storage.clone(), Arc::new(NoResolver)));
        let control = ControlSurface::new(storage.clone(), tracker, Duration::from_secs(1));
        (storage, control)
    }

    async fn seed(storage: &SqliteStorage, path: &str, description: &str, samples: i64) {
        let id = storage
            .create_identity("x.exe", path, description, true)
            .await
            .unwrap();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let offset = id * 100_000;
        for i in 0..samples {
            storage
                .append_sample(id, base + ChronoDuration::seconds(offset + i))
                .await
                .unwrap();
        }
    }

    fn parse(line: &str) -> Result<ControlCommand, ParseCommandError> {
        line.parse()
    }

    #[test]
    fn parse_commands() {
        assert_eq!(parse("stats"), Ok(ControlCommand::Stats));
        assert_eq!(parse("  STATS  "), Ok(ControlCommand::Stats));
        assert_eq!(parse("exclusions"), Ok(ControlCommand::Exclusions));
        assert_eq!(
            parse(r"exclude C:\Tools\editor.exe"),
            Ok(ControlCommand::Exclude(EDITOR.to_string()))
        );
        assert_eq!(
            parse(r#"include "C:\Program Files\App\app.exe""#),
            Ok(ControlCommand::Include(r"C:\Program Files\App\app.exe".to_string()))
        );
        assert_eq!(
            parse(r"delete C:\Program Files\App\app.exe"),
            Ok(ControlCommand::Delete(r"C:\Program Files\App\app.exe".to_string()))
        );
        assert_eq!(parse("reset"), Ok(ControlCommand::Reset));
        assert_eq!(parse("?"), Ok(ControlCommand::Help));
        assert_eq!(parse("exit"), Ok(ControlCommand::Quit));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            parse("exclude"),
            Err(ParseCommandError::MissingPath("exclude"))
        );
        assert_eq!(
            parse("frobnicate now"),
            Err(ParseCommandError::Unknown("frobnicate".to_string()))
        );
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0s");
        assert_eq!(format_duration(Duration::from_secs(59)), "59s");
        assert_eq!(format_duration(Duration::from_secs(61)), "1m 01s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 02m 03s");
        assert_eq!(format_duration(Duration::from_secs(90_000)), "25h 00m 00s");
    }

    #[tokio::test]
    async fn stats_lists_descending_with_durations() {
        let (storage, control) = surface();
        seed(&storage, EDITOR, "Editor", 3).await;
        seed(&storage, GAME, "", 75).await;

        let out = control.execute(&ControlCommand::Stats).await.unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("1m 15s"));
        assert!(lines[1].contains(GAME));
        assert!(lines[2].contains("3s"));
        assert!(lines[2].contains("Editor"));
    }

    #[tokio::test]
    async fn empty_stats() {
        let (_storage, control) = surface();
        let out = control.execute(&ControlCommand::Stats).await.unwrap();
        assert_eq!(out, "기록 없음");
    }

    #[tokio::test]
    async fn exclusions_round_trip() {
        let (_storage, control) = surface();
        control
            .execute(&ControlCommand::Exclude(GAME.to_string()))
            .await
            .unwrap();
        let listed = control.execute(&ControlCommand::Exclusions).await.unwrap();
        assert_eq!(listed, GAME);

        control
            .execute(&ControlCommand::Include(GAME.to_string()))
            .await
            .unwrap();
        let listed = control.execute(&ControlCommand::Exclusions).await.unwrap();
        assert_eq!(listed, "제외된 경로 없음");
    }

    #[tokio::test]
    async fn delete_and_reset() {
        let (storage, control) = surface();
        seed(&storage, EDITOR, "Editor", 4).await;

        let out = control
            .execute(&ControlCommand::Delete(EDITOR.to_string()))
            .await
            .unwrap();
        assert!(out.contains("4건"));
        assert!(storage.get_identity(EDITOR).unwrap().is_some());

        control.execute(&ControlCommand::Reset).await.unwrap();
        assert!(storage.get_identity(EDITOR).unwrap().is_none());
    }

    #[tokio::test]
    async fn console_keeps_running_after_errors() {
        let (_storage, control) = surface();
        let (tx, rx) = mpsc::channel(8);
        for line in ["bogus", "include C:\\nope.exe", "", "help", "quit", "stats"] {
            tx.send(line.to_string()).await.unwrap();
        }

        let mut output = Vec::new();
        let exit = control.run_console(rx, &mut output).await.unwrap();
        assert_eq!(exit, ConsoleExit::Quit);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("알 수 없는 명령: bogus"));
        assert!(text.contains("미발견"));
        assert!(text.contains("exclude <경로>"));
        // quit 이후 명령은 실행되지 않음
        assert!(!text.contains("기록 없음"));
    }

    #[tokio::test]
    async fn console_ends_on_closed_input() {
        let (_storage, control) = surface();
        let (tx, rx) = mpsc::channel(1);
        drop(tx);

        let exit = control.run_console(rx, tokio::io::sink()).await.unwrap();
        assert_eq!(exit, ConsoleExit::Eof);
    }
}
