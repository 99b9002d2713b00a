//! External tool resolution and invocation (`yt-dlp`, the browser driver, `pandoc`).

use crate::config::ToolSettings;
use crate::error::{Result, TalkbookError};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Environment variables consulted for the downloader path, in order.
const YT_DLP_ENV: [&str; 2] = ["YTDLP", "YT_DLP"];

/// Resolve the downloader executable: config, then env vars, then `PATH`.
pub fn yt_dlp_program(tools: &ToolSettings) -> String {
    if let Some(configured) = tools.yt_dlp.as_deref().filter(|p| !p.trim().is_empty()) {
        return shellexpand::tilde(configured).into_owned();
    }
    for var in YT_DLP_ENV {
        if let Ok(value) = std::env::var(var) {
            if !value.trim().is_empty() {
                return value;
            }
        }
    }
    "yt-dlp".to_string()
}

/// Look a program up on `PATH` (or accept it as-is when it is a path).
pub fn which(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}

/// Name used in error messages: the file name of the program.
fn display_name(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}

/// Build a command with piped output that is killed if dropped.
pub fn command<I, S>(program: &str, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Run a command to completion and require a zero exit status.
pub async fn run(program: &str, mut cmd: Command) -> Result<Output> {
    debug!(program, "running external tool");
    let output = cmd.output().await.map_err(|e| spawn_error(program, e))?;
    check_status(program, output)
}

/// Like [`run`], killing the process once `limit` elapses.
pub async fn run_with_timeout(program: &str, mut cmd: Command, limit: Duration) -> Result<Output> {
    debug!(program, timeout_secs = limit.as_secs(), "running external tool");
    let child = cmd.spawn().map_err(|e| spawn_error(program, e))?;
    // Dropping the future on timeout drops the child, and `kill_on_drop` ends it.
    match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(result) => check_status(program, result?),
        Err(_) => Err(TalkbookError::ToolTimeout(format!(
            "{} did not finish within {}s",
            display_name(program),
            limit.as_secs()
        ))),
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> TalkbookError {
    if e.kind() == std::io::ErrorKind::NotFound {
        TalkbookError::ToolNotFound(display_name(program))
    } else {
        TalkbookError::ToolFailed(format!("{}: {}", display_name(program), e))
    }
}

fn check_status(program: &str, output: Output) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
    let tail: Vec<&str> = tail.into_iter().rev().collect();
    Err(TalkbookError::ToolFailed(format!(
        "{} exited with {}: {}",
        display_name(program),
        output.status,
        tail.join(" | ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_downloader_wins() {
        let tools = ToolSettings {
            yt_dlp: Some("/opt/bin/yt-dlp".to_string()),
            ..Default::default()
        };
        assert_eq!(yt_dlp_program(&tools), "/opt/bin/yt-dlp");
    }

    #[test]
    fn test_display_name_uses_file_name() {
        assert_eq!(display_name("/usr/local/bin/pandoc"), "pandoc");
        assert_eq!(display_name("pandoc"), "pandoc");
    }

    #[tokio::test]
    async fn test_missing_program_maps_to_tool_not_found() {
        let program = "talkbook-no-such-tool";
        let err = run(program, command(program, ["--version"])).await.unwrap_err();
        assert!(matches!(err, TalkbookError::ToolNotFound(name) if name == program));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_slow_process() {
        let err = run_with_timeout("sleep", command("sleep", ["5"]), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, TalkbookError::ToolTimeout(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_tool_failed() {
        let err = run("false", command("false", Vec::<String>::new())).await.unwrap_err();
        assert!(matches!(err, TalkbookError::ToolFailed(_)));
    }
}
