// Helper functions shared by resolver and muxer adapters

use std::process::Stdio;

use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as TokioCommand;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration as TokioDuration};

/// Run a program to completion, capturing stdout and stderr.
///
/// The child is killed when the deadline passes or when the returned future is
/// dropped, so an aborted request never leaves yt-dlp or ffmpeg running.
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, String> {
    tracing::debug!(program, args = %args.join(" "), "spawning subprocess");

    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("Failed to start {}: {}", program, e))?;

    // Both pipes are drained while waiting; a child stuck on a full pipe never exits
    let stdout = drain(child.stdout.take(), "stdout");
    let stderr = drain(child.stderr.take(), "stderr");

    match timeout(TokioDuration::from_secs(timeout_secs), child.wait()).await {
        Ok(waited) => {
            let status = waited.map_err(|e| format!("Failed to wait for {}: {}", program, e))?;
            Ok(std::process::Output {
                status,
                stdout: collect(stdout, "stdout").await?,
                stderr: collect(stderr, "stderr").await?,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout.abort();
            stderr.abort();
            Err(format!("Timed out after {}s", timeout_secs))
        }
    }
}

type PipeTask = JoinHandle<Result<Vec<u8>, String>>;

fn drain<R>(pipe: Option<R>, name: &'static str) -> PipeTask
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)
                .await
                .map_err(|e| format!("Failed to read {}: {}", name, e))?;
        }
        Ok(buf)
    })
}

async fn collect(task: PipeTask, name: &str) -> Result<Vec<u8>, String> {
    task.await
        .map_err(|e| format!("{} reader panicked: {}", name, e))?
}

/// First few stderr lines joined for an error message
pub fn summarize_stderr(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let summary = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(3)
        .collect::<Vec<_>>()
        .join(" | ");
    if summary.is_empty() {
        "no error output".to_string()
    } else {
        summary
    }
}

lazy_static::lazy_static! {
    static ref ILLEGAL_FILENAME_CHARS: Regex = Regex::new(r#"[/\\:*?"<>|\x00-\x1f\x7f]"#).unwrap();
}

/// Replace characters that are illegal in filenames on common platforms
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = ILLEGAL_FILENAME_CHARS.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned.to_string()
    }
}

/// ASCII-only variant for the plain `filename=` parameter of Content-Disposition
pub fn ascii_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_illegal_chars() {
        assert_eq!(sanitize_filename("AC/DC: Live? \"Best\""), "AC_DC_ Live_ _Best_");
        assert_eq!(sanitize_filename("tab\there"), "tab_here");
    }

    #[test]
    fn test_sanitize_empty_title() {
        assert_eq!(sanitize_filename(""), "video");
        assert_eq!(sanitize_filename(" .. "), "video");
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_filename("Über Café 東京"), "Über Café 東京");
    }

    #[test]
    fn test_ascii_filename() {
        assert_eq!(ascii_filename("Café_720p.mp4"), "Caf__720p.mp4");
    }

    #[test]
    fn test_summarize_stderr() {
        let stderr = b"\nERROR: first\nsecond\nthird\nfourth\n";
        assert_eq!(summarize_stderr(stderr), "ERROR: first | second | third");
        assert_eq!(summarize_stderr(b""), "no error output");
    }

    #[tokio::test]
    async fn test_run_output_missing_program() {
        let err = run_output_with_timeout("definitely-not-a-real-binary-xyz", vec![], 5)
            .await
            .unwrap_err();
        assert!(err.starts_with("Failed to start"));
    }
}
