// Helper functions shared by the source, the muxer and the dispatcher

use regex::Regex;
use std::process::{Command as StdCommand, Stdio};
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;

use super::models::VideoReference;

lazy_static::lazy_static! {
    static ref VIDEO_LINK_RE: Regex = Regex::new(r"(?i)(youtube\.com|youtu\.be)").unwrap();
}

/// Treat a chat message as a video reference when it mentions a known host.
/// The whole trimmed text becomes the reference.
pub fn detect_video_reference(text: &str) -> Option<VideoReference> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !VIDEO_LINK_RE.is_match(trimmed) {
        return None;
    }
    Some(VideoReference::new(trimmed))
}

/// Locate an executable: common install dirs first, then `which`, then the
/// bare name (left to `PATH` at spawn time).
pub fn find_binary(name: &str) -> String {
    let common_paths = [
        format!("/opt/homebrew/bin/{}", name), // Homebrew on Apple Silicon
        format!("/usr/local/bin/{}", name),
        format!("/usr/bin/{}", name),
    ];

    for path in common_paths {
        if std::path::Path::new(&path).exists() {
            return path;
        }
    }

    if let Ok(output) = StdCommand::new("which").arg(name).output() {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    name.to_string()
}

/// Run a command to completion, capturing stdout and stderr.
///
/// No timeout: a hung child blocks the calling request only.
pub async fn run_output(program: &str, args: Vec<String>) -> Result<std::process::Output, String> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("Failed to start {}: {}", program, e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| format!("Failed to capture stdout from {}", program))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| format!("Failed to capture stderr from {}", program))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read stdout: {}", e))?;
        Ok::<Vec<u8>, String>(buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read stderr: {}", e))?;
        Ok::<Vec<u8>, String>(buf)
    });

    let status = child
        .wait()
        .await
        .map_err(|e| format!("Failed to wait for {}: {}", program, e))?;
    let stdout = stdout_task
        .await
        .map_err(|e| format!("stdout task failed: {}", e))??;
    let stderr = stderr_task
        .await
        .map_err(|e| format!("stderr task failed: {}", e))??;

    Ok(std::process::Output { status, stdout, stderr })
}

/// Last few lines of a process' stderr, for error messages
pub fn stderr_tail(stderr: &[u8], max_lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
