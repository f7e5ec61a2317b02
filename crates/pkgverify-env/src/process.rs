//! Bounded subprocess execution with captured output.

use crate::error::ProcessError;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Upper bound on captured output kept per stream. Installer logs can run to
/// megabytes; the tail is where the error lives.
pub const MAX_CAPTURED_CHARS: usize = 8 * 1024;

/// A command to run, with its working directory, extra environment and bound.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Working directory, inherited when `None`.
    pub cwd: Option<PathBuf>,

    /// Additional environment variables.
    pub env: Vec<(String, String)>,

    /// Timeout in seconds (0 = unbounded).
    pub timeout_secs: u64,
}

impl CommandSpec {
    pub fn new<I, S>(command: I, timeout_secs: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            cwd: None,
            env: Vec::new(),
            timeout_secs,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }
}

/// Result of a command that ran to completion.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code (-1 when terminated by a signal).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether the process exited successfully.
    pub success: bool,
}

impl ProcessOutput {
    /// Whether this command passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }

    /// The most useful slice of output for a diagnostic: stderr when the
    /// command wrote any, stdout otherwise.
    pub fn diagnostic_output(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Run a command to completion, killing it if it exceeds `timeout_secs`.
///
/// The child is spawned with `kill_on_drop`, so when the timeout elapses the
/// wait future is dropped and the process is terminated rather than leaked.
pub async fn run_bounded(spec: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
    let start = Instant::now();

    if spec.command.is_empty() {
        return Err(ProcessError::EmptyCommand);
    }

    let program = spec.program().to_string();
    let mut command = Command::new(&spec.command[0]);
    command
        .args(&spec.command[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }
    for (key, value) in &spec.env {
        command.env(key, value);
    }

    let child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;

    let waited = if spec.timeout_secs > 0 {
        tokio::time::timeout(
            Duration::from_secs(spec.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ProcessError::Timeout {
            program: program.clone(),
            limit_secs: spec.timeout_secs,
        })?
    } else {
        child.wait_with_output().await
    };
    let output = waited.map_err(|source| ProcessError::Wait {
        program: program.clone(),
        source,
    })?;

    let duration_ms = start.elapsed().as_millis() as u64;
    let exit_code = output.status.code().unwrap_or(-1);

    Ok(ProcessOutput {
        exit_code,
        stdout: tail_chars(&String::from_utf8_lossy(&output.stdout), MAX_CAPTURED_CHARS),
        stderr: tail_chars(&String::from_utf8_lossy(&output.stderr), MAX_CAPTURED_CHARS),
        duration_ms,
        success: output.status.success(),
    })
}

/// Keep the last `max` characters of `text`, marking the cut.
pub fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let skip = count - max;
    let cut = text
        .char_indices()
        .nth(skip)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    format!("[... {skip} characters truncated ...]\n{}", &text[cut..])
}
