//! Error types for pkgverify-env

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while running an external command.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Command vector had no executable
    #[error("command is empty")]
    EmptyCommand,

    /// The executable could not be started
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command exceeded its time bound and was killed
    #[error("`{program}` timed out after {limit_secs} seconds")]
    Timeout { program: String, limit_secs: u64 },

    /// Waiting on the child failed after it was spawned
    #[error("failed to collect output of `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Classification of a failed install attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallErrorKind {
    /// The installer ran and exited unsuccessfully
    #[error("exited with code {code}")]
    Exit { code: i32 },

    /// The installer did not finish within the configured bound
    #[error("timed out after {limit_secs}s")]
    Timeout { limit_secs: u64 },

    /// The installer could not be started at all
    #[error("could not be started")]
    Spawn,

    /// The isolated environment itself could not be created
    #[error("environment setup failed")]
    Environment,
}

/// A failed install attempt with the output a student needs to self-diagnose.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{command} {kind}: {output}")]
pub struct InstallError {
    /// Human-readable command that was attempted, e.g. `pip install -e .`
    pub command: String,
    pub kind: InstallErrorKind,
    /// Captured (and possibly truncated) installer output.
    pub output: String,
}

impl InstallError {
    pub fn new(command: impl Into<String>, kind: InstallErrorKind, output: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            kind,
            output: output.into(),
        }
    }

    /// Exit code of the installer, when it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self.kind {
            InstallErrorKind::Exit { code } => Some(code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, InstallErrorKind::Timeout { .. })
    }
}
