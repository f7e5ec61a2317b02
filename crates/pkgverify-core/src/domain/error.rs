//! Error taxonomy for pkgverify.
//!
//! `FetchError` and `pkgverify_env::InstallError` are per-repository
//! conditions and end up as failing check outcomes. `VerifyError` is the
//! run-level error: it aborts the run and is surfaced to the caller.

use std::path::{Path, PathBuf};

/// Failure to obtain a local snapshot of a repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("invalid repository reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("git clone failed (exit code {exit_code}): {output}")]
    CloneFailed { exit_code: i32, output: String },

    #[error("git clone timed out after {limit_secs} seconds")]
    Timeout { limit_secs: u64 },

    #[error("git could not be run: {0}")]
    Spawn(String),

    #[error("could not prepare checkout directory: {0}")]
    Scratch(String),
}

/// Run-level errors. Any of these halts processing.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("file system error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl VerifyError {
    /// Wrap an I/O error with the path it concerns.
    pub fn fs(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        VerifyError::FileSystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result type for run-level operations.
pub type Result<T> = std::result::Result<T, VerifyError>;
