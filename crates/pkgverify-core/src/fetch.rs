//! Repository fetching: local snapshots of remote repositories.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pkgverify_env::{run_bounded, CommandSpec, ProcessError};
use tracing::{debug, info};

use crate::domain::{FetchError, RepositoryReference};

/// A fetched repository tree. Checks only ever read from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    root: PathBuf,
}

impl Snapshot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Regular file called exactly `name` at the snapshot root.
    pub fn root_file(&self, name: &str) -> Option<PathBuf> {
        let path = self.root.join(name);
        path.is_file().then_some(path)
    }

    /// Regular file at the root whose name equals `name` ignoring ASCII case.
    /// An exact match wins over case variants.
    pub fn root_file_ignore_case(&self, name: &str) -> Option<PathBuf> {
        if let Some(exact) = self.root_file(name) {
            return Some(exact);
        }
        let entries = std::fs::read_dir(&self.root).ok()?;
        let mut matches: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().eq_ignore_ascii_case(name))
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        matches.sort();
        matches.into_iter().next()
    }
}

/// Obtains a snapshot of a repository's default branch into `dest`.
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    async fn fetch(
        &self,
        reference: &RepositoryReference,
        dest: &Path,
    ) -> Result<Snapshot, FetchError>;
}

/// Shallow `git clone` fetcher.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    /// Git executable.
    pub git: String,

    /// History depth to fetch.
    pub depth: u32,

    /// Bound on the clone, in seconds (0 = unbounded).
    pub timeout_secs: u64,
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            depth: 1,
            timeout_secs: 300,
        }
    }
}

impl GitFetcher {
    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            ..Self::default()
        }
    }

    fn validate(reference: &RepositoryReference) -> Result<(), FetchError> {
        let url = reference.as_str();
        let reason = if url.is_empty() {
            Some("reference is empty")
        } else if url.chars().any(char::is_whitespace) {
            Some("reference contains whitespace")
        } else if url.starts_with('-') {
            Some("reference must not start with '-'")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(FetchError::InvalidReference {
                reference: url.to_string(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RepositoryFetcher for GitFetcher {
    async fn fetch(
        &self,
        reference: &RepositoryReference,
        dest: &Path,
    ) -> Result<Snapshot, FetchError> {
        Self::validate(reference)?;

        if dest.exists() {
            tokio::fs::remove_dir_all(dest)
                .await
                .map_err(|e| FetchError::Scratch(format!("{}: {e}", dest.display())))?;
        }

        info!(repo = %reference, "Cloning repository");
        let spec = CommandSpec::new(
            [
                self.git.clone(),
                "clone".to_string(),
                "--depth".to_string(),
                self.depth.to_string(),
                "--quiet".to_string(),
                "--".to_string(),
                reference.as_str().to_string(),
                dest.to_string_lossy().to_string(),
            ],
            self.timeout_secs,
        )
        // Private or missing repositories must fail, not wait for credentials.
        .env("GIT_TERMINAL_PROMPT", "0");

        let output = run_bounded(&spec).await.map_err(|e| match e {
            ProcessError::Timeout { limit_secs, .. } => FetchError::Timeout { limit_secs },
            other => FetchError::Spawn(other.to_string()),
        })?;

        if !output.passed() {
            return Err(FetchError::CloneFailed {
                exit_code: output.exit_code,
                output: output.diagnostic_output(),
            });
        }

        debug!(repo = %reference, duration_ms = output.duration_ms, "Clone finished");
        Ok(Snapshot::new(dest))
    }
}
