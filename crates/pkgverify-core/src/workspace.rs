//! Run-scoped scratch space.
//!
//! A [`RunWorkspace`] owns one temporary root for the whole run. Each
//! repository gets its own [`RepoWorkspace`] below it, keyed by its index in
//! the input list, holding the checkout and the install environment. Dropping
//! a `RepoWorkspace` removes its directory; dropping the `RunWorkspace`
//! removes the root.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::domain::{Result, VerifyError};

/// Scratch root shared by every repository of one run.
#[derive(Debug)]
pub struct RunWorkspace {
    root: TempDir,
}

impl RunWorkspace {
    /// Create a workspace under the system temp directory.
    pub fn create() -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("pkgverify-")
            .tempdir()
            .map_err(|e| VerifyError::fs(std::env::temp_dir(), e))?;
        Ok(Self { root })
    }

    /// Create a workspace under `parent`, creating `parent` if needed.
    pub fn create_in(parent: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent).map_err(|e| VerifyError::fs(parent, e))?;
        let root = tempfile::Builder::new()
            .prefix("pkgverify-")
            .tempdir_in(parent)
            .map_err(|e| VerifyError::fs(parent, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Allocate the sub-workspace for the repository at `index`.
    ///
    /// Any directory left at that slot is replaced, so the result is always
    /// empty.
    pub fn allocate(&self, index: usize) -> Result<RepoWorkspace> {
        let dir = self.root.path().join(format!("repo-{index:04}"));
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| VerifyError::fs(&dir, e))?;
        }
        std::fs::create_dir_all(&dir).map_err(|e| VerifyError::fs(&dir, e))?;
        debug!(index, dir = %dir.display(), "Allocated repository workspace");
        Ok(RepoWorkspace { index, dir })
    }
}

/// Exclusively owned scratch directory for one repository.
#[derive(Debug)]
pub struct RepoWorkspace {
    index: usize,
    dir: PathBuf,
}

impl RepoWorkspace {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Where the repository snapshot is checked out.
    pub fn checkout_dir(&self) -> PathBuf {
        self.dir.join("repo")
    }

    /// Where the install environment lives.
    pub fn env_dir(&self) -> PathBuf {
        self.dir.join("venv")
    }
}

impl Drop for RepoWorkspace {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!(index = self.index, "Released repository workspace"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                index = self.index,
                dir = %self.dir.display(),
                error = %e,
                "Failed to release repository workspace"
            ),
        }
    }
}

/// Drop `resource` on the blocking thread pool.
///
/// Workspaces and install environments delete directory trees when dropped;
/// a virtual environment can take seconds to remove, which must not stall the
/// other repositories sharing the runtime.
pub async fn release<T: Send + 'static>(resource: T) {
    if let Err(e) = tokio::task::spawn_blocking(move || drop(resource)).await {
        warn!(error = %e, "Release task failed");
    }
}
