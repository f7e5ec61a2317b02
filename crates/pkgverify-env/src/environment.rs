//! Install environment traits and install result classification.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{InstallError, InstallErrorKind, ProcessError};
use crate::process::ProcessOutput;

/// A successful install attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub command: String,
    pub duration_ms: u64,
}

/// Outcome of one install attempt: `Installed` or an `InstallError`.
pub type InstallResult = Result<Installed, InstallError>;

/// An isolated, disposable environment scoped to one repository.
///
/// Implementations must release everything they created when dropped, so a
/// failed or timed-out install never leaks state into the next repository.
#[async_trait]
pub trait InstallEnvironment: Send + Sync {
    /// Root directory of the environment.
    fn root(&self) -> &Path;

    /// Editable (development) install of the project at `project_dir`.
    async fn install_editable(&self, project_dir: &Path) -> InstallResult;

    /// Install every dependency listed in `requirements`.
    async fn install_requirements(&self, requirements: &Path, project_dir: &Path)
        -> InstallResult;
}

/// Creates a fresh [`InstallEnvironment`] in a directory it exclusively owns.
#[async_trait]
pub trait EnvironmentProvisioner: Send + Sync {
    async fn provision(&self, env_dir: &Path) -> Result<Box<dyn InstallEnvironment>, InstallError>;
}

/// Map a finished (or failed-to-finish) process onto the install result type.
pub fn classify_install(
    command: &str,
    result: Result<ProcessOutput, ProcessError>,
) -> InstallResult {
    match result {
        Ok(output) if output.passed() => Ok(Installed {
            command: command.to_string(),
            duration_ms: output.duration_ms,
        }),
        Ok(output) => Err(InstallError::new(
            command,
            InstallErrorKind::Exit {
                code: output.exit_code,
            },
            output.diagnostic_output(),
        )),
        Err(ProcessError::Timeout { limit_secs, .. }) => Err(InstallError::new(
            command,
            InstallErrorKind::Timeout { limit_secs },
            format!("no result within {limit_secs} seconds; the install was aborted"),
        )),
        Err(e) => Err(InstallError::new(
            command,
            InstallErrorKind::Spawn,
            e.to_string(),
        )),
    }
}
