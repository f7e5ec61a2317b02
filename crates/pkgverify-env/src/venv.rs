//! Python virtual environments as disposable install sandboxes.
//!
//! Every repository gets its own `python -m venv` directory. Nothing is shared
//! between environments except the host interpreter, and the directory is
//! removed when the [`VenvEnvironment`] is dropped.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::environment::{
    classify_install, EnvironmentProvisioner, InstallEnvironment, InstallResult,
};
use crate::error::{InstallError, InstallErrorKind};
use crate::process::{run_bounded, CommandSpec};

/// Configuration for venv-backed install environments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VenvConfig {
    /// Interpreter used to create environments.
    pub python: String,

    /// Bound for each individual install command, in seconds.
    pub install_timeout_secs: u64,

    /// Run `pip install -U pip` after creating the environment.
    pub upgrade_pip: bool,
}

impl Default for VenvConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            install_timeout_secs: 600,
            upgrade_pip: true,
        }
    }
}

/// Path of the interpreter inside a virtual environment.
pub fn venv_python(venv_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_dir.join("Scripts").join("python.exe")
    } else {
        venv_dir.join("bin").join("python")
    }
}

/// Provisions one [`VenvEnvironment`] per call.
#[derive(Debug, Clone, Default)]
pub struct VenvProvisioner {
    config: VenvConfig,
}

impl VenvProvisioner {
    pub fn new(config: VenvConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VenvConfig {
        &self.config
    }
}

#[async_trait]
impl EnvironmentProvisioner for VenvProvisioner {
    async fn provision(&self, env_dir: &Path) -> Result<Box<dyn InstallEnvironment>, InstallError> {
        const CREATE: &str = "python -m venv";

        // A leftover directory would make the environment non-empty.
        if env_dir.exists() {
            tokio::fs::remove_dir_all(env_dir).await.map_err(|e| {
                InstallError::new(CREATE, InstallErrorKind::Environment, e.to_string())
            })?;
        }

        info!(env = %env_dir.display(), python = %self.config.python, "Creating virtual environment");
        let spec = CommandSpec::new(
            [
                self.config.python.clone(),
                "-m".to_string(),
                "venv".to_string(),
                env_dir.to_string_lossy().to_string(),
            ],
            self.config.install_timeout_secs,
        );
        classify_install(CREATE, run_bounded(&spec).await).map_err(|mut e| {
            if !e.is_timeout() {
                e.kind = InstallErrorKind::Environment;
            }
            e
        })?;

        let env = VenvEnvironment {
            root: env_dir.to_path_buf(),
            python: venv_python(env_dir),
            timeout_secs: self.config.install_timeout_secs,
        };

        if self.config.upgrade_pip {
            let spec = env.pip_command(["install", "-U", "pip"], None);
            if let Err(e) = classify_install("pip install -U pip", run_bounded(&spec).await) {
                // Later installs report their own failures.
                warn!(env = %env_dir.display(), error = %e, "pip upgrade failed, continuing");
            }
        }

        Ok(Box::new(env))
    }
}

/// A live virtual environment. Removed from disk on drop.
#[derive(Debug)]
pub struct VenvEnvironment {
    root: PathBuf,
    python: PathBuf,
    timeout_secs: u64,
}

impl VenvEnvironment {
    /// Interpreter inside this environment.
    pub fn python(&self) -> &Path {
        &self.python
    }

    fn pip_command<'a>(
        &self,
        args: impl IntoIterator<Item = &'a str>,
        cwd: Option<&Path>,
    ) -> CommandSpec {
        let mut command = vec![
            self.python.to_string_lossy().to_string(),
            "-m".to_string(),
            "pip".to_string(),
        ];
        command.extend(args.into_iter().map(str::to_string));

        let mut spec = CommandSpec::new(command, self.timeout_secs)
            .env("PIP_DISABLE_PIP_VERSION_CHECK", "1")
            .env("PIP_NO_INPUT", "1")
            .env("PYTHONNOUSERSITE", "1")
            .env("VIRTUAL_ENV", self.root.to_string_lossy().to_string());
        if let Some(dir) = cwd {
            spec = spec.current_dir(dir);
        }
        spec
    }
}

#[async_trait]
impl InstallEnvironment for VenvEnvironment {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn install_editable(&self, project_dir: &Path) -> InstallResult {
        debug!(project = %project_dir.display(), "pip install -e .");
        let spec = self.pip_command(["install", "-e", "."], Some(project_dir));
        classify_install("pip install -e .", run_bounded(&spec).await)
    }

    async fn install_requirements(
        &self,
        requirements: &Path,
        project_dir: &Path,
    ) -> InstallResult {
        let file_name = requirements
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "requirements.txt".to_string());
        let label = format!("pip install -r {file_name}");
        debug!(requirements = %requirements.display(), "{label}");

        let requirements = requirements.to_string_lossy().to_string();
        let spec = self.pip_command(["install", "-r", requirements.as_str()], Some(project_dir));
        classify_install(&label, run_bounded(&spec).await)
    }
}

impl Drop for VenvEnvironment {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => debug!(env = %self.root.display(), "Removed virtual environment"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(env = %self.root.display(), error = %e, "Failed to remove virtual environment"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venv_config_default() {
        let cfg = VenvConfig::default();
        assert_eq!(cfg.python, "python3");
        assert_eq!(cfg.install_timeout_secs, 600);
        assert!(cfg.upgrade_pip);
    }

    #[test]
    fn test_venv_python_path() {
        let python = venv_python(Path::new("/tmp/env"));
        assert!(python.starts_with("/tmp/env"));
        if !cfg!(windows) {
            assert_eq!(python, PathBuf::from("/tmp/env/bin/python"));
        }
    }

    #[test]
    fn test_drop_removes_environment_dir() {
        let scratch = tempfile::tempdir().unwrap();
        let root = scratch.path().join("venv");
        std::fs::create_dir_all(root.join("lib")).unwrap();

        let env = VenvEnvironment {
            python: venv_python(&root),
            root: root.clone(),
            timeout_secs: 5,
        };
        drop(env);

        assert!(!root.exists());
    }

    #[test]
    fn test_pip_command_targets_env_interpreter() {
        let env = VenvEnvironment {
            root: PathBuf::from("/nonexistent/pkgverify-venv"),
            python: venv_python(Path::new("/nonexistent/pkgverify-venv")),
            timeout_secs: 7,
        };
        let spec = env.pip_command(["install", "-e", "."], Some(Path::new("/src")));
        assert_eq!(spec.command[0], env.python().to_string_lossy());
        assert_eq!(&spec.command[1..], ["-m", "pip", "install", "-e", "."]);
        assert_eq!(spec.cwd.as_deref(), Some(Path::new("/src")));
        assert_eq!(spec.timeout_secs, 7);
        assert!(spec.env.iter().any(|(k, v)| k == "PYTHONNOUSERSITE" && v == "1"));
    }

    #[tokio::test]
    async fn test_provision_with_missing_interpreter_is_environment_error() {
        let scratch = tempfile::tempdir().unwrap();
        let provisioner = VenvProvisioner::new(VenvConfig {
            python: "pkgverify-no-such-python".to_string(),
            install_timeout_secs: 5,
            upgrade_pip: false,
        });

        let err = match provisioner.provision(&scratch.path().join("venv")).await {
            Ok(_) => panic!("provisioning should fail"),
            Err(e) => e,
        };
        assert_eq!(err.kind, InstallErrorKind::Environment);
        assert_eq!(err.command, "python -m venv");
    }

    #[tokio::test]
    async fn test_provision_replaces_stale_directory() {
        let scratch = tempfile::tempdir().unwrap();
        let env_dir = scratch.path().join("venv");
        std::fs::create_dir_all(&env_dir).unwrap();
        std::fs::write(env_dir.join("stale.txt"), "left over").unwrap();

        let provisioner = VenvProvisioner::new(VenvConfig {
            python: "pkgverify-no-such-python".to_string(),
            install_timeout_secs: 5,
            upgrade_pip: false,
        });
        let _ = provisioner.provision(&env_dir).await;

        assert!(!env_dir.join("stale.txt").exists());
    }
}
