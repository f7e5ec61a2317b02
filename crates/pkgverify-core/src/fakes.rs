//! In-memory fakes for the fetcher and environment seams (testing only)
//!
//! Provides `FixtureFetcher`, `FakeProvisioner` and `FakeEnvironment` that
//! satisfy the trait contracts without network access, git or Python.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pkgverify_env::{
    EnvironmentProvisioner, InstallEnvironment, InstallError, InstallErrorKind, InstallResult,
    Installed,
};

use crate::domain::{FetchError, RepositoryReference};
use crate::fetch::{RepositoryFetcher, Snapshot};

/// Marker in `pyproject.toml` that makes the fake editable install fail.
pub const FAKE_FAIL_MARKER: &str = "# fake: fail";

/// Marker in `pyproject.toml` that makes the fake editable install time out.
pub const FAKE_TIMEOUT_MARKER: &str = "# fake: timeout";

/// Prefix of a `pyproject.toml` line naming a package the fake editable
/// install imports at build time, e.g. `# fake: build-requires numpy`.
pub const FAKE_BUILD_REQUIRES_MARKER: &str = "# fake: build-requires ";

/// Requirement the fake environment can never resolve.
pub const UNAVAILABLE_PACKAGE: &str = "definitely-not-a-real-package";

// ---------------------------------------------------------------------------
// FixtureFetcher
// ---------------------------------------------------------------------------

/// Fetcher serving fixed file trees keyed by repository URL. Unknown URLs
/// fail the way `git clone` does for a missing repository.
#[derive(Debug, Default, Clone)]
pub struct FixtureFetcher {
    repos: HashMap<String, Vec<(String, String)>>,
    fetched: Arc<Mutex<Vec<PathBuf>>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, url: &str, files: &[(&str, &str)]) -> Self {
        let files = files
            .iter()
            .map(|(name, content)| (name.to_string(), content.to_string()))
            .collect();
        self.repos.insert(url.to_string(), files);
        self
    }

    /// Destination directories of every successful fetch, in call order.
    pub fn fetched_dirs(&self) -> Vec<PathBuf> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryFetcher for FixtureFetcher {
    async fn fetch(
        &self,
        reference: &RepositoryReference,
        dest: &Path,
    ) -> Result<Snapshot, FetchError> {
        let Some(files) = self.repos.get(reference.as_str()) else {
            return Err(FetchError::CloneFailed {
                exit_code: 128,
                output: format!(
                    "remote: Repository not found.\nfatal: repository '{reference}' not found"
                ),
            });
        };

        std::fs::create_dir_all(dest).map_err(|e| FetchError::Scratch(e.to_string()))?;
        for (name, content) in files {
            let path = dest.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| FetchError::Scratch(e.to_string()))?;
            }
            std::fs::write(&path, content).map_err(|e| FetchError::Scratch(e.to_string()))?;
        }

        self.fetched.lock().unwrap().push(dest.to_path_buf());
        Ok(Snapshot::new(dest))
    }
}

// ---------------------------------------------------------------------------
// FakeProvisioner / FakeEnvironment
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Counters {
    provisioned: Mutex<Vec<PathBuf>>,
    released: AtomicUsize,
}

/// Provisioner handing out [`FakeEnvironment`]s and counting their lifetimes.
#[derive(Debug, Default, Clone)]
pub struct FakeProvisioner {
    provision_error: Option<InstallError>,
    counters: Arc<Counters>,
}

impl FakeProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provisioner whose environments can never be created.
    pub fn failing(error: InstallError) -> Self {
        Self {
            provision_error: Some(error),
            ..Self::default()
        }
    }

    /// Environment directories handed out so far, in call order.
    pub fn provisioned_dirs(&self) -> Vec<PathBuf> {
        self.counters.provisioned.lock().unwrap().clone()
    }

    /// Environments created and not yet dropped.
    pub fn live_environments(&self) -> usize {
        self.counters.provisioned.lock().unwrap().len()
            - self.counters.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnvironmentProvisioner for FakeProvisioner {
    async fn provision(&self, env_dir: &Path) -> Result<Box<dyn InstallEnvironment>, InstallError> {
        if let Some(err) = &self.provision_error {
            return Err(err.clone());
        }
        std::fs::create_dir_all(env_dir).map_err(|e| {
            InstallError::new("fake venv", InstallErrorKind::Environment, e.to_string())
        })?;
        self.counters
            .provisioned
            .lock()
            .unwrap()
            .push(env_dir.to_path_buf());
        Ok(Box::new(FakeEnvironment {
            root: env_dir.to_path_buf(),
            installed: Mutex::new(Vec::new()),
            counters: Arc::clone(&self.counters),
        }))
    }
}

/// Environment that "installs" by inspecting the project files.
///
/// Editable installs need `pyproject.toml` or `setup.py`, plus every
/// build-time package named with [`FAKE_BUILD_REQUIRES_MARKER`] already
/// installed; requirements resolve unless they name [`UNAVAILABLE_PACKAGE`].
#[derive(Debug)]
pub struct FakeEnvironment {
    root: PathBuf,
    installed: Mutex<Vec<String>>,
    counters: Arc<Counters>,
}

fn requirement_name(line: &str) -> &str {
    line.split(|c: char| matches!(c, '=' | '<' | '>' | '!' | '~' | '[' | ';' | ' '))
        .next()
        .unwrap_or(line)
        .trim()
}

impl FakeEnvironment {
    /// First build-time package the project needs that is not installed yet.
    fn missing_build_requirement(&self, pyproject: &str) -> Option<String> {
        let installed = self.installed.lock().unwrap();
        let missing = pyproject
            .lines()
            .filter_map(|line| line.trim().strip_prefix(FAKE_BUILD_REQUIRES_MARKER))
            .map(str::trim)
            .find(|name| !installed.iter().any(|i| i == name))
            .map(str::to_string);
        missing
    }
}

#[async_trait]
impl InstallEnvironment for FakeEnvironment {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn install_editable(&self, project_dir: &Path) -> InstallResult {
        const COMMAND: &str = "pip install -e .";
        let pyproject = std::fs::read_to_string(project_dir.join("pyproject.toml")).ok();
        let has_setup = project_dir.join("setup.py").is_file();

        if let Some(name) = pyproject
            .as_deref()
            .and_then(|text| self.missing_build_requirement(text))
        {
            return Err(InstallError::new(
                COMMAND,
                InstallErrorKind::Exit { code: 1 },
                format!("ModuleNotFoundError: No module named '{name}'"),
            ));
        }

        match pyproject {
            Some(text) if text.contains(FAKE_TIMEOUT_MARKER) => Err(InstallError::new(
                COMMAND,
                InstallErrorKind::Timeout { limit_secs: 600 },
                "no result within 600 seconds; the install was aborted",
            )),
            Some(text) if text.contains(FAKE_FAIL_MARKER) => Err(InstallError::new(
                COMMAND,
                InstallErrorKind::Exit { code: 1 },
                "ERROR: Failed building editable for demo",
            )),
            None if !has_setup => Err(InstallError::new(
                COMMAND,
                InstallErrorKind::Exit { code: 1 },
                "ERROR: file:///project does not appear to be a Python project: \
                 neither 'setup.py' nor 'pyproject.toml' found.",
            )),
            _ => {
                self.installed.lock().unwrap().push("-e .".to_string());
                Ok(Installed {
                    command: COMMAND.to_string(),
                    duration_ms: 1,
                })
            }
        }
    }

    async fn install_requirements(
        &self,
        requirements: &Path,
        _project_dir: &Path,
    ) -> InstallResult {
        const COMMAND: &str = "pip install -r requirements.txt";
        let text = std::fs::read_to_string(requirements).map_err(|e| {
            InstallError::new(COMMAND, InstallErrorKind::Exit { code: 1 }, e.to_string())
        })?;

        let wanted: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();
        if let Some(bad) = wanted
            .iter()
            .find(|line| requirement_name(line) == UNAVAILABLE_PACKAGE)
        {
            return Err(InstallError::new(
                COMMAND,
                InstallErrorKind::Exit { code: 1 },
                format!("ERROR: No matching distribution found for {bad}"),
            ));
        }

        let mut installed = self.installed.lock().unwrap();
        installed.extend(wanted.iter().map(|l| requirement_name(l).to_string()));
        Ok(Installed {
            command: COMMAND.to_string(),
            duration_ms: 1,
        })
    }
}

impl Drop for FakeEnvironment {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}
