//! Check runner: evaluates the fixed checklist against one repository.
//!
//! Every check runs on its own; one failing check never suppresses another.
//! The only short-circuit is a failed fetch, which fails all four checks with
//! the same diagnostic.

use pkgverify_env::{InstallEnvironment, InstallError};
use tracing::debug;

use crate::config::ReadmePolicy;
use crate::domain::{CheckName, CheckOutcome, FetchError};
use crate::fetch::Snapshot;

/// File whose presence makes a repository a Python project.
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// Optional dependency list installed by the last check.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// The install environment as the runner sees it: provisioned, or the error
/// that prevented provisioning.
pub type EnvironmentRef<'a> = Result<&'a dyn InstallEnvironment, &'a InstallError>;

/// Runs the checklist for one repository.
pub struct CheckRunner<'a> {
    readme: &'a ReadmePolicy,
}

impl<'a> CheckRunner<'a> {
    pub fn new(readme: &'a ReadmePolicy) -> Self {
        Self { readme }
    }

    /// Evaluate all four checks, reported in canonical order.
    ///
    /// Requirements are installed before the editable install so that a
    /// build step importing a listed dependency can find it.
    pub async fn run(&self, snapshot: &Snapshot, env: EnvironmentRef<'_>) -> Vec<CheckOutcome> {
        let pyproject = check_pyproject(snapshot);
        let readme = self.check_readme(snapshot).await;
        let requirements = check_requirements(snapshot, env).await;
        let editable = check_editable_install(snapshot, env).await;

        let outcomes = vec![pyproject, readme, editable, requirements];
        for outcome in &outcomes {
            debug!(check = %outcome.name, passed = outcome.passed, "Check evaluated");
        }
        outcomes
    }

    /// Outcomes for a repository that could not be fetched.
    pub fn fetch_failed(error: &FetchError) -> Vec<CheckOutcome> {
        let diagnostic = format!("fetch failed: {error}");
        CheckName::ALL
            .iter()
            .map(|&name| CheckOutcome::fail(name, diagnostic.clone()))
            .collect()
    }

    /// `readme_mentions_install_usage`
    pub async fn check_readme(&self, snapshot: &Snapshot) -> CheckOutcome {
        const NAME: CheckName = CheckName::ReadmeMentionsInstallUsage;
        let file_name = &self.readme.file_name;

        let Some(path) = snapshot.root_file_ignore_case(file_name) else {
            return CheckOutcome::fail(NAME, format!("missing {file_name} at repository root"));
        };

        let text = match tokio::fs::read(&path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => return CheckOutcome::fail(NAME, format!("could not read {file_name}: {e}")),
        };

        let missing = self.readme.missing_terms(&text);
        if missing.is_empty() {
            CheckOutcome::pass(NAME)
        } else {
            CheckOutcome::fail(
                NAME,
                format!("{file_name} must mention: {}", missing.join(", ")),
            )
        }
    }
}

/// `pyproject_exists`
pub fn check_pyproject(snapshot: &Snapshot) -> CheckOutcome {
    const NAME: CheckName = CheckName::PyprojectExists;
    match snapshot.root_file(PYPROJECT_FILE) {
        Some(_) => CheckOutcome::pass(NAME),
        None => CheckOutcome::fail(NAME, format!("missing {PYPROJECT_FILE} at repository root")),
    }
}

/// `pip_install_succeeds`
pub async fn check_editable_install(snapshot: &Snapshot, env: EnvironmentRef<'_>) -> CheckOutcome {
    const NAME: CheckName = CheckName::PipInstallSucceeds;
    let env = match env {
        Ok(env) => env,
        Err(e) => return CheckOutcome::fail(NAME, e.to_string()),
    };
    match env.install_editable(snapshot.root()).await {
        Ok(_) => CheckOutcome::pass(NAME),
        Err(e) => CheckOutcome::fail(NAME, e.to_string()),
    }
}

/// `requirements_installed`: vacuous pass without a requirements file.
pub async fn check_requirements(snapshot: &Snapshot, env: EnvironmentRef<'_>) -> CheckOutcome {
    const NAME: CheckName = CheckName::RequirementsInstalled;
    let Some(requirements) = snapshot.root_file(REQUIREMENTS_FILE) else {
        return CheckOutcome::pass_with_note(
            NAME,
            format!("no {REQUIREMENTS_FILE} at repository root; nothing to install"),
        );
    };
    let env = match env {
        Ok(env) => env,
        Err(e) => return CheckOutcome::fail(NAME, e.to_string()),
    };
    match env.install_requirements(&requirements, snapshot.root()).await {
        Ok(_) => CheckOutcome::pass(NAME),
        Err(e) => CheckOutcome::fail(NAME, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeProvisioner, FAKE_BUILD_REQUIRES_MARKER};
    use pkgverify_env::{EnvironmentProvisioner, InstallErrorKind};

    fn snapshot_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Snapshot) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let snapshot = Snapshot::new(dir.path());
        (dir, snapshot)
    }

    fn names(outcomes: &[CheckOutcome]) -> Vec<CheckName> {
        outcomes.iter().map(|o| o.name).collect()
    }

    #[tokio::test]
    async fn test_all_checks_pass() {
        let (_dir, snapshot) = snapshot_with(&[
            ("pyproject.toml", "[project]\nname = \"demo\"\n"),
            ("README.md", "# Demo\n## Installation\npip install demo\n## Usage\nimport demo\n"),
        ]);
        let scratch = tempfile::tempdir().unwrap();
        let env = FakeProvisioner::new().provision(scratch.path()).await;
        let policy = ReadmePolicy::default();

        let outcomes = CheckRunner::new(&policy).run(&snapshot, env.as_deref()).await;

        assert_eq!(names(&outcomes), CheckName::ALL);
        assert!(outcomes.iter().all(|o| o.passed), "{outcomes:?}");
    }

    #[tokio::test]
    async fn test_missing_pyproject_does_not_suppress_other_checks() {
        let (_dir, snapshot) = snapshot_with(&[("README.md", "install and usage")]);
        let scratch = tempfile::tempdir().unwrap();
        let env = FakeProvisioner::new().provision(scratch.path()).await;
        let policy = ReadmePolicy::default();

        let outcomes = CheckRunner::new(&policy).run(&snapshot, env.as_deref()).await;

        assert_eq!(outcomes.len(), 4);
        assert!(!outcomes[0].passed);
        assert!(outcomes[1].passed, "README check must still run: {:?}", outcomes[1]);
        // the fake refuses editable installs without project metadata
        assert!(!outcomes[2].passed);
        assert!(outcomes[3].passed);
    }

    #[tokio::test]
    async fn test_readme_requires_both_terms() {
        let policy = ReadmePolicy::default();
        let runner = CheckRunner::new(&policy);

        let (_d1, only_install) = snapshot_with(&[("README.md", "How to INSTALL")]);
        let outcome = runner.check_readme(&only_install).await;
        assert!(!outcome.passed);
        assert_eq!(outcome.diagnostic.as_deref(), Some("README.md must mention: usage"));

        let (_d2, none) = snapshot_with(&[]);
        let outcome = runner.check_readme(&none).await;
        assert!(!outcome.passed);
        assert!(outcome.diagnostic.unwrap().contains("missing README.md"));
    }

    #[tokio::test]
    async fn test_readme_file_name_is_case_insensitive() {
        let policy = ReadmePolicy::default();
        let (_dir, snapshot) = snapshot_with(&[("readme.md", "Install\nUsage")]);
        assert!(CheckRunner::new(&policy).check_readme(&snapshot).await.passed);
    }

    #[tokio::test]
    async fn test_readme_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), b"install \xff\xfe usage").unwrap();
        let policy = ReadmePolicy::default();
        let outcome = CheckRunner::new(&policy)
            .check_readme(&Snapshot::new(dir.path()))
            .await;
        assert!(outcome.passed);
    }

    #[tokio::test]
    async fn test_requirements_vacuous_pass() {
        let (_dir, snapshot) = snapshot_with(&[]);
        let err = InstallError::new("python -m venv", InstallErrorKind::Environment, "no python");
        let outcome = check_requirements(&snapshot, Err(&err)).await;
        assert!(outcome.passed);
        assert!(outcome.diagnostic.unwrap().contains("nothing to install"));
    }

    #[tokio::test]
    async fn test_requirements_failure_carries_output() {
        let (_dir, snapshot) = snapshot_with(&[
            ("pyproject.toml", "[project]"),
            ("requirements.txt", "definitely-not-a-real-package==9.9\n"),
        ]);
        let scratch = tempfile::tempdir().unwrap();
        let env = FakeProvisioner::new().provision(scratch.path()).await;

        let outcome = check_requirements(&snapshot, env.as_deref()).await;
        assert!(!outcome.passed);
        let diagnostic = outcome.diagnostic.unwrap();
        assert!(diagnostic.starts_with("pip install -r requirements.txt"), "{diagnostic}");
        assert!(diagnostic.contains("definitely-not-a-real-package"), "{diagnostic}");
    }

    #[tokio::test]
    async fn test_environment_failure_fails_install_checks() {
        let (_dir, snapshot) = snapshot_with(&[
            ("pyproject.toml", "[project]"),
            ("requirements.txt", "requests\n"),
        ]);
        let err = InstallError::new(
            "python -m venv",
            InstallErrorKind::Environment,
            "No module named venv",
        );
        let policy = ReadmePolicy::default();

        let outcomes = CheckRunner::new(&policy).run(&snapshot, Err(&err)).await;

        assert!(outcomes[0].passed);
        assert!(!outcomes[2].passed);
        assert!(!outcomes[3].passed);
        assert!(outcomes[2].diagnostic.as_deref().unwrap().contains("No module named venv"));
    }

    #[tokio::test]
    async fn test_requirements_are_installed_before_editable_install() {
        let pyproject = format!("[project]\n{FAKE_BUILD_REQUIRES_MARKER}numpy\n");
        let (_dir, snapshot) = snapshot_with(&[
            ("pyproject.toml", pyproject.as_str()),
            ("README.md", "install / usage"),
            ("requirements.txt", "numpy>=1.26\n"),
        ]);
        let scratch = tempfile::tempdir().unwrap();
        let env = FakeProvisioner::new().provision(scratch.path()).await;
        let policy = ReadmePolicy::default();

        let outcomes = CheckRunner::new(&policy).run(&snapshot, env.as_deref()).await;

        assert_eq!(names(&outcomes), CheckName::ALL);
        assert!(outcomes.iter().all(|o| o.passed), "{outcomes:?}");
    }

    #[tokio::test]
    async fn test_build_dependency_missing_from_requirements_fails_install() {
        let pyproject = format!("[project]\n{FAKE_BUILD_REQUIRES_MARKER}numpy\n");
        let (_dir, snapshot) = snapshot_with(&[("pyproject.toml", pyproject.as_str())]);
        let scratch = tempfile::tempdir().unwrap();
        let env = FakeProvisioner::new().provision(scratch.path()).await;

        let outcome = check_editable_install(&snapshot, env.as_deref()).await;
        assert!(!outcome.passed);
        assert!(outcome.diagnostic.unwrap().contains("No module named 'numpy'"));
    }

    #[test]
    fn test_fetch_failure_fails_every_check_with_same_diagnostic() {
        let err = FetchError::CloneFailed {
            exit_code: 128,
            output: "remote: Repository not found.".to_string(),
        };
        let outcomes = CheckRunner::fetch_failed(&err);

        assert_eq!(names(&outcomes), CheckName::ALL);
        assert!(outcomes.iter().all(|o| !o.passed));
        let first = outcomes[0].diagnostic.clone();
        assert!(outcomes.iter().all(|o| o.diagnostic == first));
        assert!(first.unwrap().contains("Repository not found"));
    }
}
