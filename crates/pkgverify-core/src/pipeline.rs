//! Verification pipeline orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use pkgverify_env::EnvironmentProvisioner;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregate::{result_set, verdict_from_outcomes};
use crate::badges::write_badge;
use crate::config::{ArtifactPaths, VerifierConfig};
use crate::domain::{RepositoryReference, RepositoryVerdict, Result, RunResultSet, VerifyError};
use crate::fetch::RepositoryFetcher;
use crate::reporting::{write_report, write_results_json};
use crate::repo_list::read_repo_list;
use crate::runner::CheckRunner;
use crate::workspace::{release, RepoWorkspace, RunWorkspace};

/// Result of a complete verification run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Verdicts in input order, plus run metadata.
    pub results: RunResultSet,

    /// Badge file written for each verdict, same order as `results`.
    pub badge_paths: Vec<PathBuf>,

    /// Rendered report, when one was written.
    pub report_path: Option<PathBuf>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

/// Fetch -> provision -> check -> aggregate -> badge, for every repository.
pub struct VerifyPipeline {
    fetcher: Arc<dyn RepositoryFetcher>,
    provisioner: Arc<dyn EnvironmentProvisioner>,
    config: VerifierConfig,
}

impl VerifyPipeline {
    pub fn new(
        fetcher: Arc<dyn RepositoryFetcher>,
        provisioner: Arc<dyn EnvironmentProvisioner>,
        config: VerifierConfig,
    ) -> Self {
        Self {
            fetcher,
            provisioner,
            config,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify one repository inside its own workspace.
    ///
    /// Never fails: fetch and install problems become failing outcomes. The
    /// install environment is dropped before this returns.
    pub async fn verify_repository(
        &self,
        reference: &RepositoryReference,
        workspace: &RepoWorkspace,
    ) -> RepositoryVerdict {
        let snapshot = match self.fetcher.fetch(reference, &workspace.checkout_dir()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(repo = %reference, error = %e, "Fetch failed; failing all checks");
                return verdict_from_outcomes(reference.clone(), CheckRunner::fetch_failed(&e));
            }
        };

        let env = self.provisioner.provision(&workspace.env_dir()).await;
        if let Err(e) = &env {
            warn!(repo = %reference, error = %e, "Install environment unavailable");
        }

        let outcomes = CheckRunner::new(&self.config.readme)
            .run(&snapshot, env.as_deref())
            .await;
        release(env).await;

        verdict_from_outcomes(reference.clone(), outcomes)
    }

    async fn process(
        &self,
        workspace: &RunWorkspace,
        index: usize,
        reference: &RepositoryReference,
        badges_dir: &Path,
    ) -> Result<(RepositoryVerdict, PathBuf)> {
        info!(index, repo = %reference, "Verifying repository");

        let repo_workspace = workspace.allocate(index)?;
        let verdict = self.verify_repository(reference, &repo_workspace).await;
        release(repo_workspace).await;

        let badge_path = write_badge(badges_dir, &verdict, &self.config.badge).await?;
        info!(
            index,
            repo = %reference,
            slug = %verdict.slug,
            passed = verdict.passed,
            "Repository verified"
        );
        Ok((verdict, badge_path))
    }

    /// Verify `repos` and write every artifact named in `paths`.
    ///
    /// Only run-level problems (configuration, unwritable outputs) return an
    /// error; repository failures are recorded as data.
    pub async fn run(
        &self,
        repos: &[RepositoryReference],
        paths: &ArtifactPaths,
    ) -> Result<PipelineResult> {
        let start = Instant::now();
        self.config.validate()?;

        std::fs::create_dir_all(&paths.badges).map_err(|e| VerifyError::fs(&paths.badges, e))?;
        if let Some(parent) = paths.results.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| VerifyError::fs(parent, e))?;
        }

        let workspace = match &self.config.scratch_root {
            Some(root) => RunWorkspace::create_in(root)?,
            None => RunWorkspace::create()?,
        };
        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            repos = repos.len(),
            jobs = self.config.jobs,
            "Starting verification run"
        );

        let processed: Vec<(RepositoryVerdict, PathBuf)> = stream::iter(repos.iter().enumerate())
            .map(|(index, reference)| self.process(&workspace, index, reference, &paths.badges))
            .buffered(self.config.jobs)
            .try_collect()
            .await?;
        drop(workspace);

        let (verdicts, badge_paths): (Vec<_>, Vec<_>) = processed.into_iter().unzip();
        let results = result_set(run_id, Utc::now(), verdicts);
        write_results_json(&paths.results, &results)?;

        let report_path = match (&paths.report, &paths.badge_base_url) {
            (Some(report), Some(base_url)) => {
                write_report(report, &results, base_url)?;
                info!(report = %report.display(), "Wrote report");
                Some(report.clone())
            }
            (Some(report), None) => {
                warn!(report = %report.display(), "Report requested without a badge base URL; skipping");
                None
            }
            (None, _) => None,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            total = results.total(),
            passed = results.passed_count(),
            duration_ms,
            "Verification run finished"
        );

        Ok(PipelineResult {
            results,
            badge_paths,
            report_path,
            duration_ms,
        })
    }

    /// Read the repository list at `list` and run over it.
    pub async fn run_from_list(&self, list: &Path, paths: &ArtifactPaths) -> Result<PipelineResult> {
        let repos = read_repo_list(list)?;
        self.run(&repos, paths).await
    }
}
