//! pkgverify - packaging conformance verifier CLI
//!
//! Clones every repository named in a list file, checks that it is an
//! installable Python package, and writes one shields.io badge per
//! repository plus a results document and an optional report.
//!
//! ```text
//! pkgverify --repos repos.txt --badges public/badges --results results.json \
//!     --report public/index.html --badge-base-url https://org.github.io/site/badges
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use pkgverify_core::{
    ArtifactPaths, GitFetcher, PipelineResult, RunResultSet, VenvConfig, VenvProvisioner,
    VerifierConfig, VerifyPipeline,
};

#[derive(Parser, Debug)]
#[command(name = "pkgverify")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify student Python repositories and emit status badges", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Repository list: one URL per line, `#` comments allowed
    #[arg(long, env = "PKGVERIFY_REPOS")]
    repos: PathBuf,

    /// Directory receiving one badge JSON per repository
    #[arg(long, env = "PKGVERIFY_BADGES")]
    badges: PathBuf,

    /// Path of the results document
    #[arg(long, env = "PKGVERIFY_RESULTS")]
    results: PathBuf,

    /// Report path (.html, or .md for Markdown); needs --badge-base-url
    #[arg(long, env = "PKGVERIFY_REPORT")]
    report: Option<PathBuf>,

    /// Public URL where the badges directory is served
    #[arg(long, env = "PKGVERIFY_BADGE_BASE_URL")]
    badge_base_url: Option<String>,

    /// Python interpreter used to create install environments
    #[arg(long, default_value = "python3")]
    python: String,

    /// Bound on each pip invocation, in seconds
    #[arg(long, default_value = "600")]
    install_timeout_secs: u64,

    /// Bound on each clone, in seconds
    #[arg(long, default_value = "300")]
    fetch_timeout_secs: u64,

    /// Repositories verified concurrently
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// Left-hand text of every badge
    #[arg(long, default_value = "package")]
    badge_label: String,

    /// Skip `pip install -U pip` in fresh environments
    #[arg(long)]
    no_upgrade_pip: bool,

    /// Parent directory for clones and environments (default: system temp)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Exit with status 1 when any repository fails
    #[arg(long)]
    strict: bool,
}

impl Cli {
    fn verifier_config(&self) -> VerifierConfig {
        let mut config = VerifierConfig {
            jobs: self.jobs,
            scratch_root: self.scratch_dir.clone(),
            ..VerifierConfig::default()
        };
        config.badge.label = self.badge_label.clone();
        config
    }

    fn venv_config(&self) -> VenvConfig {
        VenvConfig {
            python: self.python.clone(),
            install_timeout_secs: self.install_timeout_secs,
            upgrade_pip: !self.no_upgrade_pip,
        }
    }

    fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            badges: self.badges.clone(),
            results: self.results.clone(),
            report: self.report.clone(),
            badge_base_url: self.badge_base_url.clone(),
        }
    }
}

/// One `PASS|FAIL <url> <reason>` line per repository, in input order.
fn summary_lines(set: &RunResultSet) -> Vec<String> {
    set.verdicts
        .iter()
        .map(|v| {
            let status = if v.passed { "PASS" } else { "FAIL" };
            format!("{status} {} {}", v.repository, v.reason())
        })
        .collect()
}

fn print_summary(result: &PipelineResult) {
    for line in summary_lines(&result.results) {
        println!("{line}");
    }
    println!(
        "\n{} of {} repositories passed ({} failed)",
        result.results.passed_count(),
        result.results.total(),
        result.results.failed_count()
    );
}

/// Repository failures only affect the exit status under `--strict`.
fn fails_run(set: &RunResultSet, strict: bool) -> bool {
    strict && !set.all_passed()
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    pkgverify_core::init_tracing(cli.json, level);

    let pipeline = VerifyPipeline::new(
        Arc::new(GitFetcher::with_timeout(cli.fetch_timeout_secs)),
        Arc::new(VenvProvisioner::new(cli.venv_config())),
        cli.verifier_config(),
    );

    let result = pipeline
        .run_from_list(&cli.repos, &cli.artifact_paths())
        .await
        .with_context(|| format!("Verification run over {} failed", cli.repos.display()))?;

    print_summary(&result);
    info!(
        results = %cli.results.display(),
        duration_ms = result.duration_ms,
        "Done"
    );

    if fails_run(&result.results, cli.strict) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
