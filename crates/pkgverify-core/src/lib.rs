//! pkgverify core library
//!
//! Verifies that a batch of student repositories follow a minimal Python
//! packaging contract and publishes one pass/fail badge per repository.
//!
//! For every repository the [`pipeline::VerifyPipeline`] fetches a snapshot
//! ([`fetch`]), provisions a throwaway install environment
//! (`pkgverify_env`), runs the fixed checklist ([`runner`]), folds the
//! outcomes into a verdict ([`aggregate`]) and writes a badge ([`badges`]).
//! After the last repository it writes the results document and, optionally,
//! a rendered report ([`reporting`]).

pub mod aggregate;
pub mod badges;
pub mod config;
pub mod domain;
pub mod fakes;
pub mod fetch;
pub mod pipeline;
pub mod reporting;
pub mod repo_list;
pub mod runner;
pub mod telemetry;
pub mod workspace;

pub use aggregate::{result_set, verdict_from_outcomes};
pub use badges::{badge_file_name, badge_json_url, shields_badge_url, write_badge};
pub use config::{ArtifactPaths, ReadmePolicy, VerifierConfig};
pub use domain::{
    BadgeDescriptor, BadgePolicy, CheckName, CheckOutcome, FetchError, RepositoryReference,
    RepositoryVerdict, Result, RunResultSet, VerifyError,
};
pub use fetch::{GitFetcher, RepositoryFetcher, Snapshot};
pub use pipeline::{PipelineResult, VerifyPipeline};
pub use reporting::{
    render_html_report, render_markdown_report, write_report, write_results_json, ReportFormat,
    ResultsArtifact,
};
pub use repo_list::{parse_repo_list, read_repo_list};
pub use runner::CheckRunner;
pub use telemetry::init_tracing;
pub use workspace::{release, RepoWorkspace, RunWorkspace};

pub use pkgverify_env::{InstallError, InstallErrorKind, VenvConfig, VenvProvisioner};
