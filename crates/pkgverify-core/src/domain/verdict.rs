//! Per-repository verdicts and the run-level result set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::check::{CheckName, CheckOutcome};
use super::reference::RepositoryReference;

/// Aggregated outcome of every check for one repository.
///
/// Built by [`crate::aggregate::verdict_from_outcomes`]; `passed` is the
/// conjunction of every outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryVerdict {
    pub repository: RepositoryReference,
    pub slug: String,
    pub passed: bool,
    pub checks: Vec<CheckOutcome>,
}

impl RepositoryVerdict {
    pub fn outcome(&self, name: CheckName) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Diagnostic of the first failing check, if any check failed.
    pub fn failure_reason(&self) -> Option<&str> {
        self.checks
            .iter()
            .find(|c| !c.passed)
            .map(|c| c.diagnostic.as_deref().unwrap_or(c.name.name()))
    }

    /// One-line reason for console output: `ok` or the first failure.
    pub fn reason(&self) -> &str {
        self.failure_reason().unwrap_or("ok")
    }
}

/// All verdicts of one run, in input order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunResultSet {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub verdicts: Vec<RepositoryVerdict>,
}

impl RunResultSet {
    /// Number of repositories verified.
    pub fn total(&self) -> usize {
        self.verdicts.len()
    }

    /// Number of repositories that passed every check.
    pub fn passed_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.passed).count()
    }

    /// Number of repositories with at least one failing check.
    pub fn failed_count(&self) -> usize {
        self.total() - self.passed_count()
    }

    pub fn all_passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.passed)
    }
}
