//! Result aggregation: outcomes -> verdict, verdicts -> result set. No I/O.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{CheckName, CheckOutcome, RepositoryReference, RepositoryVerdict, RunResultSet};

/// Combine check outcomes into a verdict.
///
/// Outcomes are put into canonical check order. A check with no outcome
/// counts as failed, so `passed` can only be true when all four passed.
pub fn verdict_from_outcomes(
    repository: RepositoryReference,
    outcomes: Vec<CheckOutcome>,
) -> RepositoryVerdict {
    let checks: Vec<CheckOutcome> = CheckName::ALL
        .iter()
        .map(|&name| {
            outcomes
                .iter()
                .find(|o| o.name == name)
                .cloned()
                .unwrap_or_else(|| CheckOutcome::fail(name, "check did not run"))
        })
        .collect();
    let passed = checks.iter().all(|c| c.passed);

    RepositoryVerdict {
        slug: repository.slug(),
        repository,
        passed,
        checks,
    }
}

/// Collect verdicts, already in input order, into a result set.
pub fn result_set(
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    verdicts: Vec<RepositoryVerdict>,
) -> RunResultSet {
    RunResultSet {
        run_id,
        generated_at,
        verdicts,
    }
}
