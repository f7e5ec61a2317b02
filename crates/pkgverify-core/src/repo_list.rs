//! Reading the repository input list.

use std::path::Path;

use tracing::warn;

use crate::domain::{RepositoryReference, Result, VerifyError};

/// Parse a repository list: one reference per line, blank lines and `#`
/// comments ignored, surrounding whitespace trimmed.
pub fn parse_repo_list(text: &str) -> Vec<RepositoryReference> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(RepositoryReference::new)
        .collect()
}

/// Read and parse the repository list at `path`.
///
/// An unreadable list is a run-level error.
pub fn read_repo_list(path: &Path) -> Result<Vec<RepositoryReference>> {
    let text = std::fs::read_to_string(path).map_err(|e| VerifyError::fs(path, e))?;
    let repos = parse_repo_list(&text);

    let mut seen = std::collections::HashSet::new();
    for repo in &repos {
        if !seen.insert(repo.slug()) {
            warn!(repo = %repo, "Repository listed more than once; its badge is written once per entry");
        }
    }

    Ok(repos)
}
