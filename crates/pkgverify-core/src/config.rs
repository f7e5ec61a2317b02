//! Verifier configuration and policy constants.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{BadgePolicy, Result, VerifyError};

/// What the README check looks for.
///
/// Terms are matched as case-insensitive substrings, so "Installation" counts
/// as mentioning "install".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadmePolicy {
    /// README file name, matched case-insensitively at the repository root.
    pub file_name: String,
    pub required_terms: Vec<String>,
}

impl Default for ReadmePolicy {
    fn default() -> Self {
        Self {
            file_name: "README.md".to_string(),
            required_terms: vec!["install".to_string(), "usage".to_string()],
        }
    }
}

impl ReadmePolicy {
    /// Required terms that do not occur in `text`.
    pub fn missing_terms<'a>(&'a self, text: &str) -> Vec<&'a str> {
        let haystack = text.to_lowercase();
        self.required_terms
            .iter()
            .filter(|term| !haystack.contains(&term.to_lowercase()))
            .map(String::as_str)
            .collect()
    }
}

/// Library-level configuration of a verification run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Repositories processed concurrently (1 = sequential).
    pub jobs: usize,
    pub badge: BadgePolicy,
    pub readme: ReadmePolicy,
    /// Parent directory for the run workspace; system temp dir when `None`.
    pub scratch_root: Option<PathBuf>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            jobs: 1,
            badge: BadgePolicy::default(),
            readme: ReadmePolicy::default(),
            scratch_root: None,
        }
    }
}

impl VerifierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(VerifyError::InvalidConfig("jobs must be at least 1".into()));
        }
        if self.badge.label.trim().is_empty() {
            return Err(VerifyError::InvalidConfig("badge label must not be empty".into()));
        }
        if self.readme.file_name.trim().is_empty() {
            return Err(VerifyError::InvalidConfig("README file name must not be empty".into()));
        }
        Ok(())
    }
}

/// Where a run writes its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Directory receiving one `<slug>.json` badge per repository.
    pub badges: PathBuf,
    /// Results document path.
    pub results: PathBuf,
    /// Optional rendered report path.
    pub report: Option<PathBuf>,
    /// Public URL prefix under which the badge directory is served.
    pub badge_base_url: Option<String>,
}
