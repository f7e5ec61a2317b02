//! The fixed checklist and per-check outcomes.

use serde::{Deserialize, Serialize};

/// The four packaging checks, in evaluation and reporting order.
///
/// Declaration order is the canonical order; `Ord` follows it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    /// `pyproject.toml` exists at the repository root
    PyprojectExists,

    /// `README.md` mentions installation and usage
    ReadmeMentionsInstallUsage,

    /// `pip install -e .` succeeds in a fresh environment
    PipInstallSucceeds,

    /// `requirements.txt`, when present, installs cleanly
    RequirementsInstalled,
}

impl CheckName {
    /// Every check, in canonical order.
    pub const ALL: [CheckName; 4] = [
        CheckName::PyprojectExists,
        CheckName::ReadmeMentionsInstallUsage,
        CheckName::PipInstallSucceeds,
        CheckName::RequirementsInstalled,
    ];

    /// Get the check name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            CheckName::PyprojectExists => "pyproject_exists",
            CheckName::ReadmeMentionsInstallUsage => "readme_mentions_install_usage",
            CheckName::PipInstallSucceeds => "pip_install_succeeds",
            CheckName::RequirementsInstalled => "requirements_installed",
        }
    }
}

impl std::fmt::Display for CheckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one check against one repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: CheckName,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl CheckOutcome {
    pub fn pass(name: CheckName) -> Self {
        Self {
            name,
            passed: true,
            diagnostic: None,
        }
    }

    /// A pass that still carries an explanatory note.
    pub fn pass_with_note(name: CheckName, note: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            diagnostic: Some(note.into()),
        }
    }

    pub fn fail(name: CheckName, diagnostic: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            diagnostic: Some(diagnostic.into()),
        }
    }
}
