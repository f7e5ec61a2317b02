//! Repository references and their stable artifact names.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Delimiter placed between owner and repository in a slug.
pub const SLUG_DELIMITER: &str = "__";

/// Hex characters of the identifier digest appended to fallback slugs.
const FALLBACK_DIGEST_LEN: usize = 16;

/// Longest sanitized prefix kept in a fallback slug, so badge file names stay
/// well below the 255-byte file name limit.
const FALLBACK_PREFIX_MAX: usize = 64;

/// GitHub repository URLs: the host must be exactly `github.com`.
fn github_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?:https?://(?:www\.)?github\.com/|(?:ssh://)?git@github\.com[:/])([A-Za-z0-9-]+)/([A-Za-z0-9._-]+?)(?:\.git)?/?$",
        )
        .expect("valid github pattern")
    })
}

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid sanitize pattern"))
}

/// A repository URL or identifier as it appeared in the input list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryReference(String);

impl RepositoryReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(owner, repo)` for GitHub URLs in https or scp form.
    pub fn github_coordinates(&self) -> Option<(&str, &str)> {
        let caps = github_pattern().captures(self.0.trim())?;
        Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    }

    /// Stable artifact name for this repository.
    ///
    /// GitHub references map to `owner__repo`. GitHub owners cannot contain
    /// underscores, so the first delimiter always splits owner from repo and
    /// the mapping is injective. Anything else maps to
    /// `_<sanitized>-<digest>`; the leading underscore keeps these apart from
    /// GitHub slugs (owners start with an alphanumeric) and the digest keeps
    /// two identifiers that sanitize or truncate alike apart. The sanitized
    /// part is cut to 64 characters.
    pub fn slug(&self) -> String {
        match self.github_coordinates() {
            Some((owner, repo)) => format!("{owner}{SLUG_DELIMITER}{repo}"),
            None => {
                let sanitized = unsafe_chars().replace_all(self.0.trim(), "_");
                // only ASCII survives sanitizing, so byte slicing is safe
                let sanitized = sanitized.trim_matches('_');
                let prefix = &sanitized[..sanitized.len().min(FALLBACK_PREFIX_MAX)];
                let digest = hex::encode(Sha256::digest(self.0.as_bytes()));
                format!(
                    "_{}-{}",
                    prefix.trim_end_matches('_'),
                    &digest[..FALLBACK_DIGEST_LEN]
                )
            }
        }
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepositoryReference {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
