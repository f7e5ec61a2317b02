//! Badge emission: one shields.io endpoint file per repository.

use std::path::{Path, PathBuf};

use tracing::debug;
use url::form_urlencoded;

use crate::domain::{BadgeDescriptor, BadgePolicy, RepositoryVerdict, Result, VerifyError};

/// Extension of badge descriptor files.
pub const BADGE_EXTENSION: &str = "json";

/// shields.io dynamic endpoint badge service.
pub const SHIELDS_ENDPOINT: &str = "https://img.shields.io/endpoint";

/// File name of the badge for `slug`.
pub fn badge_file_name(slug: &str) -> String {
    format!("{slug}.{BADGE_EXTENSION}")
}

/// Write the badge for `verdict` into `dir`, replacing any previous badge
/// for the same repository. Returns the written path.
pub async fn write_badge(
    dir: &Path,
    verdict: &RepositoryVerdict,
    policy: &BadgePolicy,
) -> Result<PathBuf> {
    let badge = BadgeDescriptor::for_verdict(verdict, policy);
    let path = dir.join(badge_file_name(&verdict.slug));
    let mut content = serde_json::to_string_pretty(&badge)?;
    content.push('\n');
    tokio::fs::write(&path, content)
        .await
        .map_err(|e| VerifyError::fs(&path, e))?;
    debug!(slug = %verdict.slug, message = %badge.message, "Wrote badge");
    Ok(path)
}

/// Public URL of the raw badge JSON for `slug`.
pub fn badge_json_url(base_url: &str, slug: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), badge_file_name(slug))
}

/// Rendered badge image URL for `slug`.
pub fn shields_badge_url(base_url: &str, slug: &str) -> String {
    let json_url = badge_json_url(base_url, slug);
    let encoded: String = form_urlencoded::byte_serialize(json_url.as_bytes()).collect();
    format!("{SHIELDS_ENDPOINT}?url={encoded}&style=flat-square")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::verdict_from_outcomes;
    use crate::domain::{CheckName, CheckOutcome};

    fn verdict(url: &str, passed: bool) -> RepositoryVerdict {
        let outcomes = CheckName::ALL
            .iter()
            .map(|&n| {
                if passed {
                    CheckOutcome::pass(n)
                } else {
                    CheckOutcome::fail(n, "nope")
                }
            })
            .collect();
        verdict_from_outcomes(url.into(), outcomes)
    }

    #[test]
    fn test_badge_file_name() {
        assert_eq!(badge_file_name("alice__proj"), "alice__proj.json");
    }

    #[tokio::test]
    async fn test_write_badge_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_badge(
            dir.path(),
            &verdict("https://github.com/alice/proj", true),
            &BadgePolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(path, dir.path().join("alice__proj.json"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));
        let badge: BadgeDescriptor = serde_json::from_str(&text).unwrap();
        assert_eq!(badge.message, "passing");
        assert_eq!(badge.schema_version, 1);
    }

    #[tokio::test]
    async fn test_rewrite_overwrites_instead_of_duplicating() {
        let dir = tempfile::tempdir().unwrap();
        let policy = BadgePolicy::default();
        write_badge(dir.path(), &verdict("https://github.com/alice/proj", true), &policy)
            .await
            .unwrap();
        write_badge(dir.path(), &verdict("https://github.com/alice/proj", false), &policy)
            .await
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let badge: BadgeDescriptor = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("alice__proj.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(badge.message, "failing");
    }

    #[tokio::test]
    async fn test_write_into_missing_dir_is_fs_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_badge(
            &dir.path().join("absent"),
            &verdict("https://github.com/a/b", true),
            &BadgePolicy::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VerifyError::FileSystem { .. }));
    }

    #[test]
    fn test_badge_urls() {
        assert_eq!(
            badge_json_url("https://example.github.io/badges/", "a__b"),
            "https://example.github.io/badges/a__b.json"
        );
        assert_eq!(
            shields_badge_url("https://example.github.io/badges", "a__b"),
            "https://img.shields.io/endpoint?url=https%3A%2F%2Fexample.github.io%2Fbadges%2Fa__b.json&style=flat-square"
        );
        // query delimiters in the base URL must not leak into the outer query
        let url = shields_badge_url("https://host/b?x=1&y=2", "a__b");
        assert!(url.contains("%3Fx%3D1%26y%3D2%2Fa__b.json&style=flat-square"), "{url}");
    }
}
