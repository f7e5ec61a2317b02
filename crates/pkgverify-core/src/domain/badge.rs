//! Badge descriptors in the shields.io endpoint format.

use serde::{Deserialize, Serialize};

use super::verdict::RepositoryVerdict;

/// shields.io endpoint schema version.
pub const SHIELDS_SCHEMA_VERSION: u8 = 1;

/// Label, messages and colors used when deriving badges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BadgePolicy {
    pub label: String,
    pub passing_message: String,
    pub failing_message: String,
    pub passing_color: String,
    pub failing_color: String,
}

impl Default for BadgePolicy {
    fn default() -> Self {
        Self {
            label: "package".to_string(),
            passing_message: "passing".to_string(),
            failing_message: "failing".to_string(),
            passing_color: "brightgreen".to_string(),
            failing_color: "red".to_string(),
        }
    }
}

/// Badge descriptor written to `<slug>.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDescriptor {
    pub schema_version: u8,
    pub label: String,
    pub message: String,
    pub color: String,
}

impl BadgeDescriptor {
    pub fn for_verdict(verdict: &RepositoryVerdict, policy: &BadgePolicy) -> Self {
        let (message, color) = if verdict.passed {
            (&policy.passing_message, &policy.passing_color)
        } else {
            (&policy.failing_message, &policy.failing_color)
        };
        Self {
            schema_version: SHIELDS_SCHEMA_VERSION,
            label: policy.label.clone(),
            message: message.clone(),
            color: color.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reference::RepositoryReference;

    fn verdict(passed: bool) -> RepositoryVerdict {
        RepositoryVerdict {
            repository: RepositoryReference::new("https://github.com/a/b"),
            slug: "a__b".to_string(),
            passed,
            checks: Vec::new(),
        }
    }

    #[test]
    fn test_passing_badge() {
        let badge = BadgeDescriptor::for_verdict(&verdict(true), &BadgePolicy::default());
        assert_eq!(badge.message, "passing");
        assert_eq!(badge.color, "brightgreen");
        assert_eq!(badge.label, "package");
    }

    #[test]
    fn test_failing_badge() {
        let badge = BadgeDescriptor::for_verdict(&verdict(false), &BadgePolicy::default());
        assert_eq!(badge.message, "failing");
        assert_eq!(badge.color, "red");
    }

    #[test]
    fn test_badge_json_matches_shields_schema() {
        let badge = BadgeDescriptor::for_verdict(&verdict(true), &BadgePolicy::default());
        let v = serde_json::to_value(&badge).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "schemaVersion": 1,
                "label": "package",
                "message": "passing",
                "color": "brightgreen"
            })
        );
    }

    #[test]
    fn test_custom_policy_label() {
        let policy = BadgePolicy {
            label: "install-verified".to_string(),
            ..BadgePolicy::default()
        };
        let badge = BadgeDescriptor::for_verdict(&verdict(false), &policy);
        assert_eq!(badge.label, "install-verified");
    }
}
