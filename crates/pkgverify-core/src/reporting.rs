//! Results artifact and human-readable report rendering.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::badges::shields_badge_url;
use crate::domain::{CheckName, RepositoryVerdict, Result, RunResultSet, VerifyError};

/// Version of the results document layout.
pub const RESULTS_SCHEMA_VERSION: u32 = 1;

/// One failing repository in the quick-triage list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureEntry {
    pub url: String,
    pub reason: String,
}

/// Persisted form of a [`RunResultSet`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultsArtifact {
    pub schema_version: u32,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub failures: Vec<FailureEntry>,
    pub repositories: Vec<RepositoryVerdict>,
}

impl ResultsArtifact {
    pub fn from_result_set(set: &RunResultSet) -> Self {
        Self {
            schema_version: RESULTS_SCHEMA_VERSION,
            run_id: set.run_id,
            generated_at: set.generated_at,
            total: set.total(),
            passed: set.passed_count(),
            failed: set.failed_count(),
            failures: set
                .verdicts
                .iter()
                .filter(|v| !v.passed)
                .map(|v| FailureEntry {
                    url: v.repository.to_string(),
                    reason: v.reason().to_string(),
                })
                .collect(),
            repositories: set.verdicts.clone(),
        }
    }
}

fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| VerifyError::fs(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| VerifyError::fs(path, e))
}

/// Write the results document as pretty JSON, replacing any previous one.
pub fn write_results_json(path: &Path, set: &RunResultSet) -> Result<()> {
    let artifact = ResultsArtifact::from_result_set(set);
    let mut content = serde_json::to_string_pretty(&artifact)?;
    content.push('\n');
    write_text(path, &content)
}

/// Output format of the rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Html,
    Markdown,
}

impl ReportFormat {
    /// Markdown for `.md`/`.markdown` paths, HTML otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .as_deref()
        {
            Some("md") | Some("markdown") => ReportFormat::Markdown,
            _ => ReportFormat::Html,
        }
    }
}

/// Render and write the report; the format follows the file extension.
pub fn write_report(path: &Path, set: &RunResultSet, badge_base_url: &str) -> Result<()> {
    let content = match ReportFormat::from_path(path) {
        ReportFormat::Html => render_html_report(set, badge_base_url),
        ReportFormat::Markdown => render_markdown_report(set, badge_base_url),
    };
    write_text(path, &content)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const HTML_STYLE: &str = r#"    :root {
      --ink: #1f2933;
      --pass: #2a9d8f;
      --fail: #e63946;
      --card: #ffffff;
      --shadow: rgba(31, 41, 51, 0.12);
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      font-family: "Trebuchet MS", "DejaVu Sans", sans-serif;
      color: var(--ink);
      background: linear-gradient(135deg, #fef9ef, #cce3de);
      min-height: 100vh;
    }
    header { padding: 48px 24px 24px; text-align: center; }
    h1 { margin: 0 0 8px; font-size: clamp(2rem, 4vw, 3.2rem); }
    p.subtitle { margin: 0; color: #3d5a80; }
    .grid {
      display: grid;
      gap: 16px;
      padding: 16px 24px 64px;
      grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
    }
    .card {
      background: var(--card);
      padding: 16px;
      border-radius: 16px;
      box-shadow: 0 10px 25px var(--shadow);
      display: grid;
      gap: 10px;
      align-content: start;
    }
    .repo { color: var(--ink); font-weight: 700; text-decoration: none; word-break: break-word; }
    .status { font-weight: 700; text-transform: uppercase; letter-spacing: 0.08em; }
    .status.pass { color: var(--pass); }
    .status.fail { color: var(--fail); }
    .reason { margin: 0; font-size: 0.85rem; white-space: pre-wrap; word-break: break-word; }
    .badge { width: fit-content; max-width: 100%; height: auto; }
"#;

/// Standalone HTML page with one card per repository, in input order.
pub fn render_html_report(set: &RunResultSet, badge_base_url: &str) -> String {
    let mut out = String::new();
    out.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("  <meta charset=\"utf-8\" />\n");
    out.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
    out.push_str("  <title>Hall of Fame</title>\n  <style>\n");
    out.push_str(HTML_STYLE);
    out.push_str("  </style>\n</head>\n<body>\n  <header>\n");
    out.push_str("    <h1>Hall of Fame</h1>\n");
    out.push_str(&format!(
        "    <p class=\"subtitle\">{} of {} packages verified &middot; {}</p>\n",
        set.passed_count(),
        set.total(),
        set.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    out.push_str("  </header>\n  <main class=\"grid\">\n");

    if set.verdicts.is_empty() {
        out.push_str("    <p>No repos verified yet.</p>\n");
    }
    for verdict in &set.verdicts {
        let url = escape_html(verdict.repository.as_str());
        let (class, label) = if verdict.passed {
            ("pass", "PASS")
        } else {
            ("fail", "FAIL")
        };
        out.push_str("    <article class=\"card\">\n");
        out.push_str(&format!("      <a class=\"repo\" href=\"{url}\">{url}</a>\n"));
        out.push_str(&format!(
            "      <div class=\"status {class}\">{label}</div>\n"
        ));
        if let Some(reason) = verdict.failure_reason() {
            out.push_str(&format!(
                "      <p class=\"reason\">{}</p>\n",
                escape_html(reason)
            ));
        }
        out.push_str(&format!(
            "      <img class=\"badge\" src=\"{}\" alt=\"{} badge\" />\n",
            escape_html(&shields_badge_url(badge_base_url, &verdict.slug)),
            escape_html(&verdict.slug)
        ));
        out.push_str("    </article>\n");
    }

    out.push_str("  </main>\n</body>\n</html>\n");
    out
}

fn markdown_cell(raw: &str) -> String {
    raw.replace('|', "\\|").replace('\n', " ")
}

/// Markdown table with one row per repository and one column per check.
pub fn render_markdown_report(set: &RunResultSet, badge_base_url: &str) -> String {
    let mut out = String::new();
    out.push_str("# Hall of Fame\n\n");
    out.push_str(&format!(
        "{} of {} packages verified ({}).\n\n",
        set.passed_count(),
        set.total(),
        set.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    if set.verdicts.is_empty() {
        out.push_str("No repos verified yet.\n");
        return out;
    }

    out.push_str("| Repository | Status | Badge |");
    for name in CheckName::ALL {
        out.push_str(&format!(" `{name}` |"));
    }
    out.push_str("\n|---|---|---|");
    for _ in CheckName::ALL {
        out.push_str("---|");
    }
    out.push('\n');

    for verdict in &set.verdicts {
        let url = markdown_cell(verdict.repository.as_str());
        out.push_str(&format!(
            "| [{url}]({url}) | {} | ![{}]({}) |",
            if verdict.passed { "PASS" } else { "FAIL" },
            verdict.slug,
            shields_badge_url(badge_base_url, &verdict.slug)
        ));
        for check in &verdict.checks {
            out.push_str(if check.passed { " pass |" } else { " fail |" });
        }
        out.push('\n');
    }

    let failures: Vec<_> = set.verdicts.iter().filter(|v| !v.passed).collect();
    if !failures.is_empty() {
        out.push_str("\n## Failures\n\n");
        for verdict in failures {
            out.push_str(&format!(
                "- {}: {}\n",
                markdown_cell(verdict.repository.as_str()),
                markdown_cell(verdict.reason())
            ));
        }
    }
    out
}
