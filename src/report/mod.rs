//! Plain-text rendering of sweep results.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::execute::Outcome;
use crate::extract::{IssueKind, ScanOutput};
use crate::sweep::{SampleResult, SweepReport};

/// Block counts per language, most common first, ties by name
pub fn language_histogram(scan: &ScanOutput) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for block in scan.blocks() {
        *counts.entry(block.language.as_str()).or_default() += 1;
    }

    let mut histogram: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(language, count)| (language.to_string(), count))
        .collect();
    histogram.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    histogram
}

fn status_marker(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Pass => "PASS",
        Outcome::Fail(_) => "FAIL",
        Outcome::Skipped(_) => "SKIP",
    }
}

pub fn render_markdown(report: &SweepReport) -> String {
    let summary = report.summary();
    let mut out = String::new();

    let _ = writeln!(out, "# Code Sample Test Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Total blocks**: {}", summary.total);
    let _ = writeln!(out, "- **Passed**: {}", summary.passed);
    let _ = writeln!(out, "- **Failed**: {}", summary.failed);
    let _ = writeln!(out, "- **Skipped**: {}", summary.skipped);
    let _ = writeln!(out, "- **Pass rate**: {:.1}%", summary.pass_rate());
    let _ = writeln!(out);
    let _ = writeln!(out, "## Results");
    let _ = writeln!(out);

    let mut by_document: BTreeMap<&Path, Vec<&SampleResult>> = BTreeMap::new();
    for result in &report.results {
        by_document
            .entry(result.document.as_path())
            .or_default()
            .push(result);
    }

    for (document, results) in by_document {
        let _ = writeln!(out, "### {}", document.display());
        let _ = writeln!(out);
        for result in results {
            let _ = writeln!(
                out,
                "- {} lines {}-{} ({}): {}",
                status_marker(&result.outcome),
                result.line_start,
                result.line_end,
                result.language,
                first_line(&result.message)
            );
        }
        let _ = writeln!(out);
    }

    if !report.issues.is_empty() {
        let _ = writeln!(out, "## Document issues");
        let _ = writeln!(out);
        for issue in &report.issues {
            let kind = match issue.kind {
                IssueKind::Unreadable => "unreadable",
                IssueKind::MalformedFence => "malformed fence",
            };
            let _ = writeln!(out, "- {} ({}): {}", issue.document.display(), kind, issue.message);
        }
        let _ = writeln!(out);
    }

    out
}

pub fn render_json(report: &SweepReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Write `body` to `<dir>/<filename>`, creating `dir` if needed
pub fn write_report(dir: &Path, filename: &str, body: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    std::fs::write(&path, body)?;
    tracing::info!("Report saved to {}", path.display());
    Ok(path)
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}
