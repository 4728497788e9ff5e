//! Sample sweep: classify and run every extracted block.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::{classify, Verdict};
use crate::config::Config;
use crate::execute::{Outcome, RunnerRegistry, RUNNER_NOT_IMPLEMENTED};
use crate::extract::{CodeBlock, DocumentIssue, ScanOutput};

/// Which blocks a sweep looks at
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LanguageFilter {
    #[default]
    All,
    Only(String),
}

impl LanguageFilter {
    pub fn matches(&self, language: &str) -> bool {
        match self {
            LanguageFilter::All => true,
            LanguageFilter::Only(wanted) => wanted == language,
        }
    }
}

impl FromStr for LanguageFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("all") {
            LanguageFilter::All
        } else {
            LanguageFilter::Only(s.to_string())
        })
    }
}

/// Report record for one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleResult {
    pub document: PathBuf,
    pub language: String,
    pub line_start: usize,
    pub line_end: usize,
    pub outcome: Outcome,
    pub message: String,
}

impl SampleResult {
    pub fn new(block: &CodeBlock, outcome: Outcome) -> Self {
        Self {
            document: block.document.clone(),
            language: block.language.clone(),
            line_start: block.line_start,
            line_end: block.line_end,
            message: outcome.message(),
            outcome,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    /// Percentage of all results that passed
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepReport {
    pub results: Vec<SampleResult>,
    pub issues: Vec<DocumentIssue>,
}

impl SweepReport {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.results.len(),
            ..Default::default()
        };
        for result in &self.results {
            match result.outcome {
                Outcome::Pass => summary.passed += 1,
                Outcome::Fail(_) => summary.failed += 1,
                Outcome::Skipped(_) => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.outcome.is_fail())
    }
}

/// Runs blocks one after another
pub struct Sweep {
    runners: RunnerRegistry,
    timeout: Duration,
}

impl Sweep {
    pub fn new(config: &Config, runners: RunnerRegistry) -> Self {
        Self {
            runners,
            timeout: config.timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of blocks a run with `filter` will produce results for
    pub fn planned(&self, scan: &ScanOutput, filter: &LanguageFilter) -> usize {
        scan.blocks().filter(|b| filter.matches(&b.language)).count()
    }

    /// Check a single block
    pub async fn check(&self, block: &CodeBlock) -> Outcome {
        let Some(runner) = self.runners.get(&block.language) else {
            return Outcome::skipped(RUNNER_NOT_IMPLEMENTED);
        };

        match classify(&block.code) {
            Verdict::LikelyFragment(reason) => {
                tracing::debug!(
                    "{}:{} treated as fragment: {}",
                    block.document.display(),
                    block.line_start,
                    reason
                );
                Outcome::skipped(reason.as_str())
            }
            Verdict::LikelyRunnable => runner.run(&block.code, self.timeout).await,
        }
    }

    /// Check every matching block in document order.
    ///
    /// `on_result` is called after each block, for progress display.
    pub async fn run<F>(&self, scan: &ScanOutput, filter: &LanguageFilter, mut on_result: F) -> SweepReport
    where
        F: FnMut(&SampleResult),
    {
        let mut report = SweepReport {
            results: Vec::new(),
            issues: scan.issues.clone(),
        };

        tracing::info!(
            "Checking {} code blocks (language: {})",
            self.planned(scan, filter),
            match filter {
                LanguageFilter::All => "all",
                LanguageFilter::Only(language) => language.as_str(),
            }
        );

        for block in scan.blocks().filter(|b| filter.matches(&b.language)) {
            let outcome = self.check(block).await;
            if let Outcome::Fail(ref failure) = outcome {
                tracing::warn!(
                    "{}:{}-{} failed: {}",
                    block.document.display(),
                    block.line_start,
                    block.line_end,
                    failure.message
                );
            }

            let result = SampleResult::new(block, outcome);
            on_result(&result);
            report.results.push(result);
        }

        report
    }
}
