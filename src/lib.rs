pub mod classify;
pub mod config;
pub mod error;
pub mod execute;
pub mod extract;
pub mod report;
pub mod sweep;
pub mod versions;

pub use classify::{classify, FragmentReason, Verdict};
pub use config::{Config, RunnerConfig, TrackedTechnology, CONFIG_FILENAME};
pub use error::{DocSamplesError, Result};
pub use execute::{Failure, FailureKind, Outcome, RunnerRegistry, ScriptRunner, RUNNER_NOT_IMPLEMENTED};
pub use extract::{
    extract_blocks, CodeBlock, DocScanner, DocWalker, DocumentIssue, Extraction, FenceScanner,
    IssueKind, ScanOutput, ScannedDocument,
};
pub use report::{language_histogram, render_json, render_markdown, write_report};
pub use sweep::{LanguageFilter, SampleResult, Summary, Sweep, SweepReport};
pub use versions::{
    documented_version, evaluate, render_version_report, Release, ReleaseFeed, Version,
    VersionCheck, VersionMonitor, VersionStatus,
};
