use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use doc_samples::config::Config;
use doc_samples::error::{DocSamplesError, Result};
use doc_samples::execute::RunnerRegistry;
use doc_samples::extract::{DocScanner, DocWalker, ScanOutput};
use doc_samples::report::{language_histogram, render_json, render_markdown, write_report};
use doc_samples::sweep::{LanguageFilter, Sweep};
use doc_samples::versions::{render_version_report, ReleaseFeed, VersionMonitor};

#[derive(Parser)]
#[command(name = "doc-samples")]
#[command(about = "Smoke-test code samples in Markdown docs and track documented versions")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Count code blocks per language under ./docs
    doc-samples scan

    # Run every Python sample and save the report
    doc-samples test --language python

    # Use another documentation root and emit JSON
    doc-samples --root ../handbook test --format json

    # Check documented versions against release feeds
    doc-samples versions
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Documentation project root
    #[arg(long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Config file (defaults to <root>/.doc-samples.yml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
}

impl ReportFormat {
    fn default_filename(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "code_test_report.md",
            ReportFormat::Json => "code_test_report.json",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the docs and count code blocks per language
    Scan,

    /// Classify and run code samples
    Test {
        /// Language tag to test, or "all"
        #[arg(long, default_value = "all")]
        language: String,

        /// Report format
        #[arg(long, value_enum, default_value = "markdown")]
        format: ReportFormat,

        /// Report file name inside the reports directory
        #[arg(long)]
        output: Option<String>,

        /// Per-sample timeout in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the report without saving it
        #[arg(long)]
        no_save: bool,
    },

    /// Compare documented versions with the latest releases
    Versions {
        /// Only check this technology
        #[arg(long)]
        tech: Option<String>,

        /// Report file name inside the reports directory
        #[arg(long, default_value = "version_report.md")]
        output: String,

        /// Print the report without saving it
        #[arg(long)]
        no_save: bool,
    },
}

pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<Config> {
    Config::load(root, explicit)
}

fn scan(config: &Config) -> Result<ScanOutput> {
    let walker = DocWalker::new(&config.docs_dir).with_exclude(&config.exclude);
    DocScanner::new(&config.root, config.context_lines).scan(&walker)
}

pub fn scan_docs(config: &Config) -> Result<()> {
    let output = scan(config)?;

    println!(
        "Found {} code blocks in {} documents",
        output.total_blocks(),
        output.documents.len()
    );

    let histogram = language_histogram(&output);
    if !histogram.is_empty() {
        println!("\nBlocks by language:");
        for (language, count) in histogram {
            println!("  {}: {}", language, count);
        }
    }

    if !output.issues.is_empty() {
        println!("\nDocument issues:");
        for issue in &output.issues {
            println!("  {}", issue.message);
        }
    }

    Ok(())
}

/// Run the sweep. Returns `true` when any sample failed.
pub async fn test_samples(
    config: &Config,
    language: &str,
    format: ReportFormat,
    output: Option<String>,
    timeout: Option<u64>,
    no_save: bool,
) -> Result<bool> {
    let filter: LanguageFilter = language
        .parse()
        .map_err(|_| DocSamplesError::Config(format!("bad language filter: {}", language)))?;

    let scan = scan(config)?;
    let mut sweep = Sweep::new(config, RunnerRegistry::from_config(config));
    if let Some(secs) = timeout {
        if secs == 0 {
            return Err(DocSamplesError::Config("--timeout must be greater than zero".to_string()));
        }
        sweep = sweep.with_timeout(Duration::from_secs(secs));
    }

    let progress = ProgressBar::new(sweep.planned(&scan, &filter) as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let report = sweep
        .run(&scan, &filter, |result| {
            progress.set_message(format!(
                "{}:{}",
                result.document.display(),
                result.line_start
            ));
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    let body = match format {
        ReportFormat::Markdown => render_markdown(&report),
        ReportFormat::Json => render_json(&report)?,
    };

    if !no_save {
        let filename = output.unwrap_or_else(|| format.default_filename().to_string());
        write_report(&config.reports_dir, &filename, &body)?;
    }

    println!("{}", body);

    let summary = report.summary();
    eprintln!(
        "{} passed, {} failed, {} skipped",
        summary.passed, summary.failed, summary.skipped
    );

    Ok(report.has_failures())
}

pub async fn check_versions(
    config: &Config,
    tech: Option<String>,
    output: &str,
    no_save: bool,
) -> Result<()> {
    let technologies: Vec<_> = match tech {
        Some(name) => {
            let selected: Vec<_> = config
                .technologies
                .iter()
                .filter(|t| t.name.eq_ignore_ascii_case(&name))
                .cloned()
                .collect();
            if selected.is_empty() {
                return Err(DocSamplesError::Config(format!(
                    "technology '{}' is not tracked",
                    name
                )));
            }
            selected
        }
        None => config.technologies.clone(),
    };

    let documents = DocWalker::new(&config.docs_dir)
        .with_exclude(&config.exclude)
        .walk()?;
    let monitor = VersionMonitor::new(ReleaseFeed::new(config.http_timeout)?, documents);
    let checks = monitor.check_all(&technologies).await;

    let body = render_version_report(&checks);
    if !no_save {
        write_report(&config.reports_dir, output, &body)?;
    }
    println!("{}", body);

    Ok(())
}
