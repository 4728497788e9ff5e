//! Version drift monitoring.
//!
//! Finds the highest version of a tracked technology mentioned anywhere in
//! the docs and compares it with the latest release reported by its feed.

pub mod feed;
pub mod version;

pub use feed::{parse_release, Release, ReleaseFeed};
pub use version::Version;

use std::fmt::Write as _;
use std::path::PathBuf;

use regex::Regex;
use serde::Serialize;

use crate::config::TrackedTechnology;
use crate::error::{DocSamplesError, Result};

/// Highest `<name> X.Y[.Z]` mention across `documents`, if any.
///
/// Documents that cannot be read are logged and skipped.
pub fn documented_version(name: &str, documents: &[PathBuf]) -> Result<Option<Version>> {
    let pattern = version_pattern(name)?;
    let mut best: Option<Version> = None;

    for path in documents {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                continue;
            }
        };

        for found in mentioned_versions(&pattern, &content) {
            if best.as_ref().map_or(true, |b| found > *b) {
                best = Some(found);
            }
        }
    }

    Ok(best)
}

fn version_pattern(name: &str) -> Result<Regex> {
    Regex::new(&format!(
        r"(?i)\b{}\s+v?([0-9]+\.[0-9]+(?:\.[0-9]+)?)",
        regex::escape(name)
    ))
    .map_err(|e| DocSamplesError::Config(format!("bad technology name '{}': {}", name, e)))
}

fn mentioned_versions<'a>(pattern: &'a Regex, content: &'a str) -> impl Iterator<Item = Version> + 'a {
    pattern
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| Version::parse(m.as_str()).ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VersionStatus {
    UpToDate {
        documented: String,
        latest: String,
    },
    Outdated {
        documented: String,
        latest: String,
        published_at: Option<String>,
    },
    Unavailable {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionCheck {
    pub technology: String,
    pub status: VersionStatus,
}

impl VersionCheck {
    pub fn is_outdated(&self) -> bool {
        matches!(self.status, VersionStatus::Outdated { .. })
    }
}

/// Compare a documented version with a fetched release
pub fn evaluate(documented: &Version, release: &Release) -> Result<VersionStatus> {
    let latest = Version::parse(&release.tag_name)?;
    Ok(if latest > *documented {
        VersionStatus::Outdated {
            documented: documented.to_string(),
            latest: latest.to_string(),
            published_at: release.published_at.clone(),
        }
    } else {
        VersionStatus::UpToDate {
            documented: documented.to_string(),
            latest: latest.to_string(),
        }
    })
}

pub struct VersionMonitor {
    feed: ReleaseFeed,
    documents: Vec<PathBuf>,
}

impl VersionMonitor {
    pub fn new(feed: ReleaseFeed, documents: Vec<PathBuf>) -> Self {
        Self { feed, documents }
    }

    /// Check one technology. Failures become [`VersionStatus::Unavailable`].
    pub async fn check(&self, tech: &TrackedTechnology) -> VersionCheck {
        let status = match self.try_check(tech).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Version check for {} failed: {}", tech.name, e);
                VersionStatus::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        VersionCheck {
            technology: tech.name.clone(),
            status,
        }
    }

    async fn try_check(&self, tech: &TrackedTechnology) -> Result<VersionStatus> {
        let documented = match documented_version(&tech.name, &self.documents)? {
            Some(version) => version,
            None => Version::parse(&tech.fallback_version)?,
        };
        let release = self.feed.latest(&tech.release_url).await?;

        tracing::info!("{} documented version: {}", tech.name, documented);
        tracing::info!("{} latest release: {}", tech.name, release.tag_name);

        evaluate(&documented, &release)
    }

    /// Check technologies one after another
    pub async fn check_all(&self, techs: &[TrackedTechnology]) -> Vec<VersionCheck> {
        let mut checks = Vec::with_capacity(techs.len());
        for tech in techs {
            checks.push(self.check(tech).await);
        }
        checks
    }
}

pub fn render_version_report(checks: &[VersionCheck]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Version Report");
    let _ = writeln!(out);

    for check in checks {
        let _ = writeln!(out, "## {}", check.technology.to_uppercase());
        match &check.status {
            VersionStatus::UpToDate { documented, latest } => {
                let _ = writeln!(out, "- **Documented**: {}", documented);
                let _ = writeln!(out, "- **Latest**: {}", latest);
                let _ = writeln!(out, "- **Status**: up to date");
            }
            VersionStatus::Outdated {
                documented,
                latest,
                published_at,
            } => {
                let _ = writeln!(out, "- **Documented**: {}", documented);
                let _ = writeln!(out, "- **Latest**: {}", latest);
                if let Some(published_at) = published_at {
                    let _ = writeln!(out, "- **Published**: {}", published_at);
                }
                let _ = writeln!(out, "- **Status**: update needed");
            }
            VersionStatus::Unavailable { reason } => {
                let _ = writeln!(out, "- **Status**: check failed ({})", reason);
            }
        }
        let _ = writeln!(out);
    }

    out
}
