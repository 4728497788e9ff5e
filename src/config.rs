//! Configuration loaded from `.doc-samples.yml`.
//!
//! Every field is optional. Paths are resolved against the documentation
//! root passed in explicitly; nothing is resolved relative to the binary or
//! the current process.
//!
//! Format:
//! ```yaml
//! docs_dir: docs
//! reports_dir: reports
//! context_lines: 3
//! timeout_secs: 10
//! exclude:
//!   - "drafts/**"
//! runners:
//!   bash:
//!     program: bash
//!     extension: sh
//!     aliases: [sh]
//! technologies:
//!   - name: redis
//!     release_url: https://api.github.com/repos/redis/redis/releases/latest
//!     fallback_version: "7.0"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DocSamplesError, Result};

/// Name of the config file looked up at the documentation root
pub const CONFIG_FILENAME: &str = ".doc-samples.yml";

/// Raw file contents, before paths are resolved
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub docs_dir: Option<PathBuf>,
    pub reports_dir: Option<PathBuf>,
    pub context_lines: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub scratch_dir: Option<PathBuf>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub runners: BTreeMap<String, RunnerConfig>,
    pub technologies: Option<Vec<TrackedTechnology>>,
    pub http_timeout_secs: Option<u64>,
}

/// Interpreter used to execute samples for one language tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Executable to launch (looked up on PATH)
    pub program: String,
    /// Arguments placed before the sample file path
    #[serde(default)]
    pub args: Vec<String>,
    /// File extension for the temporary sample file, without the dot
    pub extension: String,
    /// Other language tags handled by the same runner
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A technology whose documented version is compared against a release feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedTechnology {
    /// Name as it appears in the docs (e.g. "Redis"); matched case-insensitively
    pub name: String,
    /// Endpoint returning the latest release as JSON with `tag_name`
    pub release_url: String,
    /// Version assumed when the docs never mention one
    pub fallback_version: String,
}

impl TrackedTechnology {
    pub fn redis() -> Self {
        Self {
            name: "redis".to_string(),
            release_url: "https://api.github.com/repos/redis/redis/releases/latest".to_string(),
            fallback_version: "7.0".to_string(),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub docs_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub context_lines: usize,
    pub timeout: Duration,
    pub scratch_dir: Option<PathBuf>,
    pub exclude: Vec<String>,
    pub runners: BTreeMap<String, RunnerConfig>,
    pub technologies: Vec<TrackedTechnology>,
    pub http_timeout: Duration,
}

impl Config {
    pub const DEFAULT_CONTEXT_LINES: usize = 3;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Defaults for a documentation root, without reading any file
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::resolve(root.into(), ConfigFile::default())
    }

    /// Load the config for `root`.
    ///
    /// With `explicit` set, that file must exist. Otherwise
    /// `<root>/.doc-samples.yml` is used when present and defaults apply when
    /// it is not.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(DocSamplesError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => {
                let default = root.join(CONFIG_FILENAME);
                default.is_file().then_some(default)
            }
        };

        let parsed = match file {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                parse_config(&content)?
            }
            None => ConfigFile::default(),
        };

        let config = Self::resolve(root.to_path_buf(), parsed);
        config.validate()?;
        Ok(config)
    }

    fn resolve(root: PathBuf, file: ConfigFile) -> Self {
        let docs_dir = root.join(file.docs_dir.unwrap_or_else(|| PathBuf::from("docs")));
        let reports_dir = root.join(file.reports_dir.unwrap_or_else(|| PathBuf::from("reports")));
        let scratch_dir = file.scratch_dir.map(|dir| root.join(dir));

        Self {
            docs_dir,
            reports_dir,
            context_lines: file.context_lines.unwrap_or(Self::DEFAULT_CONTEXT_LINES),
            timeout: Duration::from_secs(file.timeout_secs.unwrap_or(Self::DEFAULT_TIMEOUT_SECS)),
            scratch_dir,
            exclude: file.exclude,
            runners: file.runners,
            technologies: file
                .technologies
                .unwrap_or_else(|| vec![TrackedTechnology::redis()]),
            http_timeout: Duration::from_secs(file.http_timeout_secs.unwrap_or(10)),
            root,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(DocSamplesError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        for (language, runner) in &self.runners {
            if runner.program.trim().is_empty() {
                return Err(DocSamplesError::Config(format!(
                    "runner '{}' has an empty program",
                    language
                )));
            }
        }
        Ok(())
    }
}

/// Parse config file contents
pub fn parse_config(content: &str) -> Result<ConfigFile> {
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(temp_dir.path(), None).unwrap();

        assert_eq!(config.docs_dir, temp_dir.path().join("docs"));
        assert_eq!(config.reports_dir, temp_dir.path().join("reports"));
        assert_eq!(config.context_lines, 3);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.runners.is_empty());
        assert_eq!(config.technologies, vec![TrackedTechnology::redis()]);
    }

    #[test]
    fn test_load_default_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "docs_dir: content\ntimeout_secs: 3\nexclude:\n  - \"drafts/**\"\n",
        )
        .unwrap();

        let config = Config::load(temp_dir.path(), None).unwrap();
        assert_eq!(config.docs_dir, temp_dir.path().join("content"));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.exclude, vec!["drafts/**".to_string()]);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(temp_dir.path(), Some(&temp_dir.path().join("nope.yml")));
        assert!(matches!(result, Err(DocSamplesError::Config(_))));
    }

    #[test]
    fn test_parse_runners_and_technologies() {
        let yaml = r#"
runners:
  bash:
    program: bash
    extension: sh
    aliases: [sh, shell]
technologies:
  - name: postgresql
    release_url: http://localhost/releases/latest
    fallback_version: "15"
"#;
        let file = parse_config(yaml).unwrap();
        let bash = &file.runners["bash"];
        assert_eq!(bash.program, "bash");
        assert!(bash.args.is_empty());
        assert_eq!(bash.aliases, vec!["sh", "shell"]);

        let techs = file.technologies.unwrap();
        assert_eq!(techs[0].name, "postgresql");
        assert_eq!(techs[0].fallback_version, "15");
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(parse_config("timeout: 5\n").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILENAME), "timeout_secs: 0\n").unwrap();
        assert!(Config::load(temp_dir.path(), None).is_err());
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = parse_config("   \n").unwrap();
        assert!(file.docs_dir.is_none());
        assert!(file.runners.is_empty());
    }
}
