//! Sample execution.
//!
//! A [`ScriptRunner`] runs samples of one language in a subprocess with a
//! wall-clock timeout. [`RunnerRegistry`] maps language tags to runners;
//! tags without a runner are skipped rather than failed.

pub mod runner;

pub use runner::ScriptRunner;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::DocSamplesError;

/// Skip message for languages with no runner
pub const RUNNER_NOT_IMPLEMENTED: &str = "runner not implemented";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The sample exited with a non-zero status
    ExitStatus,
    /// The sample exceeded its timeout and was killed
    TimedOut,
    /// The interpreter could not be started
    Launch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

/// Result of checking one sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail(Failure),
    Skipped(String),
}

impl Outcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Outcome::Skipped(reason.into())
    }

    /// Map an execution error onto a failed outcome
    pub fn from_error(error: DocSamplesError) -> Self {
        let kind = match error {
            DocSamplesError::ExecutionTimedOut(_) => FailureKind::TimedOut,
            DocSamplesError::RunnerUnavailable(_) | DocSamplesError::Io(_) => FailureKind::Launch,
            _ => FailureKind::ExitStatus,
        };
        Outcome::Fail(Failure {
            kind,
            message: error.to_string(),
        })
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }

    /// Human-readable one-liner
    pub fn message(&self) -> String {
        match self {
            Outcome::Pass => "passed".to_string(),
            Outcome::Fail(failure) => failure.message.clone(),
            Outcome::Skipped(reason) => format!("skipped: {}", reason),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Runners by language tag
pub struct RunnerRegistry {
    runners: HashMap<String, Arc<ScriptRunner>>,
    aliases: HashMap<String, String>,
}

impl RunnerRegistry {
    /// A registry with no runners at all
    pub fn empty() -> Self {
        Self {
            runners: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// The built-in Python runner only
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(ScriptRunner::python(), &["py", "python3"]);
        registry
    }

    /// Built-in runners plus the ones declared in config, all sharing the
    /// configured scratch directory
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();
        for (language, runner) in &config.runners {
            let aliases: Vec<&str> = runner.aliases.iter().map(String::as_str).collect();
            registry.register(ScriptRunner::from_config(language, runner), &aliases);
        }
        registry.set_scratch_dir(config.scratch_dir.clone());
        registry
    }

    pub fn register(&mut self, runner: ScriptRunner, aliases: &[&str]) {
        let language = runner.language().to_string();
        for alias in aliases {
            self.aliases.insert(alias.to_string(), language.clone());
        }
        self.aliases.remove(&language);
        self.runners.insert(language, Arc::new(runner));
    }

    fn set_scratch_dir(&mut self, dir: Option<PathBuf>) {
        for runner in self.runners.values_mut() {
            *runner = Arc::new(runner.as_ref().clone().with_scratch_dir(dir.clone()));
        }
    }

    pub fn get(&self, language: &str) -> Option<Arc<ScriptRunner>> {
        let name = self
            .aliases
            .get(language)
            .map(String::as_str)
            .unwrap_or(language);
        self.runners.get(name).cloned()
    }

    pub fn supported_languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self
            .runners
            .keys()
            .chain(self.aliases.keys())
            .map(String::as_str)
            .collect();
        languages.sort_unstable();
        languages
    }
}

impl Default for RunnerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use std::time::Duration;

    #[test]
    fn test_default_registry_has_python_only() {
        let registry = RunnerRegistry::new();
        assert_eq!(registry.get("python").unwrap().program(), "python3");
        assert_eq!(registry.get("py").unwrap().language(), "python");
        assert!(registry.get("bash").is_none());
        assert!(registry.get("text").is_none());
        assert_eq!(registry.supported_languages(), vec!["py", "python", "python3"]);
    }

    #[test]
    fn test_config_runners_are_added() {
        let mut config = Config::with_root("/tmp/docs-root");
        config.runners.insert(
            "bash".to_string(),
            RunnerConfig {
                program: "bash".to_string(),
                args: vec![],
                extension: "sh".to_string(),
                aliases: vec!["sh".to_string()],
            },
        );

        let registry = RunnerRegistry::from_config(&config);
        assert_eq!(registry.get("sh").unwrap().language(), "bash");
        assert!(registry.get("python").is_some());
    }

    #[test]
    fn test_registering_language_overrides_alias() {
        let mut registry = RunnerRegistry::new();
        registry.register(ScriptRunner::new("py", "pypy3", "py"), &[]);
        assert_eq!(registry.get("py").unwrap().program(), "pypy3");
        assert_eq!(registry.get("python").unwrap().program(), "python3");
    }

    #[test]
    fn test_outcome_from_error() {
        let timed_out = Outcome::from_error(DocSamplesError::ExecutionTimedOut(Duration::from_secs(10)));
        assert!(matches!(
            timed_out,
            Outcome::Fail(Failure { kind: FailureKind::TimedOut, .. })
        ));

        let launch = Outcome::from_error(DocSamplesError::RunnerUnavailable("no python3".to_string()));
        assert!(matches!(
            launch,
            Outcome::Fail(Failure { kind: FailureKind::Launch, .. })
        ));

        let failed = Outcome::from_error(DocSamplesError::ExecutionFailed("exit status 1".to_string()));
        assert!(failed.is_fail());
        assert_eq!(failed.message(), "Execution failed: exit status 1");
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::skipped(RUNNER_NOT_IMPLEMENTED)).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["detail"], "runner not implemented");

        let json = serde_json::to_value(Outcome::Pass).unwrap();
        assert_eq!(json["status"], "pass");
    }
}
