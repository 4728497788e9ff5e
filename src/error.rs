use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocSamplesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Document unreadable: {path}: {reason}")]
    DocumentUnreadable { path: PathBuf, reason: String },

    #[error("Unterminated code fence in {path} opened at line {line}")]
    MalformedFence { path: PathBuf, line: usize },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Execution timed out after {0:?}")]
    ExecutionTimedOut(std::time::Duration),

    #[error("Runner unavailable: {0}")]
    RunnerUnavailable(String),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),
}

pub type Result<T> = std::result::Result<T, DocSamplesError>;
