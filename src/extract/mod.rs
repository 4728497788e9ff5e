//! Code block extraction from a documentation tree.
//!
//! [`DocWalker`] lists the Markdown documents, [`FenceScanner`] pulls the
//! fenced regions out of one document and [`DocScanner`] ties the two
//! together with per-document error isolation.

pub mod fence;
pub mod walker;

pub use fence::{extract_blocks, CodeBlock, Extraction, FenceScanner, DEFAULT_LANGUAGE};
pub use walker::DocWalker;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocSamplesError, Result};

/// What went wrong with a document as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Unreadable,
    MalformedFence,
}

/// A per-document problem recorded without stopping the scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIssue {
    pub document: PathBuf,
    pub kind: IssueKind,
    /// Line the problem starts on, when it has one
    pub line: Option<usize>,
    pub message: String,
}

impl DocumentIssue {
    pub fn from_error(document: &Path, error: &DocSamplesError) -> Self {
        let (kind, line) = match error {
            DocSamplesError::MalformedFence { line, .. } => (IssueKind::MalformedFence, Some(*line)),
            _ => (IssueKind::Unreadable, None),
        };
        Self {
            document: document.to_path_buf(),
            kind,
            line,
            message: error.to_string(),
        }
    }
}

/// Blocks from one document
#[derive(Debug, Clone)]
pub struct ScannedDocument {
    /// Path relative to the documentation root when possible
    pub path: PathBuf,
    pub blocks: Vec<CodeBlock>,
    /// Opening line of an unterminated fence
    pub unterminated: Option<usize>,
}

/// Result of scanning every document
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub documents: Vec<ScannedDocument>,
    pub issues: Vec<DocumentIssue>,
}

impl ScanOutput {
    pub fn total_blocks(&self) -> usize {
        self.documents.iter().map(|d| d.blocks.len()).sum()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &CodeBlock> {
        self.documents.iter().flat_map(|d| d.blocks.iter())
    }
}

/// Reads and extracts documents one at a time
pub struct DocScanner {
    root: PathBuf,
    context_lines: usize,
}

impl DocScanner {
    /// `root` is the base that reported paths are made relative to
    pub fn new(root: impl Into<PathBuf>, context_lines: usize) -> Self {
        Self {
            root: root.into(),
            context_lines,
        }
    }

    /// Extract one document
    pub fn scan_document(&self, path: &Path) -> Result<ScannedDocument> {
        let relative = self.relative(path);
        let content = read_document(path)?;
        let extraction = extract_blocks(&relative, &content, self.context_lines);

        Ok(ScannedDocument {
            path: relative,
            blocks: extraction.blocks,
            unterminated: extraction.unterminated,
        })
    }

    /// Scan every document the walker yields.
    ///
    /// Unreadable documents and unterminated fences are recorded as issues;
    /// the blocks found before an unterminated fence are kept.
    pub fn scan(&self, walker: &DocWalker) -> Result<ScanOutput> {
        let mut output = ScanOutput::default();

        for path in walker.walk()? {
            let document = match self.scan_document(&path) {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!("{}", e);
                    output
                        .issues
                        .push(DocumentIssue::from_error(&self.relative(&path), &e));
                    continue;
                }
            };

            if let Some(line) = document.unterminated {
                let error = DocSamplesError::MalformedFence {
                    path: document.path.clone(),
                    line,
                };
                tracing::warn!("{}", error);
                output
                    .issues
                    .push(DocumentIssue::from_error(&document.path, &error));
            }

            if !document.blocks.is_empty() {
                tracing::info!(
                    "Extracted {} code blocks from {}",
                    document.blocks.len(),
                    document.path.display()
                );
                output.documents.push(document);
            }
        }

        Ok(output)
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

fn read_document(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| DocSamplesError::DocumentUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| DocSamplesError::DocumentUnreadable {
        path: path.to_path_buf(),
        reason: format!("invalid UTF-8: {}", e),
    })
}
