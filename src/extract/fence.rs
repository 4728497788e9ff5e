//! Fenced code block extraction from Markdown text.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Language tag used when a fence has none
pub const DEFAULT_LANGUAGE: &str = "text";

const FENCE_MARKER: &str = "```";

/// A fenced code block extracted from a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Document the block came from
    pub document: PathBuf,
    /// Declared language tag (e.g. "python"), "text" when absent
    pub language: String,
    /// Block content, trimmed
    pub code: String,
    /// Line of the opening fence (1-based)
    pub line_start: usize,
    /// Line of the closing fence (1-based)
    pub line_end: usize,
    /// Lines surrounding the block, fences included
    pub context: String,
}

/// Lazy scanner over the fenced regions of one document.
///
/// An opening fence with no closing marker is skipped: iteration ends and
/// [`FenceScanner::unterminated`] reports the line it was opened on.
pub struct FenceScanner<'a> {
    document: &'a Path,
    lines: Vec<&'a str>,
    context_lines: usize,
    cursor: usize,
    unterminated: Option<usize>,
}

impl<'a> FenceScanner<'a> {
    pub fn new(document: &'a Path, content: &'a str, context_lines: usize) -> Self {
        Self {
            document,
            lines: content.lines().collect(),
            context_lines,
            cursor: 0,
            unterminated: None,
        }
    }

    /// Number of lines in the scanned document
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Opening line (1-based) of an unterminated fence, once reached
    pub fn unterminated(&self) -> Option<usize> {
        self.unterminated
    }

    fn context(&self, open: usize, close: usize) -> String {
        let from = open.saturating_sub(self.context_lines);
        let to = (close + self.context_lines + 1).min(self.lines.len());
        self.lines[from..to].join("\n")
    }
}

impl Iterator for FenceScanner<'_> {
    type Item = CodeBlock;

    fn next(&mut self) -> Option<CodeBlock> {
        let open = (self.cursor..self.lines.len()).find(|&i| is_fence(self.lines[i]))?;
        let language = fence_language(self.lines[open]);

        let Some(close) = (open + 1..self.lines.len()).find(|&i| is_fence(self.lines[i])) else {
            self.unterminated = Some(open + 1);
            self.cursor = self.lines.len();
            return None;
        };
        self.cursor = close + 1;

        let code = self.lines[open + 1..close].join("\n").trim().to_string();

        Some(CodeBlock {
            document: self.document.to_path_buf(),
            language,
            code,
            line_start: open + 1,
            line_end: close + 1,
            context: self.context(open, close),
        })
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with(FENCE_MARKER)
}

fn fence_language(line: &str) -> String {
    let info = line.trim_start()[FENCE_MARKER.len()..].trim_start_matches('`');
    info.split_whitespace()
        .next()
        .map(|tag| tag.to_string())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

/// All blocks of a document, eagerly collected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub blocks: Vec<CodeBlock>,
    /// Opening line of an unterminated fence, if the document has one
    pub unterminated: Option<usize>,
}

pub fn extract_blocks(document: &Path, content: &str, context_lines: usize) -> Extraction {
    let mut scanner = FenceScanner::new(document, content, context_lines);
    let blocks = scanner.by_ref().collect();
    Extraction {
        blocks,
        unterminated: scanner.unterminated(),
    }
}
