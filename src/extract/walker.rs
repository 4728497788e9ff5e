use std::path::{Path, PathBuf};

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use crate::error::{DocSamplesError, Result};

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Lists Markdown documents under a docs directory.
///
/// `.gitignore` files apply whether or not the docs live in a git checkout.
pub struct DocWalker {
    root: PathBuf,
    exclude: Vec<String>,
}

impl DocWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude: Vec::new(),
        }
    }

    /// Skip paths matching these globs (relative to the root)
    pub fn with_exclude(mut self, patterns: &[String]) -> Self {
        self.exclude = patterns.to_vec();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Documents in sorted path order
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(DocSamplesError::Config(format!(
                "docs directory not found: {}",
                self.root.display()
            )));
        }

        let mut overrides = OverrideBuilder::new(&self.root);
        for pattern in &self.exclude {
            overrides
                .add(&format!("!{}", pattern))
                .map_err(|e| DocSamplesError::Config(format!("bad exclude '{}': {}", pattern, e)))?;
        }
        let overrides = overrides
            .build()
            .map_err(|e| DocSamplesError::Config(e.to_string()))?;

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .ignore(true)
            .overrides(overrides)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && Self::is_markdown(path) {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => tracing::warn!("Skipping unreadable entry: {}", e),
            }
        }

        Ok(files)
    }

    pub fn is_markdown(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                MARKDOWN_EXTENSIONS
                    .iter()
                    .any(|m| ext.eq_ignore_ascii_case(m))
            })
            .unwrap_or(false)
    }
}
