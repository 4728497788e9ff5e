//! Heuristic triage of code samples.
//!
//! Decides whether a block looks like a complete program that can be run on
//! its own or an illustrative fragment. This is pattern matching, not
//! parsing: it never fails and always gives the same verdict for the same
//! text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const PLACEHOLDERS: &[&str] = &["...", "\u{2026}", "TODO", "FIXME"];

/// Any of these anywhere in the text counts as using an import
const USE_MARKERS: &[&str] = &["def ", "class ", "if __name__", "print(", "="];

const MIN_LINES: usize = 4;
const MIN_CODE_LINES: usize = 3;

static ENTRY_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(def |class |if __name__)").expect("entry point pattern is valid")
});

/// Why a block was judged to be a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentReason {
    /// Contains an ellipsis, TODO or FIXME
    Placeholder,
    /// Fewer than four lines
    TooShort,
    /// Imports something but never does anything
    UnusedImport,
    /// Not enough non-comment lines
    NoExecutableLines,
}

impl FragmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentReason::Placeholder => "contains a placeholder or TODO",
            FragmentReason::TooShort => "too short to be a standalone program",
            FragmentReason::UnusedImport => "imports without using them",
            FragmentReason::NoExecutableLines => "not enough executable lines",
        }
    }
}

impl fmt::Display for FragmentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    LikelyRunnable,
    LikelyFragment(FragmentReason),
}

impl Verdict {
    pub fn is_runnable(&self) -> bool {
        matches!(self, Verdict::LikelyRunnable)
    }
}

/// Classify a sample. Rules are checked in order and the first match wins.
pub fn classify(text: &str) -> Verdict {
    if PLACEHOLDERS.iter().any(|p| text.contains(p)) {
        return Verdict::LikelyFragment(FragmentReason::Placeholder);
    }

    if text.trim().lines().count() < MIN_LINES {
        return Verdict::LikelyFragment(FragmentReason::TooShort);
    }

    if text.contains("import") && !USE_MARKERS.iter().any(|m| text.contains(m)) {
        return Verdict::LikelyFragment(FragmentReason::UnusedImport);
    }

    if ENTRY_POINT.is_match(text) {
        return Verdict::LikelyRunnable;
    }

    let code_lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .count();
    if code_lines >= MIN_CODE_LINES {
        return Verdict::LikelyRunnable;
    }

    Verdict::LikelyFragment(FragmentReason::NoExecutableLines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_snippet_is_fragment() {
        assert_eq!(
            classify("x = 1\nprint(x)\n"),
            Verdict::LikelyFragment(FragmentReason::TooShort)
        );
    }

    #[test]
    fn test_entry_point_is_runnable() {
        let code = "def main():\n    pass\n\nif __name__ == \"__main__\":\n    main()\n";
        assert_eq!(classify(code), Verdict::LikelyRunnable);
    }

    #[test]
    fn test_lone_import_is_fragment() {
        assert!(!classify("import os\n").is_runnable());
    }

    #[test]
    fn test_unused_imports_are_fragment() {
        let code = "import os\nimport sys\nimport json\nfrom pathlib import Path\n";
        assert_eq!(
            classify(code),
            Verdict::LikelyFragment(FragmentReason::UnusedImport)
        );
    }

    #[test]
    fn test_import_with_assignment_is_not_unused() {
        let code = "import os\n\nhome = os.environ\nos.getcwd()\nos.listdir(home)\n";
        assert_eq!(classify(code), Verdict::LikelyRunnable);
    }

    #[test]
    fn test_any_use_marker_counts_even_in_comments() {
        // The marker check looks at raw text, so an "=" in a comment is enough
        let code = "import os\n# a = b\n# c\nos.getcwd()\n";
        assert_eq!(
            classify(code),
            Verdict::LikelyFragment(FragmentReason::NoExecutableLines)
        );
    }

    #[test]
    fn test_placeholders() {
        let base = "def main():\n    pass\n\nmain()\n";
        for marker in ["    ...", "# TODO: finish", "# FIXME", "x = \u{2026}"] {
            let code = format!("{}{}\n", base, marker);
            assert_eq!(
                classify(&code),
                Verdict::LikelyFragment(FragmentReason::Placeholder),
                "marker {:?}",
                marker
            );
        }
    }

    #[test]
    fn test_placeholder_wins_over_length() {
        assert_eq!(
            classify("..."),
            Verdict::LikelyFragment(FragmentReason::Placeholder)
        );
    }

    #[test]
    fn test_class_definition_is_runnable() {
        let code = "class Cache:\n    pass\n\ncache = Cache()\n";
        assert_eq!(classify(code), Verdict::LikelyRunnable);
    }

    #[test]
    fn test_indented_def_does_not_match_line_start() {
        // Only two non-comment lines remain once the nested def is not an entry point
        let code = "# helpers\n    def inner():\n        pass\n# end\n";
        assert_eq!(
            classify(code),
            Verdict::LikelyFragment(FragmentReason::NoExecutableLines)
        );
    }

    #[test]
    fn test_top_level_statements_are_runnable() {
        let code = "# compute\nx = 1\ny = 2\nprint(x + y)\n";
        assert_eq!(classify(code), Verdict::LikelyRunnable);
    }

    #[test]
    fn test_mostly_comments_is_fragment() {
        let code = "# one\n# two\n\nx = 1\n# three\ny = 2\n";
        assert_eq!(
            classify(code),
            Verdict::LikelyFragment(FragmentReason::NoExecutableLines)
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let code = "import redis\n\nr = redis.Redis()\nr.set('k', 'v')\nprint(r.get('k'))\n";
        let first = classify(code);
        for _ in 0..10 {
            assert_eq!(classify(code), first);
        }
    }

    #[test]
    fn test_never_panics_on_odd_input() {
        for text in ["", "\n\n\n\n\n", "\u{0}\u{feff}", "=\n=\n=\n=\n", "```"] {
            let _ = classify(text);
        }
    }
}
