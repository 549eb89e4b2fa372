//! Secret search pattern loading

use std::path::Path;

use regex::{Regex, RegexBuilder};

use crate::{Error, Result};

/// One search pattern from the pattern file
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The pattern line exactly as written in the source file
    pub raw: String,
    matcher: Regex,
}

impl Pattern {
    /// Compile a pattern line, case-insensitively.
    ///
    /// Lines that are not valid regexes are matched as literal substrings.
    pub fn new(raw: &str) -> Self {
        let matcher = RegexBuilder::new(raw)
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|_| {
                RegexBuilder::new(&regex::escape(raw))
                    .case_insensitive(true)
                    .build()
                    .expect("escaped pattern always compiles")
            });
        Self {
            raw: raw.to_string(),
            matcher,
        }
    }

    /// Test a single line for a match
    pub fn matches(&self, line: &str) -> bool {
        self.matcher.is_match(line)
    }
}

/// Load the pattern list from `path`.
///
/// Per line: trim, skip if empty or starting with `#`, otherwise the entire
/// remaining line (embedded whitespace included) is one pattern. Duplicate
/// lines are kept and each contributes to match counts.
pub fn load_patterns(path: &Path) -> Result<Vec<Pattern>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read pattern file {}: {}",
            path.display(),
            e
        ))
    })?;

    let patterns = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Pattern::new)
        .collect();

    Ok(patterns)
}
