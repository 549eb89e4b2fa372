//! Aggregate secrets report: model and text rendering

use chrono::Utc;

/// Banner printed above each pattern's context windows
const PATTERN_BANNER_PREFIX: &str = "=== Matches for pattern: ";
/// Banner printed after each pattern's context windows
const PATTERN_BANNER_CLOSE: &str = "======================================";

/// Context windows for one matched pattern within one artifact.
///
/// One window per matching line, in line order. Overlapping windows from
/// nearby matches are kept as emitted, never merged or deduplicated.
#[derive(Debug, Clone)]
pub struct MatchRecord {
    /// The pattern as written in the pattern file
    pub pattern: String,
    /// Context windows, each at most 3 lines before + match + 3 lines after
    pub windows: Vec<Vec<String>>,
}

/// All pattern hits for one artifact
#[derive(Debug, Clone)]
pub struct ArtifactSection {
    /// Artifact path relative to the corpus root
    pub relative_path: String,
    /// One record per distinct pattern that hit, in pattern-file order
    pub records: Vec<MatchRecord>,
}

/// Aggregate of all match records across the corpus
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Sum over affected artifacts of the number of distinct patterns matched
    pub total_secrets: usize,
    /// Number of artifacts with at least one pattern hit
    pub affected_files: usize,
    /// Per-artifact sections, in corpus order
    pub sections: Vec<ArtifactSection>,
    /// Artifacts skipped as unreadable
    pub warnings: Vec<String>,
}

impl ScanReport {
    /// True when no pattern matched anywhere
    pub fn is_clean(&self) -> bool {
        self.total_secrets == 0
    }

    /// Render the aggregate report document: a header, then one section per
    /// affected artifact with each pattern's windows between fixed banners.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Secrets scan report ({})\n",
            Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        ));
        out.push_str(&format!(
            "Total matches: {}, affected files: {}\n",
            self.total_secrets, self.affected_files
        ));
        for warning in &self.warnings {
            out.push_str(&format!("WARNING: {}\n", warning));
        }
        out.push('\n');

        for section in &self.sections {
            out.push_str(&format!("--- {} ---\n", section.relative_path));
            for record in &section.records {
                out.push_str(PATTERN_BANNER_PREFIX);
                out.push_str(&record.pattern);
                out.push_str(" ===\n");
                for (i, window) in record.windows.iter().enumerate() {
                    if i > 0 {
                        out.push_str("--\n");
                    }
                    for line in window {
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                out.push_str(PATTERN_BANNER_CLOSE);
                out.push('\n');
            }
            out.push('\n');
        }

        out
    }
}
