//! Multi-pattern secret scanning with bounded context windows

use tracing::{debug, warn};

use crate::corpus::Artifact;

use super::patterns::Pattern;
use super::report::{ArtifactSection, MatchRecord, ScanReport};

/// Lines of context captured on each side of a matching line
const CONTEXT_LINES: usize = 3;

/// Scan every artifact against every pattern.
///
/// Matching is line-oriented and case-insensitive. A pattern that hits an
/// artifact counts once toward `total_secrets` no matter how many lines it
/// matches; every matching line still contributes one context window to the
/// pattern's record. Iteration order is the caller's artifact order and the
/// pattern-file order, so identical inputs produce identical reports.
///
/// An empty corpus or empty pattern set yields an empty report, not an error.
pub fn scan(corpus: &[Artifact], patterns: &[Pattern]) -> ScanReport {
    let mut report = ScanReport::default();

    for artifact in corpus {
        let text = artifact.text();
        let lines: Vec<&str> = text.lines().collect();

        let mut records = Vec::new();
        for pattern in patterns {
            let windows = match_windows(&lines, pattern);
            if !windows.is_empty() {
                records.push(MatchRecord {
                    pattern: pattern.raw.clone(),
                    windows,
                });
            }
        }

        if !records.is_empty() {
            warn!(
                "{} pattern(s) matched in {}",
                records.len(),
                artifact.relative_path
            );
            report.total_secrets += records.len();
            report.affected_files += 1;
            report.sections.push(ArtifactSection {
                relative_path: artifact.relative_path.clone(),
                records,
            });
        }
    }

    debug!(
        "Scan complete: {} match(es) across {} file(s)",
        report.total_secrets, report.affected_files
    );
    report
}

/// Collect one context window per matching line: up to `CONTEXT_LINES` before
/// and after, clamped at the artifact boundaries. Windows from nearby matches
/// overlap and are kept as-is.
fn match_windows(lines: &[&str], pattern: &Pattern) -> Vec<Vec<String>> {
    let mut windows = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if pattern.matches(line) {
            let start = idx.saturating_sub(CONTEXT_LINES);
            let end = (idx + CONTEXT_LINES + 1).min(lines.len());
            windows.push(lines[start..end].iter().map(|l| l.to_string()).collect());
        }
    }
    windows
}
