//! Scan and decode orchestration over a gathered output tree

use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::corpus;
use crate::decode::{decoder, sniffer};
use crate::scan::report::ScanReport;
use crate::scan::{patterns, scanner};
use crate::Result;

/// Name of the aggregate report file under the output root
pub const REPORT_FILE: &str = "secrets-report.txt";

/// What one pipeline run produced, for exit-status mapping.
///
/// Callers can distinguish "ran cleanly, found nothing" from "ran cleanly,
/// found N issues"; a failed run never returns an outcome at all.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub secret_matches: usize,
    pub affected_files: usize,
    pub encoded_fragments: usize,
    pub reconstructed_files: usize,
}

impl PipelineOutcome {
    /// True when the run completed without finding anything
    pub fn is_clean(&self) -> bool {
        self.secret_matches == 0 && self.encoded_fragments == 0
    }
}

/// Run the scan-and-decode pipeline over the gathered tree.
///
/// Re-running overwrites the aggregate report; reconstructed decode outputs
/// honor the overwrite flag.
pub fn run(config: &Config) -> Result<PipelineOutcome> {
    config.validate_scan_root()?;

    let patterns = patterns::load_patterns(&config.patterns_file)?;
    info!(
        "Loaded {} pattern(s) from {}",
        patterns.len(),
        config.patterns_file.display()
    );

    let (artifacts, warnings) = corpus::load_corpus(&config.output_root)?;
    info!("Scanning {} artifact(s)", artifacts.len());

    let mut report = scanner::scan(&artifacts, &patterns);
    report.warnings = warnings;
    write_report(&report, &config.output_root)?;

    let fragments = sniffer::sniff(&artifacts);
    let mut outcome = PipelineOutcome {
        secret_matches: report.total_secrets,
        affected_files: report.affected_files,
        encoded_fragments: fragments.len(),
        ..Default::default()
    };

    if fragments.is_empty() {
        info!("No encoded payloads found, skipping decode");
        return Ok(outcome);
    }

    info!("Decoding {} encoded fragment(s)", fragments.len());
    let decoded = decoder::decode(&fragments);
    outcome.reconstructed_files = decoded.file_count();
    decoder::persist(&decoded, &config.output_root, config.overwrite)?;

    Ok(outcome)
}

/// Write the aggregate report; a re-run replaces the previous report
fn write_report(report: &ScanReport, root: &Path) -> Result<()> {
    let path = root.join(REPORT_FILE);
    std::fs::write(&path, report.render())?;

    if report.is_clean() {
        info!("No secret matches found");
    } else {
        warn!(
            "{} secret match(es) across {} file(s), report at {}",
            report.total_secrets,
            report.affected_files,
            path.display()
        );
    }
    Ok(())
}
