//! Runtime configuration for a gather-and-scan run
//!
//! There is deliberately no CLI framework here: the tool takes an optional
//! output-root argument plus two flags, everything else comes from the
//! environment.

use std::env;
use std::path::PathBuf;

use crate::{Error, Result};

/// Default output root when none is given
const DEFAULT_OUTPUT_ROOT: &str = "./cluster-gather";

/// Default secret-pattern file
const DEFAULT_PATTERNS_FILE: &str = "config/default-patterns.txt";

/// Resource kinds collected per namespace by default
const DEFAULT_KINDS: &[&str] = &["configmaps", "secrets", "services", "deployments", "events"];

/// Configuration for one run
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the gathered output tree
    pub output_root: PathBuf,

    /// Pattern file driving the secret scan
    pub patterns_file: PathBuf,

    /// Resource kinds to collect per namespace
    pub kinds: Vec<String>,

    /// Restrict collection to these namespaces (empty = all)
    pub namespaces: Vec<String>,

    /// Overwrite already-reconstructed decode outputs
    pub overwrite: bool,

    /// Skip cluster collection and scan an existing output tree
    pub scan_only: bool,
}

impl Config {
    /// Build the configuration from process arguments and environment.
    ///
    /// Recognized arguments: a single positional output root, `-f`/`--force`
    /// and `--scan-only`. Environment: `CLUSTER_GATHER_DIR`,
    /// `SCAN_PATTERNS_FILE`, `GATHER_KINDS`, `GATHER_NAMESPACES`,
    /// `GATHER_OVERWRITE=1`.
    pub fn from_env_and_args() -> Self {
        let mut output_root: Option<PathBuf> = None;
        let mut overwrite = env::var("GATHER_OVERWRITE").map(|v| v == "1").unwrap_or(false);
        let mut scan_only = false;

        for arg in env::args().skip(1) {
            match arg.as_str() {
                "-f" | "--force" => overwrite = true,
                "--scan-only" => scan_only = true,
                other => {
                    if output_root.is_none() {
                        output_root = Some(PathBuf::from(other));
                    }
                }
            }
        }

        let output_root = output_root
            .or_else(|| env::var("CLUSTER_GATHER_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT));

        let patterns_file = env::var("SCAN_PATTERNS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PATTERNS_FILE));

        let kinds = env::var("GATHER_KINDS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|_| DEFAULT_KINDS.iter().map(|k| k.to_string()).collect());

        let namespaces = env::var("GATHER_NAMESPACES")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        Self {
            output_root,
            patterns_file,
            kinds,
            namespaces,
            overwrite,
            scan_only,
        }
    }

    /// Validate that the output root exists before scanning it
    pub fn validate_scan_root(&self) -> Result<()> {
        if !self.output_root.is_dir() {
            return Err(Error::Config(format!(
                "Output root {} is not a directory",
                self.output_root.display()
            )));
        }
        Ok(())
    }
}

/// Split a comma-separated environment value, dropping empty entries
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
