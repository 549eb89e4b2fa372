//! Gathered-artifact corpus
//!
//! The corpus is the set of text files a gather run produced: pod logs and
//! resource YAML dumps. Artifacts are read-only inputs to the scan and decode
//! stages; nothing in this crate mutates them after collection.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::{Error, Result};

/// File suffixes that are part of the scan corpus
const CORPUS_SUFFIXES: &[&str] = &[".log", ".yaml"];

/// Subtree of reconstructed decode outputs, excluded from re-scans
const DECODED_SUBTREE: &str = "decoded/";

/// One collected text file (pod log or resource YAML) under scan
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Path relative to the corpus root, `/`-separated
    pub relative_path: String,

    /// Raw file contents
    pub data: Vec<u8>,
}

impl Artifact {
    pub fn new(relative_path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            relative_path: relative_path.into(),
            data,
        }
    }

    /// Lossy UTF-8 view of the artifact body
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// Load all corpus artifacts under `root`, sorted by relative path.
///
/// An unreadable file is skipped with a warning, not fatal; the returned
/// warnings list records each skip. Reconstructed decode outputs under
/// `decoded/` are not re-scanned.
pub fn load_corpus(root: &Path) -> Result<(Vec<Artifact>, Vec<String>)> {
    if !root.is_dir() {
        return Err(Error::Config(format!(
            "Corpus root {} is not a directory",
            root.display()
        )));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    let mut artifacts = Vec::new();
    let mut warnings = Vec::new();

    for path in paths {
        let relative = relative_path(&path, root);
        if !is_corpus_file(&relative) || relative.starts_with(DECODED_SUBTREE) {
            continue;
        }
        match std::fs::read(&path) {
            Ok(data) => artifacts.push(Artifact::new(relative, data)),
            Err(e) => {
                let err = Error::ArtifactRead {
                    path: relative,
                    message: e.to_string(),
                };
                warn!("{}", err);
                warnings.push(err.to_string());
            }
        }
    }

    Ok((artifacts, warnings))
}

fn relative_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn is_corpus_file(relative: &str) -> bool {
    CORPUS_SUFFIXES.iter().any(|s| relative.ends_with(s))
}
