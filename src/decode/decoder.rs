//! Layered decode and reconstruction of encoded payloads
//!
//! Each fragment decodes through one or two base64 layers and a gzip stage.
//! Decoded bytes append to the reconstructed file keyed by the fragment's
//! target filename, in fragment order: a single logical file may have been
//! split across multiple log lines at the source, so reconstruction is
//! ordered concatenation, never overwrite. The two depths are disjoint
//! output namespaces.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::MultiGzDecoder;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::{Error, Result};

use super::sniffer::{Depth, EncodedFragment};

/// A file rebuilt from one or more decoded fragments
#[derive(Debug, Clone, Default)]
pub struct ReconstructedFile {
    /// Concatenated decoded bytes, in fragment order
    pub bytes: Vec<u8>,
    /// Number of fragments appended
    pub fragments: usize,
}

/// Decode results for a batch of fragments
#[derive(Debug, Default)]
pub struct DecodeOutcome {
    /// Files reconstructed from single-layer fragments
    pub single: BTreeMap<String, ReconstructedFile>,
    /// Files reconstructed from double-layer fragments
    pub double: BTreeMap<String, ReconstructedFile>,
    /// Fragments that failed a decode stage: (target, message)
    pub failures: Vec<(String, String)>,
}

impl DecodeOutcome {
    /// Total reconstructed files across both depths
    pub fn file_count(&self) -> usize {
        self.single.len() + self.double.len()
    }
}

/// Decode every fragment and reconstruct target files by ordered append.
///
/// A fragment that fails any stage (malformed base64, corrupt gzip stream) is
/// recorded and skipped; the rest of the batch continues.
pub fn decode(fragments: &[EncodedFragment]) -> DecodeOutcome {
    let mut outcome = DecodeOutcome::default();

    for fragment in fragments {
        match decode_fragment(fragment) {
            Ok(bytes) => {
                let files = match fragment.depth {
                    Depth::Single => &mut outcome.single,
                    Depth::Double => &mut outcome.double,
                };
                let file = files.entry(fragment.target.clone()).or_default();
                file.bytes.extend_from_slice(&bytes);
                file.fragments += 1;
            }
            Err(e) => {
                warn!("{}", e);
                outcome.failures.push((fragment.target.clone(), e.to_string()));
            }
        }
    }

    outcome
}

/// Run the decode stages for one fragment: one or two base64 layers, then gzip
fn decode_fragment(fragment: &EncodedFragment) -> Result<Vec<u8>> {
    let mut bytes = decode_base64(fragment, fragment.payload.as_bytes())?;
    if fragment.depth == Depth::Double {
        bytes = decode_base64(fragment, &bytes)?;
    }
    gunzip(fragment, &bytes)
}

fn decode_base64(fragment: &EncodedFragment, input: &[u8]) -> Result<Vec<u8>> {
    STANDARD.decode(input).map_err(|e| Error::Decode {
        target: fragment.target.clone(),
        message: format!("invalid base64 in {}: {}", fragment.artifact, e),
    })
}

fn gunzip(fragment: &EncodedFragment, input: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(input);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(|e| Error::Decode {
        target: fragment.target.clone(),
        message: format!("corrupt gzip stream in {}: {}", fragment.artifact, e),
    })?;
    Ok(out)
}

/// Persist reconstructed files under `<root>/decoded/single/` and
/// `<root>/decoded/double/`.
///
/// An already-existing output file is left untouched and skipped with a
/// warning unless `overwrite` is set. Returns the number of files written.
pub fn persist(outcome: &DecodeOutcome, root: &Path, overwrite: bool) -> Result<usize> {
    let decoded = root.join("decoded");
    let mut written = 0;
    written += persist_tree(&outcome.single, &decoded.join("single"), overwrite)?;
    written += persist_tree(&outcome.double, &decoded.join("double"), overwrite)?;
    Ok(written)
}

fn persist_tree(
    files: &BTreeMap<String, ReconstructedFile>,
    dir: &Path,
    overwrite: bool,
) -> Result<usize> {
    if files.is_empty() {
        return Ok(0);
    }
    std::fs::create_dir_all(dir)?;

    let mut written = 0;
    for (name, file) in files {
        // Target names come from collected log lines; refuse anything that
        // would escape the output tree.
        if name.contains('/') || name.contains("..") {
            warn!("Refusing to write reconstructed file with unsafe name '{}'", name);
            continue;
        }
        let path = dir.join(name);
        if path.exists() && !overwrite {
            warn!("Skipping existing {} (pass -f to overwrite)", path.display());
            continue;
        }
        std::fs::write(&path, &file.bytes)?;
        info!(
            "Wrote {} ({} bytes, {} fragment(s), sha256 {})",
            path.display(),
            file.bytes.len(),
            file.fragments,
            fingerprint(&file.bytes)
        );
        written += 1;
    }
    Ok(written)
}

/// Short SHA-256 fingerprint of reconstructed content
fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())[..16].to_string()
}
