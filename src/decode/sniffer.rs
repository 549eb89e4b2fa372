//! Detection of base64-encoded gzip payloads in gathered artifacts
//!
//! Two independent signatures are searched across every artifact: the base64
//! encoding of a gzip header with zero extra flags, and the base64 of that
//! base64 (a payload encoded twice). Candidate lines are matched against an
//! explicit token grammar; anything else containing a signature is a
//! non-match, never an error.

use std::collections::BTreeMap;

use tracing::debug;

use crate::corpus::Artifact;

/// Base64 of a gzip header with zero extra flags: payload encoded once
pub const SINGLE_LAYER_SIGNATURE: &str = "H4sIAAAAAAA";

/// Base64 of the single-layer signature prefix: payload encoded twice
pub const DOUBLE_LAYER_SIGNATURE: &str = "SDRzSUFBQUFBQUFBL";

/// Number of base64 layers wrapping the gzip payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Single,
    Double,
}

/// One line-level discovery of an encoded payload and its target filename
#[derive(Debug, Clone)]
pub struct EncodedFragment {
    /// Relative path of the artifact the line was first found in
    pub artifact: String,
    /// The full source line
    pub line: String,
    /// Target filename the decoded bytes belong to
    pub target: String,
    /// The base64 payload token
    pub payload: String,
    /// Encoding depth of the payload
    pub depth: Depth,
}

/// Scan the corpus for encoded-payload lines.
///
/// Identical lines appearing multiple times across the corpus are extracted
/// once; distinct lines are processed in sorted order so results are stable.
/// An empty result means nothing to decode, not an error.
pub fn sniff(corpus: &[Artifact]) -> Vec<EncodedFragment> {
    let mut fragments = sniff_depth(corpus, Depth::Single, SINGLE_LAYER_SIGNATURE);
    fragments.extend(sniff_depth(corpus, Depth::Double, DOUBLE_LAYER_SIGNATURE));
    fragments
}

fn sniff_depth(corpus: &[Artifact], depth: Depth, signature: &str) -> Vec<EncodedFragment> {
    let needle = signature.to_lowercase();

    // Distinct candidate lines, each attributed to the first artifact (in
    // caller order) that contained it.
    let mut candidates: BTreeMap<String, String> = BTreeMap::new();
    for artifact in corpus {
        let text = artifact.text();
        for line in text.lines() {
            if line.to_lowercase().contains(&needle) {
                candidates
                    .entry(line.to_string())
                    .or_insert_with(|| artifact.relative_path.clone());
            }
        }
    }

    candidates
        .into_iter()
        .filter_map(|(line, artifact)| parse_fragment_line(&line, &artifact, depth))
        .collect()
}

/// Parse one candidate line against the fragment grammar:
///
/// ```text
/// <marker> <identifier> <filename><delimiter> <payload>
/// ```
///
/// Four whitespace-separated tokens. The filename token carries one trailing
/// delimiter character from the source line format (a colon or comma) which
/// is stripped. Double-layer targets additionally drop the last
/// extension-like suffix: a double-encoded payload was an archive member, so
/// the outer extension is not meaningful after decode.
fn parse_fragment_line(line: &str, artifact: &str, depth: Depth) -> Option<EncodedFragment> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 4 {
        debug!(
            "Skipping encoded-looking line with {} token(s) in {}",
            tokens.len(),
            artifact
        );
        return None;
    }

    let Some(mut target) = strip_trailing_delimiter(tokens[2]) else {
        debug!("Skipping encoded-looking line with empty filename in {}", artifact);
        return None;
    };
    if depth == Depth::Double {
        target = strip_outer_extension(&target);
    }

    Some(EncodedFragment {
        artifact: artifact.to_string(),
        line: line.to_string(),
        target,
        payload: tokens[3].to_string(),
        depth,
    })
}

/// Strip the single trailing delimiter character from the filename token
fn strip_trailing_delimiter(token: &str) -> Option<String> {
    let mut chars = token.chars();
    chars.next_back()?;
    let stripped = chars.as_str();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

/// Drop the run of non-dot characters after the final dot, dot included
fn strip_outer_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[..idx].to_string(),
        _ => name.to_string(),
    }
}
