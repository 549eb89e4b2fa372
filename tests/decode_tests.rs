//! Integration tests for encoded-payload detection and layered decoding
//!
//! Round-trips arbitrary bytes through gzip plus one or two base64 layers
//! into synthetic log lines, then verifies that sniffing and decoding
//! reconstruct the original bytes, that fragment order is preserved, and
//! that malformed fragments never poison the batch.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::write::GzEncoder;
use flate2::Compression;

use cluster_gather_scanner::config::Config;
use cluster_gather_scanner::corpus::Artifact;
use cluster_gather_scanner::decode::{decode, persist, sniff, Depth};
use cluster_gather_scanner::pipeline;

// ============================================================================
// Test Helpers
// ============================================================================

fn artifact(path: &str, body: &str) -> Artifact {
    Artifact::new(path, body.as_bytes().to_vec())
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// gzip then base64: a payload carrying the single-layer signature
fn single_payload(data: &[u8]) -> String {
    STANDARD.encode(gzip(data))
}

/// gzip then base64 twice: a payload carrying the double-layer signature
fn double_payload(data: &[u8]) -> String {
    STANDARD.encode(single_payload(data))
}

fn fragment_line(marker: &str, identifier: &str, filename: &str, payload: &str) -> String {
    format!("{} {} {}: {}", marker, identifier, filename, payload)
}

// ============================================================================
// Sniffer Tests
// ============================================================================

#[test]
fn payloads_carry_the_expected_signatures() {
    let single = single_payload(b"some bytes");
    assert!(single.starts_with("H4sIAAAAAAA"));

    let double = double_payload(b"some bytes");
    assert!(double.starts_with("SDRzSUFBQUFBQUFBL"));
}

#[test]
fn sniff_extracts_single_layer_fragment() {
    let payload = single_payload(b"hello");
    let line = fragment_line("1", "pod-7f9c", "app.log", &payload);
    let corpus = vec![artifact("cm.yaml", &line)];

    let fragments = sniff(&corpus);
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].depth, Depth::Single);
    assert_eq!(fragments[0].artifact, "cm.yaml");
    // Trailing delimiter is stripped from the filename token.
    assert_eq!(fragments[0].target, "app.log");
    assert_eq!(fragments[0].payload, payload);
}

#[test]
fn sniff_strips_outer_extension_for_double_layer() {
    let payload = double_payload(b"hello");
    let line = fragment_line("1", "pod-7f9c", "bundle.tar.gz", &payload);
    let corpus = vec![artifact("cm.yaml", &line)];

    let fragments = sniff(&corpus);
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].depth, Depth::Double);
    assert_eq!(fragments[0].target, "bundle.tar");
}

#[test]
fn sniff_is_case_insensitive_on_signatures() {
    let payload = single_payload(b"hello");
    let line = fragment_line("1", "pod-7f9c", "app.log", &payload.to_lowercase());
    let corpus = vec![artifact("cm.yaml", &line)];

    assert_eq!(sniff(&corpus).len(), 1);
}

#[test]
fn sniff_skips_lines_not_matching_the_grammar() {
    let payload = single_payload(b"hello");
    let three_tokens = format!("pod-7f9c app.log: {}", payload);
    let five_tokens = format!("1 2 pod-7f9c app.log: {}", payload);
    let bare_delimiter = format!("1 pod-7f9c : {}", payload);
    let corpus = vec![
        artifact("a.log", &three_tokens),
        artifact("b.log", &five_tokens),
        artifact("c.log", &bare_delimiter),
    ];

    assert!(sniff(&corpus).is_empty());
}

#[test]
fn sniff_deduplicates_identical_lines_across_artifacts() {
    let payload = single_payload(b"hello");
    let line = fragment_line("1", "pod-7f9c", "app.log", &payload);
    let corpus = vec![artifact("a.log", &line), artifact("b.log", &line)];

    let fragments = sniff(&corpus);
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].artifact, "a.log");
}

#[test]
fn sniff_returns_empty_for_plain_corpus() {
    let corpus = vec![artifact("a.log", "nothing encoded here\n")];
    assert!(sniff(&corpus).is_empty());
}

#[test]
fn sniff_orders_distinct_lines_stably() {
    let first = fragment_line("1", "aaa", "one.log", &single_payload(b"1"));
    let second = fragment_line("2", "bbb", "two.log", &single_payload(b"2"));
    // Present the lines out of order; sniff sorts distinct lines.
    let corpus = vec![artifact("a.log", &format!("{}\n{}\n", second, first))];

    let fragments = sniff(&corpus);
    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0].target, "one.log");
    assert_eq!(fragments[1].target, "two.log");
}

// ============================================================================
// Decoder Round-Trip Tests
// ============================================================================

#[test]
fn single_layer_round_trip_reproduces_bytes() {
    let data = b"apiVersion: v1\nkind: Secret\ndata:\n  password: aHVudGVyMg==\n";
    let line = fragment_line("1", "pod-7f9c", "secret.yaml", &single_payload(data));
    let corpus = vec![artifact("cm.yaml", &line)];

    let outcome = decode(&sniff(&corpus));
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.single["secret.yaml"].bytes, data);
    assert_eq!(outcome.single["secret.yaml"].fragments, 1);
}

#[test]
fn double_layer_round_trip_reproduces_bytes() {
    let data = b"arbitrary \x00\x01\x02 binary content";
    let line = fragment_line("1", "pod-7f9c", "bundle.tar.gz", &double_payload(data));
    let corpus = vec![artifact("cm.yaml", &line)];

    let outcome = decode(&sniff(&corpus));
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.double["bundle.tar"].bytes, data);
}

#[test]
fn depths_use_separate_namespaces() {
    // Same cleaned filename from both depths; they must not collide.
    let single_line = fragment_line("1", "aaa", "data.tar", &single_payload(b"single"));
    let double_line = fragment_line("2", "bbb", "data.tar.gz", &double_payload(b"double"));
    let corpus = vec![artifact("a.log", &format!("{}\n{}\n", single_line, double_line))];

    let outcome = decode(&sniff(&corpus));
    assert_eq!(outcome.single["data.tar"].bytes, b"single");
    assert_eq!(outcome.double["data.tar"].bytes, b"double");
}

#[test]
fn fragments_for_one_target_concatenate_in_discovery_order() {
    let first = fragment_line("1", "aaa", "split.log", &single_payload(b"part-one:"));
    let second = fragment_line("2", "bbb", "split.log", &single_payload(b"part-two"));
    let corpus = vec![artifact("a.log", &format!("{}\n{}\n", first, second))];

    let outcome = decode(&sniff(&corpus));
    let file = &outcome.single["split.log"];
    assert_eq!(file.fragments, 2);
    assert_eq!(file.bytes, b"part-one:part-two");
}

#[test]
fn malformed_fragment_does_not_poison_the_batch() {
    // Carries the signature so it is sniffed, but is not valid base64.
    let bad = "1 pod-7f9c bad.log: H4sIAAAAAAA%%%notbase64%%%".to_string();
    let good = fragment_line("2", "pod-7f9c", "good.log", &single_payload(b"intact"));
    let corpus = vec![artifact("a.log", &format!("{}\n{}\n", bad, good))];

    let outcome = decode(&sniff(&corpus));
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, "bad.log");
    assert_eq!(outcome.single["good.log"].bytes, b"intact");
    assert!(!outcome.single.contains_key("bad.log"));
}

#[test]
fn truncated_gzip_stream_is_reported_not_fatal() {
    // Valid base64 of a truncated gzip stream.
    let mut stream = gzip(b"content that will be cut short");
    stream.truncate(stream.len() / 2);
    let payload = STANDARD.encode(stream);
    let line = fragment_line("1", "pod-7f9c", "cut.log", &payload);
    let corpus = vec![artifact("a.log", &line)];

    let outcome = decode(&sniff(&corpus));
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.single.is_empty());
}

// ============================================================================
// Persist Tests
// ============================================================================

#[test]
fn persist_writes_both_depth_trees() {
    let dir = tempfile::tempdir().unwrap();
    let single_line = fragment_line("1", "aaa", "app.log", &single_payload(b"logs"));
    let double_line = fragment_line("2", "bbb", "bundle.tar.gz", &double_payload(b"archive"));
    let corpus = vec![artifact("a.log", &format!("{}\n{}\n", single_line, double_line))];

    let outcome = decode(&sniff(&corpus));
    let written = persist(&outcome, dir.path(), false).unwrap();
    assert_eq!(written, 2);

    let single = std::fs::read(dir.path().join("decoded/single/app.log")).unwrap();
    assert_eq!(single, b"logs");
    let double = std::fs::read(dir.path().join("decoded/double/bundle.tar")).unwrap();
    assert_eq!(double, b"archive");
}

#[test]
fn persist_skips_existing_files_without_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let line = fragment_line("1", "aaa", "app.log", &single_payload(b"original"));
    let corpus = vec![artifact("a.log", &line)];
    let outcome = decode(&sniff(&corpus));

    assert_eq!(persist(&outcome, dir.path(), false).unwrap(), 1);

    // A second run with different content must leave the file untouched.
    let changed = fragment_line("1", "aaa", "app.log", &single_payload(b"changed"));
    let outcome = decode(&sniff(&[artifact("a.log", &changed)]));
    assert_eq!(persist(&outcome, dir.path(), false).unwrap(), 0);
    let kept = std::fs::read(dir.path().join("decoded/single/app.log")).unwrap();
    assert_eq!(kept, b"original");

    // With overwrite the file is re-created.
    assert_eq!(persist(&outcome, dir.path(), true).unwrap(), 1);
    let replaced = std::fs::read(dir.path().join("decoded/single/app.log")).unwrap();
    assert_eq!(replaced, b"changed");
}

// ============================================================================
// Pipeline Tests
// ============================================================================

fn scan_only_config(root: &std::path::Path, patterns: &std::path::Path) -> Config {
    Config {
        output_root: root.to_path_buf(),
        patterns_file: patterns.to_path_buf(),
        kinds: Vec::new(),
        namespaces: Vec::new(),
        overwrite: false,
        scan_only: true,
    }
}

#[test]
fn pipeline_scans_and_decodes_a_gathered_tree() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("gather");
    let pod_dir = root.join("namespaces/default/pods/pod1");
    std::fs::create_dir_all(&pod_dir).unwrap();

    let encoded = fragment_line("1", "pod-7f9c", "app.log", &single_payload(b"embedded"));
    std::fs::write(
        pod_dir.join("app.log"),
        format!("password=supersecret123\n{}\n", encoded),
    )
    .unwrap();

    let patterns = dir.path().join("patterns.txt");
    std::fs::write(&patterns, "password\n").unwrap();

    let outcome = pipeline::run(&scan_only_config(&root, &patterns)).unwrap();
    assert!(!outcome.is_clean());
    assert_eq!(outcome.secret_matches, 1);
    assert_eq!(outcome.affected_files, 1);
    assert_eq!(outcome.encoded_fragments, 1);
    assert_eq!(outcome.reconstructed_files, 1);

    let report = std::fs::read_to_string(root.join(pipeline::REPORT_FILE)).unwrap();
    assert!(report.contains("=== Matches for pattern: password ==="));
    let decoded = std::fs::read(root.join("decoded/single/app.log")).unwrap();
    assert_eq!(decoded, b"embedded");
}

#[test]
fn pipeline_clean_run_is_distinguishable() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("gather");
    std::fs::create_dir_all(root.join("namespaces/default")).unwrap();
    std::fs::write(
        root.join("namespaces/default/configmaps.yaml"),
        "---\napiVersion: v1\nkind: ConfigMap\n",
    )
    .unwrap();

    let patterns = dir.path().join("patterns.txt");
    std::fs::write(&patterns, "password\n").unwrap();

    let outcome = pipeline::run(&scan_only_config(&root, &patterns)).unwrap();
    assert!(outcome.is_clean());
    assert!(root.join(pipeline::REPORT_FILE).exists());
}

#[test]
fn pipeline_missing_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let patterns = dir.path().join("patterns.txt");
    std::fs::write(&patterns, "password\n").unwrap();

    let config = scan_only_config(&dir.path().join("missing"), &patterns);
    assert!(pipeline::run(&config).is_err());
}

#[test]
fn pipeline_missing_pattern_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("gather");
    std::fs::create_dir_all(&root).unwrap();

    let config = scan_only_config(&root, &dir.path().join("missing.txt"));
    assert!(pipeline::run(&config).is_err());
}
