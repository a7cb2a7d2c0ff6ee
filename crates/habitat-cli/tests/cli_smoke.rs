//! CLI binary smoke tests using assert_cmd.
//!
//! These tests exercise the compiled `habitat` binary on small TSV fixtures
//! written into temporary directories.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("habitat").unwrap()
}

/// 10 x 10 grid over the Cambridge box; rows 0..6 x cols 0..5 are habitat.
fn write_embeddings(dir: &Path) -> PathBuf {
    let mut tsv = String::from("row\tcol\tA00\tA01\tA02\n");
    for row in 0..10 {
        for col in 0..10 {
            let (a, b) = if row < 6 && col < 5 { (1.0, 0.2) } else { (0.1, 1.0) };
            let jitter = ((row * 3 + col) % 4) as f32 * 0.01;
            writeln!(tsv, "{}\t{}\t{}\t{}\t{}", row, col, a + jitter, b, 0.5).unwrap();
        }
    }
    let path = dir.join("embeddings.tsv");
    std::fs::write(&path, tsv).unwrap();
    path
}

/// Occurrences at the centres of the first `n` habitat pixels.
fn write_occurrences(dir: &Path, n: usize) -> PathBuf {
    let (min_lon, min_lat, max_lon, max_lat) = (0.03, 52.13, 0.22, 52.29);
    let (dx, dy) = ((max_lon - min_lon) / 10.0, (max_lat - min_lat) / 10.0);
    let mut tsv = String::from("species\ttaxon_key\tlon\tlat\n");
    for (row, col) in (0..6).flat_map(|r| (0..5).map(move |c| (r, c))).take(n) {
        let lon = min_lon + (col as f64 + 0.5) * dx;
        let lat = max_lat - (row as f64 + 0.5) * dy;
        writeln!(tsv, "Quercus robur\t2878688\t{:.6}\t{:.6}", lon, lat).unwrap();
    }
    let path = dir.join("occurrences.tsv");
    std::fs::write(&path, tsv).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("find"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("habitat"));
}

// ---------------------------------------------------------------------------
// find
// ---------------------------------------------------------------------------

#[test]
fn find_requires_inputs() {
    cmd().args(["find", "Quercus robur"]).assert().failure();
}

#[test]
fn find_rejects_unknown_method() {
    let dir = tempfile::tempdir().unwrap();
    let emb = write_embeddings(dir.path());
    let occ = write_occurrences(dir.path(), 3);
    cmd()
        .args(["find", "Quercus robur", "--region", "cambridge", "--method", "forest"])
        .arg("-e")
        .arg(&emb)
        .arg("-d")
        .arg(&occ)
        .assert()
        .failure();
}

#[test]
fn find_without_region_or_bbox_fails() {
    let dir = tempfile::tempdir().unwrap();
    let emb = write_embeddings(dir.path());
    let occ = write_occurrences(dir.path(), 3);
    cmd()
        .args(["find", "Quercus robur"])
        .arg("-e")
        .arg(&emb)
        .arg("-d")
        .arg(&occ)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("region or a bounding box"));
}

#[test]
fn find_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let emb = write_embeddings(dir.path());
    let occ = write_occurrences(dir.path(), 3);
    let out = dir.path().join("out");
    cmd()
        .args(["find", "Quercus robur", "--bbox", "0.03,52.13,0.22,52.29"])
        .arg("-e")
        .arg(&emb)
        .arg("-d")
        .arg(&occ)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    for name in [
        "probability.tsv",
        "probability.json",
        "candidates.geojson",
        "occurrences.geojson",
    ] {
        assert!(out.join(name).exists(), "missing {}", name);
    }
    let meta: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("probability.json")).unwrap()).unwrap();
    assert_eq!(meta["method"], "similarity");
    assert_eq!(meta["height"], 10);

    let occurrences: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("occurrences.geojson")).unwrap())
            .unwrap();
    assert_eq!(occurrences["features"].as_array().unwrap().len(), 3);
}

#[test]
fn find_keeps_declared_shape() {
    let dir = tempfile::tempdir().unwrap();
    let emb = write_embeddings(dir.path());
    let occ = write_occurrences(dir.path(), 3);
    let out = dir.path().join("out");
    // two trailing no-data rows below the listed pixels
    cmd()
        .args(["find", "Quercus robur", "--region", "cambridge", "--shape", "12x10"])
        .arg("-e")
        .arg(&emb)
        .arg("-d")
        .arg(&occ)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let meta: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("probability.json")).unwrap()).unwrap();
    assert_eq!(meta["height"], 12);
    assert_eq!(meta["width"], 10);
}

#[test]
fn find_rejects_shape_smaller_than_file() {
    let dir = tempfile::tempdir().unwrap();
    let emb = write_embeddings(dir.path());
    let occ = write_occurrences(dir.path(), 3);
    cmd()
        .args(["find", "Quercus robur", "--region", "cambridge", "--shape", "5x5"])
        .arg("-e")
        .arg(&emb)
        .arg("-d")
        .arg(&occ)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_writes_records_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let emb = write_embeddings(dir.path());
    let occ = write_occurrences(dir.path(), 30);
    let out = dir.path().join("validation");
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"n_trials": 2, "n_positive_values": [1, 5, 25]}"#).unwrap();

    cmd()
        .args(["validate", "--species", "Quercus robur"])
        .arg("-e")
        .arg(&emb)
        .arg("-d")
        .arg(&occ)
        .arg("-o")
        .arg(&out)
        .arg("-c")
        .arg(&config)
        .assert()
        .success();

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["n_trials"], 2);
    let results = summary["species"][0]["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(out.join("quercus_robur.json").exists());
    assert!(out.join("report.html").exists());
}

#[test]
fn validate_no_report_skips_html() {
    let dir = tempfile::tempdir().unwrap();
    let emb = write_embeddings(dir.path());
    let occ = write_occurrences(dir.path(), 30);
    let out = dir.path().join("validation");
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"n_trials": 1, "n_positive_values": [2]}"#).unwrap();

    cmd()
        .args(["validate", "--species", "Quercus robur", "--no-report"])
        .arg("-e")
        .arg(&emb)
        .arg("-d")
        .arg(&occ)
        .arg("-o")
        .arg(&out)
        .arg("-c")
        .arg(&config)
        .assert()
        .success();

    assert!(out.join("summary.json").exists());
    assert!(!out.join("report.html").exists());
}
