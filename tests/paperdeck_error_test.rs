use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn search_without_a_collection_fails_with_index_not_found() {
    let tmp = tempdir().expect("tempdir");
    let data_dir = tmp.path().join("data");

    assert_cmd::cargo::cargo_bin_cmd!("paperdeck")
        .env("PAPERDECK_SKIP_DOTENV", "1")
        .arg("search")
        .args(["--query", "attention"])
        .args(["--data-dir", data_dir.to_str().expect("utf8 path")])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("INDEX_NOT_FOUND"))
        .stderr(predicate::str::contains("\"success\": false"));
}

#[test]
fn store_with_missing_input_fails_with_input_not_found() {
    let tmp = tempdir().expect("tempdir");
    let data_dir = tmp.path().join("data");

    assert_cmd::cargo::cargo_bin_cmd!("paperdeck")
        .env("PAPERDECK_SKIP_DOTENV", "1")
        .arg("store")
        .args(["--input", tmp.path().join("missing.json").to_str().expect("utf8 path")])
        .args(["--data-dir", data_dir.to_str().expect("utf8 path")])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("INPUT_NOT_FOUND"));
}

#[test]
fn store_with_malformed_json_fails_with_invalid_json() {
    let tmp = tempdir().expect("tempdir");
    let data_dir = tmp.path().join("data");
    let input = tmp.path().join("broken.json");
    fs::write(&input, "{not json").expect("write input");

    assert_cmd::cargo::cargo_bin_cmd!("paperdeck")
        .env("PAPERDECK_SKIP_DOTENV", "1")
        .arg("store")
        .args(["--input", input.to_str().expect("utf8 path")])
        .args(["--data-dir", data_dir.to_str().expect("utf8 path")])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("INVALID_JSON"));
}

#[test]
fn annotate_rejects_a_malformed_paper_id() {
    let tmp = tempdir().expect("tempdir");
    let data_dir = tmp.path().join("data");
    fs::create_dir_all(&data_dir).expect("mkdir data");

    assert_cmd::cargo::cargo_bin_cmd!("paperdeck")
        .env("PAPERDECK_SKIP_DOTENV", "1")
        .arg("annotate")
        .args(["--paper-id", "../etc/passwd"])
        .args(["--content", "nope"])
        .args(["--data-dir", data_dir.to_str().expect("utf8 path")])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("INVALID_PAPER_ID"));
}

#[test]
fn digest_rejects_a_bad_timespan() {
    let tmp = tempdir().expect("tempdir");
    let data_dir = tmp.path().join("data");

    assert_cmd::cargo::cargo_bin_cmd!("paperdeck")
        .env("PAPERDECK_SKIP_DOTENV", "1")
        .arg("digest")
        .args(["--since", "7y"])
        .args(["--data-dir", data_dir.to_str().expect("utf8 path")])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("INVALID_ARGUMENT"));
}
