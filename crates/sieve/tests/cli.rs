use assert_cmd::prelude::*;
use assert_fs::prelude::*;

use predicates::prelude::*;
use predicates::str::contains;
use std::process::Command;

const SET: &str = r#"{
  "source": ["the cat sat", "a dog ran", "cat and dog", "bird song", "Cat nap"],
  "hyp": ["el gato", "un perro", "gato y perro", "canto", "siesta"],
  "x": [0.0, 1.0, 2.0, 3.0, 4.0],
  "y": [0.0, 1.0, 2.0, 3.0, 4.0],
  "source_id": [null, "3", null, null, "7"],
  "date": [20230101, 20230101, 20230102, 20230102, 20230103],
  "train": [1, 0, 1, 1, 0],
  "chrf": [0.9, null, 0.4, 0.95, null],
  "familiarity": [null, 0.3, null, null, 0.7],
  "keywords": [["cat", 0.8], ["dog", 0.5]]
}"#;

fn sieve_cmd(dir: &assert_fs::TempDir) -> Command {
  let mut cmd = Command::cargo_bin("sieve").expect("binary exists");
  cmd.current_dir(dir.path());
  cmd.env_remove("RUST_LOG");
  cmd
}

fn write_set(dir: &assert_fs::TempDir) -> std::path::PathBuf {
  let file = dir.child("animals.json");
  file.write_str(SET).unwrap();
  file.path().to_path_buf()
}

#[test]
fn test_summary_prints_counts_and_keywords() {
  let temp = assert_fs::TempDir::new().unwrap();
  let data = write_set(&temp);

  sieve_cmd(&temp)
    .arg("summary")
    .arg(&data)
    .assert()
    .success()
    .stdout(contains("animals").and(contains("training")).and(contains("cat")));

  temp.close().unwrap();
}

#[test]
fn test_filter_json_reports_visible_indexes() {
  let temp = assert_fs::TempDir::new().unwrap();
  let data = write_set(&temp);

  let output = sieve_cmd(&temp)
    .args(["filter", "--date", "20230102", "--format", "json"])
    .arg(&data)
    .output()
    .unwrap();
  assert!(output.status.success());

  let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(snapshot["visible"], serde_json::json!([2, 3]));
  assert_eq!(snapshot["tags"][0]["type"], "date");
  assert_eq!(snapshot["tags"][0]["message"], "Dates");

  let chrf_total: u64 =
    snapshot["chrf"]["bins"].as_array().unwrap().iter().map(|b| b["count"].as_u64().unwrap()).sum();
  assert_eq!(chrf_total, 2);

  temp.close().unwrap();
}

#[test]
fn test_search_without_hits_shows_no_sentences() {
  let temp = assert_fs::TempDir::new().unwrap();
  let data = write_set(&temp);

  sieve_cmd(&temp)
    .args(["filter", "--search", "zzzznotfound"])
    .arg(&data)
    .assert()
    .success()
    .stdout(contains("[Search Result]").and(contains("the cat sat").not()));

  temp.close().unwrap();
}

#[test]
fn test_export_writes_source_translation_pairs() {
  let temp = assert_fs::TempDir::new().unwrap();
  let data = write_set(&temp);
  let out = temp.child("out");
  out.create_dir_all().unwrap();

  sieve_cmd(&temp)
    .args(["filter", "--keyword", "dog", "--name", "Pets", "--export"])
    .arg(out.path())
    .arg(&data)
    .assert()
    .success()
    .stdout(contains("Exported 2 pairs"));

  out
    .child("challenge-set-Pets.json")
    .assert(predicate::str::contains(r#""source":["a dog ran","cat and dog"]"#))
    .assert(predicate::str::contains(r#""translation":["un perro","gato y perro"]"#));

  temp.close().unwrap();
}

#[test]
fn test_catalog_sorts_rows() {
  let temp = assert_fs::TempDir::new().unwrap();
  let meta = temp.child("meta.json");
  meta
    .write_str(
      r#"{ "challengeSets": [
        { "fileName": "a.json", "displayName": "Alpha", "count": 3, "logCount": 1,
          "trainCount": 2, "type": "topic", "chrf": 0.4 },
        { "fileName": "b.json", "displayName": "Beta", "count": 9, "logCount": 8,
          "trainCount": 1, "type": "unit-test", "chrf": 0.7 }
      ] }"#,
    )
    .unwrap();

  let output = sieve_cmd(&temp).arg("catalog").arg(meta.path()).output().unwrap();
  assert!(output.status.success());
  let stdout = String::from_utf8(output.stdout).unwrap();
  assert!(stdout.find("Beta").unwrap() < stdout.find("Alpha").unwrap());

  let output = sieve_cmd(&temp)
    .args(["catalog", "--sort", "chrf", "--ascending"])
    .arg(meta.path())
    .output()
    .unwrap();
  let stdout = String::from_utf8(output.stdout).unwrap();
  assert!(stdout.find("Alpha").unwrap() < stdout.find("Beta").unwrap());

  temp.close().unwrap();
}

#[test]
fn test_config_file_changes_bin_count() {
  let temp = assert_fs::TempDir::new().unwrap();
  let data = write_set(&temp);
  temp.child("sieve.json").write_str(r#"{ "bin_count": 4 }"#).unwrap();

  let output =
    sieve_cmd(&temp).args(["filter", "--format", "json"]).arg(&data).output().unwrap();
  let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(snapshot["familiarity"]["bins"].as_array().unwrap().len(), 4);

  temp.close().unwrap();
}

#[test]
fn test_mismatched_columns_fail() {
  let temp = assert_fs::TempDir::new().unwrap();
  let file = temp.child("broken.json");
  file.write_str(&SET.replace(r#""hyp": ["el gato", "#, r#""hyp": ["#)).unwrap();

  sieve_cmd(&temp)
    .arg("summary")
    .arg(file.path())
    .assert()
    .failure()
    .stderr(contains("Failed to load challenge set"));

  temp.close().unwrap();
}
