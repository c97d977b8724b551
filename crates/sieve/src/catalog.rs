//! Challenge-set catalog backing the table view

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::aggregate::histogram::{bin_values, HistogramBin};
use crate::store::RecordStore;
use crate::Result;

/// Bins used for the per-row sparkline histograms
pub const ROW_BIN_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeSetType {
  #[serde(rename = "topic")]
  Topic,
  #[serde(rename = "unit-test")]
  UnitTest,
}

impl ChallengeSetType {
  pub fn as_str(&self) -> &'static str {
    match self {
      ChallengeSetType::Topic => "topic",
      ChallengeSetType::UnitTest => "unit-test",
    }
  }
}

impl fmt::Display for ChallengeSetType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ChallengeSetType {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s {
      "topic" => Ok(ChallengeSetType::Topic),
      "unit-test" => Ok(ChallengeSetType::UnitTest),
      other => Err(format!("unknown challenge set type '{other}' (expected topic or unit-test)")),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeSet {
  pub file_name: String,
  pub display_name: String,
  pub count: usize,
  pub log_count: usize,
  pub train_count: usize,
  #[serde(rename = "type")]
  pub set_type: ChallengeSetType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub chrf: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub familiarity: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub train_log_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeSetMeta {
  pub challenge_sets: Vec<ChallengeSet>,
}

impl ChallengeSetMeta {
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
  }
}

/// Sortable table columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderKey {
  DisplayName,
  LogCount,
  TrainCount,
  Chrf,
  Familiarity,
  TrainLogRatio,
}

impl FromStr for HeaderKey {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s {
      "displayName" => Ok(HeaderKey::DisplayName),
      "logCount" => Ok(HeaderKey::LogCount),
      "trainCount" => Ok(HeaderKey::TrainCount),
      "chrf" => Ok(HeaderKey::Chrf),
      "familiarity" => Ok(HeaderKey::Familiarity),
      "trainLogRatio" => Ok(HeaderKey::TrainLogRatio),
      other => Err(format!("unknown column '{other}'")),
    }
  }
}

/// Derive a catalog row from a loaded set
pub fn summarize(
  file_name: &str,
  display_name: &str,
  set_type: ChallengeSetType,
  store: &RecordStore,
) -> ChallengeSet {
  let train_count = store.training_count();
  let log_count = store.log_count();

  ChallengeSet {
    file_name: file_name.to_string(),
    display_name: display_name.to_string(),
    count: store.len(),
    log_count,
    train_count,
    set_type,
    chrf: mean(store.chrf(), store.is_training(), true),
    familiarity: mean(store.familiarity(), store.is_training(), false),
    train_log_ratio: (!store.is_empty()).then(|| train_count as f64 / store.len() as f64),
  }
}

fn mean(values: &[Option<f64>], is_training: &[bool], training: bool) -> Option<f64> {
  let scored: Vec<f64> = values
    .iter()
    .zip(is_training)
    .filter(|(_, t)| **t == training)
    .filter_map(|(v, _)| *v)
    .collect();

  (!scored.is_empty()).then(|| scored.iter().sum::<f64>() / scored.len() as f64)
}

/// Sparkline bins for one row's score column
pub fn row_histogram(values: &[Option<f64>]) -> Vec<HistogramBin> {
  bin_values(values, 0..values.len(), ROW_BIN_COUNT)
}

/// Order catalog rows by `key`; rows missing the value always sort last
pub fn sort_catalog(sets: &mut [ChallengeSet], key: HeaderKey, descending: bool) {
  sets.sort_by(|a, b| match key {
    HeaderKey::DisplayName => directed(a.display_name.cmp(&b.display_name), descending),
    HeaderKey::LogCount => directed(a.log_count.cmp(&b.log_count), descending),
    HeaderKey::TrainCount => directed(a.train_count.cmp(&b.train_count), descending),
    HeaderKey::Chrf => compare_optional(a.chrf, b.chrf, descending),
    HeaderKey::Familiarity => compare_optional(a.familiarity, b.familiarity, descending),
    HeaderKey::TrainLogRatio => compare_optional(a.train_log_ratio, b.train_log_ratio, descending),
  });
}

fn directed(ordering: Ordering, descending: bool) -> Ordering {
  if descending {
    ordering.reverse()
  } else {
    ordering
  }
}

fn compare_optional(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
  match (a, b) {
    (Some(a), Some(b)) => directed(a.total_cmp(&b), descending),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::ChallengeData;

  fn row(name: &str, chrf: Option<f64>, log_count: usize) -> ChallengeSet {
    ChallengeSet {
      file_name: format!("{name}.json"),
      display_name: name.to_string(),
      count: log_count,
      log_count,
      train_count: 0,
      set_type: ChallengeSetType::Topic,
      chrf,
      familiarity: None,
      train_log_ratio: None,
    }
  }

  #[test]
  fn test_missing_values_sort_last_both_ways() {
    let mut sets = vec![row("a", None, 1), row("b", Some(0.2), 2), row("c", Some(0.8), 3)];

    sort_catalog(&mut sets, HeaderKey::Chrf, true);
    let names: Vec<&str> = sets.iter().map(|s| s.display_name.as_str()).collect();
    assert_eq!(names, vec!["c", "b", "a"]);

    sort_catalog(&mut sets, HeaderKey::Chrf, false);
    let names: Vec<&str> = sets.iter().map(|s| s.display_name.as_str()).collect();
    assert_eq!(names, vec!["b", "c", "a"]);
  }

  #[test]
  fn test_summarize_averages_by_sample_kind() {
    let store = RecordStore::from_data(ChallengeData {
      source: vec!["a".into(), "b".into(), "c".into(), "d".into()],
      hyp: vec![String::new(); 4],
      x: vec![0.0; 4],
      y: vec![0.0; 4],
      source_id: vec![None; 4],
      date: vec![None; 4],
      train: vec![1, 1, 0, 0],
      chrf: vec![Some(0.5), Some(1.0), None, None],
      familiarity: vec![None, None, Some(0.25), None],
      keywords: Vec::new(),
    })
    .unwrap();

    let set = summarize("set.json", "Set", ChallengeSetType::UnitTest, &store);
    assert_eq!(set.train_count, 2);
    assert_eq!(set.log_count, 2);
    assert_eq!(set.chrf, Some(0.75));
    assert_eq!(set.familiarity, Some(0.25));
    assert_eq!(set.train_log_ratio, Some(0.5));
  }

  #[test]
  fn test_meta_uses_dashboard_field_names() {
    let meta: ChallengeSetMeta = serde_json::from_str(
      r#"{ "challengeSets": [{ "fileName": "t.json", "displayName": "T", "count": 3,
            "logCount": 2, "trainCount": 1, "type": "unit-test" }] }"#,
    )
    .unwrap();

    assert_eq!(meta.challenge_sets[0].set_type, ChallengeSetType::UnitTest);
    assert_eq!(meta.challenge_sets[0].chrf, None);
  }
}
