//! Columnar record store for one challenge set
//!
//! Every column is index-aligned: index `i` names the same sample in all of
//! them for the lifetime of the store. The only mutation is [`RecordStore::remove`],
//! which splices one index out of every column in lock-step.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{Result, SieveError};

/// JSON document shape of a challenge set as produced by the data pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeData {
  pub source: Vec<String>,
  pub hyp: Vec<String>,
  pub x: Vec<f64>,
  pub y: Vec<f64>,
  pub source_id: Vec<Option<String>>,
  pub date: Vec<Option<u32>>,
  /// 1 for training samples, 0 for usage-log samples
  pub train: Vec<u8>,
  pub chrf: Vec<Option<f64>>,
  pub familiarity: Vec<Option<f64>>,
  #[serde(default)]
  pub keywords: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordStore {
  source: Vec<String>,
  hyp: Vec<String>,
  embedding_x: Vec<f64>,
  embedding_y: Vec<f64>,
  source_id: Vec<Option<String>>,
  date: Vec<Option<u32>>,
  is_training: Vec<bool>,
  chrf: Vec<Option<f64>>,
  familiarity: Vec<Option<f64>>,
  keywords: Vec<(String, f64)>,
}

impl RecordStore {
  /// Build a store from a parsed document, checking that every column has
  /// one value per source sentence
  pub fn from_data(data: ChallengeData) -> Result<Self> {
    let expected = data.source.len();
    check_len("hyp", expected, data.hyp.len())?;
    check_len("x", expected, data.x.len())?;
    check_len("y", expected, data.y.len())?;
    check_len("source_id", expected, data.source_id.len())?;
    check_len("date", expected, data.date.len())?;
    check_len("train", expected, data.train.len())?;
    check_len("chrf", expected, data.chrf.len())?;
    check_len("familiarity", expected, data.familiarity.len())?;

    Ok(Self {
      source: data.source,
      hyp: data.hyp,
      embedding_x: data.x,
      embedding_y: data.y,
      source_id: data.source_id,
      date: data.date,
      is_training: data.train.iter().map(|t| *t == 1).collect(),
      chrf: data.chrf.into_iter().map(finite).collect(),
      familiarity: data.familiarity.into_iter().map(finite).collect(),
      keywords: data.keywords,
    })
  }

  /// Read and validate a challenge-set JSON file
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
    let content = fs::read_to_string(path)?;
    let data: ChallengeData = serde_json::from_str(&content)?;
    Self::from_data(data)
  }

  pub fn len(&self) -> usize {
    self.source.len()
  }

  pub fn is_empty(&self) -> bool {
    self.source.is_empty()
  }

  pub fn source(&self) -> &[String] {
    &self.source
  }

  pub fn hyp(&self) -> &[String] {
    &self.hyp
  }

  pub fn embedding(&self, index: usize) -> Option<(f64, f64)> {
    Some((*self.embedding_x.get(index)?, *self.embedding_y.get(index)?))
  }

  pub fn source_id(&self) -> &[Option<String>] {
    &self.source_id
  }

  pub fn date(&self) -> &[Option<u32>] {
    &self.date
  }

  pub fn is_training(&self) -> &[bool] {
    &self.is_training
  }

  pub fn chrf(&self) -> &[Option<f64>] {
    &self.chrf
  }

  pub fn familiarity(&self) -> &[Option<f64>] {
    &self.familiarity
  }

  /// Ranked keyword/weight pairs for the whole set
  pub fn keywords(&self) -> &[(String, f64)] {
    &self.keywords
  }

  pub fn training_count(&self) -> usize {
    self.is_training.iter().filter(|t| **t).count()
  }

  pub fn log_count(&self) -> usize {
    self.len() - self.training_count()
  }

  /// First index whose source text equals `source`
  pub fn position_of_source(&self, source: &str) -> Option<usize> {
    self.source.iter().position(|s| s == source)
  }

  /// Splice `index` out of every column. Later samples shift down by one.
  pub fn remove(&mut self, index: usize) -> bool {
    if index >= self.len() {
      return false;
    }

    self.source.remove(index);
    self.hyp.remove(index);
    self.embedding_x.remove(index);
    self.embedding_y.remove(index);
    self.source_id.remove(index);
    self.date.remove(index);
    self.is_training.remove(index);
    self.chrf.remove(index);
    self.familiarity.remove(index);
    true
  }
}

fn check_len(column: &str, expected: usize, actual: usize) -> Result<()> {
  if expected == actual {
    Ok(())
  } else {
    Err(SieveError::mismatched_column(column, expected, actual))
  }
}

// NaN scores behave like missing scores everywhere downstream
fn finite(value: Option<f64>) -> Option<f64> {
  value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_data() -> ChallengeData {
    ChallengeData {
      source: vec!["a".into(), "b".into(), "c".into()],
      hyp: vec!["A".into(), "B".into(), "C".into()],
      x: vec![0.0, 1.0, 2.0],
      y: vec![0.5, 1.5, 2.5],
      source_id: vec![Some("1".into()), None, Some("2".into())],
      date: vec![Some(20230101), None, Some(20230103)],
      train: vec![1, 0, 1],
      chrf: vec![Some(0.5), None, Some(f64::NAN)],
      familiarity: vec![None, Some(0.25), None],
      keywords: vec![("a".into(), 1.0)],
    }
  }

  #[test]
  fn test_rejects_short_column() {
    let mut data = sample_data();
    data.hyp.pop();

    let err = RecordStore::from_data(data).unwrap_err();
    match err {
      SieveError::MismatchedColumn { column, expected, actual } => {
        assert_eq!(column, "hyp");
        assert_eq!(expected, 3);
        assert_eq!(actual, 2);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn test_nan_scores_become_missing() {
    let store = RecordStore::from_data(sample_data()).unwrap();
    assert_eq!(store.chrf()[2], None);
    assert_eq!(store.is_training(), &[true, false, true]);
    assert_eq!(store.training_count(), 2);
    assert_eq!(store.log_count(), 1);
  }

  #[test]
  fn test_remove_keeps_columns_aligned() {
    let mut store = RecordStore::from_data(sample_data()).unwrap();
    assert!(store.remove(1));

    assert_eq!(store.len(), 2);
    assert_eq!(store.source(), &["a".to_string(), "c".to_string()]);
    assert_eq!(store.hyp(), &["A".to_string(), "C".to_string()]);
    assert_eq!(store.embedding(1), Some((2.0, 2.5)));
    assert_eq!(store.date(), &[Some(20230101), Some(20230103)]);
    assert_eq!(store.source_id()[1], Some("2".to_string()));
    assert!(!store.remove(5));
  }
}
