//! Externally loaded lookup tables
//!
//! Both tables come from JSON files shipped next to the challenge sets:
//! the source-id map (`dataset-id-map.json`) and the challenge-set
//! intersections (`challenge-intersections.json`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::catalog::ChallengeSetType;
use crate::Result;

pub const REDACTED_LABEL: &str = "Redacted/Others";

/// Source-id key to descriptor list; the display name sits at position 1
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceIdMap {
  entries: BTreeMap<String, Vec<String>>,
}

impl SourceIdMap {
  pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
    Self { entries }
  }

  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  /// Bucket a raw sample id: ids missing from the map join the redacted bucket
  pub fn bucket_key(&self, raw: Option<&str>) -> Option<String> {
    raw.filter(|id| self.contains(id)).map(str::to_string)
  }

  pub fn display_name(&self, key: Option<&str>) -> String {
    key
      .and_then(|k| self.entries.get(k))
      .and_then(|descriptor| descriptor.get(1).or_else(|| descriptor.first()))
      .cloned()
      .or_else(|| key.map(str::to_string))
      .unwrap_or_else(|| REDACTED_LABEL.to_string())
  }
}

type OverlapTable = BTreeMap<String, BTreeMap<String, Vec<usize>>>;

/// For every challenge set, the sample indexes it shares with each other set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntersectionData {
  #[serde(default)]
  pub topics: OverlapTable,
  #[serde(default)]
  pub tests: OverlapTable,
}

impl IntersectionData {
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
  }

  /// Overlap buckets for one set, keyed by the other set's file name
  pub fn overlaps_for(
    &self,
    set_type: ChallengeSetType,
    file_name: &str,
  ) -> Option<&BTreeMap<String, Vec<usize>>> {
    let table = match set_type {
      ChallengeSetType::Topic => &self.topics,
      ChallengeSetType::UnitTest => &self.tests,
    };
    table.get(file_name)
  }
}
