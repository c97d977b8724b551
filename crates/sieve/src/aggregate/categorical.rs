//! Category counts for the input-source and overlapping-set charts
//!
//! The axis (which categories exist and in what order) is established on the
//! first draw and then reused, so bars keep their positions while filters
//! change. Only the counts are recomputed.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use crate::catalog::ChallengeSetType;
use crate::filters::shift_after_removal;
use crate::lookup::SourceIdMap;
use crate::store::RecordStore;

use super::Caption;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
  /// None is the redacted/unknown bucket
  pub key: Option<String>,
  pub display_name: String,
  pub count: usize,
}

/// Input-source bars plus their "X out of Y log samples" caption
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChart {
  pub categories: Vec<CategoryCount>,
  pub caption: Caption,
}

/// Fixed input-source axis for one view
#[derive(Debug, Clone, PartialEq)]
pub struct SourceIdAxis {
  categories: Vec<(Option<String>, String)>,
  total: usize,
}

impl SourceIdAxis {
  /// Snapshot every known key plus the redacted bucket, sorted descending by
  /// their unfiltered log-sample count
  pub fn establish(store: &RecordStore, map: &SourceIdMap) -> Self {
    let mut snapshot: Vec<(Option<String>, usize)> =
      map.keys().map(|k| (Some(k.to_string()), 0)).collect();
    snapshot.push((None, 0));

    let all = log_counts(store, map, 0..store.len());
    for (key, count) in snapshot.iter_mut() {
      *count = all.get(key).copied().unwrap_or(0);
    }
    snapshot.sort_by(|a, b| b.1.cmp(&a.1));

    let total = snapshot.iter().map(|(_, c)| c).sum();
    let categories = snapshot
      .into_iter()
      .map(|(key, _)| {
        let name = map.display_name(key.as_deref());
        (key, name)
      })
      .collect();

    Self { categories, total }
  }

  /// Log samples across the whole set, ignoring filters
  pub fn total(&self) -> usize {
    self.total
  }

  pub fn refresh_total(&mut self, store: &RecordStore) {
    self.total = store.log_count();
  }

  pub fn categories(&self) -> impl Iterator<Item = (&Option<String>, &str)> {
    self.categories.iter().map(|(key, name)| (key, name.as_str()))
  }

  /// Key whose display name is `name`
  pub fn key_for_name(&self, name: &str) -> Option<&Option<String>> {
    self.categories.iter().find(|(_, n)| n == name).map(|(key, _)| key)
  }

  /// Visible log samples per category, in axis order
  pub fn count(&self, store: &RecordStore, map: &SourceIdMap, visible: &[usize]) -> CategoryChart {
    let counts = log_counts(store, map, visible.iter().copied());
    let categories: Vec<CategoryCount> = self
      .categories
      .iter()
      .map(|(key, name)| CategoryCount {
        key: key.clone(),
        display_name: name.clone(),
        count: counts.get(key).copied().unwrap_or(0),
      })
      .collect();

    let shown = categories.iter().map(|c| c.count).sum();
    CategoryChart { categories, caption: Caption::new(shown, self.total) }
  }
}

fn log_counts<I>(store: &RecordStore, map: &SourceIdMap, indexes: I) -> HashMap<Option<String>, usize>
where
  I: IntoIterator<Item = usize>,
{
  let mut counts = HashMap::new();
  for i in indexes {
    if store.is_training().get(i).copied().unwrap_or(true) {
      continue;
    }
    let key = map.bucket_key(store.source_id()[i].as_deref());
    *counts.entry(key).or_insert(0) += 1;
  }
  counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapCount {
  pub set_name: String,
  pub display_name: String,
  pub count: usize,
  /// Overlap size before any filter
  pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct OverlapBucket {
  set_name: String,
  display_name: String,
  indexes: Vec<usize>,
}

/// Top-K overlapping sets for one view, chosen once by overlap size
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapAxis {
  buckets: Vec<OverlapBucket>,
}

impl OverlapAxis {
  pub fn establish(
    overlaps: &BTreeMap<String, Vec<usize>>,
    set_type: ChallengeSetType,
    top_k: usize,
    max_name_len: usize,
  ) -> Self {
    let mut buckets: Vec<OverlapBucket> = overlaps
      .iter()
      .map(|(set_name, indexes)| OverlapBucket {
        set_name: set_name.clone(),
        display_name: overlap_display_name(set_name, set_type, max_name_len),
        indexes: indexes.clone(),
      })
      .collect();

    buckets.sort_by(|a, b| b.indexes.len().cmp(&a.indexes.len()));
    buckets.truncate(top_k);
    Self { buckets }
  }

  pub fn set_names(&self) -> impl Iterator<Item = &str> {
    self.buckets.iter().map(|b| b.set_name.as_str())
  }

  /// Indexes shared with a kept set, looked up by file name or display name
  pub fn indexes_for(&self, name: &str) -> Option<&[usize]> {
    self
      .buckets
      .iter()
      .find(|b| b.set_name == name || b.display_name == name)
      .map(|b| b.indexes.as_slice())
  }

  pub fn count(&self, visible: &[usize]) -> Vec<OverlapCount> {
    let visible: HashSet<usize> = visible.iter().copied().collect();
    self
      .buckets
      .iter()
      .map(|b| OverlapCount {
        set_name: b.set_name.clone(),
        display_name: b.display_name.clone(),
        count: b.indexes.iter().filter(|i| visible.contains(i)).count(),
        total: b.indexes.len(),
      })
      .collect()
  }

  /// Keep the shared indexes aligned with a store that lost `removed`
  pub fn purge_index(&mut self, removed: usize) {
    for bucket in self.buckets.iter_mut() {
      bucket.indexes = shift_after_removal(bucket.indexes.iter().copied(), removed).collect();
    }
  }
}

fn topic_prefix() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"challenge-topic-\d+_").expect("static pattern compiles"))
}

/// Axis label for another set: strip the opposite family's file prefix and
/// truncate long names
pub fn overlap_display_name(set_name: &str, set_type: ChallengeSetType, max_len: usize) -> String {
  let stripped = match set_type {
    ChallengeSetType::Topic => set_name.replacen("challenge-test_", "", 1),
    ChallengeSetType::UnitTest => topic_prefix().replace(set_name, "").into_owned(),
  };

  if stripped.chars().count() > max_len {
    let mut truncated: String = stripped.chars().take(max_len).collect();
    truncated.push_str("...");
    truncated
  } else {
    stripped
  }
}
