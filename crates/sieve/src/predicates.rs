//! Concrete predicates
//!
//! Each function derives one group's index set from the record store and
//! its own UI parameters only. None of them looks at another group or at
//! the current visible set, so any group can be recomputed from scratch.
//!
//! An empty selection, or a selection that matched no sample, means "no
//! constraint" ([`GroupSet::Unconstrained`]). Only a search key and an
//! embedding region stay active with zero matches, so they can hide
//! every sample.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::aggregate::histogram::BinRange;
use crate::aggregate::sentences::SpanMap;
use crate::aggregate::OverlapAxis;
use crate::filters::GroupSet;
use crate::lookup::SourceIdMap;
use crate::store::RecordStore;

/// Group set plus the byte spans that produced it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextMatches {
  pub group: GroupSet,
  pub spans: SpanMap,
}

/// Samples whose date key (`YYYYMMDD`) is one of `selected`
pub fn date_matches(store: &RecordStore, selected: &BTreeSet<String>) -> GroupSet {
  if selected.is_empty() {
    return GroupSet::Unconstrained;
  }

  GroupSet::from_indexes(store.date().iter().enumerate().filter_map(|(i, date)| {
    date.filter(|d| selected.contains(&d.to_string())).map(|_| i)
  }))
}

/// Case-insensitive search over source text.
///
/// The key is tried as a regular expression first; a key that does not
/// compile is searched for literally. A pattern that only matches the empty
/// string (`x*` on "cat") still selects the sample but adds no span.
pub fn search_matches(store: &RecordStore, key: &str) -> TextMatches {
  if key.is_empty() {
    return TextMatches::default();
  }

  let pattern = match case_insensitive(key) {
    Ok(pattern) => pattern,
    Err(e) => {
      debug!("search key is not a valid pattern, matching literally: {e}");
      match case_insensitive(&regex::escape(key)) {
        Ok(pattern) => pattern,
        Err(e) => {
          warn!("search key could not be compiled: {e}");
          return TextMatches::default();
        }
      }
    }
  };

  let mut matched = BTreeSet::new();
  let mut spans = SpanMap::new();
  for (i, source) in store.source().iter().enumerate() {
    if !pattern.is_match(source) {
      continue;
    }
    matched.insert(i);
    let found = find_spans(&pattern, source);
    if !found.is_empty() {
      spans.insert(i, found);
    }
  }

  TextMatches { group: GroupSet::forced(matched), spans }
}

/// Union over every selected keyword of the samples containing it
pub fn keyword_matches(store: &RecordStore, keywords: &BTreeSet<String>) -> TextMatches {
  let patterns: Vec<Regex> = keywords
    .iter()
    .filter(|k| !k.is_empty())
    .filter_map(|k| case_insensitive(&regex::escape(k)).ok())
    .collect();

  if patterns.is_empty() {
    return TextMatches::default();
  }

  let mut spans = SpanMap::new();
  for (i, source) in store.source().iter().enumerate() {
    let mut found: Vec<(usize, usize)> =
      patterns.iter().flat_map(|p| find_spans(p, source)).collect();
    if !found.is_empty() {
      found.sort_unstable();
      found.dedup();
      spans.insert(i, found);
    }
  }

  TextMatches { group: GroupSet::from_indexes(spans.keys().copied()), spans }
}

/// Samples with a score inside a snapped brush range
pub fn range_matches(values: &[Option<f64>], range: Option<BinRange>) -> GroupSet {
  let Some(range) = range else {
    return GroupSet::Unconstrained;
  };

  GroupSet::from_indexes(
    values
      .iter()
      .enumerate()
      .filter(|(_, v)| v.is_some_and(|v| range.contains(v)))
      .map(|(i, _)| i),
  )
}

/// Log samples whose source bucket is selected.
///
/// With a source map, ids it does not know fall into the redacted (`None`)
/// bucket; without one the raw ids are used as keys.
pub fn source_id_matches(
  store: &RecordStore,
  map: Option<&SourceIdMap>,
  selected: &BTreeSet<Option<String>>,
) -> GroupSet {
  if selected.is_empty() {
    return GroupSet::Unconstrained;
  }

  GroupSet::from_indexes((0..store.len()).filter(|&i| {
    if store.is_training()[i] {
      return false;
    }
    let raw = store.source_id()[i].as_deref();
    let key = match map {
      Some(map) => map.bucket_key(raw),
      None => raw.map(str::to_string),
    };
    selected.contains(&key)
  }))
}

/// Samples shared with any selected overlapping set
pub fn other_set_matches(axis: &OverlapAxis, selected: &BTreeSet<String>) -> GroupSet {
  if selected.is_empty() {
    return GroupSet::Unconstrained;
  }

  let mut matched = BTreeSet::new();
  for name in selected {
    match axis.indexes_for(name) {
      Some(indexes) => matched.extend(indexes.iter().copied()),
      None => warn!(set = %name, "selected overlapping set is not on the chart"),
    }
  }
  GroupSet::from_indexes(matched)
}

/// Spatial selection over the embedding projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
  /// Axis-aligned box; corners may come in any order
  Rect { x0: f64, y0: f64, x1: f64, y1: f64 },
  /// Closed polygon through the drawn points
  Lasso(Vec<(f64, f64)>),
}

impl Region {
  /// A region a live selection tool could not have produced
  pub fn is_malformed(&self) -> bool {
    match self {
      Region::Rect { x0, y0, x1, y1 } => [x0, y0, x1, y1].iter().any(|v| !v.is_finite()),
      Region::Lasso(points) => {
        points.len() < 3 || points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite())
      }
    }
  }

  pub fn contains(&self, x: f64, y: f64) -> bool {
    match self {
      Region::Rect { x0, y0, x1, y1 } => {
        x >= x0.min(*x1) && x <= x0.max(*x1) && y >= y0.min(*y1) && y <= y0.max(*y1)
      }
      Region::Lasso(points) => point_in_polygon(points, x, y),
    }
  }
}

/// Samples whose embedding point lies in `region`; None for a malformed region
pub fn region_matches(store: &RecordStore, region: Option<&Region>) -> Option<GroupSet> {
  let Some(region) = region else {
    return Some(GroupSet::Unconstrained);
  };
  if region.is_malformed() {
    return None;
  }

  Some(GroupSet::forced((0..store.len()).filter(|&i| {
    store.embedding(i).is_some_and(|(x, y)| region.contains(x, y))
  })))
}

// Even-odd ray casting
fn point_in_polygon(points: &[(f64, f64)], x: f64, y: f64) -> bool {
  let mut inside = false;
  let mut j = points.len() - 1;
  for (i, &(xi, yi)) in points.iter().enumerate() {
    let (xj, yj) = points[j];
    if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
      inside = !inside;
    }
    j = i;
  }
  inside
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
  RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn find_spans(pattern: &Regex, text: &str) -> Vec<(usize, usize)> {
  pattern
    .find_iter(text)
    .filter(|m| !m.is_empty())
    .map(|m| (m.start(), m.len()))
    .collect()
}
