use serde::Serialize;

use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedKeyword {
  pub word: String,
  pub weight: f64,
  /// Weight mapped linearly onto [0, 1] over the kept keywords
  pub shade: f64,
}

/// The first `max` keywords of the set, shaded by weight and sorted
/// descending by weight
pub fn ranked_keywords(store: &RecordStore, max: usize) -> Vec<RankedKeyword> {
  let kept = &store.keywords()[..store.keywords().len().min(max)];

  let (lo, hi) = kept
    .iter()
    .map(|(_, w)| *w)
    .filter(|w| w.is_finite())
    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), w| (lo.min(w), hi.max(w)));
  let extent = hi - lo;

  let mut ranked: Vec<RankedKeyword> = kept
    .iter()
    .map(|(word, weight)| RankedKeyword {
      word: word.clone(),
      weight: *weight,
      shade: if extent > 0.0 { ((weight - lo) / extent).clamp(0.0, 1.0) } else { 0.0 },
    })
    .collect();

  ranked.sort_by(|a, b| b.weight.total_cmp(&a.weight));
  ranked
}
