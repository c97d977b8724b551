//! Focused view over one challenge set
//!
//! A [`SetView`] owns the record store, the predicate registry, the UI
//! selections each predicate was computed from, and the axes that must stay
//! fixed while filters change. Every mutation runs the whole cycle
//! synchronously: recompute one group, intersect, rebuild the sentence list,
//! then notify subscribers with a fresh [`ViewSnapshot`].

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::aggregate::histogram::{bin_values, BinRange, Histogram};
use crate::aggregate::sentences::{display_records, SpanMap};
use crate::aggregate::timeline::{dates_in_range, day_counts, day_span, DayCount};
use crate::aggregate::{Caption, CategoryChart, DisplayRecord, OverlapAxis, OverlapCount, SourceIdAxis};
use crate::catalog::{summarize, ChallengeSet, ChallengeSetType};
use crate::config::ViewConfig;
use crate::export::ExportPayload;
use crate::filters::{shift_after_removal, FilterRegistry, FilterTag, FilterType, GroupSet};
use crate::intersection::visible_indexes;
use crate::keywords::{ranked_keywords, RankedKeyword};
use crate::lookup::SourceIdMap;
use crate::predicates::{self, Region};
use crate::store::RecordStore;
use crate::Result;

/// Callback run after every recompute
pub type Subscriber = Box<dyn FnMut(&ViewSnapshot) + Send>;

/// The supported way to share one view between threads
pub type SharedSetView = Arc<Mutex<SetView>>;

/// Continuous score metrics with a histogram and a brush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMetric {
  Chrf,
  Familiarity,
}

impl ScoreMetric {
  pub fn filter(&self) -> FilterType {
    match self {
      ScoreMetric::Chrf => FilterType::Chrf,
      ScoreMetric::Familiarity => FilterType::Familiarity,
    }
  }

  fn values<'a>(&self, store: &'a RecordStore) -> &'a [Option<f64>] {
    match self {
      ScoreMetric::Chrf => store.chrf(),
      ScoreMetric::Familiarity => store.familiarity(),
    }
  }
}

/// Everything a presentation layer needs after one recompute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
  pub visible: Vec<usize>,
  pub tags: Vec<FilterTag>,
  pub training_count: usize,
  pub log_count: usize,
  pub chrf: Histogram,
  pub familiarity: Histogram,
  pub source_ids: Option<CategoryChart>,
  pub overlaps: Option<Vec<OverlapCount>>,
  pub days: Vec<DayCount>,
  pub sentences: Vec<DisplayRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Selections {
  dates: BTreeSet<String>,
  search_key: String,
  keywords: BTreeSet<String>,
  chrf: Option<BinRange>,
  familiarity: Option<BinRange>,
  source_ids: BTreeSet<Option<String>>,
  other_sets: BTreeSet<String>,
  region: Option<Region>,
}

impl Selections {
  fn range_mut(&mut self, metric: ScoreMetric) -> &mut Option<BinRange> {
    match metric {
      ScoreMetric::Chrf => &mut self.chrf,
      ScoreMetric::Familiarity => &mut self.familiarity,
    }
  }
}

// Cached once per store layout; refreshed only by deletion
#[derive(Debug, Clone, Copy, PartialEq)]
struct GrandTotals {
  chrf: usize,
  familiarity: usize,
}

impl GrandTotals {
  fn of(store: &RecordStore) -> Self {
    Self {
      chrf: store.chrf().iter().flatten().count(),
      familiarity: store.familiarity().iter().flatten().count(),
    }
  }

  fn get(&self, metric: ScoreMetric) -> usize {
    match metric {
      ScoreMetric::Chrf => self.chrf,
      ScoreMetric::Familiarity => self.familiarity,
    }
  }
}

pub struct SetView {
  name: String,
  set_type: ChallengeSetType,
  config: ViewConfig,
  store: RecordStore,
  source_map: Option<SourceIdMap>,
  source_axis: Option<SourceIdAxis>,
  overlap_axis: Option<OverlapAxis>,
  registry: FilterRegistry,
  selections: Selections,
  search_spans: SpanMap,
  keyword_spans: SpanMap,
  visible: Vec<usize>,
  sentences: Vec<DisplayRecord>,
  totals: GrandTotals,
  span: Option<(NaiveDate, NaiveDate)>,
  initial_days: Vec<DayCount>,
  subscribers: Vec<Subscriber>,
}

impl fmt::Debug for SetView {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SetView")
      .field("name", &self.name)
      .field("set_type", &self.set_type)
      .field("samples", &self.store.len())
      .field("visible", &self.visible.len())
      .field("tags", &self.registry.tags())
      .field("subscribers", &self.subscribers.len())
      .finish_non_exhaustive()
  }
}

impl SetView {
  pub fn new(
    name: impl Into<String>,
    set_type: ChallengeSetType,
    store: RecordStore,
    config: ViewConfig,
  ) -> Self {
    let span = day_span(&store);
    let initial_days = day_counts(&store, 0..store.len(), span);
    let visible: Vec<usize> = (0..store.len()).collect();
    let sentences = display_records(&store, &visible, &SpanMap::new(), &SpanMap::new());

    Self {
      name: name.into(),
      set_type,
      config,
      totals: GrandTotals::of(&store),
      store,
      source_map: None,
      source_axis: None,
      overlap_axis: None,
      registry: FilterRegistry::new(),
      selections: Selections::default(),
      search_spans: SpanMap::new(),
      keyword_spans: SpanMap::new(),
      visible,
      sentences,
      span,
      initial_days,
      subscribers: Vec::new(),
    }
  }

  /// Attach the source-id lookup table and fix the input-source axis
  pub fn with_source_map(mut self, map: SourceIdMap) -> Self {
    self.source_axis = Some(SourceIdAxis::establish(&self.store, &map));
    self.source_map = Some(map);
    self
  }

  /// Attach this set's overlap buckets and fix the top-K overlap axis
  pub fn with_overlaps(mut self, overlaps: &BTreeMap<String, Vec<usize>>) -> Self {
    self.overlap_axis = Some(OverlapAxis::establish(
      overlaps,
      self.set_type,
      self.config.overlap_top_k,
      self.config.display_name_max_len,
    ));
    self
  }

  pub fn into_shared(self) -> SharedSetView {
    Arc::new(Mutex::new(self))
  }

  pub fn subscribe<F>(&mut self, subscriber: F)
  where
    F: FnMut(&ViewSnapshot) + Send + 'static,
  {
    self.subscribers.push(Box::new(subscriber));
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn set_type(&self) -> ChallengeSetType {
    self.set_type
  }

  pub fn config(&self) -> &ViewConfig {
    &self.config
  }

  pub fn store(&self) -> &RecordStore {
    &self.store
  }

  pub fn registry(&self) -> &FilterRegistry {
    &self.registry
  }

  pub fn visible(&self) -> &[usize] {
    &self.visible
  }

  pub fn sentences(&self) -> &[DisplayRecord] {
    &self.sentences
  }

  pub fn tags(&self) -> &[FilterTag] {
    self.registry.tags()
  }

  pub fn search_key(&self) -> &str {
    &self.selections.search_key
  }

  pub fn selected_keywords(&self) -> &BTreeSet<String> {
    &self.selections.keywords
  }

  pub fn brush(&self, metric: ScoreMetric) -> Option<BinRange> {
    match metric {
      ScoreMetric::Chrf => self.selections.chrf,
      ScoreMetric::Familiarity => self.selections.familiarity,
    }
  }

  /// Visible training samples
  pub fn training_count(&self) -> usize {
    self.visible.iter().filter(|i| self.store.is_training()[**i]).count()
  }

  /// Visible usage-log samples
  pub fn log_count(&self) -> usize {
    self.visible.len() - self.training_count()
  }

  /// Catalog row for the set as it currently stands
  pub fn summary(&self, file_name: &str) -> ChallengeSet {
    summarize(file_name, &self.name, self.set_type, &self.store)
  }

  pub fn keywords(&self) -> Vec<RankedKeyword> {
    ranked_keywords(&self.store, self.config.max_keywords)
  }

  // Predicate setters

  /// Replace a group's index set directly; an empty selection clears it
  pub fn set_group<I: IntoIterator<Item = usize>>(&mut self, filter: FilterType, indexes: I) {
    self.apply(filter, GroupSet::from_indexes(indexes));
  }

  pub fn set_dates<I, S>(&mut self, dates: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.selections.dates = dates.into_iter().map(Into::into).collect();
    let group = predicates::date_matches(&self.store, &self.selections.dates);
    self.apply(FilterType::Date, group);
  }

  /// Select the days of a timeline brush `[start, end)`
  pub fn brush_timeline(&mut self, start: NaiveDate, end: NaiveDate) {
    if start > end {
      warn!(%start, %end, "ignoring reversed timeline brush");
      return;
    }
    let dates = dates_in_range(&self.initial_days, start, end);
    self.set_dates(dates);
  }

  pub fn set_search_key(&mut self, key: &str) {
    self.selections.search_key = key.to_string();
    let matches = predicates::search_matches(&self.store, key);
    self.search_spans = matches.spans;
    self.registry.set_group(FilterType::Search, matches.group);
    self.sync_filters();
  }

  pub fn reset_search(&mut self) {
    self.set_search_key("");
  }

  /// Add the keyword to the selection, or drop it if already selected
  pub fn toggle_keyword(&mut self, word: &str) {
    if !self.selections.keywords.remove(word) {
      self.selections.keywords.insert(word.to_string());
    }
    self.refresh_keywords();
  }

  pub fn clear_keywords(&mut self) {
    self.selections.keywords.clear();
    self.refresh_keywords();
  }

  fn refresh_keywords(&mut self) {
    let matches = predicates::keyword_matches(&self.store, &self.selections.keywords);
    self.keyword_spans = matches.spans;
    self.registry.set_group(FilterType::Keyword, matches.group);
    self.sync_filters();
  }

  /// Apply a histogram brush; bounds are snapped to bin edges first
  pub fn brush_scores(&mut self, metric: ScoreMetric, lo: f64, hi: f64) {
    let Some(range) = BinRange::from_brush(lo, hi, self.config.bin_count) else {
      warn!(metric = ?metric, lo, hi, "ignoring malformed brush selection");
      return;
    };
    if self.brush(metric) == Some(range) {
      return;
    }

    *self.selections.range_mut(metric) = Some(range);
    let group = predicates::range_matches(metric.values(&self.store), Some(range));
    self.apply(metric.filter(), group);
  }

  pub fn clear_brush(&mut self, metric: ScoreMetric) {
    self.reset_filter(metric.filter());
  }

  pub fn set_source_ids<I>(&mut self, keys: I)
  where
    I: IntoIterator<Item = Option<String>>,
  {
    self.selections.source_ids = keys.into_iter().collect();
    self.refresh_source_ids();
  }

  /// Click on an input-source bar
  pub fn toggle_source_id(&mut self, key: Option<String>) {
    if !self.selections.source_ids.remove(&key) {
      self.selections.source_ids.insert(key);
    }
    self.refresh_source_ids();
  }

  fn refresh_source_ids(&mut self) {
    let group = predicates::source_id_matches(
      &self.store,
      self.source_map.as_ref(),
      &self.selections.source_ids,
    );
    self.apply(FilterType::SourceId, group);
  }

  /// Click on an overlap bar, by set file name or axis label
  pub fn toggle_other_set(&mut self, name: &str) {
    let Some(axis) = self.overlap_axis.as_ref() else {
      warn!(set = %name, "no overlap table loaded for this set");
      return;
    };
    if axis.indexes_for(name).is_none() {
      warn!(set = %name, "ignoring overlapping set that is not on the chart");
      return;
    }

    if !self.selections.other_sets.remove(name) {
      self.selections.other_sets.insert(name.to_string());
    }
    let group = predicates::other_set_matches(axis, &self.selections.other_sets);
    self.apply(FilterType::OtherSet, group);
  }

  /// Select samples by embedding position; None clears the selection
  pub fn select_region(&mut self, region: Option<Region>) {
    let Some(group) = predicates::region_matches(&self.store, region.as_ref()) else {
      warn!("ignoring malformed embedding selection");
      return;
    };
    self.selections.region = region;
    self.apply(FilterType::Embedding, group);
  }

  /// Drop one predicate's selection, as closing its tag does
  pub fn reset_filter(&mut self, filter: FilterType) {
    match filter {
      FilterType::Date => self.selections.dates.clear(),
      FilterType::Keyword => {
        self.selections.keywords.clear();
        self.keyword_spans.clear();
      }
      FilterType::Embedding => self.selections.region = None,
      FilterType::Chrf => self.selections.chrf = None,
      FilterType::Familiarity => self.selections.familiarity = None,
      FilterType::SourceId => self.selections.source_ids.clear(),
      FilterType::OtherSet => self.selections.other_sets.clear(),
      FilterType::Search => {
        self.selections.search_key.clear();
        self.search_spans.clear();
      }
    }
    self.registry.clear(filter);
    self.sync_filters();
  }

  pub fn close_tag(&mut self, tag: &FilterTag) {
    self.reset_filter(tag.filter);
  }

  fn apply(&mut self, filter: FilterType, group: GroupSet) {
    if self.registry.set_group(filter, group) {
      self.sync_filters();
    } else {
      debug!(group = %filter, "predicate unchanged, skipping recompute");
    }
  }

  /// Intersect the active groups, rebuild the sentence list and notify
  pub fn sync_filters(&mut self) {
    self.visible = visible_indexes(&self.registry, self.store.len());
    self.sentences =
      display_records(&self.store, &self.visible, &self.search_spans, &self.keyword_spans);
    debug!(
      set = %self.name,
      visible = self.visible.len(),
      active = self.registry.tags().len(),
      "recomputed visible samples"
    );
    self.notify();
  }

  fn notify(&mut self) {
    if self.subscribers.is_empty() {
      return;
    }
    let snapshot = self.snapshot();
    for subscriber in self.subscribers.iter_mut() {
      subscriber(&snapshot);
    }
  }

  // Aggregates

  pub fn histogram(&self, metric: ScoreMetric) -> Histogram {
    let values = metric.values(&self.store);
    let bins = bin_values(values, self.visible.iter().copied(), self.config.bin_count);
    let shown = bins.iter().map(|b| b.count).sum();
    Histogram { bins, caption: Caption::new(shown, self.totals.get(metric)) }
  }

  /// None when no source-id table was attached
  pub fn source_id_counts(&self) -> Option<CategoryChart> {
    match (&self.source_axis, &self.source_map) {
      (Some(axis), Some(map)) => Some(axis.count(&self.store, map, &self.visible)),
      _ => {
        debug!(set = %self.name, "no source-id table, skipping input-source chart");
        None
      }
    }
  }

  /// None when no overlap table was attached
  pub fn overlap_counts(&self) -> Option<Vec<OverlapCount>> {
    self.overlap_axis.as_ref().map(|axis| axis.count(&self.visible))
  }

  pub fn day_counts(&self) -> Vec<DayCount> {
    day_counts(&self.store, self.visible.iter().copied(), self.span)
  }

  /// Day series over the whole set; recomputed only after a deletion
  pub fn initial_day_counts(&self) -> &[DayCount] {
    &self.initial_days
  }

  pub fn snapshot(&self) -> ViewSnapshot {
    ViewSnapshot {
      visible: self.visible.clone(),
      tags: self.registry.tags().to_vec(),
      training_count: self.training_count(),
      log_count: self.log_count(),
      chrf: self.histogram(ScoreMetric::Chrf),
      familiarity: self.histogram(ScoreMetric::Familiarity),
      source_ids: self.source_id_counts(),
      overlaps: self.overlap_counts(),
      days: self.day_counts(),
      sentences: self.sentences.clone(),
    }
  }

  // Deletion and export

  /// Remove the first sample whose source text equals `source`.
  ///
  /// Every group, span map, overlap bucket and the visible list are shifted
  /// to the new layout. The intersection is not recomputed; subscribers get
  /// the shifted state. Returns the removed index.
  pub fn delete_by_source(&mut self, source: &str) -> Option<usize> {
    let Some(index) = self.store.position_of_source(source) else {
      warn!(set = %self.name, "no sample matches the deleted sentence, nothing removed");
      return None;
    };

    self.store.remove(index);
    self.registry.purge_index(index);
    self.search_spans = shift_span_map(std::mem::take(&mut self.search_spans), index);
    self.keyword_spans = shift_span_map(std::mem::take(&mut self.keyword_spans), index);
    self.visible = shift_after_removal(self.visible.iter().copied(), index).collect();

    self.sentences.retain(|r| r.index != index);
    for record in self.sentences.iter_mut().filter(|r| r.index > index) {
      record.index -= 1;
    }

    if let Some(axis) = self.overlap_axis.as_mut() {
      axis.purge_index(index);
    }
    if let Some(axis) = self.source_axis.as_mut() {
      axis.refresh_total(&self.store);
    }
    self.totals = GrandTotals::of(&self.store);
    self.span = day_span(&self.store);
    self.initial_days = day_counts(&self.store, 0..self.store.len(), self.span);

    debug!(set = %self.name, index, remaining = self.store.len(), "deleted sample");
    self.notify();
    Some(index)
  }

  pub fn delete_record(&mut self, record: &DisplayRecord) -> Option<usize> {
    self.delete_by_source(&record.source)
  }

  pub fn export_payload(&self) -> ExportPayload {
    ExportPayload::from_records(&self.sentences)
  }

  pub fn export_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
    self.export_payload().write_to_dir(dir, &self.name)
  }
}

fn shift_span_map(spans: SpanMap, removed: usize) -> SpanMap {
  spans
    .into_iter()
    .filter(|(i, _)| *i != removed)
    .map(|(i, s)| (if i > removed { i - 1 } else { i }, s))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::ChallengeData;

  fn view() -> SetView {
    let store = RecordStore::from_data(ChallengeData {
      source: vec!["cat".into(), "dog".into(), "bird".into()],
      hyp: vec!["gato".into(), "perro".into(), "pajaro".into()],
      x: vec![0.0; 3],
      y: vec![0.0; 3],
      source_id: vec![None; 3],
      date: vec![Some(20230101), Some(20230103), None],
      train: vec![1, 0, 0],
      chrf: vec![Some(0.5), None, None],
      familiarity: vec![None, Some(0.2), Some(0.9)],
      keywords: Vec::new(),
    })
    .unwrap();
    SetView::new("Animals", ChallengeSetType::Topic, store, ViewConfig::default())
  }

  #[test]
  fn test_span_map_shifts_after_removal() {
    let spans: SpanMap = [(0, vec![(0, 1)]), (2, vec![(1, 1)]), (4, vec![(2, 1)])].into();
    let shifted = shift_span_map(spans, 2);
    assert_eq!(shifted.keys().copied().collect::<Vec<_>>(), vec![0, 3]);
  }

  #[test]
  fn test_day_series_is_dense() {
    let days = view().day_counts();
    let counts: Vec<usize> = days.iter().map(|d| d.count).collect();
    assert_eq!(counts, vec![1, 0, 1]);
  }

  #[test]
  fn test_deleting_last_dated_sample_shortens_timeline() {
    let mut view = view();
    view.delete_by_source("dog");

    let days: Vec<String> = view.initial_day_counts().iter().map(|d| d.key()).collect();
    assert_eq!(days, vec!["20230101"]);
    assert_eq!(view.day_counts().len(), 1);
  }

  #[test]
  fn test_unchanged_brush_does_not_notify() {
    let mut view = view();
    let calls = Arc::new(Mutex::new(0));
    let seen = Arc::clone(&calls);
    view.subscribe(move |_| *seen.lock().unwrap() += 1);

    view.brush_scores(ScoreMetric::Familiarity, 0.0, 0.5);
    view.brush_scores(ScoreMetric::Familiarity, 0.01, 0.52);
    assert_eq!(*calls.lock().unwrap(), 1);
    assert_eq!(view.visible(), &[1]);
  }
}
