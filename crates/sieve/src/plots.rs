//! Plot registry
//!
//! Every plot type maps to a fixed `(focus, thumbnail, reset)` triple. The
//! table is data, so adding a plot means adding one variant and one row.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aggregate::{CategoryChart, Histogram, OverlapCount};
use crate::filters::FilterType;
use crate::keywords::RankedKeyword;
use crate::view::{ScoreMetric, SetView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlotType {
  #[serde(rename = "keyword")]
  Keyword,
  #[serde(rename = "chrf")]
  Chrf,
  #[serde(rename = "source id")]
  SourceId,
  #[serde(rename = "embedding")]
  Embedding,
  #[serde(rename = "familiarity")]
  Familiarity,
  #[serde(rename = "unit test")]
  UnitTest,
}

impl PlotType {
  /// Thumbnail strip order; the first entry starts in focus
  pub const ALL: [PlotType; 6] = [
    PlotType::Keyword,
    PlotType::Embedding,
    PlotType::Chrf,
    PlotType::Familiarity,
    PlotType::SourceId,
    PlotType::UnitTest,
  ];

  pub fn label(&self) -> &'static str {
    match self {
      PlotType::Keyword => "Keywords",
      PlotType::Chrf => "ChrF",
      PlotType::SourceId => "Input Source",
      PlotType::Embedding => "Embeddings",
      PlotType::Familiarity => "Familiarities",
      PlotType::UnitTest => "Unit Tests",
    }
  }

  /// Predicate group driven by this plot's selections
  pub fn filter(&self) -> FilterType {
    match self {
      PlotType::Keyword => FilterType::Keyword,
      PlotType::Chrf => FilterType::Chrf,
      PlotType::SourceId => FilterType::SourceId,
      PlotType::Embedding => FilterType::Embedding,
      PlotType::Familiarity => FilterType::Familiarity,
      PlotType::UnitTest => FilterType::OtherSet,
    }
  }
}

impl fmt::Display for PlotType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmbeddingPoint {
  pub index: usize,
  pub x: f64,
  pub y: f64,
  pub train: bool,
}

/// Backing data for one drawn plot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ChartData {
  Keywords(Vec<RankedKeyword>),
  Histogram(Histogram),
  /// None when the source-id table is missing
  Categories(Option<CategoryChart>),
  Points(Vec<EmbeddingPoint>),
  /// None when the overlap table is missing
  Overlaps(Option<Vec<OverlapCount>>),
}

pub type DrawFn = fn(&SetView) -> ChartData;
pub type ResetFn = fn(&mut SetView);

/// Draw and reset entry points for one plot.
///
/// A thumbnail is the focus chart drawn smaller, so both draw functions
/// return the same data; only the presentation layer scales it down.
#[derive(Clone, Copy)]
pub struct PlotHandlers {
  pub focus: DrawFn,
  pub thumbnail: DrawFn,
  pub reset: ResetFn,
}

impl fmt::Debug for PlotHandlers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PlotHandlers").finish_non_exhaustive()
  }
}

pub fn plot_handlers(plot: PlotType) -> PlotHandlers {
  match plot {
    PlotType::Keyword => PlotHandlers { focus: keywords, thumbnail: keywords, reset: reset_keywords },
    PlotType::Chrf => PlotHandlers { focus: chrf, thumbnail: chrf, reset: reset_chrf },
    PlotType::SourceId => {
      PlotHandlers { focus: source_ids, thumbnail: source_ids, reset: reset_source_ids }
    }
    PlotType::Embedding => {
      PlotHandlers { focus: embedding, thumbnail: embedding, reset: reset_embedding }
    }
    PlotType::Familiarity => {
      PlotHandlers { focus: familiarity, thumbnail: familiarity, reset: reset_familiarity }
    }
    PlotType::UnitTest => PlotHandlers { focus: overlaps, thumbnail: overlaps, reset: reset_overlaps },
  }
}

fn keywords(view: &SetView) -> ChartData {
  ChartData::Keywords(view.keywords())
}

fn chrf(view: &SetView) -> ChartData {
  ChartData::Histogram(view.histogram(ScoreMetric::Chrf))
}

fn familiarity(view: &SetView) -> ChartData {
  ChartData::Histogram(view.histogram(ScoreMetric::Familiarity))
}

fn source_ids(view: &SetView) -> ChartData {
  ChartData::Categories(view.source_id_counts())
}

fn embedding(view: &SetView) -> ChartData {
  let store = view.store();
  let points = view
    .visible()
    .iter()
    .filter_map(|&index| {
      let (x, y) = store.embedding(index)?;
      Some(EmbeddingPoint { index, x, y, train: store.is_training()[index] })
    })
    .collect();
  ChartData::Points(points)
}

fn overlaps(view: &SetView) -> ChartData {
  ChartData::Overlaps(view.overlap_counts())
}

fn reset_keywords(view: &mut SetView) {
  view.reset_filter(FilterType::Keyword);
}

fn reset_chrf(view: &mut SetView) {
  view.reset_filter(FilterType::Chrf);
}

fn reset_familiarity(view: &mut SetView) {
  view.reset_filter(FilterType::Familiarity);
}

fn reset_source_ids(view: &mut SetView) {
  view.reset_filter(FilterType::SourceId);
}

fn reset_embedding(view: &mut SetView) {
  view.reset_filter(FilterType::Embedding);
}

fn reset_overlaps(view: &mut SetView) {
  view.reset_filter(FilterType::OtherSet);
}
