//! Derived aggregators
//!
//! Pure functions of the record store and the visible index set. Anything
//! that must stay fixed across updates (category order, grand totals) is
//! established once and handed back in as an explicit value owned by the view.

pub mod categorical;
pub mod histogram;
pub mod sentences;
pub mod timeline;

use serde::Serialize;
use std::fmt;

pub use categorical::{CategoryChart, CategoryCount, OverlapAxis, OverlapCount, SourceIdAxis};
pub use histogram::{BinRange, Histogram, HistogramBin};
pub use sentences::{
  DisplayRecord, HighlightKind, HighlightSpan, SampleKind, Segment, SegmentKind, SpanMap,
};
pub use timeline::{dates_in_range, DayCount};

/// "X out of Y" bookkeeping for chart captions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caption {
  /// Samples counted under the current filters
  pub shown: usize,
  /// Samples the metric applies to, ignoring filters
  pub total: usize,
}

impl Caption {
  pub fn new(shown: usize, total: usize) -> Self {
    Self { shown, total }
  }

  pub fn describe(&self, noun: &str) -> String {
    if self.shown == self.total {
      format!("{} {noun}", self.total)
    } else {
      format!("{} out of {} {noun}", self.shown, self.total)
    }
  }
}

impl fmt::Display for Caption {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.describe("samples"))
  }
}
