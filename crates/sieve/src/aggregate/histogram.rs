//! Equal-width binning over [0, 1] for ChrF and familiarity scores
//!
//! Thresholds are `k / bin_count` for `k = 1..bin_count`. A value lands in
//! the bin counted by how many thresholds are `<=` it, so every bin is
//! half-open except the last, which also takes 1.0. The first bin always
//! starts at exactly 0.0 and the last always ends at exactly 1.0.

use serde::Serialize;

use super::Caption;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
  pub start: f64,
  pub end: f64,
  pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
  pub bins: Vec<HistogramBin>,
  pub caption: Caption,
}

impl Histogram {
  pub fn total(&self) -> usize {
    self.bins.iter().map(|b| b.count).sum()
  }
}

/// Interior bin thresholds
pub fn bin_thresholds(bin_count: usize) -> Vec<f64> {
  let width = 1.0 / bin_count as f64;
  (0..bin_count.saturating_sub(1)).map(|i| (i + 1) as f64 * width).collect()
}

pub fn bin_index(value: f64, thresholds: &[f64]) -> usize {
  thresholds.partition_point(|t| *t <= value)
}

/// Count the non-missing `values` at `indexes` into `bin_count` bins.
///
/// Out-of-range values are clamped into the first or last bin so the bin
/// counts always add up to the number of scored samples.
pub fn bin_values<I>(values: &[Option<f64>], indexes: I, bin_count: usize) -> Vec<HistogramBin>
where
  I: IntoIterator<Item = usize>,
{
  let thresholds = bin_thresholds(bin_count);
  let mut bins: Vec<HistogramBin> = (0..bin_count)
    .map(|i| HistogramBin {
      start: if i == 0 { 0.0 } else { thresholds[i - 1] },
      end: if i + 1 == bin_count { 1.0 } else { thresholds[i] },
      count: 0,
    })
    .collect();

  if bins.is_empty() {
    return bins;
  }

  for value in indexes.into_iter().filter_map(|i| values.get(i).copied().flatten()) {
    let slot = bin_index(value.clamp(0.0, 1.0), &thresholds);
    bins[slot].count += 1;
  }

  bins
}

/// Quantize a brush position down to a bin boundary.
///
/// The rule is `floor(floor(v * 100) / (bin_size * 100)) * bin_size`, kept
/// exactly so filtered samples line up with the highlighted bars.
pub fn snap_to_bin(value: f64, bin_count: usize) -> f64 {
  let bin_size = 1.0 / bin_count as f64;
  let multiple = ((value * 100.0).floor() / (bin_size * 100.0)).floor();
  multiple * bin_size
}

/// Closed score range selected by a histogram brush, snapped to bin edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinRange {
  pub lo: f64,
  pub hi: f64,
}

impl BinRange {
  /// None for a selection that cannot come from a live brush
  pub fn from_brush(lo: f64, hi: f64, bin_count: usize) -> Option<Self> {
    if !lo.is_finite() || !hi.is_finite() || lo > hi || bin_count == 0 {
      return None;
    }
    Some(Self { lo: snap_to_bin(lo, bin_count), hi: snap_to_bin(hi, bin_count) })
  }

  pub fn contains(&self, value: f64) -> bool {
    value >= self.lo && value <= self.hi
  }
}
