//! Per-day sample counts for the timeline density chart

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::store::RecordStore;
use crate::{Result, SieveError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
  pub day: NaiveDate,
  pub count: usize,
}

impl DayCount {
  /// The `YYYYMMDD` key the date predicate selects on
  pub fn key(&self) -> String {
    format_day(self.day)
  }
}

pub fn parse_day(value: u32) -> Result<NaiveDate> {
  let year = (value / 10_000) as i32;
  let month = value / 100 % 100;
  let day = value % 100;
  NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| SieveError::invalid_date(value))
}

pub fn format_day(day: NaiveDate) -> String {
  format!("{:04}{:02}{:02}", day.year(), day.month(), day.day())
}

/// Earliest and latest valid day across the whole store
pub fn day_span(store: &RecordStore) -> Option<(NaiveDate, NaiveDate)> {
  let mut days = (0..store.len()).filter_map(|i| valid_day(store, i));
  let first = days.next()?;
  Some(days.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

/// Dense series over `span`, zero-filled, ascending by day
pub fn day_counts<I>(store: &RecordStore, indexes: I, span: Option<(NaiveDate, NaiveDate)>) -> Vec<DayCount>
where
  I: IntoIterator<Item = usize>,
{
  let Some((start, end)) = span else {
    return Vec::new();
  };

  let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
  for day in indexes.into_iter().filter_map(|i| valid_day(store, i)) {
    *counts.entry(day).or_insert(0) += 1;
  }

  start
    .iter_days()
    .take_while(|d| *d <= end)
    .map(|day| DayCount { day, count: counts.get(&day).copied().unwrap_or(0) })
    .collect()
}

/// Keys of the days inside a timeline brush `[start, end)`
pub fn dates_in_range(days: &[DayCount], start: NaiveDate, end: NaiveDate) -> Vec<String> {
  days
    .iter()
    .filter(|d| d.day >= start && d.day < end)
    .map(DayCount::key)
    .collect()
}

fn valid_day(store: &RecordStore, index: usize) -> Option<NaiveDate> {
  let raw = store.date().get(index).copied().flatten()?;
  match parse_day(raw) {
    Ok(day) => Some(day),
    Err(e) => {
      warn!(index, "skipping sample date: {e}");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_and_format_day() {
    let day = parse_day(20230102).unwrap();
    assert_eq!(day, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
    assert_eq!(format_day(day), "20230102");
  }

  #[test]
  fn test_invalid_day_is_rejected() {
    assert!(matches!(parse_day(20230230), Err(SieveError::InvalidDate { value: 20230230 })));
  }

  #[test]
  fn test_dates_in_range_is_half_open() {
    let day = |d| NaiveDate::from_ymd_opt(2023, 1, d).unwrap();
    let days: Vec<DayCount> = (1..=4).map(|d| DayCount { day: day(d), count: 1 }).collect();

    let keys = dates_in_range(&days, day(2), day(4));
    assert_eq!(keys, vec!["20230102".to_string(), "20230103".to_string()]);
  }
}
