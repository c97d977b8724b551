//! Predicate groups and the filter tags derived from them
//!
//! Each group holds the sample indexes matching its own constraint, computed
//! without looking at any other group. A group with no constraint is
//! [`GroupSet::Unconstrained`]. Only search and embedding groups may be
//! `Matching` an empty set, which hides every sample.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::SieveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterType {
  #[serde(rename = "date")]
  Date,
  #[serde(rename = "keyword")]
  Keyword,
  #[serde(rename = "embedding")]
  Embedding,
  #[serde(rename = "chrf")]
  Chrf,
  #[serde(rename = "familiarity")]
  Familiarity,
  #[serde(rename = "sourceID")]
  SourceId,
  #[serde(rename = "otherSet")]
  OtherSet,
  #[serde(rename = "search")]
  Search,
}

impl FilterType {
  /// Fixed iteration order used by the intersection engine
  pub const ALL: [FilterType; 8] = [
    FilterType::Date,
    FilterType::Keyword,
    FilterType::Embedding,
    FilterType::Chrf,
    FilterType::Familiarity,
    FilterType::SourceId,
    FilterType::OtherSet,
    FilterType::Search,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      FilterType::Date => "date",
      FilterType::Keyword => "keyword",
      FilterType::Embedding => "embedding",
      FilterType::Chrf => "chrf",
      FilterType::Familiarity => "familiarity",
      FilterType::SourceId => "sourceID",
      FilterType::OtherSet => "otherSet",
      FilterType::Search => "search",
    }
  }

  /// Chip label shown while the group is active
  pub fn label(&self) -> &'static str {
    match self {
      FilterType::Date => "Dates",
      FilterType::Keyword => "Keyword",
      FilterType::Embedding => "Embeddings",
      FilterType::Chrf => "ChrF",
      FilterType::Familiarity => "Familiarity",
      FilterType::SourceId => "Input Source",
      FilterType::OtherSet => "Overlapping Sets",
      FilterType::Search => "Search Result",
    }
  }

  fn slot(&self) -> usize {
    *self as usize
  }

  /// Groups that stay active when they match nothing
  pub fn keeps_empty(&self) -> bool {
    matches!(self, FilterType::Search | FilterType::Embedding)
  }
}

impl fmt::Display for FilterType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FilterType {
  type Err = SieveError;

  fn from_str(name: &str) -> Result<Self, Self::Err> {
    FilterType::ALL
      .into_iter()
      .find(|t| t.as_str().eq_ignore_ascii_case(name))
      .ok_or_else(|| SieveError::unknown_filter(name))
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GroupSet {
  #[default]
  Unconstrained,
  Matching(BTreeSet<usize>),
}

impl GroupSet {
  /// An empty selection imposes no constraint
  pub fn from_indexes<I: IntoIterator<Item = usize>>(indexes: I) -> Self {
    let set: BTreeSet<usize> = indexes.into_iter().collect();
    if set.is_empty() {
      GroupSet::Unconstrained
    } else {
      GroupSet::Matching(set)
    }
  }

  /// Active even when empty, so "matched nothing" hides every sample
  pub fn forced<I: IntoIterator<Item = usize>>(indexes: I) -> Self {
    GroupSet::Matching(indexes.into_iter().collect())
  }

  pub fn is_active(&self) -> bool {
    matches!(self, GroupSet::Matching(_))
  }

  /// True for an active group that matched no sample at all
  pub fn matches_nothing(&self) -> bool {
    matches!(self, GroupSet::Matching(set) if set.is_empty())
  }

  pub fn contains(&self, index: usize) -> bool {
    match self {
      GroupSet::Unconstrained => true,
      GroupSet::Matching(set) => set.contains(&index),
    }
  }

  pub fn indexes(&self) -> Option<&BTreeSet<usize>> {
    match self {
      GroupSet::Unconstrained => None,
      GroupSet::Matching(set) => Some(set),
    }
  }

  /// Drop `removed` and shift every higher index down by one
  pub fn purge(&mut self, removed: usize) {
    if let GroupSet::Matching(set) = self {
      *set = shift_after_removal(set.iter().copied(), removed).collect();
    }
  }
}

/// Index remapping after a sample is spliced out of the store
pub fn shift_after_removal<I>(indexes: I, removed: usize) -> impl Iterator<Item = usize>
where
  I: Iterator<Item = usize>,
{
  indexes.filter(move |i| *i != removed).map(move |i| if i > removed { i - 1 } else { i })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterTag {
  #[serde(rename = "type")]
  pub filter: FilterType,
  pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
  groups: [GroupSet; 8],
  tags: Vec<FilterTag>,
}

impl FilterRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn group(&self, filter: FilterType) -> &GroupSet {
    &self.groups[filter.slot()]
  }

  /// Replace a group wholesale. Returns false when nothing changed.
  pub fn set_group(&mut self, filter: FilterType, set: GroupSet) -> bool {
    let slot = &mut self.groups[filter.slot()];
    if *slot == set {
      return false;
    }
    *slot = set;
    self.refresh_tags();
    true
  }

  pub fn clear(&mut self, filter: FilterType) -> bool {
    self.set_group(filter, GroupSet::Unconstrained)
  }

  pub fn is_active(&self, filter: FilterType) -> bool {
    self.group(filter).is_active()
  }

  /// Active groups in intersection order
  pub fn active_groups(&self) -> impl Iterator<Item = (FilterType, &BTreeSet<usize>)> {
    FilterType::ALL
      .into_iter()
      .filter_map(|t| self.group(t).indexes().map(|set| (t, set)))
  }

  /// Tags in activation order
  pub fn tags(&self) -> &[FilterTag] {
    &self.tags
  }

  /// Shift every group after a removal. A group the removal empties is
  /// cleared unless its type keeps empty matches.
  pub fn purge_index(&mut self, removed: usize) {
    for filter in FilterType::ALL {
      let group = &mut self.groups[filter.slot()];
      group.purge(removed);
      if group.matches_nothing() && !filter.keeps_empty() {
        *group = GroupSet::Unconstrained;
      }
    }
    self.refresh_tags();
  }

  fn refresh_tags(&mut self) {
    let groups = &self.groups;
    self.tags.retain(|tag| groups[tag.filter.slot()].is_active());

    for filter in FilterType::ALL {
      let active = self.groups[filter.slot()].is_active();
      if active && !self.tags.iter().any(|tag| tag.filter == filter) {
        self.tags.push(FilterTag { filter, message: filter.label().to_string() });
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_selection_is_unconstrained() {
    assert_eq!(GroupSet::from_indexes(Vec::new()), GroupSet::Unconstrained);
    assert!(GroupSet::forced(Vec::new()).matches_nothing());
  }

  #[test]
  fn test_purge_drops_and_shifts() {
    let mut set = GroupSet::from_indexes([1, 3, 4, 7]);
    set.purge(3);
    assert_eq!(set, GroupSet::from_indexes([1, 3, 6]));
  }

  #[test]
  fn test_emptied_groups_clear_unless_search() {
    let mut registry = FilterRegistry::new();
    registry.set_group(FilterType::Date, GroupSet::from_indexes([2]));
    registry.set_group(FilterType::Search, GroupSet::from_indexes([2]));

    registry.purge_index(2);
    assert_eq!(registry.group(FilterType::Date), &GroupSet::Unconstrained);
    assert!(registry.group(FilterType::Search).matches_nothing());

    let order: Vec<FilterType> = registry.tags().iter().map(|t| t.filter).collect();
    assert_eq!(order, vec![FilterType::Search]);
  }

  #[test]
  fn test_tags_follow_activation_order() {
    let mut registry = FilterRegistry::new();
    registry.set_group(FilterType::Search, GroupSet::from_indexes([1]));
    registry.set_group(FilterType::Date, GroupSet::from_indexes([2]));

    let order: Vec<FilterType> = registry.tags().iter().map(|t| t.filter).collect();
    assert_eq!(order, vec![FilterType::Search, FilterType::Date]);

    registry.clear(FilterType::Search);
    assert_eq!(registry.tags().len(), 1);
    assert_eq!(registry.tags()[0].message, "Dates");
  }

  #[test]
  fn test_filter_type_names_round_trip() {
    for filter in FilterType::ALL {
      assert_eq!(filter.as_str().parse::<FilterType>().unwrap(), filter);
    }
    assert!("colour".parse::<FilterType>().is_err());
  }
}
