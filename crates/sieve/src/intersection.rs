use tracing::debug;

use crate::filters::FilterRegistry;

/// Intersect every active group, starting from the full range `[0, count)`.
///
/// Groups are visited in [`crate::FilterType::ALL`] order. The result is
/// sorted ascending and never contains an index outside the store, even if
/// a group still references a stale one.
pub fn visible_indexes(registry: &FilterRegistry, count: usize) -> Vec<usize> {
  let mut working: Vec<usize> = (0..count).collect();

  for (filter, set) in registry.active_groups() {
    working.retain(|i| set.contains(i));
    debug!(group = %filter, remaining = working.len(), "applied predicate group");
    if working.is_empty() {
      break;
    }
  }

  working
}
