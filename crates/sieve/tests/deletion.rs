use sieve::{
  ChallengeData, ChallengeSetType, FilterType, GroupSet, RecordStore, ScoreMetric, SetView,
  ViewConfig,
};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn data() -> ChallengeData {
  ChallengeData {
    source: vec![
      "red apple".into(),
      "green pear".into(),
      "red cherry".into(),
      "yellow lemon".into(),
      "red apple".into(),
      "red grape".into(),
    ],
    hyp: vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into(), "f".into()],
    x: vec![0.0; 6],
    y: vec![0.0; 6],
    source_id: vec![None; 6],
    date: vec![
      Some(20230101),
      Some(20230101),
      Some(20230102),
      Some(20230102),
      Some(20230103),
      Some(20230103),
    ],
    train: vec![1, 0, 1, 0, 0, 1],
    chrf: vec![Some(0.2), None, Some(0.5), None, None, Some(0.8)],
    familiarity: vec![None, Some(0.4), None, Some(0.9), Some(0.1), None],
    keywords: Vec::new(),
  }
}

fn view() -> SetView {
  let store = RecordStore::from_data(data()).unwrap();
  SetView::new("Fruit", ChallengeSetType::UnitTest, store, ViewConfig::default())
}

fn group(view: &SetView, filter: FilterType) -> Vec<usize> {
  view.registry().group(filter).indexes().map(|s| s.iter().copied().collect()).unwrap_or_default()
}

#[test]
fn test_deletion_shifts_every_group() {
  let mut view = view();
  view.set_search_key("red");
  view.set_dates(["20230102", "20230103"]);
  assert_eq!(group(&view, FilterType::Search), vec![0, 2, 4, 5]);
  assert_eq!(group(&view, FilterType::Date), vec![2, 3, 4, 5]);

  let removed = view.delete_by_source("red cherry");
  assert_eq!(removed, Some(2));
  assert_eq!(view.store().len(), 5);

  assert_eq!(group(&view, FilterType::Search), vec![0, 3, 4]);
  assert_eq!(group(&view, FilterType::Date), vec![2, 3, 4]);
  assert_eq!(view.visible(), &[3, 4]);

  let sources: Vec<&str> = view.sentences().iter().map(|r| r.source.as_str()).collect();
  assert_eq!(sources, vec!["red apple", "red grape"]);
  assert_eq!(view.sentences()[1].index, 4);
  assert_eq!(view.sentences()[1].highlights[0].start, 0);
}

#[test]
fn test_duplicate_text_deletes_first_occurrence() {
  let mut view = view();
  assert_eq!(view.delete_by_source("red apple"), Some(0));
  assert_eq!(view.store().position_of_source("red apple"), Some(3));
}

#[test]
fn test_unknown_text_is_a_no_op() {
  let mut view = view();
  view.set_dates(["20230101"]);
  let before = view.snapshot();

  assert_eq!(view.delete_by_source("blue berry"), None);
  assert_eq!(view.store().len(), 6);
  assert_eq!(view.snapshot(), before);
}

#[test]
fn test_search_emptied_by_deletion_stays_active() {
  let mut view = view();
  view.set_search_key("lemon");
  assert_eq!(view.visible(), &[3]);

  let record = view.sentences()[0].clone();
  view.delete_record(&record);

  assert_eq!(view.registry().group(FilterType::Search), &GroupSet::forced(Vec::new()));
  view.sync_filters();
  assert!(view.visible().is_empty());
}

#[test]
fn test_date_group_emptied_by_deletion_is_cleared() {
  let mut view = view();
  view.set_dates(["20230101"]);
  assert_eq!(view.visible(), &[0, 1]);

  view.delete_by_source("red apple");
  view.delete_by_source("green pear");
  assert_eq!(view.registry().group(FilterType::Date), &GroupSet::Unconstrained);
  assert!(view.tags().is_empty());

  view.sync_filters();
  assert_eq!(view.visible(), &[0, 1, 2, 3]);
}

#[test]
fn test_grand_totals_follow_the_store() {
  let mut view = view();
  assert_eq!(view.histogram(ScoreMetric::Chrf).caption.total, 3);

  view.delete_by_source("red grape");
  view.sync_filters();
  let histogram = view.histogram(ScoreMetric::Chrf);
  assert_eq!(histogram.caption.total, 2);
  assert_eq!(histogram.total(), 2);
}

#[test]
fn test_overlap_buckets_are_shifted() {
  let mut overlaps = BTreeMap::new();
  overlaps.insert("challenge-topic-4_fruit".to_string(), vec![1, 3, 5]);
  let mut view = view().with_overlaps(&overlaps);

  view.delete_by_source("red apple");
  view.toggle_other_set("fruit");
  assert_eq!(view.visible(), &[0, 2, 4]);

  let sources: Vec<&str> = view.sentences().iter().map(|r| r.source.as_str()).collect();
  assert_eq!(sources, vec!["green pear", "yellow lemon", "red grape"]);
}

#[test]
fn test_export_follows_visible_order() {
  let mut view = view();
  view.set_search_key("red");
  view.delete_by_source("red cherry");

  let payload = view.export_payload();
  assert_eq!(payload.source, vec!["red apple", "red apple", "red grape"]);
  assert_eq!(payload.translation, vec!["a", "e", "f"]);

  let temp_dir = TempDir::new().unwrap();
  let path = view.export_to_dir(temp_dir.path()).unwrap();
  assert_eq!(path.file_name().unwrap(), "challenge-set-Fruit.json");
}
