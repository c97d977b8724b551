//! Sentence list with search and keyword highlights
//!
//! Spans are byte offsets into `source`. Search spans and keyword spans are
//! merged per sample and sorted by start; on equal starts search spans come
//! first.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::store::RecordStore;

/// `(start, len)` byte spans recorded by a text predicate, keyed by sample index
pub type SpanMap = BTreeMap<usize, Vec<(usize, usize)>>;

pub const REDACTED_TEXT: &str = "REDACTED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
  Search,
  Keyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
  pub start: usize,
  pub len: usize,
  pub kind: HighlightKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
  Train,
  Log,
}

impl SampleKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      SampleKind::Train => "train",
      SampleKind::Log => "log",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRecord {
  /// Store index at the time the list was built
  pub index: usize,
  pub source: String,
  pub hyp: String,
  pub kind: SampleKind,
  pub highlights: Vec<HighlightSpan>,
}

/// One record per visible index, in visible order
pub fn display_records(
  store: &RecordStore,
  visible: &[usize],
  search_spans: &SpanMap,
  keyword_spans: &SpanMap,
) -> Vec<DisplayRecord> {
  visible
    .iter()
    .filter(|i| **i < store.len())
    .map(|&i| DisplayRecord {
      index: i,
      source: store.source()[i].clone(),
      hyp: store.hyp()[i].clone(),
      kind: if store.is_training()[i] { SampleKind::Train } else { SampleKind::Log },
      highlights: merge_spans(search_spans.get(&i), keyword_spans.get(&i)),
    })
    .collect()
}

pub fn merge_spans(
  search: Option<&Vec<(usize, usize)>>,
  keyword: Option<&Vec<(usize, usize)>>,
) -> Vec<HighlightSpan> {
  let mut merged: Vec<HighlightSpan> = tagged(search, HighlightKind::Search)
    .chain(tagged(keyword, HighlightKind::Keyword))
    .collect();
  merged.sort_by_key(|span| span.start);
  merged
}

fn tagged(
  spans: Option<&Vec<(usize, usize)>>,
  kind: HighlightKind,
) -> impl Iterator<Item = HighlightSpan> + '_ {
  spans
    .into_iter()
    .flatten()
    .map(move |&(start, len)| HighlightSpan { start, len, kind })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
  Plain,
  Search,
  Keyword,
}

impl From<HighlightKind> for SegmentKind {
  fn from(kind: HighlightKind) -> Self {
    match kind {
      HighlightKind::Search => SegmentKind::Search,
      HighlightKind::Keyword => SegmentKind::Keyword,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
  pub text: String,
  pub kind: SegmentKind,
}

/// Split a record's source into plain and highlighted segments.
///
/// Overlapping spans are clipped against the previous one so every byte
/// lands in exactly one segment. Redacted terms are masked per segment,
/// after slicing, so offsets always refer to the original text.
pub fn highlight_segments(record: &DisplayRecord, redacted_terms: &[String]) -> Vec<Segment> {
  let source = record.source.as_str();
  let mut segments = Vec::new();
  let mut cursor = 0;

  let mut push = |start: usize, end: usize, kind: SegmentKind| {
    if let Some(text) = source.get(start..end).filter(|t| !t.is_empty()) {
      segments.push(Segment { text: redact(text, redacted_terms), kind });
    }
  };

  for span in &record.highlights {
    let start = span.start.max(cursor);
    let end = (span.start + span.len).min(source.len());
    if end <= start || !source.is_char_boundary(start) || !source.is_char_boundary(end) {
      continue;
    }
    push(cursor, start, SegmentKind::Plain);
    push(start, end, span.kind.into());
    cursor = end;
  }
  push(cursor, source.len(), SegmentKind::Plain);

  segments
}

fn redact(text: &str, terms: &[String]) -> String {
  terms
    .iter()
    .filter(|term| !term.is_empty())
    .fold(text.to_string(), |acc, term| acc.replace(term.as_str(), REDACTED_TEXT))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(source: &str, highlights: Vec<HighlightSpan>) -> DisplayRecord {
    DisplayRecord {
      index: 0,
      source: source.to_string(),
      hyp: String::new(),
      kind: SampleKind::Log,
      highlights,
    }
  }

  #[test]
  fn test_search_spans_sort_before_keyword_on_ties() {
    let search = vec![(4, 2)];
    let keyword = vec![(0, 3), (4, 3)];
    let merged = merge_spans(Some(&search), Some(&keyword));

    let starts: Vec<(usize, HighlightKind)> = merged.iter().map(|s| (s.start, s.kind)).collect();
    assert_eq!(
      starts,
      vec![(0, HighlightKind::Keyword), (4, HighlightKind::Search), (4, HighlightKind::Keyword)]
    );
  }

  #[test]
  fn test_segments_cover_the_source_once() {
    let spans = vec![
      HighlightSpan { start: 4, len: 3, kind: HighlightKind::Search },
      HighlightSpan { start: 5, len: 4, kind: HighlightKind::Keyword },
    ];
    let segments = highlight_segments(&record("the catalog", spans), &[]);

    let joined: String = segments.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(joined, "the catalog");
    assert_eq!(segments[1], Segment { text: "cat".into(), kind: SegmentKind::Search });
    assert_eq!(segments[2], Segment { text: "al".into(), kind: SegmentKind::Keyword });
    assert_eq!(segments[3].kind, SegmentKind::Plain);
  }

  #[test]
  fn test_redacted_terms_are_masked() {
    let segments = highlight_segments(&record("an iframe tag", Vec::new()), &["iframe".to_string()]);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text, "an REDACTED tag");
  }
}
