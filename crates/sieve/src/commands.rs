use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::warn;

use sieve::aggregate::sentences::{highlight_segments, SegmentKind};
use sieve::aggregate::Histogram;
use sieve::catalog::{sort_catalog, summarize};
use sieve::{
  ChallengeSetMeta, ChallengeSetType, HeaderKey, IntersectionData, RecordStore, ScoreMetric,
  SetView, SourceIdMap, ViewConfig, REDACTED_LABEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  Pretty,
  Json,
}

/// Which challenge set to open and how to label it
#[derive(Args, Debug)]
pub struct SetArgs {
  /// Challenge-set JSON document
  pub data: PathBuf,
  /// Display name (defaults to the file stem)
  #[arg(long)]
  pub name: Option<String>,
  /// Challenge-set family
  #[arg(long = "type", default_value = "topic", value_parser = parse_set_type)]
  pub set_type: ChallengeSetType,
}

#[derive(Args, Debug)]
pub struct FilterArgs {
  #[command(flatten)]
  pub set: SetArgs,
  /// Keep samples from this day (YYYYMMDD); repeatable
  #[arg(long = "date")]
  pub dates: Vec<String>,
  /// Case-insensitive search key (regular expression or literal text)
  #[arg(long)]
  pub search: Option<String>,
  /// Keep samples containing this keyword; repeatable
  #[arg(long = "keyword")]
  pub keywords: Vec<String>,
  /// ChrF brush bounds
  #[arg(long, num_args = 2, value_names = ["LO", "HI"])]
  pub chrf: Option<Vec<f64>>,
  /// Familiarity brush bounds
  #[arg(long, num_args = 2, value_names = ["LO", "HI"])]
  pub familiarity: Option<Vec<f64>>,
  /// Keep log samples from this source id; repeatable
  #[arg(long = "source-id")]
  pub source_ids: Vec<String>,
  /// Source-id lookup table (dataset-id-map.json)
  #[arg(long)]
  pub source_map: Option<PathBuf>,
  /// Challenge-set intersection table (challenge-intersections.json)
  #[arg(long)]
  pub intersections: Option<PathBuf>,
  /// Key of this set in the intersection table (defaults to the data file name)
  #[arg(long)]
  pub set_file: Option<String>,
  /// Keep samples shared with this overlapping set; repeatable
  #[arg(long = "other-set")]
  pub other_sets: Vec<String>,
  /// Number of sentences to print
  #[arg(long, default_value_t = 10)]
  pub limit: usize,
  /// Output format
  #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
  pub format: OutputFormat,
  /// Write the visible source/translation pairs into this directory
  #[arg(long)]
  pub export: Option<PathBuf>,
}

fn parse_set_type(value: &str) -> std::result::Result<ChallengeSetType, String> {
  value.parse()
}

pub fn parse_header_key(value: &str) -> std::result::Result<HeaderKey, String> {
  value.parse()
}

fn display_name(data: &Path, name: Option<&str>) -> String {
  name
    .map(str::to_string)
    .or_else(|| data.file_stem().map(|s| s.to_string_lossy().into_owned()))
    .unwrap_or_else(|| "challenge-set".to_string())
}

fn file_name_of(path: &Path) -> String {
  path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

fn load_store(path: &Path) -> Result<RecordStore> {
  RecordStore::load(path)
    .with_context(|| format!("Failed to load challenge set from {}", path.display()))
}

/// Print the set summary and its top keywords
pub fn summary(set: &SetArgs, config: ViewConfig) -> Result<()> {
  let store = load_store(&set.data)?;
  let name = display_name(&set.data, set.name.as_deref());
  let file_name = file_name_of(&set.data);
  let row = summarize(&file_name, &name, set.set_type, &store);

  println!("{} ({})", row.display_name.bold(), row.set_type.to_string().cyan());
  println!("  samples:     {}", row.count);
  println!("  training:    {}", row.train_count.to_string().green());
  println!("  usage logs:  {}", row.log_count.to_string().yellow());
  println!("  mean ChrF:   {}", format_score(row.chrf));
  println!("  familiarity: {}", format_score(row.familiarity));
  println!("  train ratio: {}", format_score(row.train_log_ratio));

  let view = SetView::new(name, set.set_type, store, config);
  let keywords = view.keywords();
  if keywords.is_empty() {
    return Ok(());
  }

  println!();
  println!("{}", "Keywords".bold());
  for keyword in keywords {
    println!("  {} {:.4}", format!("{:<24}", keyword.word).magenta(), keyword.weight);
  }
  Ok(())
}

/// Apply every requested predicate and print the resulting view
pub fn filter(args: &FilterArgs, config: ViewConfig) -> Result<()> {
  let store = load_store(&args.set.data)?;
  let name = display_name(&args.set.data, args.set.name.as_deref());
  let mut view = SetView::new(name, args.set.set_type, store, config);

  if let Some(path) = &args.source_map {
    match SourceIdMap::load(path) {
      Ok(map) => view = view.with_source_map(map),
      Err(e) => warn!(path = %path.display(), "could not load source-id table: {e}"),
    }
  }

  if let Some(path) = &args.intersections {
    let set_file = args.set_file.clone().unwrap_or_else(|| file_name_of(&args.set.data));
    match IntersectionData::load(path) {
      Ok(data) => match data.overlaps_for(args.set.set_type, &set_file) {
        Some(overlaps) => view = view.with_overlaps(overlaps),
        None => warn!(set = %set_file, "set has no entry in the intersection table"),
      },
      Err(e) => warn!(path = %path.display(), "could not load intersection table: {e}"),
    }
  }

  apply_predicates(&mut view, args);

  match args.format {
    OutputFormat::Json => {
      let mut snapshot = view.snapshot();
      snapshot.sentences.truncate(args.limit);
      println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    OutputFormat::Pretty => print_view(&view, args.limit),
  }

  if let Some(dir) = &args.export {
    let path = view
      .export_to_dir(dir)
      .with_context(|| format!("Failed to export into {}", dir.display()))?;
    if args.format == OutputFormat::Pretty {
      println!();
      println!("{} Exported {} pairs to {}", "✓".green(), view.sentences().len(), path.display());
    }
  }

  Ok(())
}

fn apply_predicates(view: &mut SetView, args: &FilterArgs) {
  if !args.dates.is_empty() {
    view.set_dates(args.dates.iter().cloned());
  }
  if let Some(key) = &args.search {
    view.set_search_key(key);
  }
  for keyword in &args.keywords {
    view.toggle_keyword(keyword);
  }
  if let Some([lo, hi]) = args.chrf.as_deref() {
    view.brush_scores(ScoreMetric::Chrf, *lo, *hi);
  }
  if let Some([lo, hi]) = args.familiarity.as_deref() {
    view.brush_scores(ScoreMetric::Familiarity, *lo, *hi);
  }
  if !args.source_ids.is_empty() {
    let keys = args.source_ids.iter().map(|id| {
      if id == REDACTED_LABEL || id.eq_ignore_ascii_case("redacted") {
        None
      } else {
        Some(id.clone())
      }
    });
    view.set_source_ids(keys);
  }
  for other in &args.other_sets {
    view.toggle_other_set(other);
  }
}

fn print_view(view: &SetView, limit: usize) {
  println!("{}", view.name().bold());

  if view.tags().is_empty() {
    println!("  filters: {}", "none".dimmed());
  } else {
    let labels: Vec<String> = view.tags().iter().map(|t| format!("[{}]", t.message)).collect();
    println!("  filters: {}", labels.join(" ").cyan());
  }
  println!(
    "  visible: {} ({} training, {} log)",
    view.visible().len().to_string().bold(),
    view.training_count().to_string().green(),
    view.log_count().to_string().yellow()
  );

  print_histogram("ChrF", &view.histogram(ScoreMetric::Chrf), "training samples");
  print_histogram("Familiarity", &view.histogram(ScoreMetric::Familiarity), "log samples");

  if let Some(chart) = view.source_id_counts() {
    println!();
    println!("{} ({})", "Input Source".bold(), chart.caption.describe("log samples"));
    for category in chart.categories.iter().filter(|c| c.count > 0) {
      println!("  {:<32} {}", category.display_name, category.count);
    }
  }

  if let Some(overlaps) = view.overlap_counts() {
    println!();
    println!("{}", "Overlapping Sets".bold());
    for overlap in overlaps.iter().filter(|o| o.count > 0) {
      println!("  {:<40} {} / {}", overlap.display_name, overlap.count, overlap.total);
    }
  }

  println!();
  println!("{}", "Sentences".bold());
  let redacted = &view.config().redacted_terms;
  for record in view.sentences().iter().take(limit) {
    let text: String = highlight_segments(record, redacted)
      .into_iter()
      .map(|segment| match segment.kind {
        SegmentKind::Plain => segment.text.normal().to_string(),
        SegmentKind::Search => segment.text.yellow().bold().to_string(),
        SegmentKind::Keyword => segment.text.magenta().underline().to_string(),
      })
      .collect();
    println!("  {} {}", format!("[{}]", record.kind.as_str()).dimmed(), text);
    println!("        {}", record.hyp.dimmed());
  }
  if view.sentences().len() > limit {
    println!("  {}", format!("... {} more", view.sentences().len() - limit).dimmed());
  }
}

fn print_histogram(title: &str, histogram: &Histogram, noun: &str) {
  if histogram.caption.total == 0 {
    return;
  }
  println!();
  println!("{} ({})", title.bold(), histogram.caption.describe(noun));
  for bin in histogram.bins.iter().filter(|b| b.count > 0) {
    println!("  [{:.2}, {:.2}) {}", bin.start, bin.end, bin.count);
  }
}

fn format_score(value: Option<f64>) -> String {
  value.map_or_else(|| "-".dimmed().to_string(), |v| format!("{v:.3}"))
}

/// Print the challenge-set table
pub fn catalog(path: &Path, sort: HeaderKey, ascending: bool) -> Result<()> {
  let mut meta = ChallengeSetMeta::load(path)
    .with_context(|| format!("Failed to load challenge-set catalog from {}", path.display()))?;
  sort_catalog(&mut meta.challenge_sets, sort, !ascending);

  let header = format!(
    "{:<36} {:>10} {:>8} {:>8} {:>8} {:>8}",
    "Name", "Type", "Logs", "Train", "ChrF", "Famil."
  );
  println!("{}", header.bold());
  for set in &meta.challenge_sets {
    println!(
      "{:<36} {:>10} {:>8} {:>8} {:>8} {:>8}",
      set.display_name,
      set.set_type.to_string(),
      set.log_count,
      set.train_count,
      set.chrf.map_or_else(|| "-".to_string(), |v| format!("{v:.3}")),
      set.familiarity.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
    );
  }
  Ok(())
}
