//! Export of the visible source/translation pairs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::aggregate::DisplayRecord;
use crate::Result;

/// On-disk export shape: two index-aligned arrays in visible order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
  pub source: Vec<String>,
  pub translation: Vec<String>,
}

impl ExportPayload {
  pub fn from_records(records: &[DisplayRecord]) -> Self {
    let (source, translation) =
      records.iter().map(|r| (r.source.clone(), r.hyp.clone())).unzip();
    Self { source, translation }
  }

  pub fn len(&self) -> usize {
    self.source.len()
  }

  pub fn is_empty(&self) -> bool {
    self.source.is_empty()
  }

  /// Write `challenge-set-<display name>.json` into `dir`
  pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P, display_name: &str) -> Result<PathBuf> {
    let path = dir.as_ref().join(export_file_name(display_name));
    let content = serde_json::to_string(self)?;
    fs::write(&path, content)?;
    info!(path = %path.display(), pairs = self.len(), "exported challenge set");
    Ok(path)
  }
}

pub fn export_file_name(display_name: &str) -> String {
  let safe: String = display_name
    .chars()
    .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
    .collect();
  format!("challenge-set-{safe}.json")
}
