//! View configuration
//!
//! Bin counts, overlap limits and label rules shared by every aggregator of
//! a set view. Loaded from a JSON file when one is present, otherwise the
//! defaults match the dashboard's fixed layout.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Result, SieveError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
  /// Equal-width bins spanning [0, 1] for ChrF and familiarity histograms
  #[serde(default = "default_bin_count")]
  pub bin_count: usize,
  /// Number of overlapping sets kept in the overlap chart
  #[serde(default = "default_overlap_top_k")]
  pub overlap_top_k: usize,
  /// Number of ranked keywords shown for a set
  #[serde(default = "default_max_keywords")]
  pub max_keywords: usize,
  /// Overlap labels longer than this are truncated with "..."
  #[serde(default = "default_display_name_max_len")]
  pub display_name_max_len: usize,
  /// Substrings masked when rendering source text
  #[serde(default = "default_redacted_terms")]
  pub redacted_terms: Vec<String>,
}

fn default_bin_count() -> usize {
  20
}
fn default_overlap_top_k() -> usize {
  15
}
fn default_max_keywords() -> usize {
  50
}
fn default_display_name_max_len() -> usize {
  35
}
fn default_redacted_terms() -> Vec<String> {
  vec!["iframe".to_string()]
}

impl Default for ViewConfig {
  fn default() -> Self {
    Self {
      bin_count: default_bin_count(),
      overlap_top_k: default_overlap_top_k(),
      max_keywords: default_max_keywords(),
      display_name_max_len: default_display_name_max_len(),
      redacted_terms: default_redacted_terms(),
    }
  }
}

impl ViewConfig {
  /// Load configuration from a file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let content = std::fs::read_to_string(path)?;
    let config: ViewConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
  }

  /// Load configuration from current directory or defaults
  pub fn load() -> Result<Self> {
    let config_paths = [".sieve.json", "sieve.json", ".sieve/config.json"];

    for path in &config_paths {
      if Path::new(path).exists() {
        return Self::load_from_file(path);
      }
    }

    Ok(ViewConfig::default())
  }

  /// Save configuration to a file
  pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(self)?;
    std::fs::write(path, content)?;
    Ok(())
  }

  pub fn validate(&self) -> Result<()> {
    if self.bin_count == 0 {
      return Err(SieveError::invalid_config("bin_count must be at least 1"));
    }
    if self.overlap_top_k == 0 {
      return Err(SieveError::invalid_config("overlap_top_k must be at least 1"));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn test_defaults_match_dashboard_layout() {
    let config = ViewConfig::default();
    assert_eq!(config.bin_count, 20);
    assert_eq!(config.overlap_top_k, 15);
    assert_eq!(config.max_keywords, 50);
    assert_eq!(config.display_name_max_len, 35);
    assert_eq!(config.redacted_terms, vec!["iframe".to_string()]);
  }

  #[test]
  fn test_partial_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sieve.json");
    fs::write(&path, r#"{ "bin_count": 10 }"#).unwrap();

    let config = ViewConfig::load_from_file(&path).unwrap();
    assert_eq!(config.bin_count, 10);
    assert_eq!(config.overlap_top_k, 15);
  }

  #[test]
  fn test_zero_bins_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sieve.json");
    fs::write(&path, r#"{ "bin_count": 0 }"#).unwrap();

    let err = ViewConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SieveError::InvalidConfig { .. }));
  }

  #[test]
  fn test_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    let config = ViewConfig { overlap_top_k: 5, ..ViewConfig::default() };
    config.save_to_file(&path).unwrap();

    let loaded = ViewConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
  }
}
