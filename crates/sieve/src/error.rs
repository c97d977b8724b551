use thiserror::Error;

#[derive(Error, Debug)]
pub enum SieveError {
  #[error("Column '{column}' has {actual} values but the set has {expected} samples")]
  MismatchedColumn { column: String, expected: usize, actual: usize },

  #[error("Date '{value}' is not a valid YYYYMMDD day")]
  InvalidDate { value: u32 },

  #[error("Unknown filter group '{name}'")]
  UnknownFilter { name: String },

  #[error("Invalid configuration: {message}")]
  InvalidConfig { message: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

impl SieveError {
  pub fn mismatched_column(column: impl Into<String>, expected: usize, actual: usize) -> Self {
    Self::MismatchedColumn { column: column.into(), expected, actual }
  }

  pub fn invalid_date(value: u32) -> Self {
    Self::InvalidDate { value }
  }

  pub fn unknown_filter(name: impl Into<String>) -> Self {
    Self::UnknownFilter { name: name.into() }
  }

  pub fn invalid_config(message: impl Into<String>) -> Self {
    Self::InvalidConfig { message: message.into() }
  }
}

pub type Result<T> = std::result::Result<T, SieveError>;
