use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use sieve::{HeaderKey, ViewConfig};

mod commands;

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Sieve - Challenge-Set Explorer\nFilter, count and export translation challenge sets")]
#[command(version)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// View configuration file (defaults to .sieve.json / sieve.json when present)
  #[arg(long, global = true, env = "SIEVE_CONFIG")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show counts, mean scores and top keywords of a challenge set
  Summary {
    #[command(flatten)]
    set: commands::SetArgs,
  },
  /// Apply filters to a challenge set and print the visible samples
  Filter {
    #[command(flatten)]
    args: commands::FilterArgs,
  },
  /// List the challenge sets of a catalog file
  Catalog {
    /// Catalog JSON file (challengeSets array)
    meta: PathBuf,
    /// Column to sort by
    #[arg(long, default_value = "logCount", value_parser = commands::parse_header_key)]
    sort: HeaderKey,
    /// Sort ascending instead of descending
    #[arg(long)]
    ascending: bool,
  },
}

fn init_logging(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("sieve=debug,warn")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sieve=info,warn"))
  };

  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();
}

fn load_config(path: Option<&PathBuf>) -> Result<ViewConfig> {
  match path {
    Some(path) => ViewConfig::load_from_file(path)
      .with_context(|| format!("Failed to load configuration from {}", path.display())),
    None => ViewConfig::load().context("Failed to load configuration"),
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let config = load_config(cli.config.as_ref())?;

  match cli.command {
    Commands::Summary { set } => commands::summary(&set, config)?,
    Commands::Filter { args } => commands::filter(&args, config)?,
    Commands::Catalog { meta, sort, ascending } => commands::catalog(&meta, sort, ascending)?,
  }

  Ok(())
}
