//! seed-sync binary.
//!
//! Replays change events (one JSON object per line, from a file or stdin)
//! through the reconciler and prints one JSON decision per line.
//!
//! ```
//! seed-sync --config seed.toml changes.jsonl
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use seed_sync::{Reconciler, SyncConfig, replay};
use tokio::io::{self, BufReader};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Classify gateway configuration changes")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "seed.toml")]
  config: PathBuf,

  /// JSON-lines file of change events; reads stdin when omitted.
  input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr; stdout carries the decisions.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = SyncConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let mut reconciler = Reconciler::new();
  let mut stdout = io::stdout();

  let stats = match &cli.input {
    Some(path) => {
      let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {path:?}"))?;
      replay(BufReader::new(file), &mut stdout, &cfg.prefix, &mut reconciler)
        .await
    }
    None => {
      replay(
        BufReader::new(io::stdin()),
        &mut stdout,
        &cfg.prefix,
        &mut reconciler,
      )
      .await
    }
  }
  .context("replay failed")?;

  tracing::info!(
    applied = stats.applied,
    skipped = stats.skipped,
    tracked = reconciler.len(),
    "replay finished"
  );

  Ok(())
}
