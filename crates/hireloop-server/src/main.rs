//! hireloop-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the JSON API over HTTP. Authentication is expected to
//! happen in a proxy in front of this process; see [`ServerConfig`].

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use hireloop_server::{ServerConfig, open_store, router};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Hireloop marketplace server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Open the store, seed the category list, and exit.
  #[arg(long)]
  seed_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut cfg = ServerConfig::load(&cli.config)?;
  if cli.seed_only {
    cfg.seed_taxonomy = true;
  }

  let store = open_store(&cfg).await?;
  if cli.seed_only {
    return Ok(());
  }

  let app = router(Arc::new(store), &cfg)?;
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
