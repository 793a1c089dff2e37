//! HTTP server wiring for Hireloop.
//!
//! Turns a [`ServerConfig`] into an opened store and an axum [`Router`] with
//! the JSON API mounted under `/api`. The binary in `main.rs` only parses the
//! command line and loads configuration.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{Router, http::HeaderName};
use hireloop_api::{ApiState, DEFAULT_IDENTITY_HEADER, api_router};
use hireloop_core::store::{MarketplaceStore, TaxonomyStore};
use hireloop_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `HIRELOOP_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// Header the upstream identity proxy writes the verified email into.
  #[serde(default = "default_identity_header")]
  pub identity_header: String,
  /// Insert the fixed category list on startup if any are missing.
  #[serde(default = "default_seed_taxonomy")]
  pub seed_taxonomy:   bool,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/hireloop/hireloop.db") }

fn default_identity_header() -> String { DEFAULT_IDENTITY_HEADER.into() }

fn default_seed_taxonomy() -> bool { true }

impl ServerConfig {
  /// Load from an optional TOML file, overridden by `HIRELOOP_*` variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("HIRELOOP"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn identity_header(&self) -> anyhow::Result<HeaderName> {
    HeaderName::try_from(self.identity_header.to_lowercase())
      .with_context(|| format!("invalid identity header {:?}", self.identity_header))
  }
}

// ─── Startup ─────────────────────────────────────────────────────────────────

/// Open the store named by `cfg`, seeding the taxonomy when configured.
pub async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cfg.seed_taxonomy {
    let inserted = store
      .seed_categories()
      .await
      .context("failed to seed categories")?;
    tracing::info!(inserted, "seeded categories");
  }
  Ok(store)
}

/// The full application: the API under `/api`, with request tracing.
pub fn router<S>(store: Arc<S>, cfg: &ServerConfig) -> anyhow::Result<Router>
where
  S: MarketplaceStore + Clone + 'static,
{
  let state = ApiState::new(store).with_identity_header(cfg.identity_header()?);
  Ok(
    Router::new()
      .nest("/api", api_router(state))
      .layer(TraceLayer::new_for_http()),
  )
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests;
