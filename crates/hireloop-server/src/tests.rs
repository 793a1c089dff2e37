use std::{path::PathBuf, sync::Arc};

use axum::{
  body::Body,
  http::{Request, StatusCode},
};
use hireloop_core::store::TaxonomyStore;
use hireloop_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use super::*;

fn config(identity_header: &str) -> ServerConfig {
  ServerConfig {
    host:            "127.0.0.1".into(),
    port:            0,
    store_path:      PathBuf::from(":memory:"),
    identity_header: identity_header.into(),
    seed_taxonomy:   true,
  }
}

#[test]
fn missing_file_falls_back_to_defaults() {
  let cfg = ServerConfig::load(Path::new("/nonexistent/hireloop.toml")).unwrap();
  assert_eq!(cfg.port, 8080);
  assert_eq!(cfg.identity_header, DEFAULT_IDENTITY_HEADER);
  assert!(cfg.seed_taxonomy);
}

#[test]
fn identity_header_is_validated() {
  assert_eq!(
    config("X-Forwarded-Email").identity_header().unwrap(),
    HeaderName::from_static("x-forwarded-email")
  );
  assert!(config("not a header").identity_header().is_err());
}

#[test]
fn tilde_expands_to_home() {
  let expanded = expand_tilde(Path::new("~/data/hireloop.db"));
  if let Ok(home) = std::env::var("HOME") {
    assert_eq!(expanded, PathBuf::from(home).join("data/hireloop.db"));
  }
  assert_eq!(expand_tilde(Path::new("/abs.db")), PathBuf::from("/abs.db"));
}

#[tokio::test]
async fn api_is_mounted_under_prefix_with_configured_header() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store.seed_categories().await.unwrap();
  let app = router(Arc::new(store), &config("x-forwarded-email")).unwrap();

  let req = Request::builder()
    .uri("/api/categories")
    .header("x-forwarded-email", "kiran@example.com")
    .body(Body::empty())
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let categories: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(categories.as_array().unwrap().len(), 7);

  // The default header is not honoured once another is configured.
  let req = Request::builder()
    .uri("/api/categories")
    .header(DEFAULT_IDENTITY_HEADER, "kiran@example.com")
    .body(Body::empty())
    .unwrap();
  let resp = app.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
