//! HTTP server and background sync for Tally.
//!
//! Mounts the JSON API from `tally-api` under `/api` and, when configured,
//! mirrors store snapshots through the [`sync`] worker.

pub mod error;
pub mod sync;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use serde::Deserialize;
use tally_core::{clock::Clock, store::AttendanceStore};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `tally.toml` and
/// `TALLY_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub sync:       SyncConfig,
}

/// Snapshot mirroring. Disabled unless `mirror_path` is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  pub mirror_path:  Option<PathBuf>,
  pub debounce_ms:  u64,
  pub max_attempts: u32,
  pub backoff_ms:   u64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      mirror_path:  None,
      debounce_ms:  500,
      max_attempts: 5,
      backoff_ms:   250,
    }
  }
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 7575 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/tally/tally.db") }

/// Layer an optional TOML file under `TALLY_`-prefixed environment variables.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("TALLY")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()?
    .try_deserialize()
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

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, with request tracing.
pub fn router<S>(store: Arc<S>, clock: Arc<dyn Clock>) -> Router
where
  S: AttendanceStore + 'static,
{
  Router::new()
    .nest("/api", tally_api::api_router(store, clock))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tally_core::clock::SystemClock;
  use tally_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn from_toml(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_config_takes_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 7575);
    assert_eq!(cfg.store_path, PathBuf::from("~/.local/share/tally/tally.db"));
    assert!(cfg.sync.mirror_path.is_none());
    assert_eq!(cfg.sync.debounce_ms, 500);
    assert_eq!(cfg.sync.max_attempts, 5);
  }

  #[test]
  fn nested_sync_keys_override() {
    let cfg = from_toml(
      r#"
        port = 8080

        [sync]
        mirror_path = "/tmp/tally.json"
        backoff_ms = 10
      "#,
    );
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.sync.mirror_path, Some(PathBuf::from("/tmp/tally.json")));
    assert_eq!(cfg.sync.backoff_ms, 10);
    assert_eq!(cfg.sync.debounce_ms, 500);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/data/tally.db")),
      PathBuf::from(home).join("data/tally.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let app = router(store, Arc::new(SystemClock));

    let req = Request::builder().uri("/api/subjects").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder().uri("/subjects").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
