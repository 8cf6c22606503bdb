//! Tally server binary.
//!
//! Reads `tally.toml` (or the path given with `--config`), opens the SQLite
//! store, optionally starts the snapshot mirror, and serves the JSON API.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tally_core::clock::SystemClock;
use tally_server::{
  expand_tilde, load_config,
  sync::{FileMirror, SyncWorker},
};
use tally_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, sync::oneshot};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tally attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tally.toml")]
  config: PathBuf,
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

  let server_cfg = load_config(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Only wire the outbox when something drains it.
  let mut mirror_task = None;
  let store = match &server_cfg.sync.mirror_path {
    Some(mirror_path) => {
      let (outbox, events) = tokio::sync::mpsc::unbounded_channel();
      let store = Arc::new(store.with_outbox(outbox));
      let mirror = FileMirror::new(expand_tilde(mirror_path));
      tracing::info!(path = ?mirror.path(), "mirroring snapshots");
      let worker = SyncWorker::new(store.clone(), mirror, events, &server_cfg.sync);
      let (stop, stopped) = oneshot::channel::<()>();
      let handle = tokio::spawn(worker.run(async move {
        let _ = stopped.await;
      }));
      mirror_task = Some((stop, handle));
      store
    }
    None => Arc::new(store),
  };

  let app = tally_server::router(store, Arc::new(SystemClock));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  if let Some((stop, handle)) = mirror_task {
    let _ = stop.send(());
    if let Err(e) = handle.await {
      tracing::error!(error = %e, "sync worker did not stop cleanly");
    }
  }

  Ok(())
}

async fn shutdown_signal() {
  match tokio::signal::ctrl_c().await {
    Ok(()) => tracing::info!("shutdown signal received"),
    Err(e) => {
      tracing::error!(error = %e, "failed to listen for ctrl-c");
      std::future::pending::<()>().await;
    }
  }
}
