//! Background snapshot sync.
//!
//! The store announces every committed mutation on its outbox. The
//! [`SyncWorker`] drains that channel, waits until writes have been quiet for
//! the debounce window, exports a snapshot and hands it to a [`SnapshotSink`].
//! A snapshot whose content digest matches the last successful push is
//! skipped. Failed pushes are retried with exponential backoff.

use std::{
  future::Future,
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use sha2::{Digest, Sha256};
use tally_core::{event::StoreEvent, snapshot::Snapshot, store::AttendanceStore};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
  SyncConfig,
  error::{Error, Result},
};

// ─── Sinks ───────────────────────────────────────────────────────────────────

/// Somewhere a serialised snapshot can be delivered.
pub trait SnapshotSink: Send + Sync {
  fn push(&self, snapshot: &[u8]) -> impl Future<Output = Result<()>> + Send;
}

/// Mirror snapshots to a local file, replacing it atomically.
#[derive(Debug, Clone)]
pub struct FileMirror {
  path: PathBuf,
}

impl FileMirror {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }
}

impl SnapshotSink for FileMirror {
  async fn push(&self, snapshot: &[u8]) -> Result<()> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = self.path.with_extension("tmp");
    tokio::fs::write(&tmp, snapshot).await?;
    tokio::fs::rename(&tmp, &self.path).await?;
    Ok(())
  }
}

// ─── Digest ──────────────────────────────────────────────────────────────────

/// SHA-256 over the snapshot content, ignoring the export timestamp.
pub fn content_digest(snapshot: &Snapshot) -> Result<String> {
  let mut canonical = snapshot.clone();
  canonical.exported_at = None;
  let bytes = serde_json::to_vec(&canonical)?;
  Ok(hex::encode(Sha256::digest(&bytes)))
}

// ─── Worker ──────────────────────────────────────────────────────────────────

pub struct SyncWorker<S, K> {
  store:        Arc<S>,
  sink:         K,
  events:       UnboundedReceiver<StoreEvent>,
  debounce:     Duration,
  max_attempts: u32,
  backoff:      Duration,
  last_digest:  Option<String>,
}

impl<S, K> SyncWorker<S, K>
where
  S: AttendanceStore,
  K: SnapshotSink,
{
  pub fn new(
    store: Arc<S>,
    sink: K,
    events: UnboundedReceiver<StoreEvent>,
    config: &SyncConfig,
  ) -> Self {
    Self {
      store,
      sink,
      events,
      debounce: Duration::from_millis(config.debounce_ms),
      max_attempts: config.max_attempts.max(1),
      backoff: Duration::from_millis(config.backoff_ms),
      last_digest: None,
    }
  }

  /// Push once at startup, then once per burst of store events, until the
  /// outbox closes or `shutdown` resolves. Shutdown flushes a final snapshot.
  pub async fn run(mut self, shutdown: impl Future<Output = ()> + Send) {
    tokio::pin!(shutdown);
    self.sync_logged().await;

    loop {
      let next = tokio::select! {
        event = self.events.recv() => Some(event),
        () = &mut shutdown => None,
      };
      let event = match next {
        Some(Some(event)) => event,
        Some(None) => break,
        None => {
          self.sync_logged().await;
          tracing::info!("shutdown requested; sync worker stopping");
          return;
        }
      };

      let mut batched = 1usize;
      let mut closed = false;
      tracing::trace!(?event, "store changed; debouncing");

      loop {
        match tokio::time::timeout(self.debounce, self.events.recv()).await {
          Ok(Some(_)) => batched += 1,
          Ok(None) => {
            closed = true;
            break;
          }
          Err(_) => break,
        }
      }

      tracing::debug!(events = batched, "debounce window elapsed");
      self.sync_logged().await;
      if closed {
        break;
      }
    }

    tracing::info!("store outbox closed; sync worker stopping");
  }

  async fn sync_logged(&mut self) {
    if let Err(e) = self.sync_once().await {
      tracing::error!(error = %e, "snapshot sync failed");
    }
  }

  /// Export and push if the content changed. Returns whether a push
  /// happened.
  pub async fn sync_once(&mut self) -> Result<bool> {
    let snapshot = self
      .store
      .export_snapshot()
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    let digest = content_digest(&snapshot)?;
    if self.last_digest.as_deref() == Some(digest.as_str()) {
      tracing::debug!(%digest, "snapshot unchanged; skipping push");
      return Ok(false);
    }

    let bytes = snapshot.to_json_pretty()?;
    push_with_backoff(&self.sink, &bytes, self.max_attempts, self.backoff).await?;
    tracing::info!(%digest, bytes = bytes.len(), "pushed snapshot");
    self.last_digest = Some(digest);
    Ok(true)
  }
}

async fn push_with_backoff<K: SnapshotSink>(
  sink: &K,
  bytes: &[u8],
  max_attempts: u32,
  backoff: Duration,
) -> Result<()> {
  let mut delay = backoff;
  let mut attempt = 1;
  loop {
    match sink.push(bytes).await {
      Ok(()) => return Ok(()),
      Err(e) if attempt >= max_attempts => {
        return Err(Error::GaveUp { attempts: attempt, last: Box::new(e) });
      }
      Err(e) => {
        tracing::warn!(attempt, error = %e, ?delay, "snapshot push failed; retrying");
        tokio::time::sleep(delay).await;
        delay = delay.saturating_mul(2);
        attempt += 1;
      }
    }
  }
}
