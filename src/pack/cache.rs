//! Memoized, strictly serialized pack builds.
//!
//! [`PackCache`] owns a map from [`PackKey`] to a shared pending-or-finished
//! build and a FIFO queue drained by a single worker task. Requests for a key
//! already in the map join the existing build; new keys are appended to the
//! queue, so no two pack commands ever run at the same time and builds start
//! in the order they were requested.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::pack::error::{PackError, PackFailure};

/// Result every requester receives.
pub type PackOutcome = Result<PathBuf, PackFailure>;

type SharedOutcome = Shared<BoxFuture<'static, PackOutcome>>;
type Job = BoxFuture<'static, ()>;

/// Identity of one build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackKey {
    pub nonce: String,
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
}

impl PackKey {
    pub fn new(nonce: impl Into<String>, source_dir: &Path, destination_dir: &Path) -> Self {
        Self {
            nonce: nonce.into(),
            source_dir: source_dir.to_path_buf(),
            destination_dir: destination_dir.to_path_buf(),
        }
    }
}

struct Entry {
    id: u64,
    outcome: SharedOutcome,
}

type Entries = Arc<Mutex<HashMap<PackKey, Entry>>>;

pub struct PackCache {
    entries: Entries,
    queue: mpsc::UnboundedSender<Job>,
    next_id: AtomicU64,
}

impl PackCache {
    /// Create a cache and spawn its worker. Must be called inside a tokio runtime.
    ///
    /// The worker exits once the cache is dropped and the queue is drained.
    pub fn new() -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        tokio::spawn(drain_queue(rx));
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            queue,
            next_id: AtomicU64::new(0),
        }
    }

    /// Get the outcome for `key`, running `build` only if no build for the
    /// key is pending or cached.
    ///
    /// Never fails outside the returned `Result`. The build runs on the
    /// worker task, so dropping this future does not cancel it.
    pub async fn request<F, Fut>(&self, key: PackKey, build: F) -> PackOutcome
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<PathBuf, PackError>> + Send + 'static,
    {
        self.enqueue(key, build).await
    }

    fn enqueue<F, Fut>(&self, key: PackKey, build: F) -> SharedOutcome
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<PathBuf, PackError>> + Send + 'static,
    {
        // Held across insert and send so queue order matches request order.
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get(&key) {
            tracing::info!(
                nonce = %key.nonce,
                source = %key.source_dir.display(),
                "Pack cache hit"
            );
            return entry.outcome.clone();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel::<PackOutcome>();
        let outcome: SharedOutcome = async move {
            rx.await
                .unwrap_or_else(|_| Err(PackFailure::from(PackError::Interrupted)))
        }
        .boxed()
        .shared();

        let job = build_job(Arc::clone(&self.entries), key.clone(), id, build, tx);
        if self.queue.send(job).is_err() {
            tracing::error!("Pack queue worker is gone; request cannot run");
            return outcome;
        }

        tracing::debug!(nonce = %key.nonce, source = %key.source_dir.display(), "Pack queued");
        entries.insert(
            key,
            Entry {
                id,
                outcome: outcome.clone(),
            },
        );
        outcome
    }

    /// Whether a pending or successful build exists for `key`.
    pub fn contains(&self, key: &PackKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

fn build_job<F, Fut>(
    entries: Entries,
    key: PackKey,
    id: u64,
    build: F,
    tx: oneshot::Sender<PackOutcome>,
) -> Job
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<PathBuf, PackError>> + Send + 'static,
{
    async move {
        tracing::debug!(nonce = %key.nonce, source = %key.source_dir.display(), "Pack started");

        let outcome = match AssertUnwindSafe(async move { build().await })
            .catch_unwind()
            .await
        {
            Ok(Ok(path)) => Ok(path),
            Ok(Err(err)) => Err(PackFailure::from(err)),
            Err(panic) => Err(PackFailure::from(PackError::Panicked(panic_message(
                panic.as_ref(),
            )))),
        };

        match &outcome {
            Ok(path) => {
                tracing::info!(
                    nonce = %key.nonce,
                    source = %key.source_dir.display(),
                    archive = %path.display(),
                    "Pack finished"
                );
            }
            Err(err) => {
                tracing::warn!(
                    nonce = %key.nonce,
                    source = %key.source_dir.display(),
                    error = %err,
                    "Pack failed, evicting cache entry"
                );
                // Evict before notifying so a retry after the failure rebuilds.
                let mut entries = entries.lock();
                if entries.get(&key).is_some_and(|entry| entry.id == id) {
                    entries.remove(&key);
                }
            }
        }

        // All requesters may have gone away; the outcome is still cached.
        let _ = tx.send(outcome);
    }
    .boxed()
}

async fn drain_queue(mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = rx.recv().await {
        job.await;
    }
    tracing::debug!("Pack queue closed");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
