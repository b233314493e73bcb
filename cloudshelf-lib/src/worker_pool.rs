//! Fixed-size worker pool for slow, blocking-heavy work items.
//!
//! Spawns N persistent tokio tasks that pull items from a bounded
//! async-channel. Each worker gets its own clone of the `Receiver`, so no
//! worker ever holds a lock while waiting for work. Results come back on an
//! unbounded channel.
//!
//! Workers stop taking new items once the pool's [`CancelToken`] fires;
//! items already running are left to observe the token themselves.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::cancel::CancelToken;

/// Default per-item safety net. Work items are expected to enforce their
/// own, shorter, deadlines; this only stops a wedged item from starving
/// the pool forever.
pub const DEFAULT_SAFETY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Result of one work item.
#[derive(Debug)]
pub enum PoolOutput<R> {
    Done(R),
    /// The item exceeded the safety timeout and was abandoned.
    TimedOut,
}

/// A pool of worker tasks that process items concurrently.
///
/// # Example
///
/// ```ignore
/// let mut pool = WorkerPool::start(4, items, cancel, |item| async move {
///     transcode(item).await
/// });
///
/// while let Some(output) = pool.recv().await {
///     handle(output);
/// }
/// ```
pub struct WorkerPool<R: Send + 'static> {
    result_rx: mpsc::UnboundedReceiver<PoolOutput<R>>,
    handles: Vec<JoinHandle<()>>,
}

impl<R: Send + 'static> WorkerPool<R> {
    /// Spawn `n` workers and feed them `items`, with the default safety timeout.
    pub fn start<W, F, Fut>(n: usize, items: Vec<W>, cancel: CancelToken, process_fn: F) -> Self
    where
        W: Send + 'static,
        F: Fn(W) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        Self::start_with_timeout(n, items, cancel, DEFAULT_SAFETY_TIMEOUT, process_fn)
    }

    /// Spawn `n` workers (at least one) and feed them `items`.
    ///
    /// Items are submitted from a background task through a channel of
    /// capacity `n`, so the caller can start receiving immediately.
    pub fn start_with_timeout<W, F, Fut>(
        n: usize,
        items: Vec<W>,
        cancel: CancelToken,
        safety_timeout: Duration,
        process_fn: F,
    ) -> Self
    where
        W: Send + 'static,
        F: Fn(W) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let n = n.max(1);
        let (work_tx, work_rx) = async_channel::bounded::<W>(n);
        let (result_tx, result_rx) = mpsc::unbounded_channel::<PoolOutput<R>>();
        let process_fn = Arc::new(process_fn);

        let handles: Vec<JoinHandle<()>> = (0..n)
            .map(|worker| {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let process_fn = process_fn.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    while let Ok(item) = work_rx.recv().await {
                        if cancel.is_cancelled() {
                            log::debug!("Worker {worker}: cancelled, dropping queued items");
                            break;
                        }
                        let output =
                            match tokio::time::timeout(safety_timeout, process_fn(item)).await {
                                Ok(r) => PoolOutput::Done(r),
                                Err(_) => {
                                    log::warn!(
                                        "Worker {worker}: item timed out after {}s, skipping",
                                        safety_timeout.as_secs()
                                    );
                                    PoolOutput::TimedOut
                                }
                            };
                        if result_tx.send(output).is_err() {
                            break; // Receiver dropped
                        }
                    }
                })
            })
            .collect();

        // Channel closes once every worker has dropped its sender.
        drop(result_tx);

        tokio::spawn(async move {
            for item in items {
                if cancel.is_cancelled() || work_tx.send(item).await.is_err() {
                    break;
                }
            }
        });

        Self { result_rx, handles }
    }

    /// Receive the next result. Returns `None` once every worker has exited.
    pub async fn recv(&mut self) -> Option<PoolOutput<R>> {
        self.result_rx.recv().await
    }

    /// Number of workers in the pool.
    pub fn size(&self) -> usize {
        self.handles.len()
    }
}
