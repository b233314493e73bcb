//! Async utilities for driving a sync pass alongside its event channel.
//!
//! The CLI hands the pass an event sender, then uses [`run_with_events`] to
//! render progress while the pass runs and to flush whatever was still
//! queued when it returns.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

/// Maximum time to drain remaining events after the task completes, in case
/// a detached task is still holding a sender.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Drive `task` to completion, calling `on_event` for every event received
/// on `event_rx` while it runs and after it returns.
pub async fn run_with_events<F, E, R>(
    task: F,
    mut event_rx: mpsc::UnboundedReceiver<E>,
    mut on_event: impl FnMut(E),
) -> R
where
    F: Future<Output = R>,
{
    tokio::pin!(task);
    let mut event_count: u64 = 0;

    let result = loop {
        tokio::select! {
            r = &mut task => break Some(r),
            event = event_rx.recv() => match event {
                Some(e) => {
                    event_count += 1;
                    on_event(e);
                }
                None => {
                    log::debug!("run_with_events: channel closed before task finished ({event_count} events)");
                    break None;
                }
            }
        }
    };

    let Some(result) = result else {
        return task.await;
    };

    let deadline = Instant::now() + DRAIN_TIMEOUT;
    loop {
        match tokio::time::timeout_at(deadline, event_rx.recv()).await {
            Ok(Some(e)) => {
                event_count += 1;
                on_event(e);
            }
            Ok(None) => break,
            Err(_) => {
                log::warn!(
                    "run_with_events: drain timed out after {}s, senders likely leaked",
                    DRAIN_TIMEOUT.as_secs()
                );
                break;
            }
        }
    }
    log::debug!("run_with_events: finished ({event_count} events)");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delivers_events_sent_before_return() {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = async move {
            for i in 0..5u32 {
                tx.send(i).unwrap();
            }
            "done"
        };

        let mut seen = Vec::new();
        let result = run_with_events(task, rx, |e| seen.push(e)).await;
        assert_eq!(result, "done");
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_channel_closed_first_still_returns_result() {
        let (tx, rx) = mpsc::unbounded_channel::<u32>();
        drop(tx);
        let task = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            42
        };
        let result = run_with_events(task, rx, |_| {}).await;
        assert_eq!(result, 42);
    }
}
