//! Stage A: concurrent image downloads and launch-script writes.
//!
//! Every task runs on the driver's task through `buffer_unordered`, sharing
//! one HTTP client and bounded to `workers` requests in flight. A missing
//! remote image only skips that slot; a failed script write aborts the pass.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use cloudshelf_core::{ArtifactCounts, ArtifactKey, ArtifactKind};
use cloudshelf_lib::CancelToken;
use futures::stream::{self, StreamExt};

use crate::error::{FetchError, SyncError};
use crate::events::{ProgressReporter, SyncEvent};
use crate::planner::{DownloadTask, TaskSource, launch_script};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the body of a remote asset.
///
/// Anything other than a 200 response is an error; the orchestrator turns
/// it into a skipped slot.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`Fetcher`] over a shared `reqwest` connection pool.
#[derive(Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status(status));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Prefix protocol-relative URIs (`//host/path`) with `https:`.
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

/// Per-kind tallies of one download stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub created: ArtifactCounts,
    pub skipped: ArtifactCounts,
}

enum TaskOutcome {
    Created(ArtifactKind),
    Skipped {
        key: ArtifactKey,
        kind: ArtifactKind,
        reason: String,
    },
    Cancelled,
}

/// Run every download task with at most `workers` in flight.
///
/// Returns early with an error on the first script write failure; the
/// remaining in-flight tasks are dropped. Cancellation makes pending
/// tasks return without writing.
pub(crate) async fn execute<F: Fetcher>(
    tasks: Vec<DownloadTask>,
    fetcher: &F,
    workers: usize,
    cancel: &CancelToken,
    progress: &mut ProgressReporter,
    span: (u8, u8),
) -> Result<DownloadReport, SyncError> {
    let total = tasks.len();
    let mut report = DownloadReport::default();
    let mut done = 0usize;

    let mut results = stream::iter(tasks)
        .map(|task| async move {
            if cancel.is_cancelled() {
                return Ok(TaskOutcome::Cancelled);
            }
            tokio::select! {
                _ = cancel.cancelled() => Ok(TaskOutcome::Cancelled),
                r = run_task(task, fetcher) => r,
            }
        })
        .buffer_unordered(workers.max(1));

    while let Some(result) = results.next().await {
        match result? {
            TaskOutcome::Created(kind) => report.created.add(kind),
            TaskOutcome::Skipped { key, kind, reason } => {
                report.skipped.add(kind);
                progress.emit(SyncEvent::AssetSkipped { key, kind, reason });
            }
            TaskOutcome::Cancelled => {}
        }
        done += 1;
        progress.span(span.0, span.1, done, total);
    }

    log::info!(
        "Downloads finished: created {}, skipped {}",
        report.created,
        report.skipped.total()
    );
    Ok(report)
}

async fn run_task<F: Fetcher>(task: DownloadTask, fetcher: &F) -> Result<TaskOutcome, SyncError> {
    let DownloadTask {
        key,
        kind,
        source,
        dest,
    } = task;

    match source {
        TaskSource::Script => {
            write_file(&dest, launch_script(&key).as_bytes(), true)
                .map_err(|e| SyncError::fs(&dest, e))?;
            log::debug!("{key}: wrote launch script");
            Ok(TaskOutcome::Created(kind))
        }
        TaskSource::Url(uri) => {
            let url = normalize_url(&uri);
            let bytes = match fetcher.fetch(&url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("{key}: skipping {kind} from {url}: {e}");
                    return Ok(TaskOutcome::Skipped {
                        key,
                        kind,
                        reason: e.to_string(),
                    });
                }
            };
            match write_file(&dest, &bytes, false) {
                Ok(()) => {
                    log::debug!("{key}: saved {kind} ({} bytes)", bytes.len());
                    Ok(TaskOutcome::Created(kind))
                }
                Err(e) => {
                    log::warn!("{key}: could not save {kind} to {}: {e}", dest.display());
                    Ok(TaskOutcome::Skipped {
                        key,
                        kind,
                        reason: e.to_string(),
                    })
                }
            }
        }
    }
}

/// Write `contents` to a temp file beside `dest`, then rename it into place
/// so `dest` never holds a partial file.
fn write_file(dest: &Path, contents: &[u8], executable: bool) -> std::io::Result<()> {
    let dir = dest
        .parent()
        .ok_or_else(|| std::io::Error::other("destination has no parent directory"))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;

    #[cfg(unix)]
    if executable {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    let _ = executable;

    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("//store-images.s-microsoft.com/image/apps.1"),
            "https://store-images.s-microsoft.com/image/apps.1"
        );
        assert_eq!(normalize_url("https://a/b.png"), "https://a/b.png");
        assert_eq!(normalize_url("http://a/b.png"), "http://a/b.png");
    }

    #[test]
    fn test_write_file_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("HALO.png");
        write_file(&dest, b"first", false).unwrap();
        write_file(&dest, b"second", false).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("HALO.sh");
        write_file(&dest, b"#!/bin/bash\n", true).unwrap();
        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nope").join("HALO.sh");
        assert!(write_file(&dest, b"x", true).is_err());
    }
}
