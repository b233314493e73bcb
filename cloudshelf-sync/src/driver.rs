//! One reconciliation pass: catalog, plan, downloads, gamelist, videos, prune.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cloudshelf_catalog::{CatalogCache, CatalogSource, Resolution};
use cloudshelf_core::{ArtifactCounts, ArtifactKey, CatalogRecord, SyncPaths};
use cloudshelf_frontend::Frontend;
use cloudshelf_frontend::esde::EsDeFrontend;
use cloudshelf_lib::CancelToken;
use tokio::sync::mpsc;

use crate::download::{self, Fetcher};
use crate::error::SyncError;
use crate::events::{ProgressReporter, SyncEvent};
use crate::planner::{self, VideoTask};
use crate::prune;
use crate::transcode::{self, Transcoder};

/// How long a cancelled pass may take to unwind before it is abandoned.
pub const CANCEL_GRACE: Duration = Duration::from_secs(5);

/// Tuning for one pass.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum concurrent image/script downloads
    pub download_workers: usize,
    /// Maximum concurrent transcodes
    pub transcode_workers: usize,
    /// Plan and produce preview videos
    pub videos: bool,
    /// Delete orphaned videos too
    pub prune_videos: bool,
    /// Refetch the catalog even when the cache is fresh
    pub force_refresh: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            download_workers: 20,
            transcode_workers: 4,
            videos: true,
            prune_videos: false,
            force_refresh: false,
        }
    }
}

/// The collaborators a pass talks to.
pub struct SyncServices<S, F> {
    pub cache: CatalogCache,
    pub source: S,
    pub fetcher: F,
    pub transcoder: Arc<dyn Transcoder>,
}

/// Aggregate result of a completed pass.
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub catalog_entries: usize,
    pub catalog_cached: bool,
    pub created: ArtifactCounts,
    /// Images whose download was skipped (non-200, network error)
    pub skipped: ArtifactCounts,
    pub removed: ArtifactCounts,
    pub transcode_failed: usize,
    pub gamelist_path: PathBuf,
    pub gamelist_entries: usize,
}

/// Terminal state of a pass.
#[derive(Debug)]
pub enum SyncOutcome {
    Completed(SyncSummary),
    Cancelled,
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SyncOutcome::Completed(_))
    }
}

/// Run one reconciliation pass.
///
/// Progress and per-asset events go to `events`. Firing `cancel` stops new
/// work, signals running downloads and transcodes, and returns
/// [`SyncOutcome::Cancelled`] once they unwind or [`CANCEL_GRACE`] elapses.
pub async fn run_sync<S: CatalogSource, F: Fetcher>(
    services: &SyncServices<S, F>,
    paths: &SyncPaths,
    options: &SyncOptions,
    events: mpsc::UnboundedSender<SyncEvent>,
    cancel: CancelToken,
) -> SyncOutcome {
    let mut progress = ProgressReporter::new(events);
    let pass = run_pass(services, paths, options, &mut progress, &cancel);
    tokio::pin!(pass);

    tokio::select! {
        result = &mut pass => match result {
            Ok(Some(summary)) => SyncOutcome::Completed(summary),
            Ok(None) => SyncOutcome::Cancelled,
            Err(e) => {
                log::error!("Sync failed: {e}");
                SyncOutcome::Failed(e)
            }
        },
        _ = cancel.cancelled() => {
            log::info!(
                "Cancellation requested, waiting up to {}s for running tasks",
                CANCEL_GRACE.as_secs()
            );
            if tokio::time::timeout(CANCEL_GRACE, &mut pass).await.is_err() {
                log::warn!("Tasks still running after grace period, abandoning them");
            }
            SyncOutcome::Cancelled
        }
    }
}

/// The pass itself. `Ok(None)` means it stopped early because of `cancel`.
async fn run_pass<S: CatalogSource, F: Fetcher>(
    services: &SyncServices<S, F>,
    paths: &SyncPaths,
    options: &SyncOptions,
    progress: &mut ProgressReporter,
    cancel: &CancelToken,
) -> Result<Option<SyncSummary>, SyncError> {
    progress.progress(0);

    if options.videos {
        let transcoder = services.transcoder.clone();
        tokio::task::spawn_blocking(move || transcoder.validate())
            .await
            .map_err(|e| SyncError::TranscoderUnavailable(e.to_string()))?
            .map_err(SyncError::TranscoderUnavailable)?;
    }

    let resolved = services
        .cache
        .get_catalog(&services.source, options.force_refresh)
        .await?;
    let cached = resolved.resolution == Resolution::Cached;
    let records = resolved.records;
    progress.emit(SyncEvent::CatalogResolved {
        entries: records.len(),
        cached,
    });
    progress.progress(5);
    if cancel.is_cancelled() {
        return Ok(None);
    }

    // Nothing local is touched until the catalog is known to be complete.
    for dir in paths.all_dirs() {
        std::fs::create_dir_all(&dir).map_err(|e| SyncError::fs(&dir, e))?;
    }

    let mut valid_keys: HashSet<ArtifactKey> = HashSet::new();
    let mut downloads = Vec::new();
    let mut videos: Vec<VideoTask> = Vec::new();
    let total = records.len();
    // Planned last to first: the first record to claim a key gets its
    // artifacts, so on a collision the later record wins, as in the gamelist.
    for (i, record) in records.iter().rev().enumerate() {
        let plan = planner::plan_record(record, paths, options.videos, &mut valid_keys);
        downloads.extend(plan.downloads);
        videos.extend(plan.video);
        progress.span(5, 45, i + 1, total);
    }
    log::info!(
        "Planned {} downloads and {} videos for {} catalog entries",
        downloads.len(),
        videos.len(),
        total
    );
    progress.emit(SyncEvent::DownloadsPlanned {
        tasks: downloads.len(),
    });

    let download_report = download::execute(
        downloads,
        &services.fetcher,
        options.download_workers,
        cancel,
        progress,
        (45, 50),
    )
    .await?;
    progress.progress(50);
    if cancel.is_cancelled() {
        return Ok(None);
    }

    let catalog_by_key = index_by_key(records);
    let esde = EsDeFrontend::new();
    let games = esde.generate(&paths.games_dir, &catalog_by_key)?;
    let gamelist_path = esde.write_metadata(&games, &paths.gamelist_dir)?;
    log::info!(
        "Wrote {} games to {}",
        games.len(),
        gamelist_path.display()
    );
    progress.emit(SyncEvent::GamelistWritten {
        path: gamelist_path.clone(),
        entries: games.len(),
    });
    progress.progress(60);

    let mut created = download_report.created;
    let mut transcode_failed = 0;
    if options.videos {
        let report = transcode::execute(
            videos,
            services.transcoder.clone(),
            options.transcode_workers,
            cancel,
            progress,
            (60, 90),
        )
        .await;
        created.videos += report.succeeded;
        transcode_failed = report.failed;
    }
    progress.progress(90);
    if cancel.is_cancelled() {
        return Ok(None);
    }

    let removed = prune::prune(paths, &valid_keys, options.prune_videos)?;
    progress.emit(SyncEvent::Pruned { removed });
    progress.progress(100);
    progress.emit(SyncEvent::Done);

    Ok(Some(SyncSummary {
        catalog_entries: total,
        catalog_cached: cached,
        created,
        skipped: download_report.skipped,
        removed,
        transcode_failed,
        gamelist_path,
        gamelist_entries: games.len(),
    }))
}

/// Catalog records by artifact key. On a key collision the later record wins.
fn index_by_key(records: Vec<CatalogRecord>) -> HashMap<ArtifactKey, CatalogRecord> {
    records.into_iter().map(|r| (r.key(), r)).collect()
}
