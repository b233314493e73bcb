use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cloudshelf_catalog::{CatalogCache, GamePassClient, default_cache_dir};
use cloudshelf_core::ArtifactKind;
use cloudshelf_lib::async_util::run_with_events;
use cloudshelf_lib::settings::save_paths;
use cloudshelf_lib::{CancelToken, PathSettings, Settings};
use cloudshelf_sync::{
    FfmpegTranscoder, HttpFetcher, SyncEvent, SyncOptions, SyncOutcome, SyncServices, SyncSummary,
};

use super::{dirs_given, merge_dirs, resolve_paths};
use crate::cli_types::DirArgs;
use crate::error::CliError;

/// Flags of `cloudshelf sync` that tune a pass.
pub(crate) struct SyncFlags {
    pub refresh: bool,
    pub no_videos: bool,
    pub prune_videos: bool,
    pub download_workers: Option<usize>,
    pub transcode_workers: Option<usize>,
}

/// Settings first, command-line flags on top.
fn build_options(settings: &Settings, flags: &SyncFlags) -> SyncOptions {
    SyncOptions {
        download_workers: flags
            .download_workers
            .unwrap_or(settings.sync.download_workers)
            .max(1),
        transcode_workers: flags
            .transcode_workers
            .unwrap_or(settings.sync.transcode_workers)
            .max(1),
        videos: settings.sync.videos && !flags.no_videos,
        prune_videos: settings.sync.prune_videos || flags.prune_videos,
        force_refresh: flags.refresh,
    }
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(100);
    if let Ok(style) =
        ProgressStyle::with_template("  {spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
    {
        pb.set_style(style.progress_chars("=> ").tick_chars("/-\\|"));
    }
    pb.set_message("Resolving catalog...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run one reconciliation pass against the configured directories.
pub(crate) fn run_sync(dirs: DirArgs, flags: SyncFlags, quiet: bool) -> Result<(), CliError> {
    let settings = Settings::load().map_err(|e| CliError::config(e.to_string()))?;
    let paths = resolve_paths(&merge_dirs(&settings.paths, &dirs))?;

    if dirs_given(&dirs) {
        let remembered = PathSettings {
            assets_dir: dirs.assets_dir.clone(),
            games_dir: dirs.games_dir.clone(),
            gamelist_dir: dirs.gamelist_dir.clone(),
        };
        if let Err(e) = save_paths(&remembered) {
            log::warn!(
                "{} Could not save directories to settings: {}",
                "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                e,
            );
        }
    }

    let options = build_options(&settings, &flags);
    let ttl = Duration::from_secs(settings.sync.cache_ttl_hours.saturating_mul(3600));
    let services = SyncServices {
        cache: CatalogCache::new(default_cache_dir()?).with_ttl(ttl),
        source: GamePassClient::new()?,
        fetcher: HttpFetcher::new()
            .map_err(|e| CliError::other(format!("Failed to build HTTP client: {e}")))?,
        transcoder: Arc::new(FfmpegTranscoder::new()),
    };

    log::info!(
        "{}",
        "Syncing Game Pass catalog".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!(
        "  Scripts:  {}",
        paths.games_dir.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    log::info!(
        "  Media:    {}",
        paths.assets_dir.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    log::info!(
        "  Gamelist: {}",
        paths.gamelist_dir.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    if !options.videos {
        log::info!(
            "  {}",
            "Videos disabled".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }

    let rt = tokio::runtime::Runtime::new().map_err(|e| CliError::runtime(e.to_string()))?;
    let outcome = rt.block_on(async {
        let cancel = CancelToken::new();
        let pb = progress_bar(quiet);

        let signal_cancel = cancel.clone();
        let signal_pb = pb.clone();
        let signal_task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal_pb.suspend(|| {
                    log::warn!(
                        "{} Interrupted, stopping running tasks...",
                        "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                    );
                });
                signal_cancel.cancel();
            }
        });

        let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel::<SyncEvent>();
        let pass = cloudshelf_sync::run_sync(&services, &paths, &options, event_tx, cancel);

        let outcome = run_with_events(pass, event_rx, |e| match e {
            SyncEvent::Progress(percent) => pb.set_position(percent as u64),
            SyncEvent::CatalogResolved { entries, cached } => {
                pb.suspend(|| {
                    log::info!(
                        "  {} Catalog: {} entries ({})",
                        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                        entries,
                        if cached { "cached" } else { "fetched" },
                    );
                });
                pb.set_message("Planning downloads...");
            }
            SyncEvent::DownloadsPlanned { tasks } => {
                pb.set_message(format!("Downloading {tasks} files..."));
            }
            SyncEvent::AssetSkipped { key, kind, reason } => {
                log::debug!("Skipped {} for {}: {}", kind, key, reason);
            }
            SyncEvent::GamelistWritten { path, entries } => {
                pb.suspend(|| {
                    log::info!(
                        "  {} Wrote {} ({} games)",
                        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                        path.display(),
                        entries,
                    );
                });
                pb.set_message("Checking videos...");
            }
            SyncEvent::TranscodeStarted { total } => {
                pb.set_message(format!("Transcoding {total} videos..."));
            }
            SyncEvent::TranscodeFailed { key, reason } => {
                pb.suspend(|| {
                    log::warn!(
                        "  {} Video for {} failed: {}",
                        "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                        key,
                        reason,
                    );
                });
            }
            SyncEvent::Pruned { .. } => pb.set_message("Pruned orphaned files"),
            SyncEvent::Done => {}
        })
        .await;

        signal_task.abort();
        pb.finish_and_clear();
        outcome
    });

    match outcome {
        SyncOutcome::Completed(summary) => {
            print_summary(&summary);
            Ok(())
        }
        SyncOutcome::Cancelled => {
            log::warn!(
                "{} Sync cancelled; finished files were kept",
                "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            );
            Err(CliError::Cancelled)
        }
        SyncOutcome::Failed(e) => Err(e.into()),
    }
}

fn print_summary(summary: &SyncSummary) {
    log::info!("");
    log::info!(
        "{} Sync complete: {} catalog entries ({})",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        summary.catalog_entries,
        if summary.catalog_cached { "cached" } else { "fetched" },
    );

    for kind in ArtifactKind::ALL {
        let created = summary.created.get(kind);
        let removed = summary.removed.get(kind);
        if created == 0 && removed == 0 {
            continue;
        }
        log::info!(
            "  {:<8} {} {}",
            kind.label(),
            format!("+{created}").if_supports_color(Stdout, |t| t.green()),
            format!("-{removed}").if_supports_color(Stdout, |t| t.red()),
        );
    }
    if summary.created.total() == 0 && summary.removed.total() == 0 {
        log::info!(
            "  {}",
            "Everything up to date".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }

    let skipped = summary.skipped.total();
    if skipped > 0 {
        log::warn!(
            "  {} {} images unavailable ({})",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            skipped,
            summary.skipped,
        );
    }
    if summary.transcode_failed > 0 {
        log::warn!(
            "  {} {} videos failed to transcode",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            summary.transcode_failed,
        );
    }
    log::info!(
        "  Gamelist: {} ({} games)",
        summary.gamelist_path.display(),
        summary.gamelist_entries,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> SyncFlags {
        SyncFlags {
            refresh: false,
            no_videos: false,
            prune_videos: false,
            download_workers: None,
            transcode_workers: None,
        }
    }

    #[test]
    fn test_options_default_from_settings() {
        let options = build_options(&Settings::default(), &flags());
        assert_eq!(options.download_workers, 20);
        assert_eq!(options.transcode_workers, 4);
        assert!(options.videos);
        assert!(!options.prune_videos);
        assert!(!options.force_refresh);
    }

    #[test]
    fn test_flags_override_settings() {
        let mut settings = Settings::default();
        settings.sync.prune_videos = true;
        let options = build_options(
            &settings,
            &SyncFlags {
                refresh: true,
                no_videos: true,
                download_workers: Some(0),
                transcode_workers: Some(2),
                ..flags()
            },
        );
        assert_eq!(options.download_workers, 1);
        assert_eq!(options.transcode_workers, 2);
        assert!(!options.videos);
        assert!(options.prune_videos);
        assert!(options.force_refresh);
    }
}
