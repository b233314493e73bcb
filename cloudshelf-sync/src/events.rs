use std::path::PathBuf;

use cloudshelf_core::{ArtifactCounts, ArtifactKey, ArtifactKind};
use tokio::sync::mpsc;

/// Progress events emitted during a sync pass.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Overall completion, 0 to 100. Never decreases within a pass.
    Progress(u8),
    /// The catalog is available, from cache or freshly fetched.
    CatalogResolved { entries: usize, cached: bool },
    /// Image and script work has been planned.
    DownloadsPlanned { tasks: usize },
    /// A remote image could not be fetched; the slot stays empty.
    AssetSkipped {
        key: ArtifactKey,
        kind: ArtifactKind,
        reason: String,
    },
    /// `gamelist.xml` was regenerated.
    GamelistWritten { path: PathBuf, entries: usize },
    /// Video transcoding is starting.
    TranscodeStarted { total: usize },
    /// One video could not be produced.
    TranscodeFailed { key: ArtifactKey, reason: String },
    /// Orphaned artifacts were removed.
    Pruned { removed: ArtifactCounts },
    /// The pass finished.
    Done,
}

/// Sends events to the caller and keeps the reported percentage monotonic.
pub(crate) struct ProgressReporter {
    events: mpsc::UnboundedSender<SyncEvent>,
    last: Option<u8>,
}

impl ProgressReporter {
    pub(crate) fn new(events: mpsc::UnboundedSender<SyncEvent>) -> Self {
        Self { events, last: None }
    }

    pub(crate) fn emit(&self, event: SyncEvent) {
        // The caller may have stopped listening; the pass carries on.
        let _ = self.events.send(event);
    }

    /// Report `percent`, ignoring values below what was already reported.
    pub(crate) fn progress(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        self.emit(SyncEvent::Progress(percent));
    }

    /// Report `done / total` of the way from `start` to `end`.
    pub(crate) fn span(&mut self, start: u8, end: u8, done: usize, total: usize) {
        let width = end.saturating_sub(start) as usize;
        let step = if total == 0 { width } else { width * done.min(total) / total };
        self.progress(start.saturating_add(step as u8));
    }
}
