//! Decides which artifacts of a catalog record still have to be produced.
//!
//! A file's presence at its canonical path is the only completion state:
//! existing artifacts are never planned again, whatever the catalog says.

use std::collections::HashSet;
use std::path::PathBuf;

use cloudshelf_core::{ArtifactKey, ArtifactKind, CatalogRecord, SyncPaths};

/// Flatpak id of the streaming client the launch scripts start.
pub const STREAMING_CLIENT: &str = "io.github.unknownskl.greenlight";

/// Contents of the launch script for `key`.
pub fn launch_script(key: &ArtifactKey) -> String {
    format!(
        "#!/bin/bash\nflatpak run --socket=wayland --env=ELECTRON_ENABLE_WAYLAND=1 {STREAMING_CLIENT} --fullscreen --connect='xcloud_{key}'\n"
    )
}

/// Where the bytes of a download task come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSource {
    /// Rendered locally from the script template.
    Script,
    /// Fetched from a remote image URI (as found in the catalog).
    Url(String),
}

/// One script or image to materialise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub key: ArtifactKey,
    pub kind: ArtifactKind,
    pub source: TaskSource,
    pub dest: PathBuf,
}

/// One preview video to transcode from a streaming manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTask {
    pub key: ArtifactKey,
    pub manifest: String,
    pub dest: PathBuf,
}

/// Missing artifacts for one record.
#[derive(Debug, Default)]
pub struct RecordPlan {
    pub downloads: Vec<DownloadTask>,
    pub video: Option<VideoTask>,
}

/// Plan the missing artifacts of `record` and add its key to `valid_keys`.
///
/// Slots without a source (no image URI, no manifest) produce no task.
/// The video slot is only considered when `videos` is set. A record whose
/// key was already planned in this pass produces no tasks, so every
/// destination has at most one writer.
pub fn plan_record(
    record: &CatalogRecord,
    paths: &SyncPaths,
    videos: bool,
    valid_keys: &mut HashSet<ArtifactKey>,
) -> RecordPlan {
    let key = record.key();
    if !valid_keys.insert(key.clone()) {
        log::debug!("{key}: already planned by another title, skipping");
        return RecordPlan::default();
    }

    let mut plan = RecordPlan::default();
    let missing = |kind: ArtifactKind| {
        let dest = paths.artifact_path(kind, &key);
        (!dest.exists()).then_some(dest)
    };

    if let Some(dest) = missing(ArtifactKind::Script) {
        plan.downloads.push(DownloadTask {
            key: key.clone(),
            kind: ArtifactKind::Script,
            source: TaskSource::Script,
            dest,
        });
    }

    for kind in ArtifactKind::IMAGES {
        let uri = match kind {
            ArtifactKind::Logo => record.logo_source(),
            ArtifactKind::Cover => record.cover_source(),
            _ => record.fanart_source(),
        };
        let Some(uri) = uri.filter(|u| !u.is_empty()) else {
            log::debug!("{key}: no source for {kind}");
            continue;
        };
        if let Some(dest) = missing(kind) {
            plan.downloads.push(DownloadTask {
                key: key.clone(),
                kind,
                source: TaskSource::Url(uri.to_string()),
                dest,
            });
        }
    }

    if videos {
        if let Some(manifest) = record.dash.as_deref().filter(|m| !m.is_empty()) {
            if let Some(dest) = missing(ArtifactKind::Video) {
                plan.video = Some(VideoTask {
                    key: key.clone(),
                    manifest: manifest.to_string(),
                    dest,
                });
            }
        }
    }

    plan
}
