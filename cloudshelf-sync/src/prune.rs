//! Removes artifacts whose key is no longer in the catalog.

use std::collections::HashSet;
use std::fs;

use cloudshelf_core::{ArtifactCounts, ArtifactKey, ArtifactKind, SyncPaths};

use crate::error::SyncError;

/// Artifact kinds swept on every pass. Videos are opt-in.
const ALWAYS_PRUNED: [ArtifactKind; 4] = [
    ArtifactKind::Script,
    ArtifactKind::Logo,
    ArtifactKind::Cover,
    ArtifactKind::Fanart,
];

/// Delete every artifact file whose key is not in `valid_keys`.
///
/// Only files with the kind's own extension are considered, so temp and
/// `.part` files are left alone. A directory that does not exist is
/// skipped; one that cannot be listed aborts the pass. Individual delete
/// failures are logged and left for the next pass.
pub fn prune(
    paths: &SyncPaths,
    valid_keys: &HashSet<ArtifactKey>,
    prune_videos: bool,
) -> Result<ArtifactCounts, SyncError> {
    let mut removed = ArtifactCounts::new();
    let kinds = ALWAYS_PRUNED
        .into_iter()
        .chain(prune_videos.then_some(ArtifactKind::Video));

    for kind in kinds {
        let dir = paths.dir_for(kind);
        if !dir.is_dir() {
            continue;
        }
        let entries = fs::read_dir(&dir).map_err(|e| SyncError::fs(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| SyncError::fs(&dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(kind.extension()) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if valid_keys.contains(stem) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    log::debug!("Pruned {}", path.display());
                    removed.add(kind);
                }
                Err(e) => log::warn!("Could not remove {}: {e}", path.display()),
            }
        }
    }

    if removed.total() > 0 {
        log::info!("Pruned orphaned artifacts: {removed}");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn setup(root: &Path, keys: &[&str]) -> SyncPaths {
        let paths = SyncPaths::resolve(&root.join("media"), &root.join("roms"), &root.join("lists"));
        for dir in paths.all_dirs() {
            fs::create_dir_all(dir).unwrap();
        }
        for key in keys {
            let key = ArtifactKey::from_stem(*key);
            for kind in ArtifactKind::ALL {
                fs::write(paths.artifact_path(kind, &key), b"x").unwrap();
            }
        }
        paths
    }

    fn keys(list: &[&str]) -> HashSet<ArtifactKey> {
        list.iter().map(|k| ArtifactKey::from_stem(*k)).collect()
    }

    #[test]
    fn test_removes_only_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let paths = setup(dir.path(), &["A", "B", "C"]);

        let removed = prune(&paths, &keys(&["A", "B"]), false).unwrap();
        assert_eq!(removed.scripts, 1);
        assert_eq!(removed.logos, 1);
        assert_eq!(removed.covers, 1);
        assert_eq!(removed.fanart, 1);
        assert_eq!(removed.videos, 0);

        let c = ArtifactKey::from_stem("C");
        assert!(!paths.artifact_path(ArtifactKind::Script, &c).exists());
        assert!(!paths.artifact_path(ArtifactKind::Fanart, &c).exists());
        // Videos untouched unless asked for.
        assert!(paths.artifact_path(ArtifactKind::Video, &c).exists());
        let a = ArtifactKey::from_stem("A");
        assert!(paths.artifact_path(ArtifactKind::Logo, &a).exists());
    }

    #[test]
    fn test_prune_videos_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let paths = setup(dir.path(), &["A", "C"]);

        let removed = prune(&paths, &keys(&["A"]), true).unwrap();
        assert_eq!(removed.videos, 1);
        assert_eq!(removed.total(), 5);
        let a = ArtifactKey::from_stem("A");
        assert!(paths.artifact_path(ArtifactKind::Video, &a).exists());
    }

    #[test]
    fn test_ignores_foreign_extensions_and_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = setup(dir.path(), &[]);
        let games = paths.dir_for(ArtifactKind::Script);
        fs::write(games.join("README.txt"), b"keep").unwrap();
        fs::write(games.join(".tmpAbC123"), b"keep").unwrap();
        fs::remove_dir_all(paths.dir_for(ArtifactKind::Fanart)).unwrap();

        let removed = prune(&paths, &HashSet::new(), true).unwrap();
        assert_eq!(removed.total(), 0);
        assert!(games.join("README.txt").exists());
        assert!(games.join(".tmpAbC123").exists());
    }
}
