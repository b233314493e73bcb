use std::path::{Path, PathBuf};

use crate::artifact::ArtifactKind;
use crate::key::ArtifactKey;

/// Name of the ES-DE system folder every target directory is nested under.
pub const SYSTEM_DIR_NAME: &str = "greenlight";

/// Filename of the generated ES-DE listing.
pub const GAMELIST_FILENAME: &str = "gamelist.xml";

/// The three target directories of a sync pass.
///
/// - `games_dir`: launch scripts (`<KEY>.sh`), ES-DE's ROM folder
/// - `assets_dir`: media, one subdirectory per image/video kind
/// - `gamelist_dir`: `gamelist.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPaths {
    pub assets_dir: PathBuf,
    pub games_dir: PathBuf,
    pub gamelist_dir: PathBuf,
}

impl SyncPaths {
    /// Build paths from user-chosen folders, nesting each one under a
    /// `greenlight` subdirectory unless it already ends in one.
    pub fn resolve(assets: &Path, games: &Path, gamelist: &Path) -> Self {
        Self {
            assets_dir: system_subdir(assets),
            games_dir: system_subdir(games),
            gamelist_dir: system_subdir(gamelist),
        }
    }

    /// Directory holding artifacts of `kind`.
    pub fn dir_for(&self, kind: ArtifactKind) -> PathBuf {
        match kind.media_subdir() {
            Some(sub) => self.assets_dir.join(sub),
            None => self.games_dir.clone(),
        }
    }

    /// Canonical path of one artifact.
    pub fn artifact_path(&self, kind: ArtifactKind, key: &ArtifactKey) -> PathBuf {
        self.dir_for(kind)
            .join(format!("{}.{}", key, kind.extension()))
    }

    pub fn gamelist_path(&self) -> PathBuf {
        self.gamelist_dir.join(GAMELIST_FILENAME)
    }

    /// Every directory a sync pass writes into.
    pub fn all_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = ArtifactKind::ALL.iter().map(|k| self.dir_for(*k)).collect();
        dirs.push(self.gamelist_dir.clone());
        dirs
    }

    /// The three top-level target directories.
    pub fn roots(&self) -> [&Path; 3] {
        [&self.assets_dir, &self.games_dir, &self.gamelist_dir]
    }
}

/// Append the `greenlight` folder unless `path` already names it.
pub fn system_subdir(path: &Path) -> PathBuf {
    let already = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.eq_ignore_ascii_case(SYSTEM_DIR_NAME))
        .unwrap_or(false);
    if already {
        path.to_path_buf()
    } else {
        path.join(SYSTEM_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_subdir_appended_once() {
        assert_eq!(
            system_subdir(Path::new("/roms")),
            PathBuf::from("/roms/greenlight")
        );
        assert_eq!(
            system_subdir(Path::new("/roms/Greenlight")),
            PathBuf::from("/roms/Greenlight")
        );
    }

    #[test]
    fn test_artifact_paths() {
        let paths = SyncPaths::resolve(
            Path::new("/media"),
            Path::new("/roms"),
            Path::new("/gamelists"),
        );
        let key = ArtifactKey::from_title("Halo Infinite");
        assert_eq!(
            paths.artifact_path(ArtifactKind::Script, &key),
            PathBuf::from("/roms/greenlight/HALOINFINITE.sh")
        );
        assert_eq!(
            paths.artifact_path(ArtifactKind::Logo, &key),
            PathBuf::from("/media/greenlight/marquees/HALOINFINITE.png")
        );
        assert_eq!(
            paths.artifact_path(ArtifactKind::Video, &key),
            PathBuf::from("/media/greenlight/videos/HALOINFINITE.mp4")
        );
        assert_eq!(
            paths.gamelist_path(),
            PathBuf::from("/gamelists/greenlight/gamelist.xml")
        );
    }
}
