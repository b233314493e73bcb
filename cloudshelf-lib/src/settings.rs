//! Persistent user settings (target folders and sync tuning).
//!
//! The settings file is `~/.config/cloudshelf/settings.toml`:
//!
//! ```toml
//! [paths]
//! assets_dir = "/home/me/ES-DE/downloaded_media"
//! games_dir = "/home/me/ROMs"
//! gamelist_dir = "/home/me/ES-DE/gamelists"
//!
//! [sync]
//! download_workers = 20
//! transcode_workers = 4
//! videos = true
//! prune_videos = false
//! cache_ttl_hours = 24
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Canonical path to the settings file: `~/.config/cloudshelf/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("cloudshelf").join("settings.toml")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub sync: SyncSettings,
}

/// The three folders the user picked. Each gets a `greenlight`
/// subdirectory when resolved into `SyncPaths`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub assets_dir: Option<PathBuf>,
    pub games_dir: Option<PathBuf>,
    pub gamelist_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Concurrent image/script downloads.
    pub download_workers: usize,
    /// Concurrent ffmpeg processes.
    pub transcode_workers: usize,
    /// Produce preview videos at all.
    pub videos: bool,
    /// Delete orphaned videos along with the other artifacts.
    pub prune_videos: bool,
    pub cache_ttl_hours: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            download_workers: 20,
            transcode_workers: 4,
            videos: true,
            prune_videos: false,
            cache_ttl_hours: 24,
        }
    }
}

impl Settings {
    /// Load settings from the canonical path. A missing file yields defaults.
    pub fn load() -> io::Result<Self> {
        Self::load_from(&settings_path())
    }

    /// Load settings from `path`. A missing file yields defaults; a file
    /// that exists but does not parse is an error.
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e),
        };
        toml::from_str(&contents).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}: {}", path.display(), e),
            )
        })
    }
}

/// Save any folders given in `paths` to the canonical settings file.
pub fn save_paths(paths: &PathSettings) -> io::Result<()> {
    save_paths_to(&settings_path(), paths)
}

/// Save any folders given in `paths` into `settings`.
///
/// Uses a surgical `toml::Table` update so keys this version does not know
/// about are preserved. `None` entries leave the stored value untouched.
pub fn save_paths_to(settings: &Path, paths: &PathSettings) -> io::Result<()> {
    let mut doc: toml::Table = match std::fs::read_to_string(settings) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => toml::Table::new(),
    };

    let section = doc
        .entry("paths")
        .or_insert_with(|| toml::Value::Table(Default::default()));
    let table = section
        .as_table_mut()
        .ok_or_else(|| io::Error::other("[paths] is not a table"))?;

    for (name, value) in [
        ("assets_dir", &paths.assets_dir),
        ("games_dir", &paths.games_dir),
        ("gamelist_dir", &paths.gamelist_dir),
    ] {
        if let Some(p) = value {
            table.insert(
                name.to_string(),
                toml::Value::String(p.to_string_lossy().into_owned()),
            );
        }
    }

    // Write atomically
    if let Some(parent) = settings.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(&doc).map_err(io::Error::other)?;
    let tmp = settings.with_extension("toml.tmp");
    std::fs::write(&tmp, &serialized)?;
    std::fs::rename(&tmp, settings)?;

    Ok(())
}

/// Load the full settings file as a pretty-printed TOML string for display.
pub fn load_settings_string() -> Option<String> {
    let contents = std::fs::read_to_string(settings_path()).ok()?;
    let doc: toml::Table = toml::from_str(&contents).ok()?;
    toml::to_string_pretty(&doc).ok()
}
