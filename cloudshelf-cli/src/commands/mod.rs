pub(crate) mod cache;
pub(crate) mod clean;
pub(crate) mod config;
pub(crate) mod sync;

use std::path::PathBuf;
use std::time::Duration;

use cloudshelf_core::SyncPaths;
use cloudshelf_lib::PathSettings;

use crate::cli_types::DirArgs;
use crate::error::CliError;

/// Command-line directories layered over the saved ones.
pub(crate) fn merge_dirs(saved: &PathSettings, dirs: &DirArgs) -> PathSettings {
    PathSettings {
        assets_dir: dirs.assets_dir.clone().or_else(|| saved.assets_dir.clone()),
        games_dir: dirs.games_dir.clone().or_else(|| saved.games_dir.clone()),
        gamelist_dir: dirs
            .gamelist_dir
            .clone()
            .or_else(|| saved.gamelist_dir.clone()),
    }
}

/// Resolve the three target directories, or explain which one is missing.
pub(crate) fn resolve_paths(dirs: &PathSettings) -> Result<SyncPaths, CliError> {
    fn required<'a>(
        value: &'a Option<PathBuf>,
        flag: &str,
        key: &str,
    ) -> Result<&'a PathBuf, CliError> {
        value.as_ref().ok_or_else(|| {
            CliError::config(format!(
                "No {key} configured. Pass --{flag} or set paths.{key} in settings.toml"
            ))
        })
    }

    let assets = required(&dirs.assets_dir, "assets-dir", "assets_dir")?;
    let games = required(&dirs.games_dir, "games-dir", "games_dir")?;
    let gamelist = required(&dirs.gamelist_dir, "gamelist-dir", "gamelist_dir")?;
    Ok(SyncPaths::resolve(assets, games, gamelist))
}

/// True when any directory was given on the command line.
pub(crate) fn dirs_given(dirs: &DirArgs) -> bool {
    dirs.assets_dir.is_some() || dirs.games_dir.is_some() || dirs.gamelist_dir.is_some()
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} bytes", bytes)
    }
}

pub(crate) fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_cli_dirs_override_saved() {
        let saved = PathSettings {
            assets_dir: Some("/saved/media".into()),
            games_dir: Some("/saved/roms".into()),
            gamelist_dir: None,
        };
        let dirs = DirArgs {
            games_dir: Some("/cli/roms".into()),
            gamelist_dir: Some("/cli/lists".into()),
            ..Default::default()
        };
        let merged = merge_dirs(&saved, &dirs);
        assert_eq!(merged.assets_dir, Some("/saved/media".into()));
        assert_eq!(merged.games_dir, Some("/cli/roms".into()));
        assert_eq!(merged.gamelist_dir, Some("/cli/lists".into()));
        assert!(dirs_given(&dirs));
        assert!(!dirs_given(&DirArgs::default()));
    }

    #[test]
    fn test_resolve_requires_all_dirs() {
        let partial = PathSettings {
            assets_dir: Some("/media".into()),
            games_dir: Some("/roms".into()),
            gamelist_dir: None,
        };
        let err = resolve_paths(&partial).unwrap_err();
        assert!(err.to_string().contains("--gamelist-dir"));

        let full = PathSettings {
            gamelist_dir: Some("/lists/greenlight".into()),
            ..partial
        };
        let paths = resolve_paths(&full).unwrap();
        assert_eq!(paths.games_dir, Path::new("/roms/greenlight"));
        assert_eq!(paths.gamelist_dir, Path::new("/lists/greenlight"));
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::from_secs(42)), "42s");
        assert_eq!(format_age(Duration::from_secs(3 * 3600 + 120)), "3h 2m");
        assert_eq!(format_age(Duration::from_secs(2 * 86400 + 3600)), "2d 1h");
    }
}
