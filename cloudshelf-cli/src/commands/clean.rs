use std::fs;
use std::io;
use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cloudshelf_lib::Settings;

use super::{merge_dirs, resolve_paths};
use crate::cli_types::DirArgs;
use crate::error::CliError;

/// Delete every file under the three resolved target directories.
pub(crate) fn run_clean(dirs: DirArgs, yes: bool) -> Result<(), CliError> {
    let settings = Settings::load().map_err(|e| CliError::config(e.to_string()))?;
    let paths = resolve_paths(&merge_dirs(&settings.paths, &dirs))?;

    if !yes {
        log::warn!(
            "{} This deletes every file under:",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
        );
        for root in paths.roots() {
            log::warn!("    {}", root.display());
        }
        log::warn!("Re-run with --yes to confirm.");
        return Ok(());
    }

    let mut removed = 0usize;
    for root in paths.roots() {
        removed += remove_files(root)?;
    }
    log::info!(
        "{} Removed {} files",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        removed,
    );
    Ok(())
}

/// Remove all files below `dir`, keeping the directories themselves.
/// A directory that does not exist counts as empty.
fn remove_files(dir: &Path) -> io::Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            removed += remove_files(&path)?;
        } else {
            fs::remove_file(&path)?;
            log::debug!("Removed {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_files_recurses_and_keeps_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("greenlight");
        fs::create_dir_all(root.join("covers")).unwrap();
        fs::write(root.join("HALO.sh"), "#!/bin/bash\n").unwrap();
        fs::write(root.join("covers").join("HALO.png"), b"png").unwrap();
        fs::write(root.join("covers").join("FORZA.png"), b"png").unwrap();

        assert_eq!(remove_files(&root).unwrap(), 3);
        assert!(root.join("covers").is_dir());
        assert_eq!(fs::read_dir(root.join("covers")).unwrap().count(), 0);
    }

    #[test]
    fn test_remove_files_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(remove_files(&dir.path().join("absent")).unwrap(), 0);
    }
}
