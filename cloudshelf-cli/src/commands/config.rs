use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cloudshelf_lib::Settings;
use cloudshelf_lib::settings::{load_settings_string, settings_path};

use super::resolve_paths;
use crate::error::CliError;

/// Show the settings file and the values a sync would use.
pub(crate) fn run_config_show() -> Result<(), CliError> {
    let path = settings_path();

    log::info!(
        "{}",
        "cloudshelf settings".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");
    if path.exists() {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        );
    } else {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found, using defaults)".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }

    let settings = Settings::load().map_err(|e| CliError::config(e.to_string()))?;
    log::info!("");
    match resolve_paths(&settings.paths) {
        Ok(paths) => {
            log::info!("  Scripts:  {}", paths.games_dir.display());
            log::info!("  Media:    {}", paths.assets_dir.display());
            log::info!("  Gamelist: {}", paths.gamelist_path().display());
        }
        Err(e) => log::info!(
            "  {}",
            e.to_string().if_supports_color(Stdout, |t| t.yellow()),
        ),
    }

    let sync = &settings.sync;
    log::info!("");
    log::info!("  Download workers:  {}", sync.download_workers);
    log::info!("  Transcode workers: {}", sync.transcode_workers);
    log::info!("  Videos:            {}", on_off(sync.videos));
    log::info!("  Prune videos:      {}", on_off(sync.prune_videos));
    log::info!("  Cache TTL:         {}h", sync.cache_ttl_hours);

    if let Some(raw) = load_settings_string() {
        log::debug!("Raw settings:\n{raw}");
    }
    Ok(())
}

/// Print the settings file path, nothing else.
pub(crate) fn run_config_path() {
    println!("{}", settings_path().display());
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}
