use std::time::Duration;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cloudshelf_catalog::{CacheStatus, CatalogCache, default_cache_dir};
use cloudshelf_lib::Settings;

use super::{format_age, format_bytes};
use crate::error::CliError;

fn open_cache() -> Result<CatalogCache, CliError> {
    let settings = Settings::load().map_err(|e| CliError::config(e.to_string()))?;
    let ttl = Duration::from_secs(settings.sync.cache_ttl_hours.saturating_mul(3600));
    Ok(CatalogCache::new(default_cache_dir()?).with_ttl(ttl))
}

/// Show where the catalog cache lives, how old it is and how many entries it holds.
pub(crate) fn run_cache_status() -> Result<(), CliError> {
    let cache = open_cache()?;

    log::info!(
        "{}",
        "Catalog cache".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!(
        "  Location: {}",
        cache.dir().display().if_supports_color(Stdout, |t| t.cyan()),
    );

    let age = match cache.status() {
        CacheStatus::Missing => {
            log::info!(
                "  {}",
                "No cached catalog.".if_supports_color(Stdout, |t| t.dimmed()),
            );
            log::info!("Run 'cloudshelf sync' to fetch it.");
            return Ok(());
        }
        CacheStatus::Fresh { age } => {
            log::info!(
                "  Status:   {}",
                "fresh".if_supports_color(Stdout, |t| t.green()),
            );
            age
        }
        CacheStatus::Stale { age } => {
            log::info!(
                "  Status:   {} (refetched on next sync)",
                "stale".if_supports_color(Stdout, |t| t.yellow()),
            );
            age
        }
    };
    log::info!("  Age:      {}", format_age(age));

    match cache.load() {
        Ok(records) => log::info!("  Entries:  {}", records.len()),
        Err(e) => log::warn!(
            "  {} Cached catalog is unreadable: {}",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            e,
        ),
    }
    if let Ok(meta) = std::fs::metadata(cache.payload_path()) {
        log::info!("  Size:     {}", format_bytes(meta.len()));
    }
    Ok(())
}

/// Delete the cached catalog so the next sync refetches it.
pub(crate) fn run_cache_clear() -> Result<(), CliError> {
    let cache = open_cache()?;
    let freed = cache.clear()?;
    log::info!(
        "{} Cache cleared ({} freed)",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        format_bytes(freed),
    );
    Ok(())
}
