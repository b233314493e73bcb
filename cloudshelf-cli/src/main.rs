//! cloudshelf CLI
//!
//! Mirrors the Game Pass cloud catalog into launch scripts, artwork, preview
//! videos and a gamelist for the ES-DE `greenlight` system.

mod cli_types;
mod commands;
mod error;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cli_types::{CacheAction, Cli, Commands, ConfigAction};
use commands::sync::SyncFlags;
use error::CliError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.quiet, cli.verbose, cli.logfile.as_deref()) {
        eprintln!("Failed to open log file: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli.command, cli.quiet) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Cancelled) => ExitCode::from(130),
        Err(e) => {
            log::error!(
                "{} {}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                e,
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, quiet: bool) -> Result<(), CliError> {
    match command {
        Commands::Sync {
            dirs,
            refresh,
            no_videos,
            prune_videos,
            download_workers,
            transcode_workers,
        } => commands::sync::run_sync(
            dirs,
            SyncFlags {
                refresh,
                no_videos,
                prune_videos,
                download_workers,
                transcode_workers,
            },
            quiet,
        ),
        Commands::Cache { action } => match action {
            CacheAction::Status => commands::cache::run_cache_status(),
            CacheAction::Clear => commands::cache::run_cache_clear(),
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(),
            ConfigAction::Path => {
                commands::config::run_config_path();
                Ok(())
            }
        },
        Commands::Clean { dirs, yes } => commands::clean::run_clean(dirs, yes),
    }
}
