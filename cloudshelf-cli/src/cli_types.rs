//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cloudshelf")]
#[command(
    about = "Mirror the Game Pass cloud catalog into an ES-DE greenlight system",
    long_about = None
)]
pub(crate) struct Cli {
    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write log output to a file (ANSI codes stripped)
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Target directories. Each one gets a `greenlight` subdirectory appended
/// unless it already ends in one. Values given here are remembered.
#[derive(Args, Clone, Default)]
pub(crate) struct DirArgs {
    /// Media root (marquees, covers, fanart, videos)
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,

    /// ROM root where launch scripts are written
    #[arg(long)]
    pub games_dir: Option<PathBuf>,

    /// Root for gamelist.xml
    #[arg(long)]
    pub gamelist_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Reconcile local artifacts against the catalog
    Sync {
        #[command(flatten)]
        dirs: DirArgs,

        /// Refetch the catalog even if the cache is fresh
        #[arg(long)]
        refresh: bool,

        /// Skip preview videos (no ffmpeg needed)
        #[arg(long)]
        no_videos: bool,

        /// Also delete videos for titles that left the catalog
        #[arg(long)]
        prune_videos: bool,

        /// Maximum concurrent downloads
        #[arg(long)]
        download_workers: Option<usize>,

        /// Maximum concurrent ffmpeg processes
        #[arg(long)]
        transcode_workers: Option<usize>,
    },

    /// Manage the catalog cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Delete every file in the target directories
    Clean {
        #[command(flatten)]
        dirs: DirArgs,

        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Show cache age, entry count and freshness
    Status,
    /// Remove the cached catalog
    Clear,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show the settings file and the effective values
    Show,
    /// Print the settings file path
    Path,
}
