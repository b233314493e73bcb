pub mod error;
pub mod esde;

pub use error::FrontendError;

use std::path::{Path, PathBuf};

/// One game in a generated listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameListEntry {
    /// Path to the launch script, relative to the games directory (`./KEY.sh`)
    pub path: String,
    /// Display name
    pub name: String,
    /// Game description (may be empty)
    pub description: String,
    /// Rating from 0.0 to 1.0
    pub rating: Option<f32>,
    /// Release date already in `YYYYMMDDT000000` form
    pub release_date: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    /// Number of players (e.g., "1", "1-4")
    pub players: Option<String>,
    pub play_count: Option<u32>,
    pub last_played: Option<String>,
}

/// Trait for gaming frontend metadata writers.
pub trait Frontend {
    fn name(&self) -> &'static str;

    /// Write the listing for `games` into `metadata_dir`, returning the
    /// path of the written file.
    fn write_metadata(
        &self,
        games: &[GameListEntry],
        metadata_dir: &Path,
    ) -> Result<PathBuf, FrontendError>;
}
