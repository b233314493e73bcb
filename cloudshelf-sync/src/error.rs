use std::path::PathBuf;

use cloudshelf_catalog::CatalogError;
use cloudshelf_frontend::FrontendError;

/// Errors that abort a sync pass.
///
/// Per-asset problems (a missing image, a failed transcode) never show up
/// here; they are logged and counted instead.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Filesystem error on {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Video transcoder unavailable: {0}")]
    TranscoderUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<FrontendError> for SyncError {
    fn from(e: FrontendError) -> Self {
        match e {
            FrontendError::Io { path, source } => Self::Filesystem { path, source },
        }
    }
}

/// Why a single remote asset could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}
