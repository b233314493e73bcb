//! Reconciliation engine: keeps the ES-DE greenlight system in step with
//! the cloud catalog.

pub mod download;
pub mod driver;
pub mod error;
pub mod events;
pub mod planner;
pub mod prune;
pub mod transcode;

pub use download::{DownloadReport, Fetcher, HttpFetcher, normalize_url};
pub use driver::{SyncOptions, SyncOutcome, SyncServices, SyncSummary, run_sync};
pub use error::{FetchError, SyncError};
pub use events::SyncEvent;
pub use planner::{DownloadTask, TaskSource, VideoTask, plan_record};
pub use prune::prune;
pub use transcode::{FfmpegTranscoder, TranscodeError, TranscodeReport, Transcoder};
