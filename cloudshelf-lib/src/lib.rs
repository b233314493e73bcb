pub mod async_util;
pub mod cancel;
pub mod settings;
pub mod worker_pool;

pub use cancel::CancelToken;
pub use settings::{PathSettings, Settings, SyncSettings};
pub use worker_pool::WorkerPool;
