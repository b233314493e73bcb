pub mod cache;
pub mod client;
pub mod error;
pub mod types;

pub use cache::{CacheStatus, CatalogCache, ResolvedCatalog, Resolution, default_cache_dir};
pub use client::{CatalogSource, GamePassClient};
pub use error::CatalogError;
