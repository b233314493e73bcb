//! Shared types for cloudshelf: artifact keys, catalog records and the
//! on-disk artifact layout.

pub mod artifact;
pub mod key;
pub mod layout;
pub mod record;

pub use artifact::{ArtifactCounts, ArtifactKind};
pub use key::{ArtifactKey, normalize_title};
pub use layout::SyncPaths;
pub use record::{CatalogRecord, ImageSet};
