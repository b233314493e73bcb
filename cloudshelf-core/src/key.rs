use std::borrow::Borrow;
use std::fmt;

/// Title substituted when a catalog record has no usable title.
const UNKNOWN_TITLE: &str = "Unknown";

/// Normalize a display title into an artifact key string.
///
/// Keeps ASCII letters and digits, uppercased; everything else is dropped.
/// An empty title, or one with no alphanumerics at all, normalizes as
/// `"Unknown"` so the key is always usable as a filename stem.
pub fn normalize_title(title: &str) -> String {
    let key = strip_to_key(title);
    if key.is_empty() {
        strip_to_key(UNKNOWN_TITLE)
    } else {
        key
    }
}

fn strip_to_key(title: &str) -> String {
    title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Stable per-title identifier used to name artifact files.
///
/// Distinct titles can collide on the same key (e.g. "Halo" and "HALO!").
/// Nothing here resolves that: whichever record is processed last wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Derive the key for a display title.
    pub fn from_title(title: &str) -> Self {
        Self(normalize_title(title))
    }

    /// Wrap a filename stem that is already a key (no normalization).
    pub fn from_stem(stem: impl Into<String>) -> Self {
        Self(stem.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ArtifactKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ArtifactKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
