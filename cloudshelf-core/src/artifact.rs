use std::fmt;

/// The five kinds of file generated for each catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Launch script run by ES-DE
    Script,
    /// Logo / marquee image
    Logo,
    /// Front cover (poster) image
    Cover,
    /// Hero art used as fanart
    Fanart,
    /// Transcoded preview video
    Video,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Script,
        ArtifactKind::Logo,
        ArtifactKind::Cover,
        ArtifactKind::Fanart,
        ArtifactKind::Video,
    ];

    /// Image kinds, in the order they are planned.
    pub const IMAGES: [ArtifactKind; 3] =
        [ArtifactKind::Logo, ArtifactKind::Cover, ArtifactKind::Fanart];

    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Script => "sh",
            ArtifactKind::Video => "mp4",
            _ => "png",
        }
    }

    /// Media subdirectory under the assets directory (ES-DE layout).
    /// Scripts live directly in the games directory and have none.
    pub fn media_subdir(&self) -> Option<&'static str> {
        match self {
            ArtifactKind::Script => None,
            ArtifactKind::Logo => Some("marquees"),
            ArtifactKind::Cover => Some("covers"),
            ArtifactKind::Fanart => Some("fanart"),
            ArtifactKind::Video => Some("videos"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Script => "scripts",
            ArtifactKind::Logo => "logos",
            ArtifactKind::Cover => "covers",
            ArtifactKind::Fanart => "fanart",
            ArtifactKind::Video => "videos",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-kind file counts (created, removed, skipped...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactCounts {
    pub scripts: usize,
    pub logos: usize,
    pub covers: usize,
    pub fanart: usize,
    pub videos: usize,
}

impl ArtifactCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: ArtifactKind) {
        *self.slot_mut(kind) += 1;
    }

    pub fn get(&self, kind: ArtifactKind) -> usize {
        match kind {
            ArtifactKind::Script => self.scripts,
            ArtifactKind::Logo => self.logos,
            ArtifactKind::Cover => self.covers,
            ArtifactKind::Fanart => self.fanart,
            ArtifactKind::Video => self.videos,
        }
    }

    pub fn total(&self) -> usize {
        self.scripts + self.logos + self.covers + self.fanart + self.videos
    }

    pub fn merge(&mut self, other: &ArtifactCounts) {
        for kind in ArtifactKind::ALL {
            *self.slot_mut(kind) += other.get(kind);
        }
    }

    fn slot_mut(&mut self, kind: ArtifactKind) -> &mut usize {
        match kind {
            ArtifactKind::Script => &mut self.scripts,
            ArtifactKind::Logo => &mut self.logos,
            ArtifactKind::Cover => &mut self.covers,
            ArtifactKind::Fanart => &mut self.fanart,
            ArtifactKind::Video => &mut self.videos,
        }
    }
}

impl fmt::Display for ArtifactCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scripts, {} logos, {} covers, {} fanart, {} videos",
            self.scripts, self.logos, self.covers, self.fanart, self.videos
        )
    }
}
