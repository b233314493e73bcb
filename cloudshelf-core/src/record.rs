use serde::{Deserialize, Serialize};

use crate::key::ArtifactKey;

/// Image URIs extracted for one catalog title, by purpose.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSet {
    #[serde(rename = "Logo", default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(rename = "Poster", default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(rename = "BoxArt", default, skip_serializing_if = "Option::is_none")]
    pub box_art: Option<String>,
    /// Titled hero art, or the super hero art when no titled variant exists.
    #[serde(rename = "TitledHeroArt", default, skip_serializing_if = "Option::is_none")]
    pub titled_hero_art: Option<String>,
}

/// One remote catalog title.
///
/// Serialized with the remote catalog's field names so the cache file reads
/// like the upstream payload it was extracted from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogRecord {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub developer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Partial ISO-8601 timestamp, e.g. `2021-11-09T00:00:00.0000000Z`
    #[serde(default)]
    pub original_release_date: Option<String>,
    #[serde(default)]
    pub images: ImageSet,
    /// DASH manifest of the first trailer that has one
    #[serde(rename = "DASH", default)]
    pub dash: Option<String>,

    // Never supplied by the remote catalog, but honoured when present in
    // the cache file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<String>,
}

impl CatalogRecord {
    /// Display title, falling back to `"Unknown"`.
    pub fn title(&self) -> &str {
        match self.product_title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => "Unknown",
        }
    }

    /// The artifact key for this record.
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::from_title(self.product_title.as_deref().unwrap_or_default())
    }

    /// Source for the logo slot: the logo, or the poster if there is none.
    pub fn logo_source(&self) -> Option<&str> {
        self.images
            .logo
            .as_deref()
            .or(self.images.poster.as_deref())
    }

    pub fn cover_source(&self) -> Option<&str> {
        self.images.poster.as_deref()
    }

    pub fn fanart_source(&self) -> Option<&str> {
        self.images.titled_hero_art.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_falls_back_to_poster() {
        let record = CatalogRecord {
            product_title: Some("Grounded".into()),
            images: ImageSet {
                poster: Some("//store-images.s-microsoft.com/poster".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            record.logo_source(),
            Some("//store-images.s-microsoft.com/poster")
        );
        assert_eq!(record.cover_source(), record.logo_source());
    }

    #[test]
    fn test_missing_title_keys_as_unknown() {
        let record = CatalogRecord::default();
        assert_eq!(record.title(), "Unknown");
        assert_eq!(record.key().as_str(), "UNKNOWN");
    }

    #[test]
    fn test_cache_field_names() {
        let json = r#"{
            "ProductId": "9NBLGGH4R315",
            "ProductTitle": "Forza Horizon 5",
            "ShortDescription": "Explore Mexico",
            "DeveloperName": "Playground Games",
            "OriginalReleaseDate": "2021-11-09T00:00:00.0000000Z",
            "Images": { "Logo": "//logo", "TitledHeroArt": "//hero" },
            "DASH": "https://example.invalid/manifest.mpd"
        }"#;
        let record: CatalogRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.key().as_str(), "FORZAHORIZON5");
        assert_eq!(record.images.logo.as_deref(), Some("//logo"));
        assert_eq!(record.fanart_source(), Some("//hero"));
        assert!(record.publisher_name.is_none());
        assert!(record.rating.is_none());

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["DASH"], "https://example.invalid/manifest.mpd");
        assert!(back.get("Rating").is_none());
    }
}
