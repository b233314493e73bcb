//! Wire types for the discovery and details endpoints, and their
//! extraction into [`CatalogRecord`]s.

use serde::Deserialize;

use cloudshelf_core::{CatalogRecord, ImageSet};

/// One element of the discovery list. Only entries with an `id` matter;
/// the list also carries a header object without one.
#[derive(Debug, Deserialize)]
pub struct SiglEntry {
    #[serde(default)]
    pub id: Option<String>,
}

/// Top-level response from the product details endpoint.
#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    #[serde(rename = "Products", default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub localized_properties: Vec<LocalizedProperties>,
    #[serde(default)]
    pub market_properties: Vec<MarketProperties>,
    #[serde(default)]
    pub properties: Option<ProductProperties>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalizedProperties {
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub developer_name: Option<String>,
    #[serde(default)]
    pub publisher_name: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(rename = "CMSVideos", default)]
    pub cms_videos: Vec<CmsVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductImage {
    #[serde(default)]
    pub image_purpose: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CmsVideo {
    #[serde(rename = "DASH", default)]
    pub dash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketProperties {
    #[serde(default)]
    pub original_release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductProperties {
    #[serde(default)]
    pub category: Option<String>,
}

impl Product {
    /// Extract the fields cloudshelf keeps. Index 0 of the localized and
    /// market arrays is the canonical locale/market.
    pub fn into_record(self) -> CatalogRecord {
        let market = self.market_properties.into_iter().next();
        let localized = self
            .localized_properties
            .into_iter()
            .next()
            .unwrap_or_default();

        let images = select_images(&localized.images);
        let dash = localized
            .cms_videos
            .iter()
            .find_map(|v| v.dash.clone().filter(|d| !d.is_empty()));

        CatalogRecord {
            product_id: self.product_id,
            product_title: localized.product_title,
            short_description: localized.short_description,
            developer_name: localized.developer_name,
            publisher_name: localized.publisher_name,
            category: self.properties.and_then(|p| p.category),
            original_release_date: market.and_then(|m| m.original_release_date),
            images,
            dash,
            ..Default::default()
        }
    }
}

/// Pick image URIs by purpose.
///
/// Logo, Poster and BoxArt are taken as-is (a later duplicate replaces an
/// earlier one). SuperHeroArt only fills the hero slot while no
/// TitledHeroArt has been seen; a TitledHeroArt always takes the slot.
pub fn select_images(images: &[ProductImage]) -> ImageSet {
    let mut set = ImageSet::default();
    let mut titled_hero_found = false;

    for image in images {
        let uri = image.uri.clone();
        match image.image_purpose.as_deref() {
            Some("Logo") => set.logo = uri,
            Some("Poster") => set.poster = uri,
            Some("BoxArt") => set.box_art = uri,
            Some("TitledHeroArt") => {
                set.titled_hero_art = uri;
                titled_hero_found = true;
            }
            Some("SuperHeroArt") if !titled_hero_found => set.titled_hero_art = uri,
            _ => {}
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(purpose: &str, uri: &str) -> ProductImage {
        ProductImage {
            image_purpose: Some(purpose.to_string()),
            uri: Some(uri.to_string()),
        }
    }

    #[test]
    fn test_super_hero_art_is_fallback() {
        let set = select_images(&[image("Poster", "//p"), image("SuperHeroArt", "//super")]);
        assert_eq!(set.titled_hero_art.as_deref(), Some("//super"));
        assert_eq!(set.poster.as_deref(), Some("//p"));
    }

    #[test]
    fn test_titled_hero_art_wins() {
        let set = select_images(&[
            image("TitledHeroArt", "//titled"),
            image("SuperHeroArt", "//super"),
        ]);
        assert_eq!(set.titled_hero_art.as_deref(), Some("//titled"));

        let set = select_images(&[
            image("SuperHeroArt", "//super"),
            image("TitledHeroArt", "//titled"),
        ]);
        assert_eq!(set.titled_hero_art.as_deref(), Some("//titled"));
    }

    #[test]
    fn test_unknown_purposes_ignored() {
        let set = select_images(&[image("Screenshot", "//shot"), image("BrandedKeyArt", "//k")]);
        assert_eq!(set, ImageSet::default());
    }

    #[test]
    fn test_product_extraction() {
        let json = r#"{
            "Products": [{
                "ProductId": "9NBLGGH4R315",
                "LocalizedProperties": [{
                    "ProductTitle": "Forza Horizon 5",
                    "ShortDescription": "Your greatest Horizon Adventure awaits!",
                    "DeveloperName": "Playground Games",
                    "PublisherName": "Xbox Game Studios",
                    "Images": [
                        { "ImagePurpose": "Logo", "Uri": "//logo" },
                        { "ImagePurpose": "Poster", "Uri": "//poster" }
                    ],
                    "CMSVideos": [ { "DASH": null }, { "DASH": "https://v/1.mpd" }, { "DASH": "https://v/2.mpd" } ]
                }, {
                    "ProductTitle": "Second locale ignored"
                }],
                "MarketProperties": [ { "OriginalReleaseDate": "2021-11-09T00:00:00.0000000Z" } ],
                "Properties": { "Category": "Racing & flying" }
            }]
        }"#;
        let resp: ProductsResponse = serde_json::from_str(json).unwrap();
        let record = resp.products.into_iter().next().unwrap().into_record();
        assert_eq!(record.product_title.as_deref(), Some("Forza Horizon 5"));
        assert_eq!(record.publisher_name.as_deref(), Some("Xbox Game Studios"));
        assert_eq!(record.category.as_deref(), Some("Racing & flying"));
        assert_eq!(record.dash.as_deref(), Some("https://v/1.mpd"));
        assert_eq!(
            record.original_release_date.as_deref(),
            Some("2021-11-09T00:00:00.0000000Z")
        );
        assert!(record.images.titled_hero_art.is_none());
    }

    #[test]
    fn test_product_without_localized_properties() {
        let json = r#"{ "Products": [ { "ProductId": "X" } ] }"#;
        let resp: ProductsResponse = serde_json::from_str(json).unwrap();
        let record = resp.products.into_iter().next().unwrap().into_record();
        assert_eq!(record.product_id.as_deref(), Some("X"));
        assert!(record.product_title.is_none());
        assert!(record.dash.is_none());
    }

    #[test]
    fn test_sigl_entries_without_id() {
        let json = r#"[ { "siglId": "abc", "title": "Header" }, { "id": "A" }, { "id": "B" } ]"#;
        let entries: Vec<SiglEntry> = serde_json::from_str(json).unwrap();
        let ids: Vec<String> = entries.into_iter().filter_map(|e| e.id).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }
}
