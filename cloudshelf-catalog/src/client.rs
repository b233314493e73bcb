use std::time::Duration;

use cloudshelf_core::CatalogRecord;

use crate::error::CatalogError;
use crate::types::{ProductsResponse, SiglEntry};

/// Game Pass cloud catalog list (ids only).
pub const DISCOVERY_URL: &str = "https://catalog.gamepass.com/sigls/v2?id=fdd9e2a7-0fee-49f6-ad69-4354098401ff&language=en-us&market=GB";

/// Product details endpoint; `{ids}` is replaced by the comma-joined batch.
pub const DETAILS_URL: &str = "https://displaycatalog.mp.microsoft.com/v7.0/products?bigIds={ids}&market=GB&languages=en-us&MS-CV=DGU1mcuYo0WMMp+F.1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can produce a complete catalog snapshot.
///
/// Implementations must either return the whole catalog or fail: the
/// pruner treats whatever comes back as the full truth.
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRecord>, CatalogError>;
}

/// HTTP client for the Game Pass discovery and display-catalog endpoints.
pub struct GamePassClient {
    http: reqwest::Client,
    discovery_url: String,
    details_url: String,
}

impl GamePassClient {
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_endpoints(DISCOVERY_URL, DETAILS_URL)
    }

    /// Client against alternative endpoints. `details_url` must contain
    /// an `{ids}` placeholder.
    pub fn with_endpoints(
        discovery_url: impl Into<String>,
        details_url: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            discovery_url: discovery_url.into(),
            details_url: details_url.into(),
        })
    }

    /// Fetch the list of content ids from the discovery endpoint.
    pub async fn fetch_ids(&self) -> Result<Vec<String>, CatalogError> {
        let text = self.get_text(&self.discovery_url, "discovery").await?;
        let entries: Vec<SiglEntry> =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                endpoint: "discovery",
                source,
            })?;
        let ids: Vec<String> = entries.into_iter().filter_map(|e| e.id).collect();
        log::debug!("Discovery returned {} ids", ids.len());
        Ok(ids)
    }

    /// Fetch details for a batch of ids in a single request.
    pub async fn fetch_details(&self, ids: &[String]) -> Result<Vec<CatalogRecord>, CatalogError> {
        let url = details_url(&self.details_url, ids);
        let text = self.get_text(&url, "details").await?;
        let response: ProductsResponse =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                endpoint: "details",
                source,
            })?;
        Ok(response
            .products
            .into_iter()
            .map(|p| p.into_record())
            .collect())
    }

    async fn get_text(&self, url: &str, endpoint: &'static str) -> Result<String, CatalogError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}

impl CatalogSource for GamePassClient {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRecord>, CatalogError> {
        let ids = self.fetch_ids().await?;
        if ids.is_empty() {
            return Err(CatalogError::Empty);
        }
        let records = self.fetch_details(&ids).await?;
        log::info!("Fetched {} catalog entries", records.len());
        Ok(records)
    }
}

fn details_url(template: &str, ids: &[String]) -> String {
    template.replace("{ids}", &ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_url_joins_ids() {
        let ids = vec!["9NBLGGH4R315".to_string(), "9P4D0K92BM7V".to_string()];
        let url = details_url(DETAILS_URL, &ids);
        assert!(url.contains("bigIds=9NBLGGH4R315,9P4D0K92BM7V&market=GB"));
        assert!(!url.contains("{ids}"));
    }
}
