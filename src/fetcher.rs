use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::CatalogConfig;
use crate::error::{Result, ShelfError};
use crate::filter::{FilterState, SEARCH_KEY, SORT_KEY};
use crate::types::{Category, Page, Store};

/// Fetches exactly one page for a fully resolved filter. No retries, no
/// shared state.
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch(&self, filter: &FilterState, page: u32, page_size: u32) -> Result<Page<T>>;
}

/// Build the ordered query pairs for one page request.
///
/// Filter keys pass through verbatim, except `sort`, which goes through the
/// `SortKey` table, and `search`, which is sent as the full-text parameter.
pub fn build_query(
    filter: &FilterState,
    page: u32,
    page_size: u32,
    params: &CatalogConfig,
) -> Vec<(String, String)> {
    let mut query = vec![
        (params.page_param.clone(), page.to_string()),
        (params.limit_param.clone(), page_size.to_string()),
    ];

    for (key, value) in filter.iter() {
        if key == SORT_KEY || key == SEARCH_KEY {
            continue;
        }
        query.push((key.to_string(), value.to_string()));
    }

    if let Some(search) = filter.search() {
        query.push((params.search_param.clone(), search.to_string()));
    }

    if let Some(sort) = filter.sort() {
        let fields = sort.backend_fields();
        let names = fields.iter().map(|(f, _)| *f).collect::<Vec<_>>().join(",");
        let orders = fields
            .iter()
            .map(|(_, o)| o.as_api_str())
            .collect::<Vec<_>>()
            .join(",");
        query.push((params.sort_param.clone(), names));
        query.push((params.order_param.clone(), orders));
    } else if let Some(raw) = filter.get(SORT_KEY) {
        tracing::debug!(sort = raw, "unknown sort key, sending unsorted request");
    }

    query
}

/// HTTP client for the store catalog
pub struct CatalogClient {
    client: Client,
    config: CatalogConfig,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ShelfError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ShelfError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ShelfError::Decode(e.to_string()))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let url = self.api_url(&self.config.categories_path);
        self.get_json(&url, &[]).await
    }
}

#[async_trait]
impl PageFetcher<Store> for CatalogClient {
    async fn fetch(&self, filter: &FilterState, page: u32, page_size: u32) -> Result<Page<Store>> {
        let url = self.api_url(&self.config.collection);
        let query = build_query(filter, page, page_size, &self.config);
        tracing::debug!(%url, page, fingerprint = %filter, "fetching page");

        let stores: Vec<Store> = self.get_json(&url, &query).await?;
        Ok(Page::from_batch(stores, page, page_size))
    }
}
