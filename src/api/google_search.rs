use super::{FetchedImage, ImageFetch, ImageSearch};
use crate::config::SearchConfig;
use crate::error::{Result, VideoError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const CUSTOM_SEARCH_API: &str = "https://www.googleapis.com/customsearch/v1";

/// Custom Search caps `num` at 10.
const MAX_RESULTS: usize = 10;

#[derive(Debug, Clone)]
pub struct GoogleImageSearch {
    config: SearchConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
}

impl GoogleImageSearch {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { config, client })
    }
}

fn links(response: SearchResponse) -> Vec<String> {
    response
        .items
        .into_iter()
        .filter_map(|item| item.link)
        .filter(|link| !link.trim().is_empty())
        .collect()
}

#[async_trait]
impl ImageSearch for GoogleImageSearch {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<String>> {
        let num = count.clamp(1, MAX_RESULTS).to_string();
        debug!("Searching images for '{}' (num={})", query, num);

        let response = self
            .client
            .get(CUSTOM_SEARCH_API)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.engine_id.as_str()),
                ("q", query),
                ("searchType", "image"),
                ("num", num.as_str()),
                ("safe", "active"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(VideoError::Api(format!(
                "Image search error (HTTP {}): {}",
                status, error_text
            )));
        }

        let body: SearchResponse = response.json().await?;
        Ok(links(body))
    }
}

/// Plain HTTP GET with a short per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetch for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}
