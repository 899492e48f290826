use async_trait::async_trait;
use tracing::{debug, error};

use crate::config::GoogleConfig;
use crate::error::TransportError;
use crate::gateway::SearchProvider;
use crate::models::{GoogleSearchResponse, ImageHit, SearchHit};

/// Google Custom Search client for web and image results.
#[derive(Debug, Clone)]
pub struct GoogleSearch {
    client: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleSearch {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn fetch(
        &self,
        query: &str,
        n: usize,
        image: bool,
    ) -> Result<GoogleSearchResponse, TransportError> {
        let (Some(api_key), Some(engine_id)) = (
            self.config.api_key.as_deref(),
            self.config.search_engine_id.as_deref(),
        ) else {
            return Err(TransportError::new("Google search credentials not configured"));
        };

        // The API caps `num` at 10.
        let num = n.clamp(1, 10).to_string();
        let mut params = vec![
            ("key", api_key),
            ("cx", engine_id),
            ("q", query),
            ("num", num.as_str()),
        ];
        if image {
            params.push(("searchType", "image"));
        }

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| TransportError::new(format!("Request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| TransportError::new(format!("Search API error: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| TransportError::new(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    async fn search(&self, query: &str, n: usize) -> Vec<SearchHit> {
        match self.fetch(query, n, false).await {
            Ok(response) => {
                debug!(query, results = response.items.len(), "web search finished");
                response
                    .items
                    .into_iter()
                    .map(|item| SearchHit {
                        title: item.title,
                        link: item.link,
                        snippet: item.snippet,
                    })
                    .collect()
            }
            Err(e) => {
                error!("Google search error: {}", e);
                vec![]
            }
        }
    }

    async fn image_search(&self, query: &str, n: usize) -> Vec<ImageHit> {
        match self.fetch(query, n, true).await {
            Ok(response) => {
                debug!(query, results = response.items.len(), "image search finished");
                response
                    .items
                    .into_iter()
                    .map(|item| {
                        let image = item.image.unwrap_or_default();
                        ImageHit {
                            thumbnail: image.thumbnail_link.unwrap_or_else(|| item.link.clone()),
                            context_link: image.context_link.unwrap_or_default(),
                            title: item.title,
                            link: item.link,
                        }
                    })
                    .collect()
            }
            Err(e) => {
                error!("Image search error: {}", e);
                vec![]
            }
        }
    }
}
