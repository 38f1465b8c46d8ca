//! Thin SerpAPI client shared by the search-backed collectors.

use crate::error::CollectError;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Message SerpAPI puts in `error` when a search simply has no hits.
const NO_RESULTS_MARKER: &str = "hasn't returned any results";

/// Client for `GET {base}/search.json`.
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SerpApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_seconds: u64,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Run one search with the given engine parameters.
    pub async fn search(&self, params: &[(&str, String)]) -> Result<Value, CollectError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CollectError::SourceUnavailable("SERPAPI_API_KEY is not set".to_string())
        })?;

        let url = format!("{}/search.json", self.base_url);
        debug!("SerpAPI request: {:?}", params);

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("api_key", api_key)])
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            CollectError::SourceUnavailable(format!("invalid SerpAPI response ({}): {}", status, e))
        })?;

        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(if message.contains(NO_RESULTS_MARKER) {
                CollectError::EmptyResult(message.to_string())
            } else {
                CollectError::SourceUnavailable(message.to_string())
            });
        }

        if !status.is_success() {
            return Err(CollectError::SourceUnavailable(format!(
                "SerpAPI returned HTTP {}",
                status
            )));
        }

        Ok(body)
    }
}

/// String field, treating blanks as absent.
pub fn text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Parse `organic_results` into search hits.
pub fn organic_hits(body: &Value, limit: usize) -> Vec<crate::models::SearchHit> {
    body.get("organic_results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|r| {
                    Some(crate::models::SearchHit {
                        title: text(r, "title")?,
                        link: text(r, "link").unwrap_or_default(),
                        snippet: text(r, "snippet").unwrap_or_default(),
                    })
                })
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}
