//! Organic web search collectors: market overview and demographics.

use super::serpapi::{organic_hits, SerpApiClient};
use super::Collector;
use crate::error::CollectError;
use crate::models::{Fragment, Query, SourceKind};
use async_trait::async_trait;
use std::sync::Arc;

/// Market size and growth results for the business type.
pub struct WebSearchCollector {
    client: Arc<SerpApiClient>,
    limit: usize,
}

impl WebSearchCollector {
    pub fn new(client: Arc<SerpApiClient>, limit: usize) -> Self {
        Self { client, limit }
    }

    fn search_terms(query: &Query) -> String {
        format!(
            "{} industry market size growth trends {}",
            query.business_type(),
            query.location()
        )
    }
}

#[async_trait]
impl Collector for WebSearchCollector {
    fn source(&self) -> SourceKind {
        SourceKind::WebSearch
    }

    async fn fetch(&self, query: &Query) -> Result<Fragment, CollectError> {
        let body = self
            .client
            .search(&[
                ("engine", "google".to_string()),
                ("q", Self::search_terms(query)),
                ("num", "10".to_string()),
            ])
            .await?;

        Ok(Fragment::SearchHits(organic_hits(&body, self.limit)))
    }
}

/// Population and demographic results for the location.
pub struct DemographicsCollector {
    client: Arc<SerpApiClient>,
    limit: usize,
}

impl DemographicsCollector {
    pub fn new(client: Arc<SerpApiClient>, limit: usize) -> Self {
        Self { client, limit }
    }
}

#[async_trait]
impl Collector for DemographicsCollector {
    fn source(&self) -> SourceKind {
        SourceKind::Demographics
    }

    async fn fetch(&self, query: &Query) -> Result<Fragment, CollectError> {
        let body = self
            .client
            .search(&[
                ("engine", "google".to_string()),
                (
                    "q",
                    format!("{} demographics population statistics", query.location()),
                ),
                ("num", self.limit.to_string()),
            ])
            .await?;

        Ok(Fragment::SearchHits(organic_hits(&body, self.limit)))
    }
}
