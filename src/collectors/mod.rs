//! Data collectors.
//!
//! Each collector wraps one external source and turns a [`Query`] into a
//! [`Fragment`]. Collectors are independent; [`collect_all`] runs them
//! concurrently and converts failures into [`SourceIssue`]s.

pub mod local;
pub mod news;
pub mod scrape;
pub mod search;
pub mod serpapi;
pub mod trends;

use crate::config::SourcesConfig;
use crate::error::CollectError;
use crate::models::{CollectorResult, Fragment, IssueKind, Query, SourceIssue, SourceKind};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

pub use local::LocalBusinessCollector;
pub use news::NewsCollector;
pub use scrape::CompetitorPagesCollector;
pub use search::{DemographicsCollector, WebSearchCollector};
pub use serpapi::SerpApiClient;
pub use trends::TrendsCollector;

/// A wrapper around one external data source.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Which report section this collector feeds.
    fn source(&self) -> SourceKind;

    /// Fetch this source's fragment for the query.
    async fn fetch(&self, query: &Query) -> Result<Fragment, CollectError>;
}

/// Run all collectors concurrently and join their results.
///
/// Never fails: errors and empty fragments become issues.
pub async fn collect_all(
    collectors: &[Box<dyn Collector>],
    query: &Query,
) -> (CollectorResult, Vec<SourceIssue>) {
    let outcomes = join_all(collectors.iter().map(|c| async move {
        let result = c.fetch(query).await;
        (c.source(), result)
    }))
    .await;

    let mut fragments = CollectorResult::new();
    let mut issues = Vec::new();

    for (source, outcome) in outcomes {
        match outcome {
            Ok(fragment) if fragment.is_empty() => {
                info!("{}: no results", source);
                issues.push(SourceIssue::new(
                    source,
                    IssueKind::EmptyResult,
                    "the source returned no data",
                ));
            }
            Ok(fragment) => {
                info!("{}: collected", source);
                fragments.insert(source, fragment);
            }
            Err(CollectError::EmptyResult(message)) => {
                info!("{}: no results ({})", source, message);
                issues.push(SourceIssue::new(source, IssueKind::EmptyResult, message));
            }
            Err(CollectError::SourceUnavailable(message)) => {
                warn!("{}: unavailable ({})", source, message);
                issues.push(SourceIssue::new(
                    source,
                    IssueKind::SourceUnavailable,
                    message,
                ));
            }
        }
    }

    (fragments, issues)
}

/// Build the enabled collectors from configuration.
pub fn build_collectors(
    config: &SourcesConfig,
    serpapi_key: Option<String>,
) -> anyhow::Result<Vec<Box<dyn Collector>>> {
    let client = Arc::new(SerpApiClient::new(
        config.serpapi_url.clone(),
        serpapi_key,
        config.timeout_seconds,
    )?);

    let mut collectors: Vec<Box<dyn Collector>> = Vec::new();
    for source in SourceKind::ALL {
        if !config.enabled.contains(&source) {
            continue;
        }

        let collector: Box<dyn Collector> = match source {
            SourceKind::LocalBusinesses => Box::new(LocalBusinessCollector::new(
                client.clone(),
                config.max_listings,
            )),
            SourceKind::WebSearch => Box::new(WebSearchCollector::new(
                client.clone(),
                config.max_search_results,
            )),
            SourceKind::Trends => Box::new(TrendsCollector::new(
                client.clone(),
                config.max_trend_terms,
            )),
            SourceKind::News => Box::new(NewsCollector::new(client.clone(), config.max_news)),
            SourceKind::Demographics => Box::new(DemographicsCollector::new(
                client.clone(),
                config.max_demographics,
            )),
            SourceKind::CompetitorPages => Box::new(CompetitorPagesCollector::new(
                client.clone(),
                config.scrape_pages,
                config.scrape_paragraphs,
                config.scrape_timeout_seconds,
            )?),
        };
        collectors.push(collector);
    }

    Ok(collectors)
}
