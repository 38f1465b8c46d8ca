//! Search interest over the last twelve months via the SerpAPI Google Trends engine.

use super::serpapi::{text, SerpApiClient};
use super::Collector;
use crate::error::CollectError;
use crate::models::{Fragment, Query, SourceKind, TrendPoint, TrendSeries};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

const TIMEFRAME: &str = "today 12-m";

pub struct TrendsCollector {
    client: Arc<SerpApiClient>,
    max_terms: usize,
}

impl TrendsCollector {
    pub fn new(client: Arc<SerpApiClient>, max_terms: usize) -> Self {
        Self { client, max_terms }
    }

    fn params(keyword: &str, data_type: &str) -> Vec<(&'static str, String)> {
        vec![
            ("engine", "google_trends".to_string()),
            ("q", keyword.to_string()),
            ("data_type", data_type.to_string()),
            ("date", TIMEFRAME.to_string()),
        ]
    }
}

#[async_trait]
impl Collector for TrendsCollector {
    fn source(&self) -> SourceKind {
        SourceKind::Trends
    }

    async fn fetch(&self, query: &Query) -> Result<Fragment, CollectError> {
        let keyword = query.business_type();

        let body = self
            .client
            .search(&Self::params(keyword, "TIMESERIES"))
            .await?;
        let points = parse_timeline(&body);
        if points.is_empty() {
            return Err(CollectError::EmptyResult(format!(
                "no trend data found for {}",
                keyword
            )));
        }

        // Related queries are a bonus; the series stands on its own.
        let (rising_terms, top_terms) = match self
            .client
            .search(&Self::params(keyword, "RELATED_QUERIES"))
            .await
        {
            Ok(related) => (
                related_terms(&related, "rising", self.max_terms),
                related_terms(&related, "top", self.max_terms),
            ),
            Err(e) => {
                warn!("Related queries unavailable for {}: {}", keyword, e);
                (Vec::new(), Vec::new())
            }
        };

        Ok(Fragment::Trends(TrendSeries {
            keyword: keyword.to_string(),
            points,
            rising_terms,
            top_terms,
        }))
    }
}

fn parse_timeline(body: &Value) -> Vec<TrendPoint> {
    let Some(timeline) = body
        .pointer("/interest_over_time/timeline_data")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    timeline
        .iter()
        .filter_map(|entry| {
            let sample = entry.get("values")?.as_array()?.first()?;
            let value = sample
                .get("extracted_value")
                .and_then(Value::as_u64)
                .or_else(|| sample.get("value")?.as_str()?.trim().parse().ok())?;

            Some(TrendPoint {
                date: text(entry, "date").unwrap_or_default(),
                value: value.min(100) as u32,
            })
        })
        .collect()
}

fn related_terms(body: &Value, bucket: &str, limit: usize) -> Vec<String> {
    body.get("related_queries")
        .and_then(|r| r.get(bucket))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| text(item, "query"))
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn timeline_body() -> Value {
        json!({
            "interest_over_time": {
                "timeline_data": [
                    {"date": "Jan 2025", "values": [{"query": "coffee shop", "extracted_value": 40}]},
                    {"date": "Feb 2025", "values": [{"query": "coffee shop", "value": "55"}]},
                    {"date": "Mar 2025", "values": []}
                ]
            }
        })
    }

    #[test]
    fn test_parse_timeline() {
        let points = parse_timeline(&timeline_body());
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 40);
        assert_eq!(points[1].value, 55);
        assert_eq!(points[1].date, "Feb 2025");
    }

    #[test]
    fn test_related_terms() {
        let body = json!({
            "related_queries": {
                "rising": [{"query": "oat milk latte"}, {"query": "cold brew"}],
                "top": [{"query": "coffee near me"}]
            }
        });
        assert_eq!(
            related_terms(&body, "rising", 1),
            vec!["oat milk latte".to_string()]
        );
        assert_eq!(related_terms(&body, "top", 5).len(), 1);
        assert!(related_terms(&body, "missing", 5).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_survives_related_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("data_type", "TIMESERIES"))
            .respond_with(ResponseTemplate::new(200).set_body_json(timeline_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("data_type", "RELATED_QUERIES"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = Arc::new(SerpApiClient::new(server.uri(), Some("k".to_string()), 5).unwrap());
        let collector = TrendsCollector::new(client, 5);
        let query = Query::new("coffee shop", "Portland").unwrap();

        match collector.fetch(&query).await.unwrap() {
            Fragment::Trends(series) => {
                assert_eq!(series.keyword, "coffee shop");
                assert_eq!(series.points.len(), 2);
                assert!(series.rising_terms.is_empty());
            }
            other => panic!("unexpected fragment: {:?}", other),
        }
    }
}
