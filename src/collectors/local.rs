//! Local business listings from the SerpAPI Google Maps engine.

use super::serpapi::{text, SerpApiClient};
use super::Collector;
use crate::error::CollectError;
use crate::models::{BusinessListing, Fragment, Query, SourceKind};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct LocalBusinessCollector {
    client: Arc<SerpApiClient>,
    limit: usize,
}

impl LocalBusinessCollector {
    pub fn new(client: Arc<SerpApiClient>, limit: usize) -> Self {
        Self { client, limit }
    }
}

#[async_trait]
impl Collector for LocalBusinessCollector {
    fn source(&self) -> SourceKind {
        SourceKind::LocalBusinesses
    }

    async fn fetch(&self, query: &Query) -> Result<Fragment, CollectError> {
        let body = self
            .client
            .search(&[
                ("engine", "google_maps".to_string()),
                ("type", "search".to_string()),
                ("q", query.phrase()),
            ])
            .await?;

        let listings = parse_listings(&body, self.limit);
        if listings.is_empty() {
            return Err(CollectError::EmptyResult(format!(
                "no local businesses found for {}",
                query.phrase()
            )));
        }

        Ok(Fragment::Listings(listings))
    }
}

/// Parse `local_results` into listings.
fn parse_listings(body: &Value, limit: usize) -> Vec<BusinessListing> {
    let Some(places) = body.get("local_results").and_then(Value::as_array) else {
        return Vec::new();
    };

    places
        .iter()
        .filter_map(|place| {
            Some(BusinessListing {
                name: text(place, "title")?,
                address: text(place, "address"),
                phone: text(place, "phone"),
                website: text(place, "website"),
                rating: place.get("rating").and_then(Value::as_f64).map(|r| r as f32),
                reviews: place.get("reviews").and_then(Value::as_u64),
                category: text(place, "type"),
                // `hours` is sometimes a summary string, sometimes a weekday table.
                hours: text(place, "hours"),
                description: text(place, "description"),
            })
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_listings() {
        let body = json!({
            "local_results": [
                {
                    "title": "Stumptown Coffee",
                    "address": "128 SW 3rd Ave",
                    "rating": 4.6,
                    "reviews": 2150,
                    "type": "Coffee shop",
                    "hours": "Open ⋅ Closes 6 PM",
                    "operating_hours": {"monday": "7 AM-6 PM"}
                },
                {
                    "title": "Heart Coffee",
                    "hours": {"monday": "7 AM-5 PM"}
                },
                {"address": "untitled place"}
            ]
        });

        let listings = parse_listings(&body, 10);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].name, "Stumptown Coffee");
        assert_eq!(listings[0].rating, Some(4.6));
        assert_eq!(listings[0].reviews, Some(2150));
        assert_eq!(listings[0].category.as_deref(), Some("Coffee shop"));
        assert!(listings[0].hours.is_some());
        assert_eq!(listings[1].hours, None);
        assert_eq!(listings[1].rating, None);
    }

    #[tokio::test]
    async fn test_fetch_uses_maps_engine() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("engine", "google_maps"))
            .and(query_param("q", "coffee shop in Portland"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "local_results": [{"title": "Stumptown Coffee", "rating": 4.6}]
            })))
            .mount(&server)
            .await;

        let client = Arc::new(SerpApiClient::new(server.uri(), Some("k".to_string()), 5).unwrap());
        let collector = LocalBusinessCollector::new(client, 10);
        let query = Query::new("coffee shop", "Portland").unwrap();

        match collector.fetch(&query).await.unwrap() {
            Fragment::Listings(listings) => assert_eq!(listings[0].name, "Stumptown Coffee"),
            other => panic!("unexpected fragment: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_without_results_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"search_metadata": {}})))
            .mount(&server)
            .await;

        let client = Arc::new(SerpApiClient::new(server.uri(), Some("k".to_string()), 5).unwrap());
        let collector = LocalBusinessCollector::new(client, 10);
        let query = Query::new("coffee shop", "Portland").unwrap();

        let err = collector.fetch(&query).await.unwrap_err();
        assert!(matches!(err, CollectError::EmptyResult(_)));
    }
}
