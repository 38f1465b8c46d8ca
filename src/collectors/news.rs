//! Local news from the SerpAPI Google News tab.

use super::serpapi::{text, SerpApiClient};
use super::Collector;
use crate::error::CollectError;
use crate::models::{Fragment, NewsItem, Query, SourceKind};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct NewsCollector {
    client: Arc<SerpApiClient>,
    limit: usize,
}

impl NewsCollector {
    pub fn new(client: Arc<SerpApiClient>, limit: usize) -> Self {
        Self { client, limit }
    }
}

#[async_trait]
impl Collector for NewsCollector {
    fn source(&self) -> SourceKind {
        SourceKind::News
    }

    async fn fetch(&self, query: &Query) -> Result<Fragment, CollectError> {
        let body = self
            .client
            .search(&[
                ("engine", "google".to_string()),
                ("tbm", "nws".to_string()),
                (
                    "q",
                    format!("{} {} news", query.business_type(), query.location()),
                ),
                ("num", self.limit.to_string()),
            ])
            .await?;

        Ok(Fragment::News(parse_news(&body, self.limit)))
    }
}

fn parse_news(body: &Value, limit: usize) -> Vec<NewsItem> {
    let Some(results) = body.get("news_results").and_then(Value::as_array) else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|item| {
            // `source` is a plain string on the news tab, an object on the news engine.
            let source = text(item, "source")
                .or_else(|| item.get("source").and_then(|s| text(s, "name")));

            Some(NewsItem {
                title: text(item, "title")?,
                link: text(item, "link").unwrap_or_default(),
                source,
                date: text(item, "date"),
                snippet: text(item, "snippet"),
            })
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_news_source_shapes() {
        let body = json!({
            "news_results": [
                {"title": "New roastery opens", "link": "https://a", "source": "Oregonian", "date": "2 days ago"},
                {"title": "Coffee prices climb", "link": "https://b", "source": {"name": "KGW"}},
                {"link": "https://untitled"}
            ]
        });

        let items = parse_news(&body, 5);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source.as_deref(), Some("Oregonian"));
        assert_eq!(items[0].date.as_deref(), Some("2 days ago"));
        assert_eq!(items[1].source.as_deref(), Some("KGW"));
        assert_eq!(items[1].snippet, None);
    }
}
