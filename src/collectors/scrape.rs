//! Competitor website text.
//!
//! Finds competitor pages with a web search, fetches the top few and keeps
//! each page's title and leading paragraphs.

use super::serpapi::{organic_hits, SerpApiClient};
use super::Collector;
use crate::error::CollectError;
use crate::models::{Fragment, Query, ScrapedPage, SourceKind};
use async_trait::async_trait;
use futures::future::join_all;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub struct CompetitorPagesCollector {
    search: Arc<SerpApiClient>,
    http: reqwest::Client,
    max_pages: usize,
    max_paragraphs: usize,
}

impl CompetitorPagesCollector {
    pub fn new(
        search: Arc<SerpApiClient>,
        max_pages: usize,
        max_paragraphs: usize,
        timeout_seconds: u64,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            search,
            http,
            max_pages,
            max_paragraphs,
        })
    }

    async fn scrape(&self, url: &str) -> Result<ScrapedPage, CollectError> {
        let html = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let (title, paragraphs) = extract_page_text(&html, self.max_paragraphs);
        if title.is_none() && paragraphs.is_empty() {
            return Err(CollectError::EmptyResult(format!("no text on {}", url)));
        }

        Ok(ScrapedPage {
            url: url.to_string(),
            title: title.unwrap_or_else(|| "No title found".to_string()),
            paragraphs,
        })
    }
}

#[async_trait]
impl Collector for CompetitorPagesCollector {
    fn source(&self) -> SourceKind {
        SourceKind::CompetitorPages
    }

    async fn fetch(&self, query: &Query) -> Result<Fragment, CollectError> {
        let body = self
            .search
            .search(&[
                ("engine", "google".to_string()),
                ("q", format!("best {}", query.phrase())),
                ("num", "10".to_string()),
            ])
            .await?;

        let links: Vec<String> = organic_hits(&body, usize::MAX)
            .into_iter()
            .map(|hit| hit.link)
            .filter(|link| link.starts_with("http://") || link.starts_with("https://"))
            .take(self.max_pages)
            .collect();

        if links.is_empty() {
            return Err(CollectError::EmptyResult(
                "no competitor pages found".to_string(),
            ));
        }

        let results = join_all(links.iter().map(|link| self.scrape(link))).await;

        let mut pages = Vec::new();
        let mut last_error = None;
        for (link, result) in links.iter().zip(results) {
            match result {
                Ok(page) => pages.push(page),
                Err(e) => {
                    debug!("Skipping {}: {}", link, e);
                    last_error = Some(e);
                }
            }
        }

        match (pages.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            _ => Ok(Fragment::Pages(pages)),
        }
    }
}

/// Title and the first `max_paragraphs` non-empty `<p>` texts of a page.
pub fn extract_page_text(html: &str, max_paragraphs: usize) -> (Option<String>, Vec<String>) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    });

    let paragraphs = match Selector::parse("p") {
        Ok(sel) => document
            .select(&sel)
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|p| !p.is_empty())
            .take(max_paragraphs)
            .collect(),
        Err(_) => Vec::new(),
    };

    (title, paragraphs)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><head><title> Heart Coffee | Roasters </title></head>
        <body>
          <nav><p>   </p></nav>
          <p>Small-batch roasting   since 2009.</p>
          <p>Two cafés in <b>Portland</b>.</p>
          <p>Wholesale available.</p>
        </body></html>"#;

    #[test]
    fn test_extract_page_text() {
        let (title, paragraphs) = extract_page_text(PAGE, 2);
        assert_eq!(title.as_deref(), Some("Heart Coffee | Roasters"));
        assert_eq!(
            paragraphs,
            vec![
                "Small-batch roasting since 2009.".to_string(),
                "Two cafés in Portland.".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_page_text_without_content() {
        let (title, paragraphs) = extract_page_text("<html><body><div>x</div></body></html>", 10);
        assert_eq!(title, None);
        assert!(paragraphs.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_skips_broken_pages() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic_results": [
                    {"title": "Heart", "link": format!("{}/heart", base)},
                    {"title": "Gone", "link": format!("{}/gone", base)},
                    {"title": "Relative", "link": "/not-absolute"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/heart"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let search = Arc::new(SerpApiClient::new(base.clone(), Some("k".to_string()), 5).unwrap());
        let collector = CompetitorPagesCollector::new(search, 3, 10, 5).unwrap();
        let query = Query::new("coffee shop", "Portland").unwrap();

        match collector.fetch(&query).await.unwrap() {
            Fragment::Pages(pages) => {
                assert_eq!(pages.len(), 1);
                assert_eq!(pages[0].title, "Heart Coffee | Roasters");
                assert_eq!(pages[0].paragraphs.len(), 3);
            }
            other => panic!("unexpected fragment: {:?}", other),
        }
    }
}
