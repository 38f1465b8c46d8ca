//! Data models for the market research pipeline.
//!
//! This module contains the query, the per-source fragments produced by
//! collectors, and the consolidated [`ReportData`] handed to the renderer.

use crate::error::ValidationError;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// A validated research request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    business_type: String,
    location: String,
}

impl Query {
    /// Create a query, trimming both fields and rejecting empty ones.
    pub fn new(
        business_type: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let business_type = business_type.into().trim().to_string();
        let location = location.into().trim().to_string();

        if business_type.is_empty() {
            return Err(ValidationError::EmptyBusinessType);
        }
        if location.is_empty() {
            return Err(ValidationError::EmptyLocation);
        }

        Ok(Self {
            business_type,
            location,
        })
    }

    /// Split a free-text idea such as "coffee shop in Portland".
    ///
    /// Returns `None` when no location can be found or nothing precedes it.
    pub fn from_idea(idea: &str) -> Option<(String, String)> {
        static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            ["in", "at", "for"]
                .iter()
                .filter_map(|prep| {
                    Regex::new(&format!(
                        r"(?i)\b{}\s+([A-Za-z\s]+(?:,\s*[A-Za-z\s]+)?)",
                        prep
                    ))
                    .ok()
                })
                .collect()
        });

        for pattern in patterns {
            let Some(caps) = pattern.captures(idea) else {
                continue;
            };
            let (Some(whole), Some(place)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            let location = place.as_str().trim();
            if location.is_empty() || is_article(location) {
                continue;
            }

            let business_type = idea[..whole.start()].trim();
            if business_type.is_empty() {
                continue;
            }

            return Some((business_type.to_string(), location.to_string()));
        }

        None
    }

    pub fn business_type(&self) -> &str {
        &self.business_type
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// "coffee shop in Portland"
    pub fn phrase(&self) -> String {
        format!("{} in {}", self.business_type, self.location)
    }

    /// Lowercase, underscore-separated form used in output file names.
    pub fn slug(&self) -> String {
        let raw = format!("{} {}", self.business_type, self.location).to_lowercase();
        raw.split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_")
    }
}

fn is_article(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "the" | "a" | "an" | "my" | "our" | "your" | "their"
    )
}

/// The data sources a report draws on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    LocalBusinesses,
    WebSearch,
    Trends,
    News,
    Demographics,
    CompetitorPages,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::LocalBusinesses,
        SourceKind::WebSearch,
        SourceKind::Trends,
        SourceKind::News,
        SourceKind::Demographics,
        SourceKind::CompetitorPages,
    ];
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::LocalBusinesses => write!(f, "Local businesses"),
            SourceKind::WebSearch => write!(f, "Web search"),
            SourceKind::Trends => write!(f, "Search trends"),
            SourceKind::News => write!(f, "Local news"),
            SourceKind::Demographics => write!(f, "Demographics"),
            SourceKind::CompetitorPages => write!(f, "Competitor websites"),
        }
    }
}

/// A business listing from a maps search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessListing {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// One news article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// A single interest-over-time sample (0-100 scale).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub value: u32,
}

/// Search-interest data for one keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub keyword: String,
    pub points: Vec<TrendPoint>,
    pub rising_terms: Vec<String>,
    pub top_terms: Vec<String>,
}

/// Text extracted from a competitor web page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: String,
    pub paragraphs: Vec<String>,
}

/// The payload contributed by one collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Fragment {
    Listings(Vec<BusinessListing>),
    SearchHits(Vec<SearchHit>),
    Trends(TrendSeries),
    News(Vec<NewsItem>),
    Pages(Vec<ScrapedPage>),
}

impl Fragment {
    /// Whether the fragment carries no usable data.
    pub fn is_empty(&self) -> bool {
        match self {
            Fragment::Listings(v) => v.is_empty(),
            Fragment::SearchHits(v) => v.is_empty(),
            Fragment::Trends(t) => t.points.is_empty(),
            Fragment::News(v) => v.is_empty(),
            Fragment::Pages(v) => v.is_empty(),
        }
    }
}

/// All fragments gathered for one query, keyed by source.
pub type CollectorResult = BTreeMap<SourceKind, Fragment>;

/// What went wrong with a section of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    SourceUnavailable,
    EmptyResult,
    /// Disabled in configuration; never contacted.
    NotRequested,
    ModelFailure,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::SourceUnavailable => write!(f, "Unavailable"),
            IssueKind::EmptyResult => write!(f, "No data"),
            IssueKind::NotRequested => write!(f, "Not requested"),
            IssueKind::ModelFailure => write!(f, "Model failure"),
        }
    }
}

/// A non-fatal problem recorded while building the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIssue {
    /// `None` for the narrative synthesizer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKind>,
    pub kind: IssueKind,
    pub message: String,
}

impl SourceIssue {
    pub fn new(source: SourceKind, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            source: Some(source),
            kind,
            message: message.into(),
        }
    }

    pub fn model_failure(message: impl Into<String>) -> Self {
        Self {
            source: None,
            kind: IssueKind::ModelFailure,
            message: message.into(),
        }
    }

    /// Section label shown in the coverage table.
    pub fn label(&self) -> String {
        match self.source {
            Some(source) => source.to_string(),
            None => "Narrative".to_string(),
        }
    }
}

/// Summary statistics over competitor listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompetitorStats {
    pub count: usize,
    pub rated_count: usize,
    /// Mean rating rounded to one decimal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f32>,
    pub total_reviews: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_rated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompetitorSection {
    pub listings: Vec<BusinessListing>,
    pub pages: Vec<ScrapedPage>,
    pub stats: CompetitorStats,
}

impl CompetitorSection {
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty() && self.pages.is_empty()
    }
}

/// Direction of search interest over the last six samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Rising => write!(f, "rising"),
            TrendDirection::Falling => write!(f, "falling"),
            TrendDirection::Flat => write!(f, "flat"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub direction: TrendDirection,
    pub current: u32,
    pub peak: u32,
    pub average: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendSection {
    pub keyword: String,
    pub points: Vec<TrendPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TrendSummary>,
    pub rising_terms: Vec<String>,
    pub top_terms: Vec<String>,
}

impl TrendSection {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.rising_terms.is_empty() && self.top_terms.is_empty()
    }
}

/// Where the prose sections came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeOrigin {
    /// Not yet synthesized.
    #[default]
    Pending,
    Model,
    Fallback,
}

/// Prose sections of the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Narrative {
    pub origin: NarrativeOrigin,
    pub executive_summary: String,
    pub market_analysis: String,
    pub competitor_analysis: String,
    pub trend_analysis: String,
    pub recommendations: Vec<String>,
}

/// Everything known about one query, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportData {
    pub query: Query,
    pub generated_on: NaiveDate,
    pub competitors: CompetitorSection,
    pub market_overview: Vec<SearchHit>,
    pub trends: TrendSection,
    pub news: Vec<NewsItem>,
    pub demographics: Vec<SearchHit>,
    pub narrative: Narrative,
    pub issues: Vec<SourceIssue>,
}

/// Rendered outputs for one request.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub markdown: String,
    pub html: String,
    pub raw: ReportData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_trims_fields() {
        let query = Query::new("  coffee shop ", " Portland\n").unwrap();
        assert_eq!(query.business_type(), "coffee shop");
        assert_eq!(query.location(), "Portland");
        assert_eq!(query.phrase(), "coffee shop in Portland");
    }

    #[test]
    fn test_query_rejects_empty_fields() {
        assert_eq!(
            Query::new("", "Portland"),
            Err(ValidationError::EmptyBusinessType)
        );
        assert_eq!(
            Query::new("coffee shop", "   "),
            Err(ValidationError::EmptyLocation)
        );
    }

    #[test]
    fn test_query_slug() {
        let query = Query::new("Coffee Shop", "Portland, OR").unwrap();
        assert_eq!(query.slug(), "coffee_shop_portland_or");
    }

    #[test]
    fn test_from_idea_with_in() {
        let parsed = Query::from_idea("coffee shop in Portland");
        assert_eq!(
            parsed,
            Some(("coffee shop".to_string(), "Portland".to_string()))
        );
    }

    #[test]
    fn test_from_idea_with_region() {
        let parsed = Query::from_idea("vegan bakery in Austin, Texas");
        assert_eq!(
            parsed,
            Some(("vegan bakery".to_string(), "Austin, Texas".to_string()))
        );
    }

    #[test]
    fn test_from_idea_skips_articles_and_missing_location() {
        assert_eq!(Query::from_idea("pet grooming"), None);
        assert_eq!(Query::from_idea("in Boston"), None);
        assert_eq!(
            Query::from_idea("bike repair at Denver"),
            Some(("bike repair".to_string(), "Denver".to_string()))
        );
    }

    #[test]
    fn test_fragment_is_empty() {
        assert!(Fragment::Listings(vec![]).is_empty());
        assert!(Fragment::Trends(TrendSeries::default()).is_empty());
        assert!(!Fragment::SearchHits(vec![SearchHit {
            title: "t".to_string(),
            link: "l".to_string(),
            snippet: "s".to_string(),
        }])
        .is_empty());
    }

    #[test]
    fn test_issue_label() {
        let issue = SourceIssue::new(SourceKind::News, IssueKind::EmptyResult, "none");
        assert_eq!(issue.label(), "Local news");
        assert_eq!(SourceIssue::model_failure("x").label(), "Narrative");
    }
}
