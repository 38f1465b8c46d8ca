//! Fragment aggregation and statistics.
//!
//! This module merges collector fragments into a single [`ReportData`]
//! and computes summary statistics for the competitor and trend sections.
//! Everything here is pure: the same inputs always give the same output.

use crate::models::{
    BusinessListing, CollectorResult, CompetitorSection, CompetitorStats, Fragment, IssueKind,
    Narrative, Query, ReportData, SourceIssue, SourceKind, TrendDirection, TrendPoint,
    TrendSection, TrendSummary,
};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Direction compares the last point with the sixth from the end.
const TREND_LOOKBACK: usize = 6;

/// Merge collector output into report data.
///
/// Missing, empty, or mismatched fragments leave their section empty. Every
/// source without usable data gets an issue unless one was already recorded.
/// The narrative is left pending.
pub fn aggregate(
    query: &Query,
    generated_on: NaiveDate,
    fragments: &CollectorResult,
    issues: &[SourceIssue],
) -> ReportData {
    let mut issues = issues.to_vec();

    let listings = match fragments.get(&SourceKind::LocalBusinesses) {
        Some(Fragment::Listings(listings)) => dedup_listings(listings),
        _ => Vec::new(),
    };
    let pages = match fragments.get(&SourceKind::CompetitorPages) {
        Some(Fragment::Pages(pages)) => pages.clone(),
        _ => Vec::new(),
    };
    let market_overview = match fragments.get(&SourceKind::WebSearch) {
        Some(Fragment::SearchHits(hits)) => hits.clone(),
        _ => Vec::new(),
    };
    let demographics = match fragments.get(&SourceKind::Demographics) {
        Some(Fragment::SearchHits(hits)) => hits.clone(),
        _ => Vec::new(),
    };
    let news = match fragments.get(&SourceKind::News) {
        Some(Fragment::News(items)) => items.clone(),
        _ => Vec::new(),
    };
    let trends = match fragments.get(&SourceKind::Trends) {
        Some(Fragment::Trends(series)) => TrendSection {
            keyword: series.keyword.clone(),
            points: series.points.clone(),
            summary: summarize_trend(&series.points),
            rising_terms: series.rising_terms.clone(),
            top_terms: series.top_terms.clone(),
        },
        _ => TrendSection::default(),
    };

    let filled = [
        (SourceKind::LocalBusinesses, !listings.is_empty()),
        (SourceKind::WebSearch, !market_overview.is_empty()),
        (SourceKind::Trends, !trends.is_empty()),
        (SourceKind::News, !news.is_empty()),
        (SourceKind::Demographics, !demographics.is_empty()),
        (SourceKind::CompetitorPages, !pages.is_empty()),
    ];
    for (source, has_data) in filled {
        if !has_data && !issues.iter().any(|i| i.source == Some(source)) {
            issues.push(SourceIssue::new(
                source,
                IssueKind::EmptyResult,
                "no data collected",
            ));
        }
    }

    let stats = competitor_stats(&listings);

    ReportData {
        query: query.clone(),
        generated_on,
        competitors: CompetitorSection {
            listings,
            pages,
            stats,
        },
        market_overview,
        trends,
        news,
        demographics,
        narrative: Narrative::default(),
        issues,
    }
}

/// Drop repeated listings by case-insensitive name, keeping the first.
pub fn dedup_listings(listings: &[BusinessListing]) -> Vec<BusinessListing> {
    let mut seen = HashSet::new();
    listings
        .iter()
        .filter(|l| seen.insert(l.name.trim().to_lowercase()))
        .cloned()
        .collect()
}

/// Compute rating and review statistics over listings.
pub fn competitor_stats(listings: &[BusinessListing]) -> CompetitorStats {
    let ratings: Vec<f32> = listings.iter().filter_map(|l| l.rating).collect();

    let average_rating = if ratings.is_empty() {
        None
    } else {
        let mean = ratings.iter().sum::<f32>() / ratings.len() as f32;
        Some((mean * 10.0).round() / 10.0)
    };

    // Ties keep the earlier (higher-ranked) listing.
    let top_rated = listings
        .iter()
        .filter_map(|l| l.rating.map(|r| (l, r)))
        .fold(None::<(&BusinessListing, f32)>, |best, (l, r)| match best {
            Some((_, best_r)) if best_r >= r => best,
            _ => Some((l, r)),
        })
        .map(|(l, _)| l.name.clone());

    CompetitorStats {
        count: listings.len(),
        rated_count: ratings.len(),
        average_rating,
        total_reviews: listings.iter().filter_map(|l| l.reviews).sum(),
        top_rated,
    }
}

/// Current, peak, mean and direction of an interest series.
pub fn summarize_trend(points: &[TrendPoint]) -> Option<TrendSummary> {
    let last = points.last()?;
    let earlier = if points.len() >= TREND_LOOKBACK {
        &points[points.len() - TREND_LOOKBACK]
    } else {
        &points[0]
    };

    let direction = match last.value.cmp(&earlier.value) {
        std::cmp::Ordering::Greater => TrendDirection::Rising,
        std::cmp::Ordering::Less => TrendDirection::Falling,
        std::cmp::Ordering::Equal => TrendDirection::Flat,
    };

    let total: u32 = points.iter().map(|p| p.value).sum();
    let average = ((total as f32 / points.len() as f32) * 10.0).round() / 10.0;

    Some(TrendSummary {
        direction,
        current: last.value,
        peak: points.iter().map(|p| p.value).max().unwrap_or(last.value),
        average,
    })
}

/// Issues for one source, if any.
pub fn issues_for(data: &ReportData, source: SourceKind) -> Vec<&SourceIssue> {
    data.issues
        .iter()
        .filter(|i| i.source == Some(source))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewsItem, ScrapedPage, SearchHit, TrendSeries};

    fn listing(name: &str, rating: Option<f32>, reviews: Option<u64>) -> BusinessListing {
        BusinessListing {
            name: name.to_string(),
            rating,
            reviews,
            ..BusinessListing::default()
        }
    }

    fn points(values: &[u32]) -> Vec<TrendPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TrendPoint {
                date: format!("week {}", i + 1),
                value: *v,
            })
            .collect()
    }

    fn query() -> Query {
        Query::new("coffee shop", "Portland").unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn populated() -> CollectorResult {
        let hit = |t: &str| SearchHit {
            title: t.to_string(),
            link: format!("https://example.com/{}", t),
            snippet: format!("{} snippet", t),
        };

        let mut fragments = CollectorResult::new();
        fragments.insert(
            SourceKind::LocalBusinesses,
            Fragment::Listings(vec![
                listing("Stumptown", Some(4.6), Some(2000)),
                listing("Heart", Some(4.7), Some(800)),
                listing("stumptown ", Some(4.1), Some(5)),
            ]),
        );
        fragments.insert(
            SourceKind::WebSearch,
            Fragment::SearchHits(vec![hit("market")]),
        );
        fragments.insert(
            SourceKind::Demographics,
            Fragment::SearchHits(vec![hit("census")]),
        );
        fragments.insert(
            SourceKind::News,
            Fragment::News(vec![NewsItem {
                title: "Roastery opens".to_string(),
                link: "https://news/1".to_string(),
                source: None,
                date: None,
                snippet: None,
            }]),
        );
        fragments.insert(
            SourceKind::Trends,
            Fragment::Trends(TrendSeries {
                keyword: "coffee shop".to_string(),
                points: points(&[50, 52, 48, 60, 61, 58, 70, 72]),
                rising_terms: vec!["cold brew".to_string()],
                top_terms: vec![],
            }),
        );
        fragments.insert(
            SourceKind::CompetitorPages,
            Fragment::Pages(vec![ScrapedPage {
                url: "https://heart.coffee".to_string(),
                title: "Heart".to_string(),
                paragraphs: vec!["Roasters".to_string()],
            }]),
        );
        fragments
    }

    #[test]
    fn test_aggregate_populated() {
        let data = aggregate(&query(), date(), &populated(), &[]);

        assert_eq!(data.competitors.listings.len(), 2);
        assert_eq!(data.competitors.pages.len(), 1);
        assert_eq!(data.market_overview.len(), 1);
        assert_eq!(data.demographics.len(), 1);
        assert_eq!(data.news.len(), 1);
        assert!(data.trends.summary.is_some());
        assert!(data.issues.is_empty());
        assert_eq!(data.narrative, Narrative::default());
    }

    #[test]
    fn test_aggregate_empty_is_total() {
        let data = aggregate(&query(), date(), &CollectorResult::new(), &[]);

        assert!(data.competitors.is_empty());
        assert!(data.trends.is_empty());
        assert!(data.news.is_empty());
        assert_eq!(data.issues.len(), SourceKind::ALL.len());
        assert!(data
            .issues
            .iter()
            .all(|i| i.kind == IssueKind::EmptyResult));
    }

    #[test]
    fn test_aggregate_keeps_recorded_issue() {
        let recorded = SourceIssue::new(
            SourceKind::Trends,
            IssueKind::SourceUnavailable,
            "timeout",
        );
        let mut fragments = populated();
        fragments.remove(&SourceKind::Trends);

        let data = aggregate(&query(), date(), &fragments, &[recorded.clone()]);
        assert_eq!(issues_for(&data, SourceKind::Trends), vec![&recorded]);
    }

    #[test]
    fn test_aggregate_ignores_mismatched_fragment() {
        let mut fragments = CollectorResult::new();
        fragments.insert(SourceKind::News, Fragment::SearchHits(vec![]));

        let data = aggregate(&query(), date(), &fragments, &[]);
        assert!(data.news.is_empty());
        assert_eq!(issues_for(&data, SourceKind::News).len(), 1);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let fragments = populated();
        let issues = vec![SourceIssue::new(
            SourceKind::News,
            IssueKind::EmptyResult,
            "none",
        )];

        let first = aggregate(&query(), date(), &fragments, &issues);
        let second = aggregate(&query(), date(), &fragments, &issues);
        assert_eq!(first, second);
    }

    #[test]
    fn test_competitor_stats() {
        let listings = vec![
            listing("A", Some(4.0), Some(10)),
            listing("B", Some(4.5), None),
            listing("C", None, Some(5)),
            listing("D", Some(4.5), Some(1)),
        ];
        let stats = competitor_stats(&listings);

        assert_eq!(stats.count, 4);
        assert_eq!(stats.rated_count, 3);
        assert_eq!(stats.average_rating, Some(4.3));
        assert_eq!(stats.total_reviews, 16);
        assert_eq!(stats.top_rated.as_deref(), Some("B"));
    }

    #[test]
    fn test_competitor_stats_empty() {
        let stats = competitor_stats(&[]);
        assert_eq!(stats, CompetitorStats::default());
    }

    #[test]
    fn test_summarize_trend_direction() {
        let rising = summarize_trend(&points(&[50, 52, 48, 60, 61, 58, 70, 72])).unwrap();
        assert_eq!(rising.direction, TrendDirection::Rising);
        assert_eq!(rising.current, 72);
        assert_eq!(rising.peak, 72);
        assert_eq!(rising.average, 58.9);

        let falling = summarize_trend(&points(&[80, 40])).unwrap();
        assert_eq!(falling.direction, TrendDirection::Falling);

        let flat = summarize_trend(&points(&[30])).unwrap();
        assert_eq!(flat.direction, TrendDirection::Flat);

        assert!(summarize_trend(&[]).is_none());
    }

    #[test]
    fn test_summarize_trend_uses_sixth_from_end() {
        // 30 is compared with 50, not with the first value 10.
        let summary = summarize_trend(&points(&[10, 50, 40, 40, 40, 40, 30])).unwrap();
        assert_eq!(summary.direction, TrendDirection::Falling);

        // Exactly six points compares with the first.
        let summary = summarize_trend(&points(&[20, 90, 90, 90, 90, 25])).unwrap();
        assert_eq!(summary.direction, TrendDirection::Rising);
    }

    #[test]
    fn test_dedup_listings() {
        let deduped = dedup_listings(&[
            listing("Heart", None, None),
            listing(" HEART", Some(5.0), None),
            listing("Coava", None, None),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].rating, None);
    }
}
