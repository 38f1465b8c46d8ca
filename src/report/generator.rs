//! Markdown, HTML and JSON report generation.
//!
//! This module renders [`ReportData`] into the final report formats.
//! Rendering is pure: the same data and options always produce the same text.

use crate::analysis::issues_for;
use crate::config::ReportConfig;
use crate::models::{
    BusinessListing, CompetitorSection, GeneratedReport, NarrativeOrigin, NewsItem, ReportData,
    ScrapedPage, SearchHit, SourceIssue, SourceKind, TrendSection,
};
use anyhow::Result;

/// Paragraphs quoted per competitor website.
const PAGE_EXCERPT_PARAGRAPHS: usize = 3;

/// Render every format.
pub fn render_report(data: &ReportData, options: &ReportConfig) -> GeneratedReport {
    let markdown = render_markdown(data, options);
    let html = render_html(data, options);

    GeneratedReport {
        markdown,
        html,
        raw: data.clone(),
    }
}

/// Report title shown in both formats.
pub fn report_title(data: &ReportData) -> String {
    format!("Market Research Report: {}", data.query.phrase())
}

/// Generate a complete Markdown report.
pub fn render_markdown(data: &ReportData, options: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report_title(data)));
    output.push_str(&generate_metadata_section(data));
    output.push_str(&generate_table_of_contents());
    output.push_str(&generate_summary_section(data));
    output.push_str(&generate_market_section(data, options));
    output.push_str(&generate_competitor_section(data, options));
    output.push_str(&generate_trends_section(data));
    output.push_str(&generate_news_section(&data.news));
    output.push_str(&generate_demographics_section(&data.demographics, options));
    output.push_str(&generate_recommendations_section(&data.narrative.recommendations));
    output.push_str(&generate_coverage_section(&data.issues));
    output.push_str(&generate_conclusion());
    output.push_str(&generate_footer(data));

    output
}

fn placeholder(what: &str) -> String {
    format!("_No {} data was available for this report._\n\n", what)
}

/// Prose paragraph, or nothing when the narrative left it blank.
fn prose(text: &str) -> String {
    if text.trim().is_empty() {
        String::new()
    } else {
        format!("{}\n\n", text.trim())
    }
}

/// Make text safe inside a Markdown table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn generate_metadata_section(data: &ReportData) -> String {
    let mut section = String::new();

    let narrative = match data.narrative.origin {
        NarrativeOrigin::Model => "Language model",
        NarrativeOrigin::Fallback => "Templated",
        NarrativeOrigin::Pending => "Not generated",
    };
    let with_data = SourceKind::ALL
        .iter()
        .filter(|s| issues_for(data, **s).is_empty())
        .count();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Business Type:** {}\n",
        data.query.business_type()
    ));
    section.push_str(&format!("- **Location:** {}\n", data.query.location()));
    section.push_str(&format!(
        "- **Generated On:** {}\n",
        data.generated_on.format("%Y-%m-%d")
    ));
    section.push_str(&format!("- **Narrative:** {}\n", narrative));
    section.push_str(&format!(
        "- **Sources With Data:** {} of {}\n",
        with_data,
        SourceKind::ALL.len()
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents() -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    for (title, anchor) in [
        ("Executive Summary", "executive-summary"),
        ("Market Overview", "market-overview"),
        ("Competitor Analysis", "competitor-analysis"),
        ("Market Trends", "market-trends"),
        ("Local News", "local-news"),
        ("Demographics", "demographics"),
        ("Recommendations", "recommendations"),
        ("Data Coverage", "data-coverage"),
    ] {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor));
    }
    toc.push('\n');

    toc
}

fn generate_summary_section(data: &ReportData) -> String {
    let mut section = String::from("## Executive Summary\n\n");

    let summary = prose(&data.narrative.executive_summary);
    if summary.is_empty() {
        section.push_str(&placeholder("summary"));
    } else {
        section.push_str(&summary);
    }

    section
}

fn generate_market_section(data: &ReportData, options: &ReportConfig) -> String {
    let mut section = String::from("## Market Overview\n\n");

    let analysis = prose(&data.narrative.market_analysis);
    section.push_str(&analysis);

    if !data.market_overview.is_empty() {
        if options.include_source_links {
            section.push_str("### Sources\n\n");
            section.push_str(&generate_hit_list(&data.market_overview, true));
        } else if analysis.is_empty() {
            section.push_str(&generate_hit_list(&data.market_overview, false));
        }
    }

    if analysis.is_empty() && data.market_overview.is_empty() {
        section.push_str(&placeholder("market overview"));
    }

    section
}

fn generate_hit_list(hits: &[SearchHit], with_links: bool) -> String {
    let mut list = String::new();
    for hit in hits {
        if with_links && !hit.link.is_empty() {
            list.push_str(&format!("- [{}]({})", hit.title, hit.link));
        } else {
            list.push_str(&format!("- **{}**", hit.title));
        }
        if !hit.snippet.is_empty() {
            list.push_str(&format!(": {}", hit.snippet));
        }
        list.push('\n');
    }
    list.push('\n');
    list
}

fn generate_competitor_section(data: &ReportData, options: &ReportConfig) -> String {
    let competitors: &CompetitorSection = &data.competitors;
    let mut section = String::from("## Competitor Analysis\n\n");

    if competitors.is_empty() {
        section.push_str(&prose(&data.narrative.competitor_analysis));
        section.push_str(&placeholder("competitor"));
        return section;
    }

    section.push_str(&prose(&data.narrative.competitor_analysis));

    if !competitors.listings.is_empty() {
        let stats = &competitors.stats;
        section.push_str("### Competitor Snapshot\n\n");
        section.push_str("| Competitors | Rated | Average Rating | Total Reviews | Top Rated |\n");
        section.push_str("|:---:|:---:|:---:|:---:|:---|\n");
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n\n",
            stats.count,
            stats.rated_count,
            stats
                .average_rating
                .map(|r| format!("{:.1}", r))
                .unwrap_or_else(|| "n/a".to_string()),
            stats.total_reviews,
            stats.top_rated.as_deref().map(cell).unwrap_or_else(|| "n/a".to_string()),
        ));

        section.push_str("### Local Businesses\n\n");
        for (i, listing) in competitors
            .listings
            .iter()
            .take(options.max_listings_shown)
            .enumerate()
        {
            section.push_str(&generate_listing_block(i + 1, listing));
        }
        let hidden = competitors
            .listings
            .len()
            .saturating_sub(options.max_listings_shown);
        if hidden > 0 {
            section.push_str(&format!("_{} more listings omitted._\n\n", hidden));
        }
    }

    if !competitors.pages.is_empty() {
        section.push_str("### Competitor Websites\n\n");
        for page in &competitors.pages {
            section.push_str(&generate_page_block(page));
        }
    }

    section
}

fn generate_listing_block(rank: usize, listing: &BusinessListing) -> String {
    let mut block = format!("#### {}. {}\n\n", rank, listing.name);

    let mut fields = Vec::new();
    if let Some(ref category) = listing.category {
        fields.push(format!("**Type:** {}", category));
    }
    if let Some(ref address) = listing.address {
        fields.push(format!("**Address:** {}", address));
    }
    if let Some(ref phone) = listing.phone {
        fields.push(format!("**Phone:** {}", phone));
    }
    if let Some(ref website) = listing.website {
        fields.push(format!("**Website:** {}", website));
    }
    if let Some(rating) = listing.rating {
        fields.push(format!(
            "**Rating:** {:.1} ({} reviews)",
            rating,
            listing.reviews.unwrap_or(0)
        ));
    }
    if let Some(ref hours) = listing.hours {
        fields.push(format!("**Hours:** {}", hours));
    }
    if let Some(ref description) = listing.description {
        fields.push(format!("**Description:** {}", description));
    }

    if !fields.is_empty() {
        // Trailing double space forces a line break.
        block.push_str(&fields.join("  \n"));
        block.push_str("\n\n");
    }

    block
}

fn generate_page_block(page: &ScrapedPage) -> String {
    let mut block = format!("#### [{}]({})\n\n", page.title, page.url);
    for paragraph in page.paragraphs.iter().take(PAGE_EXCERPT_PARAGRAPHS) {
        block.push_str(&format!("> {}\n>\n", paragraph));
    }
    if !page.paragraphs.is_empty() {
        // Drop the dangling quote separator.
        block.truncate(block.len() - 2);
        block.push('\n');
    }
    block
}

fn generate_trends_section(data: &ReportData) -> String {
    let trends: &TrendSection = &data.trends;
    let mut section = String::from("## Market Trends\n\n");

    section.push_str(&prose(&data.narrative.trend_analysis));

    if trends.is_empty() {
        section.push_str(&placeholder("trend"));
        return section;
    }

    if let Some(ref summary) = trends.summary {
        section.push_str(&format!("### Search Interest: \"{}\"\n\n", trends.keyword));
        section.push_str("| Direction | Current | Peak | Average |\n");
        section.push_str("|:---:|:---:|:---:|:---:|\n");
        section.push_str(&format!(
            "| {} | {} | {} | {:.1} |\n\n",
            summary.direction, summary.current, summary.peak, summary.average
        ));
        section.push_str("_Interest is relative, on a 0-100 scale over the past 12 months._\n\n");
    }

    if !trends.rising_terms.is_empty() {
        section.push_str(&format!(
            "**Rising searches:** {}\n\n",
            trends.rising_terms.join(", ")
        ));
    }
    if !trends.top_terms.is_empty() {
        section.push_str(&format!(
            "**Top searches:** {}\n\n",
            trends.top_terms.join(", ")
        ));
    }

    section
}

fn generate_news_section(news: &[NewsItem]) -> String {
    let mut section = String::from("## Local News\n\n");

    if news.is_empty() {
        section.push_str(&placeholder("news"));
        return section;
    }

    for item in news {
        if item.link.is_empty() {
            section.push_str(&format!("- **{}**", item.title));
        } else {
            section.push_str(&format!("- [{}]({})", item.title, item.link));
        }

        let meta: Vec<&str> = [item.source.as_deref(), item.date.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !meta.is_empty() {
            section.push_str(&format!(" _({})_", meta.join(", ")));
        }
        if let Some(ref snippet) = item.snippet {
            section.push_str(&format!(": {}", snippet));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_demographics_section(hits: &[SearchHit], options: &ReportConfig) -> String {
    let mut section = String::from("## Demographics\n\n");

    if hits.is_empty() {
        section.push_str(&placeholder("demographic"));
        return section;
    }

    let snippets: Vec<&SearchHit> = hits.iter().filter(|h| !h.snippet.is_empty()).collect();
    for hit in &snippets {
        section.push_str(&format!("{}\n\n", hit.snippet));
    }

    let linked: Vec<&SearchHit> = hits.iter().filter(|h| !h.link.is_empty()).collect();
    if options.include_source_links && !linked.is_empty() {
        section.push_str("### Sources\n\n");
        for hit in linked {
            section.push_str(&format!("- [{}]({})\n", hit.title, hit.link));
        }
        section.push('\n');
    } else if snippets.is_empty() {
        section.push_str(&generate_hit_list(hits, false));
    }

    section
}

fn generate_recommendations_section(recommendations: &[String]) -> String {
    let mut section = String::from("## Recommendations\n\n");

    if recommendations.is_empty() {
        section.push_str("_No recommendations could be generated for this report._\n\n");
        return section;
    }

    section.push_str(
        "Based on the analysis, here are the key recommendations for pursuing this business idea:\n\n",
    );
    for (i, rec) in recommendations.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, rec));
    }
    section.push('\n');

    section
}

fn generate_coverage_section(issues: &[SourceIssue]) -> String {
    let mut section = String::from("## Data Coverage\n\n");

    if issues.is_empty() {
        section.push_str("All data sources returned results.\n\n");
        return section;
    }

    section.push_str("Some sections are incomplete:\n\n");
    section.push_str("| Section | Status | Details |\n");
    section.push_str("|:---|:---|:---|\n");
    for issue in issues {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            issue.label(),
            issue.kind,
            cell(&issue.message)
        ));
    }
    section.push('\n');

    section
}

fn generate_conclusion() -> String {
    let mut section = String::from("## Conclusion\n\n");
    section.push_str(
        "This report provides location-specific insights to guide your business planning. \
         The local market analysis, competitor assessment and trend identification should help \
         you develop a strategic approach to launching or growing your business. Further \
         in-depth research is recommended for the areas of interest it identifies.\n\n",
    );
    section
}

fn generate_footer(data: &ReportData) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Generated on: {} by MarketMind*\n",
        data.generated_on.format("%Y-%m-%d")
    ));

    footer
}

/// Generate a standalone HTML report.
pub fn render_html(data: &ReportData, options: &ReportConfig) -> String {
    wrap_html(data, &render_markdown(data, options))
}

/// Convert rendered Markdown and wrap it in a styled document.
fn wrap_html(data: &ReportData, markdown: &str) -> String {
    let body = markdown::to_html_with_options(markdown, &markdown::Options::gfm())
        .unwrap_or_else(|_| markdown::to_html(markdown));

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    html.push_str(&format!(
        "<title>{}</title>\n",
        escape_html(&report_title(data))
    ));
    html.push_str("<style>\n");
    html.push_str(STYLESHEET);
    html.push_str("</style>\n</head>\n<body>\n<main class=\"report\">\n");
    html.push_str(&body);
    html.push_str("\n</main>\n</body>\n</html>\n");

    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const STYLESHEET: &str = r#"body { background: #F5F7F9; color: #212121; font-family: -apple-system, "Segoe UI", Roboto, sans-serif; line-height: 1.6; margin: 0; }
.report { background: #fff; border-radius: 10px; box-shadow: 0 4px 20px rgba(0, 0, 0, 0.1); margin: 2rem auto; max-width: 960px; padding: 1.5rem 2rem; }
h1 { color: #1E88E5; font-weight: 700; }
h2 { color: #26A69A; border-bottom: 2px solid #E0E0E0; padding-bottom: 0.5rem; margin-top: 2rem; }
h3, h4 { color: #0A192F; }
a { color: #1E88E5; }
table { border-collapse: collapse; margin: 1rem 0; }
th, td { border: 1px solid #E0E0E0; padding: 0.4rem 0.8rem; }
th { background: #F5F7F9; }
blockquote { border-left: 4px solid #26A69A; color: #555; margin: 0.5rem 0; padding-left: 1rem; }
"#;

/// Generate a JSON dump of the raw report data.
pub fn render_json(data: &ReportData) -> Result<String> {
    serde_json::to_string_pretty(data).map_err(Into::into)
}
