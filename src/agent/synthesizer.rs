//! Narrative synthesis.
//!
//! Turns aggregated findings into prose with one language-model call. Any
//! failure (transport, unparsable reply, missing sections) falls back to a
//! templated narrative built from the data alone.

use crate::agent::client::LanguageModel;
use crate::error::ModelError;
use crate::models::{Narrative, NarrativeOrigin, ReportData, SourceIssue, TrendDirection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// System prompt for the synthesis call.
pub const SYSTEM_PROMPT: &str = r#"You are a market research analyst writing for a small-business owner.
Base every statement on the findings you are given. Do not invent figures.
Reply with a single JSON object and nothing else."#;

/// Findings as shown to the model: everything except prose and issues.
#[derive(Debug, Serialize)]
struct PromptFindings<'a> {
    business_type: &'a str,
    location: &'a str,
    competitors: &'a crate::models::CompetitorSection,
    market_overview: &'a [crate::models::SearchHit],
    trends: &'a crate::models::TrendSection,
    news: &'a [crate::models::NewsItem],
    demographics: &'a [crate::models::SearchHit],
}

/// Shape the model is asked to produce.
#[derive(Debug, Deserialize)]
struct RawNarrative {
    #[serde(default)]
    executive_summary: String,
    #[serde(default)]
    market_analysis: String,
    #[serde(default)]
    competitor_analysis: String,
    #[serde(default)]
    trend_analysis: String,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Writes the prose sections of a report.
pub struct NarrativeSynthesizer {
    model: Option<Arc<dyn LanguageModel>>,
}

impl NarrativeSynthesizer {
    pub fn new(model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { model }
    }

    /// Produce the narrative, plus an issue when the model failed.
    pub async fn synthesize(&self, data: &ReportData) -> (Narrative, Option<SourceIssue>) {
        let Some(model) = &self.model else {
            info!("No language model configured, using templated narrative");
            return (fallback_narrative(data), None);
        };

        let prompt = match build_prompt(data) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Could not build prompt: {}", e);
                return (
                    fallback_narrative(data),
                    Some(SourceIssue::model_failure(e.to_string())),
                );
            }
        };

        info!("Requesting narrative from {}", model.name());
        match model.complete(&prompt).await.and_then(|text| parse_narrative(&text)) {
            Ok(narrative) => (narrative, None),
            Err(e) => {
                warn!("Narrative synthesis failed: {}", e);
                (
                    fallback_narrative(data),
                    Some(SourceIssue::model_failure(e.to_string())),
                )
            }
        }
    }
}

/// Serialize the findings into the synthesis prompt.
pub fn build_prompt(data: &ReportData) -> Result<String, ModelError> {
    let findings = PromptFindings {
        business_type: data.query.business_type(),
        location: data.query.location(),
        competitors: &data.competitors,
        market_overview: &data.market_overview,
        trends: &data.trends,
        news: &data.news,
        demographics: &data.demographics,
    };
    let findings_json = serde_json::to_string_pretty(&findings)
        .map_err(|e| ModelError::Malformed(format!("could not serialize findings: {}", e)))?;

    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Write a market research analysis for opening a {} in {}.\n\n",
        data.query.business_type(),
        data.query.location()
    ));
    prompt.push_str("=== FINDINGS ===\n");
    prompt.push_str(&findings_json);
    prompt.push_str("\n=== END OF FINDINGS ===\n\n");
    prompt.push_str("Respond with exactly this JSON structure:\n");
    prompt.push_str(
        r#"{"executive_summary": "...", "market_analysis": "...", "competitor_analysis": "...", "trend_analysis": "...", "recommendations": ["...", "..."]}"#,
    );
    prompt.push_str("\n\n");
    prompt.push_str("- market_analysis: market size, growth potential, target audience, barriers to entry.\n");
    prompt.push_str("- competitor_analysis: competitive landscape, strengths and weaknesses of the main competitors, gaps.\n");
    prompt.push_str("- trend_analysis: search interest, local news, consumer behaviour, emerging opportunities and threats.\n");
    prompt.push_str("- recommendations: 5 to 7 specific, actionable recommendations.\n");
    prompt.push_str("If a section has no findings, say so briefly instead of guessing.\n");

    Ok(prompt)
}

/// Parse a model reply into a narrative.
///
/// Tolerates code fences and prose around the JSON object.
pub fn parse_narrative(text: &str) -> Result<Narrative, ModelError> {
    let start = text
        .find('{')
        .ok_or_else(|| ModelError::Malformed("no JSON object in reply".to_string()))?;

    // Reads one object and ignores whatever trails it.
    let raw: RawNarrative = serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<RawNarrative>()
        .next()
        .ok_or_else(|| ModelError::Malformed("unterminated JSON object".to_string()))?
        .map_err(|e| ModelError::Malformed(format!("invalid JSON: {}", e)))?;

    let recommendations: Vec<String> = raw
        .recommendations
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();

    if raw.executive_summary.trim().is_empty() {
        return Err(ModelError::Malformed("empty executive summary".to_string()));
    }
    if recommendations.is_empty() {
        return Err(ModelError::Malformed("no recommendations".to_string()));
    }

    Ok(Narrative {
        origin: NarrativeOrigin::Model,
        executive_summary: raw.executive_summary.trim().to_string(),
        market_analysis: raw.market_analysis.trim().to_string(),
        competitor_analysis: raw.competitor_analysis.trim().to_string(),
        trend_analysis: raw.trend_analysis.trim().to_string(),
        recommendations,
    })
}

/// Templated narrative derived from the data alone.
pub fn fallback_narrative(data: &ReportData) -> Narrative {
    let business = data.query.business_type();
    let location = data.query.location();
    let stats = &data.competitors.stats;

    let mut summary = format!(
        "This report provides a market analysis for the business idea **{}** in **{}**. \
         It covers local competitors, search trends, local news and demographics.",
        business, location
    );
    if stats.count > 0 {
        if stats.count == 1 {
            summary.push_str(" 1 local competitor was identified");
        } else {
            summary.push_str(&format!(" {} local competitors were identified", stats.count));
        }
        if let Some(avg) = stats.average_rating {
            summary.push_str(&format!(
                " with an average rating of {:.1} across {} reviews",
                avg, stats.total_reviews
            ));
        }
        summary.push('.');
    }
    if let Some(ref trend) = data.trends.summary {
        summary.push_str(&format!(
            " Search interest over the past twelve months is {}.",
            trend.direction
        ));
    }

    let market_analysis = data
        .market_overview
        .iter()
        .filter(|hit| !hit.snippet.is_empty())
        .map(|hit| format!("- {}", hit.snippet))
        .collect::<Vec<_>>()
        .join("\n");

    let competitor_analysis = match (stats.count, &stats.top_rated) {
        (0, _) => String::new(),
        (n, Some(top)) => format!(
            "{} competing businesses were found in {}. The highest-rated is {}.",
            n, location, top
        ),
        (n, None) => format!("{} competing businesses were found in {}.", n, location),
    };

    let trend_analysis = match &data.trends.summary {
        Some(trend) => format!(
            "Interest in \"{}\" is {} (current {}, peak {}, average {:.1} on a 0-100 scale).",
            data.trends.keyword, trend.direction, trend.current, trend.peak, trend.average
        ),
        None => String::new(),
    };

    let mut recommendations = vec![
        "Consider the market size and growth potential identified in this report.".to_string(),
        "Evaluate the competitive landscape and identify potential differentiators.".to_string(),
        "Align your business strategy with emerging trends in the market.".to_string(),
        "Address potential barriers to entry through strategic planning.".to_string(),
    ];
    if let Some(avg) = stats.average_rating {
        recommendations.push(format!(
            "Local competitors average {:.1} stars; plan service quality and customer experience to match or exceed that.",
            avg
        ));
    }
    if let Some(ref trend) = data.trends.summary {
        if trend.direction == TrendDirection::Falling {
            recommendations.push(
                "Search interest is declining; validate demand locally before committing capital."
                    .to_string(),
            );
        }
    }
    if let Some(term) = data.trends.rising_terms.first() {
        recommendations.push(format!(
            "Look at rising search interest in \"{}\" when shaping your offering.",
            term
        ));
    }

    Narrative {
        origin: NarrativeOrigin::Fallback,
        executive_summary: summary,
        market_analysis,
        competitor_analysis,
        trend_analysis,
        recommendations,
    }
}
