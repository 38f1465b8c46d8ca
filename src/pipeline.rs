//! End-to-end report generation.
//!
//! [`ReportPipeline`] validates the query, runs every collector, aggregates
//! the fragments, asks the synthesizer for prose, and renders the result.
//! Only validation can fail; every later problem degrades into an issue.

use crate::agent::NarrativeSynthesizer;
use crate::analysis::aggregate;
use crate::collectors::{collect_all, Collector};
use crate::config::ReportConfig;
use crate::error::ValidationError;
use crate::models::{GeneratedReport, IssueKind, Query, SourceIssue, SourceKind};
use crate::report::render_report;
use chrono::{NaiveDate, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

pub struct ReportPipeline {
    collectors: Vec<Box<dyn Collector>>,
    synthesizer: NarrativeSynthesizer,
    report_config: ReportConfig,
    progress: Option<ProgressBar>,
    today: Option<NaiveDate>,
}

impl ReportPipeline {
    pub fn new(
        collectors: Vec<Box<dyn Collector>>,
        synthesizer: NarrativeSynthesizer,
        report_config: ReportConfig,
    ) -> Self {
        Self {
            collectors,
            synthesizer,
            report_config,
            progress: None,
            today: None,
        }
    }

    /// Report stage progress on a terminal bar.
    pub fn with_progress(mut self) -> Self {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.progress = Some(pb);
        self
    }

    /// Pin the report date instead of using today's.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.today = Some(date);
        self
    }

    fn stage(&self, position: u64, message: &str) {
        info!("{}", message);
        if let Some(ref pb) = self.progress {
            pb.set_position(position);
            pb.set_message(message.to_string());
        }
    }

    /// Produce a report for a business type in a location.
    ///
    /// Fails only if either input is blank, before any source is contacted.
    pub async fn generate_report(
        &self,
        business_type: &str,
        location: &str,
    ) -> Result<GeneratedReport, ValidationError> {
        let query = Query::new(business_type, location)?;

        self.stage(10, "Collecting market data...");
        let (fragments, mut issues) = collect_all(&self.collectors, &query).await;
        for source in SourceKind::ALL {
            if !self.collectors.iter().any(|c| c.source() == source) {
                issues.push(SourceIssue::new(
                    source,
                    IssueKind::NotRequested,
                    "source disabled",
                ));
            }
        }
        info!(
            "Collected {} of {} sources",
            fragments.len(),
            self.collectors.len()
        );

        self.stage(33, "Analyzing collected data...");
        let generated_on = self.today.unwrap_or_else(|| Utc::now().date_naive());
        let mut data = aggregate(&query, generated_on, &fragments, &issues);

        self.stage(66, "Writing narrative...");
        let (narrative, issue) = self.synthesizer.synthesize(&data).await;
        data.narrative = narrative;
        data.issues.extend(issue);

        self.stage(90, "Rendering report...");
        let report = render_report(&data, &self.report_config);

        if let Some(ref pb) = self.progress {
            pb.set_position(100);
            pb.finish_with_message("Report complete");
        }

        Ok(report)
    }
}
