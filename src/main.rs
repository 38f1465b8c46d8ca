//! MarketMind - AI-assisted local market research reports
//!
//! A CLI tool that collects public data about a business idea in a
//! location, has a language model summarize it, and writes a Markdown
//! and HTML report.
//!
//! Exit codes:
//!   0 - Report written (possibly with degraded sections)
//!   1 - Invalid input or runtime error (config, output directory, etc.)

mod agent;
mod analysis;
mod cli;
mod collectors;
mod config;
mod error;
mod models;
mod pipeline;
mod report;

use agent::{ChatClient, ChatConfig, LanguageModel, NarrativeSynthesizer, SYSTEM_PROMPT};
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, ProviderKind, CONFIG_FILE};
use models::GeneratedReport;
use pipeline::ReportPipeline;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("MarketMind v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Report generation failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default config file.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the model, sources, and report layout.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

/// Run the complete research workflow.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let (business_type, location) = match args.query_parts() {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let collectors = collectors::build_collectors(&config.sources, args.serpapi_key.clone())?;
    if args.serpapi_key.is_none() {
        warn!("SERPAPI_API_KEY is not set; search-backed sources will be unavailable");
    }

    let model = build_model(&args, &config)?;

    println!("🔎 Researching: {} in {}", business_type, location);
    println!(
        "   Sources: {}",
        config
            .sources
            .enabled
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    match model {
        Some(ref m) => println!("   Model: {} ({:?})", m.name(), config.model.provider),
        None => println!("   Model: none (templated narrative)"),
    }

    let mut pipeline = ReportPipeline::new(
        collectors,
        NarrativeSynthesizer::new(model),
        config.report.clone(),
    );
    if !args.quiet {
        pipeline = pipeline.with_progress();
    }

    let report = match pipeline.generate_report(&business_type, &location).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let output_dir = PathBuf::from(&config.general.output_dir);
    let written = write_outputs(&output_dir, &report, config.general.write_json)?;

    // Print summary
    let data = &report.raw;
    println!("\n📊 Report Summary:");
    println!("   Competitors found: {}", data.competitors.stats.count);
    if let Some(ref summary) = data.trends.summary {
        println!("   Search interest: {} (current {})", summary.direction, summary.current);
    }
    println!("   News items: {}", data.news.len());
    println!("   Recommendations: {}", data.narrative.recommendations.len());
    if !data.issues.is_empty() {
        println!("   ⚠️  Incomplete sections:");
        for issue in &data.issues {
            println!("     - {}: {} ({})", issue.label(), issue.kind, issue.message);
        }
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());

    println!("\n✅ Report complete! Saved to:");
    for path in &written {
        println!("   {}", path.display());
    }

    Ok(())
}

/// Build the language model, or `None` to use the templated narrative.
fn build_model(args: &Args, config: &Config) -> Result<Option<Arc<dyn LanguageModel>>> {
    if args.no_llm {
        info!("Language model disabled by --no-llm");
        return Ok(None);
    }

    let api_key = args.groq_api_key.clone();
    if config.model.provider == ProviderKind::Groq && api_key.is_none() {
        warn!("GROQ_API_KEY is not set; falling back to templated narrative");
        return Ok(None);
    }

    let chat_config = ChatConfig::from_model_config(&config.model, api_key, SYSTEM_PROMPT);
    let client = ChatClient::new(chat_config)?;
    Ok(Some(Arc::new(client)))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// File stem shared by every output format.
fn output_stem(report: &GeneratedReport) -> String {
    format!(
        "market_research_{}_{}",
        report.raw.query.slug(),
        report.raw.generated_on.format("%Y%m%d")
    )
}

/// Write the rendered report into `dir`, returning the written paths.
fn write_outputs(dir: &Path, report: &GeneratedReport, write_json: bool) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let stem = output_stem(report);
    let mut outputs = vec![
        (dir.join(format!("{}.md", stem)), report.markdown.clone()),
        (dir.join(format!("{}.html", stem)), report.html.clone()),
    ];
    if write_json {
        outputs.push((
            dir.join(format!("{}.json", stem)),
            report::render_json(&report.raw)?,
        ));
    }

    let mut written = Vec::new();
    for (path, content) in outputs {
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::models::{CollectorResult, Query};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_report() -> GeneratedReport {
        let mut data = analysis::aggregate(
            &Query::new("Coffee Shop", "Portland, OR").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            &CollectorResult::new(),
            &[],
        );
        data.narrative = agent::synthesizer::fallback_narrative(&data);
        report::render_report(&data, &ReportConfig::default())
    }

    #[test]
    fn test_output_stem() {
        assert_eq!(
            output_stem(&sample_report()),
            "market_research_coffee_shop_portland_or_20250314"
        );
    }

    #[test]
    fn test_write_outputs() {
        let dir = TempDir::new().unwrap();
        let report = sample_report();

        let written = write_outputs(dir.path(), &report, false).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("market_research_coffee_shop_portland_or_20250314.md"));

        let markdown = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(markdown, report.markdown);
        let html = std::fs::read_to_string(&written[1]).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_write_outputs_with_json_creates_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("reports/2025");

        let written = write_outputs(&nested, &sample_report(), true).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written.iter().all(|p| p.exists()));
        assert_eq!(written[2].extension().and_then(|e| e.to_str()), Some("json"));
    }
}
