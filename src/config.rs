//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.marketmind.toml` files. API keys are never read from the file;
//! they come from the environment or the command line.

use crate::models::SourceKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".marketmind.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Language model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Data source settings.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory the report files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Also write the raw report data as JSON.
    #[serde(default)]
    pub write_json: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            write_json: false,
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

/// Which chat API dialect to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions (Groq).
    #[default]
    Groq,
    /// Local Ollama server.
    Ollama,
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API dialect.
    #[serde(default)]
    pub provider: ProviderKind,

    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Endpoint base URL. Defaults depend on the provider.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in response.
    #[serde(default)]
    pub max_tokens: Option<usize>,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            name: default_model(),
            base_url: None,
            temperature: default_temperature(),
            max_tokens: None,
            timeout_seconds: default_model_timeout(),
        }
    }
}

impl ModelConfig {
    /// The configured base URL or the provider's public default.
    pub fn effective_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => match self.provider {
                ProviderKind::Groq => "https://api.groq.com/openai/v1".to_string(),
                ProviderKind::Ollama => "http://localhost:11434".to_string(),
            },
        }
    }
}

fn default_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_model_timeout() -> u64 {
    120
}

/// Data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// SerpAPI base URL.
    #[serde(default = "default_serpapi_url")]
    pub serpapi_url: String,

    /// Per-request timeout for SerpAPI calls, in seconds.
    #[serde(default = "default_source_timeout")]
    pub timeout_seconds: u64,

    /// Per-request timeout for competitor page fetches, in seconds.
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_seconds: u64,

    /// Sources to query.
    #[serde(default = "default_enabled")]
    pub enabled: Vec<SourceKind>,

    #[serde(default = "default_max_listings")]
    pub max_listings: usize,

    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,

    #[serde(default = "default_max_news")]
    pub max_news: usize,

    #[serde(default = "default_max_demographics")]
    pub max_demographics: usize,

    #[serde(default = "default_max_trend_terms")]
    pub max_trend_terms: usize,

    /// Competitor pages to scrape.
    #[serde(default = "default_scrape_pages")]
    pub scrape_pages: usize,

    /// Paragraphs kept per scraped page.
    #[serde(default = "default_scrape_paragraphs")]
    pub scrape_paragraphs: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            serpapi_url: default_serpapi_url(),
            timeout_seconds: default_source_timeout(),
            scrape_timeout_seconds: default_scrape_timeout(),
            enabled: default_enabled(),
            max_listings: default_max_listings(),
            max_search_results: default_max_search_results(),
            max_news: default_max_news(),
            max_demographics: default_max_demographics(),
            max_trend_terms: default_max_trend_terms(),
            scrape_pages: default_scrape_pages(),
            scrape_paragraphs: default_scrape_paragraphs(),
        }
    }
}

fn default_serpapi_url() -> String {
    "https://serpapi.com".to_string()
}

fn default_source_timeout() -> u64 {
    30
}

fn default_scrape_timeout() -> u64 {
    10
}

fn default_enabled() -> Vec<SourceKind> {
    SourceKind::ALL.to_vec()
}

fn default_max_listings() -> usize {
    10
}

fn default_max_search_results() -> usize {
    5
}

fn default_max_news() -> usize {
    5
}

fn default_max_demographics() -> usize {
    3
}

fn default_max_trend_terms() -> usize {
    5
}

fn default_scrape_pages() -> usize {
    3
}

fn default_scrape_paragraphs() -> usize {
    10
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// List source links under each data section.
    #[serde(default = "default_true")]
    pub include_source_links: bool,

    /// Maximum competitor listings printed in detail.
    #[serde(default = "default_max_listings")]
    pub max_listings_shown: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_source_links: true,
            max_listings_shown: default_max_listings(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when explicitly given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(provider) = args.provider {
            self.model.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.llm_url {
            self.model.base_url = Some(url.clone());
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(ref sources) = args.sources {
            self.sources.enabled = sources.clone();
        }

        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.display().to_string();
        }
        if args.json {
            self.general.write_json = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
