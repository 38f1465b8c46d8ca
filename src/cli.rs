//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::ProviderKind;
use crate::models::SourceKind;
use clap::Parser;
use std::path::PathBuf;

/// MarketMind - market research reports for a business idea
///
/// Collects local listings, search trends, news, demographics and competitor
/// websites, then asks a language model to write up the findings.
/// Writes Markdown and HTML reports.
///
/// Examples:
///   marketmind --business "coffee shop" --location Portland
///   marketmind --idea "vegan bakery in Austin, Texas" --json
///   marketmind -b "bike repair" -l Denver --provider ollama -m llama3.2:latest
///   marketmind -b "bike repair" -l Denver --no-llm --sources local-businesses,trends
///   marketmind --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Type of business to research (e.g. "coffee shop")
    #[arg(short, long, value_name = "TYPE", conflicts_with = "idea")]
    pub business: Option<String>,

    /// Location to research (e.g. "Portland, OR")
    #[arg(short, long, value_name = "PLACE", conflicts_with = "idea")]
    pub location: Option<String>,

    /// Free-text business idea including a location
    ///
    /// Example: "coffee shop in Portland". The location is taken from the
    /// text following "in", "at" or "for".
    #[arg(long, value_name = "TEXT")]
    pub idea: Option<String>,

    /// Language model API dialect
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<ProviderKind>,

    /// Model used for the written analysis
    ///
    /// Can also be set via MARKETMIND_MODEL env var or .marketmind.toml config.
    #[arg(short, long, env = "MARKETMIND_MODEL")]
    pub model: Option<String>,

    /// Language model endpoint base URL
    #[arg(long, value_name = "URL", env = "MARKETMIND_LLM_URL")]
    pub llm_url: Option<String>,

    /// API key for the Groq endpoint
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// API key for SerpAPI (maps, search, news, trends)
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub serpapi_key: Option<String>,

    /// Directory to write the report files into
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Data sources to query (comma-separated)
    ///
    /// Example: --sources local-businesses,trends,news
    #[arg(long, value_name = "SOURCES", value_delimiter = ',')]
    pub sources: Option<Vec<SourceKind>>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Language model request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip the language model and use the templated write-up
    #[arg(long)]
    pub no_llm: bool,

    /// Also write the raw report data as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .marketmind.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .marketmind.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// Empty business type or location is left to `Query::new`.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.idea.is_none() && (self.business.is_none() || self.location.is_none()) {
            return Err("Provide --business and --location, or --idea".to_string());
        }

        if let Some(ref url) = self.llm_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("LLM URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref sources) = self.sources {
            if sources.is_empty() {
                return Err("At least one source must be selected".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Business type and location, from the explicit flags or the idea text.
    pub fn query_parts(&self) -> Result<(String, String), String> {
        if let Some(ref idea) = self.idea {
            return crate::models::Query::from_idea(idea).ok_or_else(|| {
                format!(
                    "Could not find a location in \"{}\". Try e.g. \"coffee shop in Portland\".",
                    idea
                )
            });
        }

        Ok((
            self.business.clone().unwrap_or_default(),
            self.location.clone().unwrap_or_default(),
        ))
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            business: Some("coffee shop".to_string()),
            location: Some("Portland".to_string()),
            idea: None,
            provider: None,
            model: None,
            llm_url: None,
            groq_api_key: None,
            serpapi_key: None,
            output_dir: None,
            sources: None,
            temperature: None,
            timeout: None,
            no_llm: false,
            json: false,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "marketmind",
            "-b",
            "coffee shop",
            "-l",
            "Portland",
            "--sources",
            "local-businesses,trends",
            "--provider",
            "ollama",
        ])
        .unwrap();

        assert_eq!(args.business.as_deref(), Some("coffee shop"));
        assert_eq!(
            args.sources,
            Some(vec![SourceKind::LocalBusinesses, SourceKind::Trends])
        );
        assert_eq!(args.provider, Some(ProviderKind::Ollama));
    }

    #[test]
    fn test_idea_conflicts_with_business() {
        let result = Args::try_parse_from([
            "marketmind",
            "-b",
            "coffee shop",
            "--idea",
            "coffee shop in Portland",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_requires_query() {
        let mut args = make_args();
        args.location = None;
        assert!(args.validate().is_err());

        args.idea = Some("coffee shop in Portland".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_temperature_range() {
        let mut args = make_args();
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_query_parts_from_idea() {
        let mut args = make_args();
        args.business = None;
        args.location = None;
        args.idea = Some("dog daycare in Seattle".to_string());
        assert_eq!(
            args.query_parts(),
            Ok(("dog daycare".to_string(), "Seattle".to_string()))
        );

        args.idea = Some("dog daycare".to_string());
        assert!(args.query_parts().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
