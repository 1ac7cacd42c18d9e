//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::PartnerFilter;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Pipedash - partnership revenue pipeline dashboard
///
/// Reads the weekly sales-tracking workbook (Sponsorships, Public Investment,
/// Contact Detail, Data_Dictionary) and writes a dashboard with KPIs, top
/// deals, the stage board, pipeline totals, an activity heat map, and the
/// recent-activity feed.
///
/// Examples:
///   pipedash --workbook pipeline.xlsx
///   pipedash --workbook pipeline.xlsx --partner-type sponsorship --format json
///   pipedash --owner "Dana,Riley" --today 2025-03-14
///   pipedash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the pipeline workbook (.xlsx)
    ///
    /// Defaults to the workbook in .pipedash.toml, or the bundled sample.
    #[arg(short, long, value_name = "FILE", env = "PIPEDASH_WORKBOOK")]
    pub workbook: Option<PathBuf>,

    /// Output file path for the dashboard
    ///
    /// Defaults to the config file setting, or pipeline_dashboard.md.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .pipedash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Partner type to show on the stage board, totals, top deals, and KPIs
    #[arg(long, default_value = "all", value_name = "TYPE")]
    pub partner_type: PartnerTypeArg,

    /// Only include prospects owned by these people (comma-separated)
    ///
    /// Example: --owner "Dana,Riley"
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub owner: Option<Vec<String>>,

    /// Reference date for the activity heat map (YYYY-MM-DD)
    ///
    /// Defaults to today's local date.
    #[arg(long, value_name = "DATE")]
    pub today: Option<NaiveDate>,

    /// Number of top deals to list per partner type
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Number of rows in the recent-activity feed
    #[arg(long, value_name = "COUNT")]
    pub recent: Option<usize>,

    /// Exit with code 2 if any view was unavailable or data-quality warnings were raised
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .pipedash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Partner type selection for --partner-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PartnerTypeArg {
    #[default]
    All,
    Sponsorship,
    PublicInvestment,
}

impl From<PartnerTypeArg> for PartnerFilter {
    fn from(arg: PartnerTypeArg) -> Self {
        match arg {
            PartnerTypeArg::All => PartnerFilter::All,
            PartnerTypeArg::Sponsorship => PartnerFilter::Sponsorship,
            PartnerTypeArg::PublicInvestment => PartnerFilter::PublicInvestment,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if self.recent == Some(0) {
            return Err("--recent must be at least 1".to_string());
        }

        if let Some(ref owners) = self.owner {
            if owners.iter().all(|o| o.trim().is_empty()) {
                return Err("--owner needs at least one non-empty name".to_string());
            }
        }

        Ok(())
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

    /// Owner names to filter on, trimmed, without blanks.
    pub fn owners(&self) -> Vec<String> {
        self.owner
            .iter()
            .flatten()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }
}
