//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.pipedash.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".pipedash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Workbook source settings.
    #[serde(default)]
    pub workbook: WorkbookConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "pipeline_dashboard.md".to_string()
}

/// Where the pipeline workbook lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookConfig {
    /// Path to the workbook file.
    #[serde(default = "default_workbook_path")]
    pub path: PathBuf,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            path: default_workbook_path(),
        }
    }
}

/// The sample workbook shipped with the crate.
pub fn default_workbook_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("sample_pipeline.xlsx")
}

/// Dashboard content settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Deals listed per partner type in the top-deals view.
    #[serde(default = "default_top_deals")]
    pub top_deals: usize,

    /// Rows in the recent-activity feed.
    #[serde(default = "default_recent_activity")]
    pub recent_activity: usize,

    /// Render the Data_Dictionary sheet at the bottom of the dashboard.
    #[serde(default = "default_true")]
    pub include_data_dictionary: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_deals: default_top_deals(),
            recent_activity: default_recent_activity(),
            include_data_dictionary: true,
        }
    }
}

fn default_top_deals() -> usize {
    3
}

fn default_recent_activity() -> usize {
    10
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
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Workbook path (--workbook or PIPEDASH_WORKBOOK)
        if let Some(ref workbook) = args.workbook {
            self.workbook.path = workbook.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(top) = args.top {
            self.report.top_deals = top;
        }
        if let Some(recent) = args.recent {
            self.report.recent_activity = recent;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, OutputFormat, PartnerTypeArg};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "pipeline_dashboard.md");
        assert_eq!(config.report.top_deals, 3);
        assert_eq!(config.report.recent_activity, 10);
        assert!(config.report.include_data_dictionary);
        assert!(config.workbook.path.ends_with("data/sample_pipeline.xlsx"));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "weekly.md"
verbose = true

[workbook]
path = "/shared/pipeline.xlsx"

[report]
top_deals = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "weekly.md");
        assert!(config.general.verbose);
        assert_eq!(config.workbook.path, PathBuf::from("/shared/pipeline.xlsx"));
        assert_eq!(config.report.top_deals, 5);
        assert_eq!(config.report.recent_activity, 10);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[report]\nrecent_activity = 25\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.report.recent_activity, 25);
        assert_eq!(config.general.output, "pipeline_dashboard.md");

        std::fs::write(&path, "[report\nbroken").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let args = Args {
            workbook: Some(PathBuf::from("cli.xlsx")),
            output: Some(PathBuf::from("out.json")),
            config: None,
            format: OutputFormat::Json,
            partner_type: PartnerTypeArg::All,
            owner: None,
            today: None,
            top: None,
            recent: Some(4),
            strict: false,
            verbose: false,
            quiet: false,
            init_config: false,
        };

        config.merge_with_args(&args);
        assert_eq!(config.workbook.path, PathBuf::from("cli.xlsx"));
        assert_eq!(config.general.output, "out.json");
        assert_eq!(config.report.top_deals, 3);
        assert_eq!(config.report.recent_activity, 4);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[workbook]"));
        assert!(toml_str.contains("[report]"));
    }
}
