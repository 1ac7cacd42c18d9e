//! Pipedash - partnership revenue pipeline dashboard
//!
//! A CLI tool that reads the weekly sales-tracking workbook and writes
//! a dashboard of pipeline KPIs, top deals, stage totals, and recent
//! partner activity.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing workbook, unreadable file, bad config, etc.)
//!   2 - Dashboard degraded (views unavailable or data warnings) with --strict

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod pipeline;
mod report;
mod workbook;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::PartnerFilter;
use report::DashboardOptions;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use workbook::Workbook;

fn main() -> Result<()> {
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

    // Load configuration before logging so `general.verbose` can apply
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("Pipedash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_dashboard(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .pipedash.toml.
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
    println!("   Edit it to set the workbook path, output file, and report sizes.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        // An explicit path must load
        Config::load(config_path)?
    } else {
        match Config::load_default() {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE, e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    Ok(config)
}

/// Where to write the dashboard.
///
/// A JSON dashboard without an explicit `--output` swaps the default `.md`
/// extension for `.json`.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);
    let is_markdown = path.extension().map_or(false, |ext| ext == "md");

    if args.output.is_none() && args.format == OutputFormat::Json && is_markdown {
        path.with_extension("json")
    } else {
        path
    }
}

/// Open the workbook, with a spinner unless running quietly.
fn open_workbook(path: &Path, show_progress: bool) -> Result<Workbook> {
    let spinner = show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Reading {}", path.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = Workbook::open(path);

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let workbook = result?;
    info!(
        "Loaded {} sheets: {}",
        workbook.sheet_names().len(),
        workbook.sheet_names().join(", ")
    );
    Ok(workbook)
}

/// Run the complete dashboard workflow. Returns exit code (0 or 2).
fn run_dashboard(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Read the workbook
    let workbook_path = config.workbook.path.clone();
    if !args.quiet {
        println!("📥 Loading workbook: {}", workbook_path.display());
    }
    let workbook = open_workbook(&workbook_path, !args.quiet)?;

    // Step 2: Build every view
    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let options = DashboardOptions {
        partner_filter: PartnerFilter::from(args.partner_type),
        owners: args.owners(),
        today,
        top_deals: config.report.top_deals,
        recent_activity: config.report.recent_activity,
        include_data_dictionary: config.report.include_data_dictionary,
    };
    debug!("Dashboard options: {:?}", options);

    if !args.quiet {
        println!("📊 Building dashboard for the week of {}...", today);
    }
    let dashboard = report::build_dashboard(&workbook, &options);

    // Step 3: Render and save
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(&dashboard),
    };

    let output_file = output_path(&args, &config);
    std::fs::write(&output_file, &output)
        .with_context(|| format!("Failed to write dashboard to {}", output_file.display()))?;

    // Print summary
    if !args.quiet {
        println!("\n📋 Dashboard Summary:");
        println!(
            "   Prospects: {} | Activities: {}",
            dashboard.metadata.prospect_count, dashboard.metadata.activity_count
        );
        if let Some(ref pipeline) = dashboard.pipeline {
            println!(
                "   Total expected value: {}",
                report::generator::format_currency(pipeline.kpis.total_expected_value)
            );
            println!("   Active prospects: {}", pipeline.kpis.active_prospects);
        }
        if let Some(ref activity) = dashboard.activity {
            println!(
                "   Contacts in the last three weeks: {}",
                activity.heat_map.total()
            );
        }
        for view in &dashboard.unavailable {
            println!("   ⛔ {}", view);
        }
        if !dashboard.warnings.is_empty() {
            println!("   ⚠️  Data quality warnings: {}", dashboard.warnings.len());
        }
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        println!(
            "\n✅ Dashboard complete! Saved to: {}",
            output_file.display()
        );
    }

    if args.strict && dashboard.is_degraded() {
        warn!(
            "{} views unavailable, {} warnings",
            dashboard.unavailable.len(),
            dashboard.warnings.len()
        );
        eprintln!("\n⛔ Dashboard is degraded and --strict is set. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cli::PartnerTypeArg;

    fn make_args() -> Args {
        Args {
            workbook: None,
            output: None,
            config: None,
            format: OutputFormat::Markdown,
            partner_type: PartnerTypeArg::All,
            owner: None,
            today: None,
            top: None,
            recent: None,
            strict: false,
            verbose: false,
            quiet: true,
            init_config: false,
        }
    }

    #[test]
    fn test_output_path_follows_format() {
        let mut args = make_args();
        let config = Config::default();
        assert_eq!(
            output_path(&args, &config),
            PathBuf::from("pipeline_dashboard.md")
        );

        args.format = OutputFormat::Json;
        assert_eq!(
            output_path(&args, &config),
            PathBuf::from("pipeline_dashboard.json")
        );

        // An explicit --output is never rewritten
        args.output = Some(PathBuf::from("weekly.md"));
        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(output_path(&args, &config), PathBuf::from("weekly.md"));
    }

    #[test]
    fn test_missing_workbook_is_an_error() {
        let err = open_workbook(Path::new("/definitely/not/here.xlsx"), false).unwrap_err();
        assert!(err.to_string().contains("Workbook not found"));
    }

    #[test]
    fn test_bundled_sample_workbook_renders() {
        let workbook = open_workbook(&config::default_workbook_path(), false).unwrap();
        let options = DashboardOptions {
            partner_filter: PartnerFilter::All,
            owners: Vec::new(),
            today: chrono::NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            top_deals: 3,
            recent_activity: 10,
            include_data_dictionary: true,
        };

        let dashboard = report::build_dashboard(&workbook, &options);
        assert!(dashboard.unavailable.is_empty());
        assert!(dashboard.pipeline.is_some());
        assert!(dashboard.activity.as_ref().unwrap().heat_map.total() > 0);

        let markdown = report::generate_markdown_report(&dashboard);
        assert!(markdown.contains("## Activity Heat Map"));
    }
}
