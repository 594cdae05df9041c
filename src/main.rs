//! vlansweep CLI: dry-run analysis by default, explicit execute mode.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use vlansweep::aggregate::{FleetSummary, MetricsPolicy};
use vlansweep::config::Settings;
use vlansweep::fleet::FleetAnalyzer;
use vlansweep::report;
use vlansweep::transport::SshConnector;

/// Identify unused VLANs across a switch fleet and generate removal
/// commands for Cisco, Arista, and Juniper devices.
#[derive(Debug, Parser)]
#[command(name = "vlansweep", version, about)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Execute the actual VLAN cleanup (disables dry-run).
    #[arg(long)]
    execute: bool,

    /// Approve removal of high-risk VLANs (use with caution).
    #[arg(long)]
    approve_all: bool,

    /// Output file for the JSON report.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also generate a CSV summary next to the report.
    #[arg(long)]
    csv: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> vlansweep::error::Result<ExitCode> {
    let dry_run = !cli.execute;
    if dry_run {
        info!("Running in DRY-RUN mode - no changes will be applied");
    } else {
        info!("Running in PRODUCTION mode - changes will be applied to devices");
        if cli.approve_all {
            warn!("AUTO-APPROVAL enabled - high-risk VLANs will be removed automatically");
        }
    }

    let settings = Settings::load(&cli.config)?;
    settings.validate()?;

    let connector = SshConnector::new(
        Arc::new(settings.authentication),
        settings.processing.clone(),
    );
    let fleet = FleetAnalyzer::new(
        Arc::new(connector),
        settings.vlan_analysis.clone(),
        settings.processing.max_concurrent_devices,
        dry_run,
    );

    info!("Starting VLAN cleanup analysis...");
    let results = fleet.run(&settings.devices).await;

    if results.is_empty() {
        error!("No results generated - check configuration and device connectivity");
        return Ok(ExitCode::FAILURE);
    }

    let summary = FleetSummary::from_results(&results, &MetricsPolicy::default());
    let document = report::build_report(&results, &summary, dry_run);

    let report_path = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&settings.output.file));
    report::save_report(&document, &report_path)?;
    info!("Analysis complete. Report saved to: {}", report_path.display());

    if cli.csv {
        let csv_path = report_path.with_extension("csv");
        report::write_summary_csv(&results, &csv_path)?;
        info!("CSV summary generated: {}", csv_path.display());
    }

    print!("{}", report::render_executive_summary(&summary));

    if cli.execute {
        info!("Proceeding with VLAN cleanup execution...");
        let outcome = fleet.execute_approved(&results, cli.approve_all).await?;
        if outcome.all_succeeded() {
            info!("VLAN cleanup execution completed successfully");
        } else {
            error!(
                "VLAN cleanup execution encountered errors: {}/{} devices successful",
                outcome.succeeded_count(),
                outcome.devices.len()
            );
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}
