mod bootstrap;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use metering_core::settings::Settings;
use metering_report::{block_report, csv_export, diagnostics_log, summary};
use metering_runtime::district::{run_district, summarize};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::info!("BTU metering pipeline v{} starting", env!("CARGO_PKG_VERSION"));

    let config = settings.into_config()?;
    bootstrap::ensure_output_dir(&config.output_dir)?;

    tracing::info!(
        "Month {}/{}: {} blocks under {}",
        config.target_month,
        config.target_year,
        config.blocks.len(),
        config.data_root.display()
    );

    let config = Arc::new(config);
    let run = run_district(Arc::clone(&config)).await;

    for outcome in &run.outcomes {
        let report_path = block_report::write_block_report(&config, outcome)?;
        tracing::info!("Report written: {}", report_path.display());
        diagnostics_log::write_diagnostics_log(&config, outcome)?;
    }

    if config.write_csv {
        csv_export::write_block_csv(&config, &run.outcomes)?;
        csv_export::write_meter_csv(&config, &run.outcomes)?;
        tracing::info!("CSV exports written to {}", config.output_dir.display());
    }

    let district = summarize(&run, &config);
    let summary_path = summary::write_district_summary(&config, &district)?;
    tracing::info!("District summary saved: {}", summary_path.display());
    summary::log_district_summary(&district);

    Ok(())
}
