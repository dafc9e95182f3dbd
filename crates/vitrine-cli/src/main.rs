use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vitrine_client::ChromiumSessions;
use vitrine_core::{CatalogRun, RunSummary, ScrapeConfig, TracingRunReporter};

/// Scrape every configured catalog page into one CSV file per page.
///
/// Configuration comes from the environment (or a `.env` file):
/// `VITRINE_PAGES`, `VITRINE_OUTPUT_DIR`, `VITRINE_SETTLE_MS`,
/// `VITRINE_MAX_EXPANSIONS` and `VITRINE_TIMEOUT_SECS`.
#[derive(Parser)]
#[command(name = "vitrine", version, about = "Catalog product extractor")]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vitrine=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Cli {} = Cli::parse();

    let config = ScrapeConfig::from_env().context("Invalid configuration")?;
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;
    tracing::debug!(
        pages = config.pages.len(),
        output_dir = %config.output_dir.display(),
        "Configuration loaded"
    );

    let sessions = ChromiumSessions::with_timeout(config.operation_timeout);
    let summary = CatalogRun::from_config(sessions, &config)
        .run(&config.pages, &TracingRunReporter)
        .await;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for page in &summary.completed {
        println!(
            "{:<12} {:>5} records  {:>3} skipped  -> {}",
            page.page,
            page.records,
            page.skipped,
            page.output.display()
        );
    }

    if summary.has_failures() {
        println!();
        println!("{} page(s) failed:", summary.failed.len());
        for failure in &summary.failed {
            println!("  {} ({}): {}", failure.page, failure.stage, failure.error);
        }
    }
}
