/// Smoke-test for `ChromiumSessions`.
///
/// Launches a headless Chromium, opens the webscraper.io laptops page, clicks
/// "load more" until it disappears and prints the first few products.
///
/// Run with:
///   cargo run --example browser_smoke --features browser
use vitrine_client::ChromiumSessions;
use vitrine_core::models::PageTarget;
use vitrine_core::{
    ExpanderConfig, PageExpander, PageScraper, PageSelectors, RecordExtractor, RecordSchema,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let target = PageTarget::new(
        "laptops",
        "https://webscraper.io/test-sites/e-commerce/more/computers/laptops",
    )?;

    let scraper = PageScraper::new(
        ChromiumSessions::new(),
        PageSelectors::default(),
        PageExpander::new(ExpanderConfig::default()),
        RecordExtractor::new(RecordSchema::product()),
    );

    println!("Scraping {} …", target.url());
    let report = scraper.scrape(&target).await?;

    assert!(
        !report.records.is_empty(),
        "Expected at least one product on {}",
        target.url()
    );

    println!(
        "OK, {} products after {} load-more clicks ({} skipped)",
        report.records.len(),
        report.batches,
        report.skipped
    );
    for product in report.records.iter().take(5) {
        println!("  {} | {} | {} stars", product.title, product.price, product.rating);
    }
    Ok(())
}
