use std::path::PathBuf;

use crate::config::ScrapeConfig;
use crate::expander::PageExpander;
use crate::extractor::RecordExtractor;
use crate::models::{PageFailure, PageSummary, PageTarget, RunSummary};
use crate::schema::RecordSchema;
use crate::scraper::{PageScraper, PageSelectors};
use crate::traits::SessionFactory;
use crate::writer::TabularWriter;

/// Events emitted during a run for monitoring/logging.
#[derive(Debug, Clone)]
pub enum RunEvent<'a> {
    Started { pages: usize },
    PageStarted { page: &'a PageTarget },
    PageCompleted { summary: &'a PageSummary },
    PageFailed { failure: &'a PageFailure },
    Finished { summary: &'a RunSummary },
}

/// Trait for receiving run events (decoupled progress reporting).
pub trait RunReporter: Send + Sync {
    fn report(&self, event: RunEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunReporter;

impl RunReporter for TracingRunReporter {
    fn report(&self, event: RunEvent<'_>) {
        match event {
            RunEvent::Started { pages } => {
                tracing::info!(%pages, "Run started");
            }
            RunEvent::PageStarted { page } => {
                tracing::info!(page = %page.name(), url = %page.url(), "Scraping page");
            }
            RunEvent::PageCompleted { summary } => {
                tracing::info!(
                    page = %summary.page,
                    records = summary.records,
                    skipped = summary.skipped,
                    output = %summary.output.display(),
                    "Page written"
                );
            }
            RunEvent::PageFailed { failure } => {
                tracing::warn!(
                    page = %failure.page,
                    stage = %failure.stage,
                    error = %failure.error,
                    "Page failed"
                );
            }
            RunEvent::Finished { summary } => {
                tracing::info!(
                    completed = summary.completed.len(),
                    failed = summary.failed.len(),
                    records = summary.total_records(),
                    skipped = summary.total_skipped(),
                    "Run finished"
                );
            }
        }
    }
}

/// Scrapes every page in turn and writes one CSV per page.
///
/// Pages are independent: a failure on one is recorded and the run moves on.
pub struct CatalogRun<S: SessionFactory> {
    scraper: PageScraper<S>,
    writer: TabularWriter,
    output_dir: PathBuf,
}

impl<S: SessionFactory> CatalogRun<S> {
    pub fn new(scraper: PageScraper<S>, writer: TabularWriter, output_dir: PathBuf) -> Self {
        Self {
            scraper,
            writer,
            output_dir,
        }
    }

    /// Wire up the default product schema and selectors from `config`.
    pub fn from_config(sessions: S, config: &ScrapeConfig) -> Self {
        let schema = RecordSchema::product();
        let scraper = PageScraper::new(
            sessions,
            PageSelectors::default(),
            PageExpander::new(config.expander_config()),
            RecordExtractor::new(schema.clone()),
        );
        Self::new(scraper, TabularWriter::new(schema), config.output_dir.clone())
    }

    pub async fn run<R: RunReporter>(&self, pages: &[PageTarget], reporter: &R) -> RunSummary {
        reporter.report(RunEvent::Started { pages: pages.len() });

        let mut summary = RunSummary::default();
        for page in pages {
            reporter.report(RunEvent::PageStarted { page });
            match self.run_page(page).await {
                Ok(done) => {
                    reporter.report(RunEvent::PageCompleted { summary: &done });
                    summary.completed.push(done);
                }
                Err(failure) => {
                    reporter.report(RunEvent::PageFailed { failure: &failure });
                    summary.failed.push(failure);
                }
            }
        }

        reporter.report(RunEvent::Finished { summary: &summary });
        summary
    }

    async fn run_page(&self, page: &PageTarget) -> Result<PageSummary, PageFailure> {
        let report = self.scraper.scrape(page).await.map_err(|e| PageFailure {
            page: page.name().to_string(),
            stage: e.stage.to_string(),
            error: e.source.to_string(),
        })?;

        let output = self.output_dir.join(page.file_name());
        self.writer
            .write_to_path(&report.records, &output)
            .map_err(|e| PageFailure {
                page: page.name().to_string(),
                stage: "writing".to_string(),
                error: e.to_string(),
            })?;

        Ok(PageSummary {
            page: report.page,
            records: report.records.len(),
            skipped: report.skipped,
            output,
        })
    }
}
