pub mod config;
pub mod error;
pub mod expander;
pub mod extractor;
pub mod models;
pub mod run;
pub mod schema;
pub mod scraper;
pub mod traits;
pub mod writer;

#[cfg(test)]
pub mod testutil;

pub use config::ScrapeConfig;
pub use error::{AppError, FieldError};
pub use expander::{ExpanderConfig, Expansion, PageExpander, StopReason};
pub use extractor::{Extracted, RecordExtractor};
pub use models::{PageFailure, PageReport, PageSummary, PageTarget, Product, RunSummary};
pub use run::{CatalogRun, RunEvent, RunReporter, TracingRunReporter};
pub use schema::RecordSchema;
pub use scraper::{PageError, PageScraper, PageSelectors, PageStage};
pub use traits::{PageNode, PageSession, RenderedPage, SessionFactory};
pub use writer::TabularWriter;
