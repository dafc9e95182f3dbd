use std::fmt;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use thiserror::Error;

use crate::error::AppError;
use crate::expander::PageExpander;
use crate::extractor::RecordExtractor;
use crate::models::{PageReport, PageTarget};
use crate::traits::{PageNode, PageSession, RenderedPage, SessionFactory};

/// Page-level selectors that are not part of the record schema.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    /// One match per catalog entry.
    pub content: String,
    /// Cookie-consent acknowledgment button.
    pub consent: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            content: "[class*=product-wrapper]".to_string(),
            consent: ".acceptCookies".to_string(),
        }
    }
}

/// Where in the per-page state machine something happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStage {
    Opening,
    Navigating,
    ConsentCheck,
    Expanding,
    Enumerating,
    Done,
}

impl fmt::Display for PageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PageStage::Opening => "opening session",
            PageStage::Navigating => "navigating",
            PageStage::ConsentCheck => "consent check",
            PageStage::Expanding => "expanding",
            PageStage::Enumerating => "enumerating",
            PageStage::Done => "done",
        };
        f.write_str(label)
    }
}

/// A failure that aborted one page.
#[derive(Error, Debug)]
#[error("{stage}: {source}")]
pub struct PageError {
    pub stage: PageStage,
    #[source]
    pub source: AppError,
}

impl PageError {
    fn at(stage: PageStage) -> impl FnOnce(AppError) -> PageError {
        move |source| PageError { stage, source }
    }
}

/// Scrapes one catalog page per call: open session, navigate, dismiss the
/// consent banner, expand, extract, close session.
pub struct PageScraper<S: SessionFactory> {
    sessions: S,
    selectors: PageSelectors,
    expander: PageExpander,
    extractor: RecordExtractor,
}

impl<S: SessionFactory> PageScraper<S> {
    pub fn new(
        sessions: S,
        selectors: PageSelectors,
        expander: PageExpander,
        extractor: RecordExtractor,
    ) -> Self {
        Self {
            sessions,
            selectors,
            expander,
            extractor,
        }
    }

    pub fn extractor(&self) -> &RecordExtractor {
        &self.extractor
    }

    /// Run the whole page. The session is closed before returning, whatever
    /// the outcome, and before a panic from the backend is resumed.
    pub async fn scrape(&self, target: &PageTarget) -> Result<PageReport, PageError> {
        let session = self
            .sessions
            .open()
            .await
            .map_err(PageError::at(PageStage::Opening))?;

        let outcome = AssertUnwindSafe(self.drive(&session, target))
            .catch_unwind()
            .await;
        session.close().await;
        tracing::debug!(page = %target.name(), "Session released");

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn drive(&self, page: &S::Session, target: &PageTarget) -> Result<PageReport, PageError> {
        tracing::info!(page = %target.name(), url = %target.url(), "Navigating");
        page.navigate(target.url())
            .await
            .map_err(PageError::at(PageStage::Navigating))?;

        self.dismiss_consent(page)
            .await
            .map_err(PageError::at(PageStage::ConsentCheck))?;

        let expansion = self
            .expander
            .expand_fully(page)
            .await
            .map_err(PageError::at(PageStage::Expanding))?;

        let nodes = page
            .find_all(&self.selectors.content)
            .await
            .map_err(PageError::at(PageStage::Enumerating))?;
        let extracted = self
            .extractor
            .extract_all(&nodes)
            .await
            .map_err(PageError::at(PageStage::Enumerating))?;

        tracing::info!(
            page = %target.name(),
            nodes = nodes.len(),
            records = extracted.records.len(),
            skipped = extracted.skipped,
            batches = expansion.batches,
            "Page {}",
            PageStage::Done
        );

        Ok(PageReport {
            page: target.name().to_string(),
            records: extracted.records,
            skipped: extracted.skipped,
            batches: expansion.batches,
        })
    }

    /// Click the consent button if it is there and clickable. Its absence is
    /// normal; only page-fatal errors (timeouts) propagate.
    async fn dismiss_consent(&self, page: &S::Session) -> Result<(), AppError> {
        let attempt = async {
            let Some(button) = page.find_first(&self.selectors.consent).await? else {
                tracing::debug!("No cookie consent control");
                return Ok(());
            };
            if button.is_interactable().await? {
                button.activate().await?;
                tracing::debug!("Dismissed cookie consent");
            } else {
                tracing::debug!("Cookie consent present but not interactable");
            }
            Ok::<(), AppError>(())
        };

        match attempt.await {
            Err(e) if e.is_page_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Could not dismiss cookie consent; continuing");
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }
}
