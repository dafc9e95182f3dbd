//! Drives a page to its fully expanded state by clicking "load more" until
//! the control disappears or stops being clickable.

use std::time::Duration;

use crate::error::AppError;
use crate::traits::{PageNode, RenderedPage};

/// Settings for [`PageExpander`].
#[derive(Debug, Clone)]
pub struct ExpanderConfig {
    /// Selector of the "load more" control.
    pub selector: String,
    /// Quiescence delay after each click.
    pub settle_delay: Duration,
    /// Hard ceiling on clicks per page.
    pub max_expansions: usize,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            selector: "[class*=scroll-more]".to_string(),
            settle_delay: Duration::from_secs(1),
            max_expansions: 200,
        }
    }
}

/// Why expansion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No control on the page.
    NoControl,
    /// Control present but hidden or disabled.
    NotInteractable,
    /// Lookup failed twice in a row; the catalog may be partial.
    Stalled,
    /// `max_expansions` clicks were made and the control was still there.
    Ceiling,
}

/// Result of [`PageExpander::expand_fully`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expansion {
    pub batches: usize,
    pub stop: StopReason,
}

enum Step<N> {
    Expand(N),
    Stop(StopReason),
}

#[derive(Debug, Clone, Default)]
pub struct PageExpander {
    config: ExpanderConfig,
}

impl PageExpander {
    pub fn new(config: ExpanderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    /// Click "load more" until there is nothing more to load.
    ///
    /// Every iteration either makes exactly one click or ends the loop.
    /// Calling this again on an exhausted page makes no clicks.
    pub async fn expand_fully<P: RenderedPage>(&self, page: &P) -> Result<Expansion, AppError> {
        let mut batches = 0;
        loop {
            match self.next_step(page).await? {
                Step::Expand(_) if batches >= self.config.max_expansions => {
                    tracing::warn!(
                        batches,
                        selector = %self.config.selector,
                        "Load-more control still present at expansion ceiling"
                    );
                    return Ok(Expansion {
                        batches,
                        stop: StopReason::Ceiling,
                    });
                }
                Step::Expand(control) => {
                    control.activate().await?;
                    batches += 1;
                    tracing::debug!(batches, "Triggered load-more batch");
                    if !self.config.settle_delay.is_zero() {
                        tokio::time::sleep(self.config.settle_delay).await;
                    }
                }
                Step::Stop(stop) => {
                    tracing::debug!(batches, ?stop, "Expansion complete");
                    return Ok(Expansion { batches, stop });
                }
            }
        }
    }

    /// Look for the control (retrying one transient failure) and decide.
    async fn next_step<P: RenderedPage>(&self, page: &P) -> Result<Step<P::Node>, AppError> {
        let probed = match self.probe(page).await {
            Err(e) if e.is_transient() => {
                tracing::debug!(error = %e, "Load-more lookup failed, retrying once");
                self.probe(page).await
            }
            other => other,
        };

        match probed {
            Ok(Some((control, true))) => Ok(Step::Expand(control)),
            Ok(Some((_, false))) => Ok(Step::Stop(StopReason::NotInteractable)),
            Ok(None) => Ok(Step::Stop(StopReason::NoControl)),
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "Load-more lookup stalled; accepting partial catalog");
                Ok(Step::Stop(StopReason::Stalled))
            }
            Err(e) => Err(e),
        }
    }

    async fn probe<P: RenderedPage>(&self, page: &P) -> Result<Option<(P::Node, bool)>, AppError> {
        match page.find_first(&self.config.selector).await? {
            Some(control) => {
                let ready = control.is_interactable().await?;
                Ok(Some((control, ready)))
            }
            None => Ok(None),
        }
    }
}
