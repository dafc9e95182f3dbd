use crate::error::{AppError, FieldError};
use crate::models::Product;
use crate::schema::{Capture, Captured, FieldRule, ProductDraft, RecordSchema};
use crate::traits::PageNode;

/// Records extracted from a batch of content nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    /// Surviving records, in the order of the input nodes.
    pub records: Vec<Product>,
    /// Nodes discarded because one of their fields failed.
    pub skipped: usize,
}

/// Maps content nodes to [`Product`]s by walking a [`RecordSchema`].
#[derive(Debug, Clone, Default)]
pub struct RecordExtractor {
    schema: RecordSchema,
}

impl RecordExtractor {
    pub fn new(schema: RecordSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Extract one record. The inner error is the first field that could not
    /// be read or parsed; no partial record is ever returned. The outer error
    /// is page-fatal (a timeout or lost session) and must abort the page.
    pub async fn extract<N: PageNode>(
        &self,
        node: &N,
    ) -> Result<Result<Product, FieldError>, AppError> {
        match self.try_extract(node).await {
            Ok(product) => Ok(Ok(product)),
            Err(Failure::Skip(e)) => Ok(Err(e)),
            Err(Failure::Fatal(e)) => Err(e),
        }
    }

    /// Extract every node, skipping (and counting) the ones that fail.
    /// Stops at the first page-fatal error.
    pub async fn extract_all<N: PageNode>(&self, nodes: &[N]) -> Result<Extracted, AppError> {
        let mut out = Extracted::default();
        for (index, node) in nodes.iter().enumerate() {
            match self.extract(node).await? {
                Ok(product) => out.records.push(product),
                Err(e) => {
                    tracing::debug!(index, field = e.field(), error = %e, "Skipping content node");
                    out.skipped += 1;
                }
            }
        }
        Ok(out)
    }

    async fn try_extract<N: PageNode>(&self, node: &N) -> Result<Product, Failure> {
        let mut draft = ProductDraft::default();
        for rule in self.schema.rules() {
            let captured = capture(node, rule).await?;
            rule.apply(captured, &mut draft)?;
        }
        Ok(draft.finish()?)
    }
}

/// Why one node produced no record.
enum Failure {
    Skip(FieldError),
    Fatal(AppError),
}

impl From<FieldError> for Failure {
    fn from(e: FieldError) -> Self {
        Failure::Skip(e)
    }
}

async fn capture<N: PageNode>(node: &N, rule: &FieldRule) -> Result<Captured, Failure> {
    let render_err = |e: AppError| {
        if e.is_page_fatal() {
            Failure::Fatal(e)
        } else {
            Failure::Skip(FieldError::Render {
                field: rule.name,
                message: e.to_string(),
            })
        }
    };

    match rule.capture {
        Capture::Count => {
            let matches = node.find_all(rule.selector).await.map_err(render_err)?;
            Ok(Captured::Count(matches.len()))
        }
        Capture::RawContent | Capture::VisibleText => {
            let target = node
                .find_first(rule.selector)
                .await
                .map_err(render_err)?
                .ok_or(FieldError::Missing {
                    field: rule.name,
                    selector: rule.selector,
                })?;
            let text = if rule.capture == Capture::RawContent {
                target.raw_content().await
            } else {
                target.text().await
            };
            Ok(Captured::Text(text.map_err(render_err)?))
        }
    }
}
