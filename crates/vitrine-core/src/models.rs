use std::path::PathBuf;

use url::Url;

use crate::error::AppError;

/// One product row extracted from a catalog page.
///
/// Field order matches [`crate::schema::RecordSchema::product`], which is the
/// column order of the CSV output.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub rating: u32,
    pub num_of_reviews: u32,
}

/// A named catalog page to scrape.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(try_from = "RawPageTarget")]
pub struct PageTarget {
    name: String,
    url: String,
}

#[derive(serde::Deserialize)]
struct RawPageTarget {
    name: String,
    url: String,
}

impl TryFrom<RawPageTarget> for PageTarget {
    type Error = AppError;

    fn try_from(raw: RawPageTarget) -> Result<Self, Self::Error> {
        PageTarget::new(raw.name, raw.url)
    }
}

impl PageTarget {
    /// Validate and build a target.
    ///
    /// The name becomes a file stem, so it is restricted to ASCII
    /// alphanumerics, `-` and `_`. The URL must be absolute http(s).
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self, AppError> {
        let name = name.into();
        let url = url.into();

        if name.is_empty() {
            return Err(AppError::ConfigError("page name must not be empty".into()));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::ConfigError(format!(
                "page name '{name}' may only contain ASCII letters, digits, '-' and '_'"
            )));
        }

        let parsed = Url::parse(&url)
            .map_err(|e| AppError::ConfigError(format!("invalid URL for page '{name}': {e}")))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::ConfigError(format!(
                    "URL scheme '{scheme}' for page '{name}' is not allowed (only http/https)"
                )));
            }
        }

        Ok(Self { name, url })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Output file name for this page, e.g. `laptops.csv`.
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name.to_lowercase())
    }
}

/// Everything one page produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    pub page: String,
    /// Successfully extracted records, in document order.
    pub records: Vec<Product>,
    /// Content nodes discarded because a field failed.
    pub skipped: usize,
    /// "Load more" batches triggered during expansion.
    pub batches: usize,
}

/// A page that was scraped and written.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub page: String,
    pub records: usize,
    pub skipped: usize,
    pub output: PathBuf,
}

/// A page that failed as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFailure {
    pub page: String,
    pub stage: String,
    pub error: String,
}

/// Outcome of a full run over every configured page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub completed: Vec<PageSummary>,
    pub failed: Vec<PageFailure>,
}

impl RunSummary {
    pub fn total_records(&self) -> usize {
        self.completed.iter().map(|p| p.records).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.completed.iter().map(|p| p.skipped).sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
