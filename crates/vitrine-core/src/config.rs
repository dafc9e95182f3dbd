use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;
use crate::expander::ExpanderConfig;
use crate::models::PageTarget;

/// Catalog pages scraped when no page list is configured.
const DEFAULT_PAGES: &[(&str, &str)] = &[
    ("home", "https://webscraper.io/test-sites/e-commerce/more"),
    (
        "computers",
        "https://webscraper.io/test-sites/e-commerce/more/computers",
    ),
    (
        "laptops",
        "https://webscraper.io/test-sites/e-commerce/more/computers/laptops",
    ),
    (
        "tablets",
        "https://webscraper.io/test-sites/e-commerce/more/computers/tablets",
    ),
    ("phones", "https://webscraper.io/test-sites/e-commerce/more/phones"),
    (
        "touch",
        "https://webscraper.io/test-sites/e-commerce/more/phones/touch",
    ),
];

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub pages: Vec<PageTarget>,
    pub output_dir: PathBuf,
    pub settle_delay: Duration,
    pub max_expansions: usize,
    /// Bound on every navigation, lookup and click.
    pub operation_timeout: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        let expander = ExpanderConfig::default();
        Self {
            pages: default_pages(),
            output_dir: PathBuf::from("."),
            settle_delay: expander.settle_delay,
            max_expansions: expander.max_expansions,
            operation_timeout: Duration::from_secs(30),
        }
    }
}

impl ScrapeConfig {
    /// Read configuration from environment variables.
    ///
    /// - `VITRINE_PAGES` (optional): JSON file with `[{"name": .., "url": ..}]`
    /// - `VITRINE_OUTPUT_DIR` (optional, defaults to `.`)
    /// - `VITRINE_SETTLE_MS` (optional, defaults to 1000)
    /// - `VITRINE_MAX_EXPANSIONS` (optional, defaults to 200)
    /// - `VITRINE_TIMEOUT_SECS` (optional, defaults to 30)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(path) = lookup("VITRINE_PAGES") {
            config.pages = load_pages(Path::new(&path))?;
        }
        if let Some(dir) = lookup("VITRINE_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("VITRINE_SETTLE_MS") {
            config.settle_delay = Duration::from_millis(parse_number("VITRINE_SETTLE_MS", &raw)?);
        }
        if let Some(raw) = lookup("VITRINE_MAX_EXPANSIONS") {
            config.max_expansions = parse_number("VITRINE_MAX_EXPANSIONS", &raw)?;
        }
        if let Some(raw) = lookup("VITRINE_TIMEOUT_SECS") {
            let secs: u64 = parse_number("VITRINE_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
                return Err(AppError::ConfigError(
                    "VITRINE_TIMEOUT_SECS must be at least 1".into(),
                ));
            }
            config.operation_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Page names must be unique once lowercased, since they name the output files.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.pages.is_empty() {
            return Err(AppError::ConfigError("no pages configured".into()));
        }
        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.file_name()) {
                return Err(AppError::ConfigError(format!(
                    "duplicate page name '{}'",
                    page.name()
                )));
            }
        }
        Ok(())
    }

    pub fn expander_config(&self) -> ExpanderConfig {
        ExpanderConfig {
            settle_delay: self.settle_delay,
            max_expansions: self.max_expansions,
            ..ExpanderConfig::default()
        }
    }
}

/// The built-in page list.
pub fn default_pages() -> Vec<PageTarget> {
    DEFAULT_PAGES
        .iter()
        .filter_map(|(name, url)| PageTarget::new(*name, *url).ok())
        .collect()
}

fn load_pages(path: &Path) -> Result<Vec<PageTarget>, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!("Failed to read page list {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::ConfigError(format!("Invalid page list {}: {e}", path.display()))
    })
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid {key} '{raw}': must be a non-negative integer"
        ))
    })
}
