use thiserror::Error;

/// Application-wide error types for Vitrine.
#[derive(Error, Debug)]
pub enum AppError {
    /// A rendering session (browser instance) could not be acquired.
    #[error("Session error: {0}")]
    SessionError(String),

    /// Navigation to a page URL failed.
    #[error("Navigation error: {0}")]
    NavigationError(String),

    /// Element lookup or interaction failed inside a rendered page.
    #[error("Render error: {0}")]
    RenderError(String),

    /// A bounded wait elapsed.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// The output sink could not be fully written.
    #[error("Write error: {0}")]
    WriteError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is a transient rendering hiccup worth one more try.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::RenderError(_))
    }

    /// Returns true if this error aborts the page it occurred on.
    pub fn is_page_fatal(&self) -> bool {
        matches!(
            self,
            AppError::SessionError(_) | AppError::NavigationError(_) | AppError::Timeout(_)
        )
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::WriteError(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::WriteError(e.to_string())
    }
}

/// Why a single field could not be extracted from a content node.
///
/// Any of these discards the whole record; they are counted, never propagated
/// past the extractor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("`{field}`: no element matches `{selector}`")]
    Missing {
        field: &'static str,
        selector: &'static str,
    },

    #[error("`{field}` is empty")]
    Empty { field: &'static str },

    #[error("`{field}`: cannot parse {raw:?}: {reason}")]
    Parse {
        field: &'static str,
        raw: String,
        reason: String,
    },

    #[error("`{field}` was never captured")]
    Unset { field: &'static str },

    #[error("`{field}`: {message}")]
    Render {
        field: &'static str,
        message: String,
    },
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::Missing { field, .. }
            | FieldError::Empty { field }
            | FieldError::Unset { field }
            | FieldError::Parse { field, .. }
            | FieldError::Render { field, .. } => field,
        }
    }
}
