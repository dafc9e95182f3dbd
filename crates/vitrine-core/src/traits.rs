use std::future::Future;

use crate::error::AppError;

/// One element of a rendered page.
///
/// Lookups on a node are scoped to its descendants.
pub trait PageNode: Send + Sync + Sized {
    /// Rendered (visible) text, as a user would see it.
    fn text(&self) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Full text content, including text that is not visually rendered.
    fn raw_content(&self) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Whether the element is displayed and can receive a click.
    fn is_interactable(&self) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Click-equivalent activation.
    fn activate(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    fn find_first(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Option<Self>, AppError>> + Send;

    fn find_all(&self, selector: &str) -> impl Future<Output = Result<Vec<Self>, AppError>> + Send;
}

/// A page inside a rendering engine (real browser, headless engine or test double).
pub trait RenderedPage: Send + Sync {
    type Node: PageNode;

    /// Load `url` into this page.
    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// First element matching `selector`, or `None`.
    fn find_first(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Option<Self::Node>, AppError>> + Send;

    /// All elements matching `selector`, in document order.
    fn find_all(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<Self::Node>, AppError>> + Send;
}

/// An exclusive rendering session for one page.
///
/// Must be released with [`PageSession::close`] once the page is done.
pub trait PageSession: RenderedPage {
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Acquires a fresh rendering session per page.
pub trait SessionFactory: Send + Sync {
    type Session: PageSession;

    fn open(&self) -> impl Future<Output = Result<Self::Session, AppError>> + Send;
}
