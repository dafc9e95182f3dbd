//! Pre-rendered HTML documents served through the rendered-page traits.
//!
//! Nothing is executed: "load more" never loads anything and clicks are
//! no-ops. Visibility is read from `hidden` attributes and inline
//! `display: none` / `visibility: hidden` styles. Useful for saved snapshots
//! of fully expanded catalogs and as a test double.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use scraper::{ElementRef, Html, Node, Selector};
use vitrine_core::error::AppError;
use vitrine_core::traits::{PageNode, PageSession, RenderedPage, SessionFactory};

const SKIPPED_TAGS: &[&str] = &["script", "style", "template", "noscript"];
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "br", "div", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "li", "p", "section", "td", "tr",
];

/// Hands out [`StaticPage`] sessions over a fixed set of documents keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct StaticSessions {
    documents: Arc<HashMap<String, Arc<str>>>,
}

impl StaticSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` when `url` is navigated to.
    pub fn with_document(mut self, url: &str, html: &str) -> Self {
        Arc::make_mut(&mut self.documents).insert(url.to_string(), Arc::from(html));
        self
    }
}

impl SessionFactory for StaticSessions {
    type Session = StaticPage;

    async fn open(&self) -> Result<StaticPage, AppError> {
        Ok(StaticPage {
            documents: Arc::clone(&self.documents),
            current: Mutex::new(None),
        })
    }
}

/// A page showing one of the documents of its [`StaticSessions`].
#[derive(Debug)]
pub struct StaticPage {
    documents: Arc<HashMap<String, Arc<str>>>,
    current: Mutex<Option<Arc<str>>>,
}

impl StaticPage {
    /// A page already showing `html`.
    pub fn from_html(html: &str) -> Self {
        Self {
            documents: Arc::default(),
            current: Mutex::new(Some(Arc::from(html))),
        }
    }

    fn document(&self) -> Result<Arc<str>, AppError> {
        self.current
            .lock()
            .map_err(|_| AppError::RenderError("page state poisoned".into()))?
            .clone()
            .ok_or_else(|| AppError::RenderError("no document loaded".into()))
    }
}

impl RenderedPage for StaticPage {
    type Node = StaticNode;

    async fn navigate(&self, url: &str) -> Result<(), AppError> {
        let html = self
            .documents
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::NavigationError(format!("no document for {url}")))?;
        *self
            .current
            .lock()
            .map_err(|_| AppError::RenderError("page state poisoned".into()))? = Some(html);
        Ok(())
    }

    async fn find_first(&self, selector: &str) -> Result<Option<StaticNode>, AppError> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<StaticNode>, AppError> {
        select(&self.document()?, selector, None)
    }
}

impl PageSession for StaticPage {
    async fn close(self) {
        tracing::trace!("Static page closed");
    }
}

/// Snapshot of one element: its markup plus text and visibility computed
/// against the full document it came from.
#[derive(Debug, Clone)]
pub struct StaticNode {
    fragment: Arc<str>,
    text: String,
    raw: String,
    hidden: bool,
}

impl StaticNode {
    fn capture(element: ElementRef<'_>, inherited_hidden: bool) -> Self {
        let hidden = inherited_hidden
            || is_hidden(element)
            || element.ancestors().filter_map(ElementRef::wrap).any(is_hidden);

        let mut text = String::new();
        collect_visible(element, &mut text);

        Self {
            fragment: Arc::from(element.html()),
            text: text.split_whitespace().collect::<Vec<_>>().join(" "),
            raw: element.text().collect(),
            hidden,
        }
    }
}

impl PageNode for StaticNode {
    async fn text(&self) -> Result<String, AppError> {
        Ok(self.text.clone())
    }

    async fn raw_content(&self) -> Result<String, AppError> {
        Ok(self.raw.clone())
    }

    async fn is_interactable(&self) -> Result<bool, AppError> {
        Ok(!self.hidden)
    }

    async fn activate(&self) -> Result<(), AppError> {
        tracing::debug!("Click on static element ignored");
        Ok(())
    }

    async fn find_first(&self, selector: &str) -> Result<Option<StaticNode>, AppError> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<StaticNode>, AppError> {
        select(&self.fragment, selector, Some(self.hidden))
    }
}

/// Query `html`. With `scope` set, `html` is an element fragment: only its
/// descendants match, and they inherit the scope's hidden flag.
fn select(html: &str, selector: &str, scope: Option<bool>) -> Result<Vec<StaticNode>, AppError> {
    let parsed = Selector::parse(selector)
        .map_err(|e| AppError::RenderError(format!("invalid selector {selector:?}: {e}")))?;

    let Some(scope_hidden) = scope else {
        let doc = Html::parse_document(html);
        return Ok(doc
            .select(&parsed)
            .map(|el| StaticNode::capture(el, false))
            .collect());
    };

    let doc = Html::parse_fragment(html);
    let root = doc.root_element().children().find_map(ElementRef::wrap);
    Ok(doc
        .select(&parsed)
        .filter(|el| root.is_none_or(|r| r.id() != el.id()))
        .map(|el| StaticNode::capture(el, scope_hidden))
        .collect())
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("hidden").is_some() {
        return true;
    }
    let style: String = value
        .attr("style")
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    style.contains("display:none") || style.contains("visibility:hidden")
}

fn collect_visible(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child.value().name();
                if SKIPPED_TAGS.contains(&name) || is_hidden(child) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push(' ');
                }
                collect_visible(child, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}
