//! Test utilities: mock implementations of the rendered-page traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::run::{RunEvent, RunReporter};
use crate::traits::{PageNode, PageSession, RenderedPage, SessionFactory};

const CONTENT: &str = "[class*=product-wrapper]";
const LOAD_MORE: &str = "[class*=scroll-more]";
const CONSENT: &str = ".acceptCookies";

type OnActivate = Arc<dyn Fn() + Send + Sync>;

// ---------------------------------------------------------------------------
// MockNode
// ---------------------------------------------------------------------------

/// Mock element with fixed text and children keyed by selector.
#[derive(Clone)]
pub struct MockNode {
    text: String,
    raw: Option<String>,
    interactable: bool,
    children: Vec<(String, MockNode)>,
    failing: Vec<String>,
    hung: bool,
    on_activate: Option<OnActivate>,
}

impl MockNode {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            raw: None,
            interactable: true,
            children: Vec::new(),
            failing: Vec::new(),
            hung: false,
            on_activate: None,
        }
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::new()
        }
    }

    /// Full text content, when it differs from the visible text.
    pub fn raw(mut self, raw: &str) -> Self {
        self.raw = Some(raw.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.interactable = false;
        self
    }

    /// Add a descendant reachable through exactly `selector`.
    pub fn child(mut self, selector: &str, node: MockNode) -> Self {
        self.children.push((selector.to_string(), node));
        self
    }

    /// Lookups for `selector` under this node return a render error.
    pub fn failing_find(mut self, selector: &str) -> Self {
        self.failing.push(selector.to_string());
        self
    }

    /// Every lookup and read times out, like an unresponsive browser.
    pub fn hung(mut self) -> Self {
        self.hung = true;
        self
    }

    fn on_activate(mut self, f: OnActivate) -> Self {
        self.on_activate = Some(f);
        self
    }

    fn lookup(&self, selector: &str) -> Result<Vec<MockNode>, AppError> {
        if self.hung {
            return Err(AppError::Timeout(30));
        }
        if self.failing.iter().any(|s| s == selector) {
            return Err(AppError::RenderError(format!("lookup of {selector} failed")));
        }
        Ok(self
            .children
            .iter()
            .filter(|(s, _)| s == selector)
            .map(|(_, n)| n.clone())
            .collect())
    }
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl PageNode for MockNode {
    async fn text(&self) -> Result<String, AppError> {
        if self.hung {
            return Err(AppError::Timeout(30));
        }
        Ok(self.text.clone())
    }

    async fn raw_content(&self) -> Result<String, AppError> {
        if self.hung {
            return Err(AppError::Timeout(30));
        }
        Ok(self.raw.clone().unwrap_or_else(|| self.text.clone()))
    }

    async fn is_interactable(&self) -> Result<bool, AppError> {
        Ok(self.interactable)
    }

    async fn activate(&self) -> Result<(), AppError> {
        if let Some(f) = &self.on_activate {
            f();
        }
        Ok(())
    }

    async fn find_first(&self, selector: &str) -> Result<Option<MockNode>, AppError> {
        Ok(self.lookup(selector)?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<MockNode>, AppError> {
        self.lookup(selector)
    }
}

/// A complete, well-formed product node.
pub fn product_node(
    title: &str,
    description: &str,
    price: &str,
    stars: usize,
    reviews: &str,
) -> MockNode {
    let mut node = MockNode::new()
        .child("a.title", MockNode::with_text(title))
        .child("[class*=description]", MockNode::with_text(description))
        .child("[class*=price]", MockNode::with_text(price))
        .child("[class*=review-count]", MockNode::with_text(reviews));
    for _ in 0..stars {
        node = node.child("p > span.ws-icon-star", MockNode::new());
    }
    node
}

/// A well-formed product with only its title varying.
pub fn simple_product(title: &str) -> MockNode {
    product_node(title, "description", "$10.00", 2, "4 reviews")
}

// ---------------------------------------------------------------------------
// MockPage
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PageState {
    navigated: Vec<String>,
    navigate_error: Option<AppError>,
    navigate_panic: bool,
    products: Vec<MockNode>,
    batches: VecDeque<Vec<MockNode>>,
    load_more: LoadMore,
    consent: Option<bool>,
    load_more_clicks: usize,
    consent_clicks: usize,
    /// Selector → number of upcoming lookups that fail transiently.
    lookup_failures: HashMap<String, usize>,
    /// Selector → error returned by the next lookup.
    lookup_errors: HashMap<String, AppError>,
}

#[derive(Default, Clone, Copy, PartialEq, Eq)]
enum LoadMore {
    #[default]
    Absent,
    /// Visible while batches remain, hidden afterwards.
    Batched,
    Hidden,
    Stuck,
}

/// Mock catalog page. Clicking "load more" appends the next queued batch.
#[derive(Clone, Default)]
pub struct MockPage {
    state: Arc<Mutex<PageState>>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(self, products: Vec<MockNode>) -> Self {
        self.state.lock().unwrap().products = products;
        self
    }

    pub fn with_batches(self, batches: Vec<Vec<MockNode>>) -> Self {
        let mut state = self.state.lock().unwrap();
        state.batches = batches.into();
        state.load_more = LoadMore::Batched;
        drop(state);
        self
    }

    /// Control present but never interactable.
    pub fn with_hidden_load_more(self) -> Self {
        self.state.lock().unwrap().load_more = LoadMore::Hidden;
        self
    }

    /// Control stays visible no matter how often it is clicked.
    pub fn with_stuck_load_more(self) -> Self {
        self.state.lock().unwrap().load_more = LoadMore::Stuck;
        self
    }

    pub fn with_consent(self, visible: bool) -> Self {
        self.state.lock().unwrap().consent = Some(visible);
        self
    }

    pub fn with_navigate_error(self, error: AppError) -> Self {
        self.state.lock().unwrap().navigate_error = Some(error);
        self
    }

    /// Navigation panics, as a misbehaving backend might.
    pub fn with_navigate_panic(self) -> Self {
        self.state.lock().unwrap().navigate_panic = true;
        self
    }

    pub fn with_lookup_failures(self, selector: &str, times: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .lookup_failures
            .insert(selector.to_string(), times);
        self
    }

    pub fn with_lookup_error(self, selector: &str, error: AppError) -> Self {
        self.state
            .lock()
            .unwrap()
            .lookup_errors
            .insert(selector.to_string(), error);
        self
    }

    pub fn navigated(&self) -> Vec<String> {
        self.state.lock().unwrap().navigated.clone()
    }

    pub fn load_more_clicks(&self) -> usize {
        self.state.lock().unwrap().load_more_clicks
    }

    pub fn consent_clicks(&self) -> usize {
        self.state.lock().unwrap().consent_clicks
    }

    pub fn product_count(&self) -> usize {
        self.state.lock().unwrap().products.len()
    }

    fn lookup(&self, selector: &str) -> Result<Vec<MockNode>, AppError> {
        let mut state = self.state.lock().unwrap();

        if let Some(err) = state.lookup_errors.remove(selector) {
            return Err(err);
        }
        if let Some(left) = state.lookup_failures.get_mut(selector)
            && *left > 0
        {
            *left -= 1;
            return Err(AppError::RenderError(format!("{selector} is detached")));
        }

        let found = match selector {
            CONTENT => state.products.clone(),
            LOAD_MORE => {
                let visible = match state.load_more {
                    LoadMore::Absent => return Ok(vec![]),
                    LoadMore::Batched => !state.batches.is_empty(),
                    LoadMore::Stuck => true,
                    LoadMore::Hidden => false,
                };
                let page = self.state.clone();
                let control = MockNode::new().on_activate(Arc::new(move || {
                    let mut state = page.lock().unwrap();
                    state.load_more_clicks += 1;
                    if let Some(batch) = state.batches.pop_front() {
                        state.products.extend(batch);
                    }
                }));
                vec![if visible { control } else { control.hidden() }]
            }
            CONSENT => match state.consent {
                Some(visible) => {
                    let page = self.state.clone();
                    let button = MockNode::new().on_activate(Arc::new(move || {
                        page.lock().unwrap().consent_clicks += 1;
                    }));
                    vec![if visible { button } else { button.hidden() }]
                }
                None => vec![],
            },
            _ => vec![],
        };
        Ok(found)
    }
}

impl RenderedPage for MockPage {
    type Node = MockNode;

    async fn navigate(&self, url: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        if state.navigate_panic {
            drop(state);
            panic!("renderer crashed while loading {url}");
        }
        if let Some(err) = state.navigate_error.take() {
            return Err(err);
        }
        state.navigated.push(url.to_string());
        Ok(())
    }

    async fn find_first(&self, selector: &str) -> Result<Option<MockNode>, AppError> {
        Ok(self.lookup(selector)?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<MockNode>, AppError> {
        self.lookup(selector)
    }
}

/// A [`MockPage`] handed out by [`MockSessions`]; closing it is recorded.
pub struct MockSession {
    page: MockPage,
    closed: Arc<Mutex<usize>>,
}

impl RenderedPage for MockSession {
    type Node = MockNode;

    async fn navigate(&self, url: &str) -> Result<(), AppError> {
        self.page.navigate(url).await
    }

    async fn find_first(&self, selector: &str) -> Result<Option<MockNode>, AppError> {
        self.page.find_first(selector).await
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<MockNode>, AppError> {
        self.page.find_all(selector).await
    }
}

impl PageSession for MockSession {
    async fn close(self) {
        *self.closed.lock().unwrap() += 1;
    }
}

// ---------------------------------------------------------------------------
// MockSessions
// ---------------------------------------------------------------------------

/// Session factory handing out queued pages in order.
///
/// Once the queue is empty, every new session gets a blank page.
#[derive(Clone)]
pub struct MockSessions {
    pages: Arc<Mutex<VecDeque<MockPage>>>,
    open_error: Arc<Mutex<Option<AppError>>>,
    opened: Arc<Mutex<usize>>,
    closed: Arc<Mutex<usize>>,
}

impl MockSessions {
    pub fn with_pages(pages: Vec<MockPage>) -> Self {
        Self {
            pages: Arc::new(Mutex::new(pages.into())),
            open_error: Arc::new(Mutex::new(None)),
            opened: Arc::new(Mutex::new(0)),
            closed: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_open_error(error: AppError) -> Self {
        let sessions = Self::with_pages(vec![]);
        *sessions.open_error.lock().unwrap() = Some(error);
        sessions
    }

    pub fn opened(&self) -> usize {
        *self.opened.lock().unwrap()
    }

    pub fn closed(&self) -> usize {
        *self.closed.lock().unwrap()
    }
}

impl SessionFactory for MockSessions {
    type Session = MockSession;

    async fn open(&self) -> Result<MockSession, AppError> {
        if let Some(e) = self.open_error.lock().unwrap().take() {
            return Err(e);
        }
        *self.opened.lock().unwrap() += 1;
        let page = self.pages.lock().unwrap().pop_front().unwrap_or_default();
        Ok(MockSession {
            page,
            closed: Arc::clone(&self.closed),
        })
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock run reporter that records event labels.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunReporter for MockReporter {
    fn report(&self, event: RunEvent<'_>) {
        let label = match &event {
            RunEvent::Started { .. } => "Started",
            RunEvent::PageStarted { .. } => "PageStarted",
            RunEvent::PageCompleted { .. } => "PageCompleted",
            RunEvent::PageFailed { .. } => "PageFailed",
            RunEvent::Finished { .. } => "Finished",
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}
