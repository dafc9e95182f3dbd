use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use vitrine_core::error::AppError;
use vitrine_core::traits::{PageNode, PageSession, RenderedPage, SessionFactory};

/// Mirrors what a user could click: rendered, visible, with a box, not disabled.
const IS_INTERACTABLE_JS: &str = r#"function() {
    if (this.disabled) return false;
    const style = window.getComputedStyle(this);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    const rect = this.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
}"#;

const TEXT_CONTENT_JS: &str = "function() { return this.textContent; }";

/// Launches one headless Chromium per session via the Chrome DevTools Protocol.
///
/// Every page gets its own browser process, torn down by
/// [`PageSession::close`]. All CDP calls are bounded by the operation timeout.
///
/// # Example
///
/// ```rust,no_run
/// use vitrine_client::ChromiumSessions;
/// use vitrine_core::traits::{PageSession, RenderedPage, SessionFactory};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let session = ChromiumSessions::new().open().await?;
/// session.navigate("https://example.com").await?;
/// let headings = session.find_all("h1").await?;
/// println!("{} headings", headings.len());
/// session.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ChromiumSessions {
    timeout: Duration,
    executable: Option<PathBuf>,
}

impl ChromiumSessions {
    /// Sessions with a **30 s** operation timeout.
    ///
    /// Requires a Chromium / Chrome binary reachable via `$PATH` (or the
    /// default locations checked by `chromiumoxide`).
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            executable: Self::find_chrome_binary(),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, AppError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .disable_default_args()
            .request_timeout(self.timeout)
            .window_size(1366, 900);

        if let Some(bin) = &self.executable {
            tracing::debug!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-translate")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::SessionError(format!("Browser config error: {e}")))
    }

    /// Tries to locate the real Chrome/Chromium binary.
    ///
    /// The snap wrapper at `/snap/bin/chromium` strips unknown CLI flags and
    /// breaks headless mode, so the binary inside the snap is preferred.
    /// `CHROME_BIN` overrides everything. `None` lets `chromiumoxide` search.
    fn find_chrome_binary() -> Option<PathBuf> {
        let candidates: &[&str] = &[
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ];

        if let Ok(p) = std::env::var("CHROME_BIN") {
            let path = PathBuf::from(&p);
            if path.exists() {
                return Some(path);
            }
        }

        candidates.iter().map(PathBuf::from).find(|p| p.exists())
    }
}

impl Default for ChromiumSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFactory for ChromiumSessions {
    type Session = ChromiumSession;

    async fn open(&self) -> Result<ChromiumSession, AppError> {
        let config = self.browser_config()?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::SessionError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        let opened = bounded(self.timeout, "open tab", browser.new_page("about:blank")).await;
        match opened {
            Ok(page) => Ok(ChromiumSession {
                browser,
                page,
                handler,
                timeout: self.timeout,
            }),
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                Err(AppError::SessionError(e.to_string()))
            }
        }
    }
}

/// One browser process with a single tab.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    timeout: Duration,
}

impl RenderedPage for ChromiumSession {
    type Node = ChromiumNode;

    async fn navigate(&self, url: &str) -> Result<(), AppError> {
        let as_navigation = |e: AppError| match e {
            AppError::RenderError(msg) => AppError::NavigationError(msg),
            other => other,
        };
        bounded(self.timeout, url, self.page.goto(url))
            .await
            .map_err(as_navigation)?;
        bounded(self.timeout, url, self.page.wait_for_navigation())
            .await
            .map_err(as_navigation)?;
        Ok(())
    }

    async fn find_first(&self, selector: &str) -> Result<Option<ChromiumNode>, AppError> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ChromiumNode>, AppError> {
        let elements = bounded(self.timeout, selector, self.page.find_elements(selector)).await?;
        Ok(wrap(elements, self.timeout))
    }
}

impl PageSession for ChromiumSession {
    async fn close(mut self) {
        match tokio::time::timeout(self.timeout, self.browser.close()).await {
            Ok(Ok(_)) => {
                let _ = self.browser.wait().await;
            }
            Ok(Err(e)) => tracing::warn!("Failed to close browser cleanly: {e}"),
            Err(_) => tracing::warn!("Timed out closing browser"),
        }
        self.handler.abort();
    }
}

impl Drop for ChromiumSession {
    // Reached without `close` when the scrape future is dropped mid-page.
    // The browser process itself is killed by `Browser`'s own drop.
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// A DOM element inside a [`ChromiumSession`].
pub struct ChromiumNode {
    element: Element,
    timeout: Duration,
}

impl ChromiumNode {
    async fn call(&self, what: &str, function: &str) -> Result<Option<serde_json::Value>, AppError> {
        let returns = bounded(self.timeout, what, self.element.call_js_fn(function, false)).await?;
        Ok(returns.result.value)
    }
}

impl PageNode for ChromiumNode {
    async fn text(&self) -> Result<String, AppError> {
        let text = bounded(self.timeout, "innerText", self.element.inner_text()).await?;
        Ok(text.unwrap_or_default())
    }

    async fn raw_content(&self) -> Result<String, AppError> {
        let value = self.call("textContent", TEXT_CONTENT_JS).await?;
        Ok(value
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn is_interactable(&self) -> Result<bool, AppError> {
        let value = self.call("visibility check", IS_INTERACTABLE_JS).await?;
        Ok(value
            .as_ref()
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }

    async fn activate(&self) -> Result<(), AppError> {
        bounded(self.timeout, "click", self.element.click()).await?;
        Ok(())
    }

    async fn find_first(&self, selector: &str) -> Result<Option<ChromiumNode>, AppError> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ChromiumNode>, AppError> {
        let elements = bounded(self.timeout, selector, self.element.find_elements(selector)).await?;
        Ok(wrap(elements, self.timeout))
    }
}

fn wrap(elements: Vec<Element>, timeout: Duration) -> Vec<ChromiumNode> {
    elements
        .into_iter()
        .map(|element| ChromiumNode { element, timeout })
        .collect()
}

/// Run a CDP call under `timeout`, mapping protocol errors to render errors.
async fn bounded<T>(
    timeout: Duration,
    what: &str,
    call: impl Future<Output = Result<T, CdpError>>,
) -> Result<T, AppError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AppError::RenderError(format!("{what}: {e}"))),
        Err(_) => Err(AppError::Timeout(timeout.as_secs())),
    }
}
