use std::path::PathBuf;
use std::sync::Arc;

use canopy_core::error::AppError;
use canopy_core::traits::PageRenderer;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::render::{RenderTimeouts, Tab, render_in_tab};

/// Headless Chromium renderer driven over the Chrome DevTools Protocol.
///
/// The browser is launched on the first [`render`](PageRenderer::render)
/// and shared by every clone; each render opens its own tab and closes it
/// whatever the outcome. [`close`](PageRenderer::close) shuts the browser
/// down for all clones.
///
/// # Example
///
/// ```rust,no_run
/// use canopy_client::ChromiumRenderer;
/// use canopy_core::traits::PageRenderer;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let renderer = ChromiumRenderer::new();
/// let html = renderer.render("https://example.com", Some("h1")).await?;
/// println!("{}", &html[..200]);
/// renderer.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct ChromiumRenderer {
    state: Arc<Mutex<Option<BrowserState>>>,
    timeouts: RenderTimeouts,
}

struct BrowserState {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Renderer with a **30 s** navigation and **10 s** selector timeout.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeouts(timeouts: RenderTimeouts) -> Self {
        Self {
            state: Arc::default(),
            timeouts,
        }
    }

    async fn launch() -> Result<BrowserState, AppError> {
        let mut builder = BrowserConfig::builder().no_sandbox().disable_default_args();

        // Snap-packaged Chromium wraps the binary in a script that drops
        // standard flags, so prefer the real executable when present.
        if let Some(bin) = find_chrome_binary() {
            tracing::info!(binary = %bin.display(), "Using Chrome binary");
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::RenderError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!(error = %e, "Browser CDP handler error");
                    break;
                }
            }
        });

        tracing::info!("Headless browser launched");
        Ok(BrowserState { browser, handler })
    }

    async fn open_tab(&self) -> Result<ChromiumTab, AppError> {
        let mut state = self.state.lock().await;
        if state.is_none() {
            *state = Some(Self::launch().await?);
        }
        let Some(state) = state.as_ref() else {
            return Err(AppError::RenderError("Browser is not running".into()));
        };
        let page = state
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to open tab: {e}")))?;
        Ok(ChromiumTab(page))
    }
}

impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str, wait_selector: Option<&str>) -> Result<String, AppError> {
        let tab = self.open_tab().await?;
        tracing::debug!(%url, "Rendering page");
        render_in_tab(tab, url, wait_selector, self.timeouts).await
    }

    async fn close(&self) -> Result<(), AppError> {
        let Some(mut state) = self.state.lock().await.take() else {
            return Ok(());
        };
        let result = state
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| AppError::RenderError(format!("Failed to close browser: {e}")));
        if let Err(e) = state.browser.wait().await {
            tracing::debug!(error = %e, "Browser process did not exit cleanly");
        }
        state.handler.abort();
        tracing::info!("Headless browser closed");
        result
    }
}

struct ChromiumTab(Page);

impl Tab for ChromiumTab {
    async fn goto(&self, url: &str) -> Result<(), AppError> {
        self.0
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| AppError::RenderError(format!("Failed to navigate to {url}: {e}")))
    }

    async fn has_element(&self, selector: &str) -> bool {
        self.0.find_element(selector).await.is_ok()
    }

    async fn content(&self) -> Result<String, AppError> {
        self.0
            .content()
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to read page content: {e}")))
    }

    async fn close(self) -> Result<(), AppError> {
        self.0
            .close()
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to close tab: {e}")))
    }
}

/// Locate a Chrome/Chromium binary, honouring `CHROME_BIN`.
///
/// Returns `None` to let `chromiumoxide` do its own lookup.
fn find_chrome_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    [
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}
