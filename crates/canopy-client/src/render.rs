//! Page lifecycle shared by headless renderers.
//!
//! [`render_in_tab`] drives one browser tab through navigation, an optional
//! selector wait and content extraction, and closes the tab on every exit
//! path.

use std::future::Future;
use std::time::Duration;

use canopy_core::error::AppError;
use tokio::time::Instant;

/// Time limits for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTimeouts {
    pub navigation: Duration,
    pub selector: Duration,
    /// Interval between selector polls.
    pub poll: Duration,
}

impl Default for RenderTimeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            selector: Duration::from_secs(10),
            poll: Duration::from_millis(250),
        }
    }
}

/// One open browser tab.
pub trait Tab: Send + Sync {
    fn goto(&self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    fn has_element(&self, selector: &str) -> impl Future<Output = bool> + Send;

    fn content(&self) -> impl Future<Output = Result<String, AppError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Render `url` in `tab` and return the resulting HTML.
pub async fn render_in_tab<T: Tab>(
    tab: T,
    url: &str,
    wait_selector: Option<&str>,
    timeouts: RenderTimeouts,
) -> Result<String, AppError> {
    let result = drive(&tab, url, wait_selector, timeouts).await;
    if let Err(e) = tab.close().await {
        tracing::warn!(%url, error = %e, "Failed to close tab");
    }
    result
}

async fn drive<T: Tab>(
    tab: &T,
    url: &str,
    wait_selector: Option<&str>,
    timeouts: RenderTimeouts,
) -> Result<String, AppError> {
    tokio::time::timeout(timeouts.navigation, tab.goto(url))
        .await
        .map_err(|_| {
            AppError::RenderError(format!(
                "Navigation to {url} timed out after {}s",
                timeouts.navigation.as_secs()
            ))
        })??;

    if let Some(selector) = wait_selector {
        wait_for_selector(tab, selector, timeouts).await?;
    }

    tab.content().await
}

async fn wait_for_selector<T: Tab>(
    tab: &T,
    selector: &str,
    timeouts: RenderTimeouts,
) -> Result<(), AppError> {
    let deadline = Instant::now() + timeouts.selector;
    loop {
        if tab.has_element(selector).await {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(AppError::RenderError(format!(
                "Timed out waiting for selector '{selector}'"
            )));
        }
        tokio::time::sleep(timeouts.poll).await;
    }
}
