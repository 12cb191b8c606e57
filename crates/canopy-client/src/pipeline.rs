//! Wiring of the concrete sources into a [`ScraperManager`].

use std::sync::Arc;

use canopy_core::config::PipelineConfig;
use canopy_core::error::AppError;
use canopy_core::manager::ScraperManager;
use canopy_core::session::ScrapeSession;
use canopy_core::skills::SkillTable;
use canopy_core::traits::{HttpClient, PageRenderer};

use crate::http::ReqwestHttpClient;
use crate::sources::{ApiAdapter, JSearchProvider, RenderedPageAdapter, RenderedSourceConfig};

#[cfg(feature = "browser")]
pub type DefaultRenderer = crate::browser::ChromiumRenderer;

/// Without the `browser` feature, rendered sources fail page by page.
#[cfg(not(feature = "browser"))]
pub type DefaultRenderer = canopy_core::traits::NullRenderer;

pub type DefaultSession = ScrapeSession<ReqwestHttpClient, DefaultRenderer>;

#[cfg(feature = "browser")]
fn default_renderer(config: &PipelineConfig) -> DefaultRenderer {
    crate::browser::ChromiumRenderer::with_timeouts(crate::render::RenderTimeouts {
        navigation: config.render_timeout,
        ..Default::default()
    })
}

#[cfg(not(feature = "browser"))]
fn default_renderer(_config: &PipelineConfig) -> DefaultRenderer {
    canopy_core::traits::NullRenderer
}

/// A fresh session with its own HTTP client and renderer.
pub fn open_session(
    config: &PipelineConfig,
    skills: Arc<SkillTable>,
) -> Result<DefaultSession, AppError> {
    let http = ReqwestHttpClient::with_timeout(config.http_timeout)?;
    Ok(ScrapeSession::new(http, default_renderer(config), skills))
}

/// Register every configured source against `session`.
///
/// Indeed is always registered. JSearch is added when an API key is
/// configured and well-formed; a malformed key is logged and skipped.
pub fn build_manager<H, R>(
    session: &ScrapeSession<H, R>,
    config: &PipelineConfig,
) -> Result<ScraperManager, AppError>
where
    H: HttpClient + 'static,
    R: PageRenderer + 'static,
{
    let mut manager = ScraperManager::new(config.data_volume);

    let indeed = RenderedSourceConfig::indeed();
    let fetch = session.fetch_client(&indeed.name, config.fetch_limits.clone());
    manager.register(RenderedPageAdapter::new(indeed, fetch)?);

    match config.jsearch_api_key.as_deref().map(JSearchProvider::new) {
        Some(Ok(provider)) => {
            let fetch = session.fetch_client("jsearch", config.fetch_limits.clone());
            manager.register(ApiAdapter::new(provider, fetch));
        }
        Some(Err(e)) => tracing::warn!(error = %e, "JSearch source disabled"),
        None => tracing::debug!("JSEARCH_API_KEY not set, JSearch source disabled"),
    }

    tracing::info!(session = %session.id(), sources = ?manager.sources(), "Scraper manager ready");
    Ok(manager)
}
