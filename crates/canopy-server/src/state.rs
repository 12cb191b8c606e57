use std::sync::Arc;

use futures::future::BoxFuture;

use canopy_client::{OpenAiCompleter, build_manager, open_session};
use canopy_core::error::AppError;
use canopy_core::models::{ScrapeReport, SearchQuery};
use canopy_core::{LlmGateway, PipelineConfig, SkillTable};

/// Runs one scrape on behalf of a request.
pub trait JobScraper: Send + Sync {
    fn scrape<'a>(
        &'a self,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<ScrapeReport, AppError>>;
}

/// Scrapes the configured sources, one session per call.
///
/// The session is closed whether the scrape succeeds or fails.
pub struct LiveScraper {
    config: PipelineConfig,
    skills: Arc<SkillTable>,
}

impl LiveScraper {
    pub fn new(config: PipelineConfig, skills: Arc<SkillTable>) -> Self {
        Self { config, skills }
    }
}

impl JobScraper for LiveScraper {
    fn scrape<'a>(
        &'a self,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<ScrapeReport, AppError>> {
        Box::pin(async move {
            let session = open_session(&self.config, Arc::clone(&self.skills))?;
            let result = match build_manager(&session, &self.config) {
                Ok(manager) => manager.scrape_jobs(query).await,
                Err(e) => Err(e),
            };
            // Close failures are logged by the session.
            let _ = session.close().await;
            result
        })
    }
}

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub scraper: Box<dyn JobScraper>,
    pub gateway: LlmGateway<OpenAiCompleter>,
}
