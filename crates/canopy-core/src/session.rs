use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppError;
use crate::fetch::FetchClient;
use crate::normalize::Normalizer;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::skills::SkillTable;
use crate::traits::{HttpClient, PageRenderer};

/// Context for one scraping session.
///
/// Owns the renderer handle shared by the session's adapters and hands each
/// adapter a [`FetchClient`] with its own rate limiter, so concurrent
/// sessions never share browser state or rate-limit accounting. Call
/// [`close`](Self::close) after the last scrape.
pub struct ScrapeSession<H, R>
where
    H: HttpClient,
    R: PageRenderer,
{
    id: Uuid,
    http: H,
    renderer: R,
    skills: Arc<SkillTable>,
}

impl<H, R> ScrapeSession<H, R>
where
    H: HttpClient,
    R: PageRenderer,
{
    pub fn new(http: H, renderer: R, skills: Arc<SkillTable>) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, "Scrape session opened");
        Self {
            id,
            http,
            renderer,
            skills,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// A fetch client for one source, with a limiter nobody else holds.
    pub fn fetch_client(&self, source: &str, limits: RateLimitConfig) -> FetchClient<H, R> {
        FetchClient::new(
            source,
            self.http.clone(),
            self.renderer.clone(),
            RateLimiter::new(format!("{source}@{}", self.id), limits),
            Normalizer::new(Arc::clone(&self.skills)),
        )
    }

    /// Release the shared renderer.
    pub async fn close(&self) -> Result<(), AppError> {
        let result = self.renderer.close().await;
        match &result {
            Ok(()) => tracing::debug!(session = %self.id, "Scrape session closed"),
            Err(e) => tracing::warn!(session = %self.id, error = %e, "Failed to close renderer"),
        }
        result
    }
}
