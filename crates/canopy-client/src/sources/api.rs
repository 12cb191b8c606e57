use std::time::Duration;

use canopy_core::error::AppError;
use canopy_core::fetch::FetchClient;
use canopy_core::models::{JobListing, SearchQuery};
use canopy_core::normalize::{ApiPosting, RawListing};
use canopy_core::traits::{HttpClient, PageRenderer, SourceAdapter};
use futures::future::BoxFuture;

/// Describes one REST job-search API.
pub trait ApiProvider: Send + Sync {
    /// Identifier stamped on every listing.
    fn name(&self) -> &str;

    fn endpoint(&self) -> &str;

    fn headers(&self) -> Vec<(String, String)>;

    /// Query parameters for one-based `page`.
    fn params(&self, query: &SearchQuery, page: u32) -> Vec<(String, String)>;

    /// Postings in one response body. Malformed records are skipped.
    fn postings(&self, body: &serde_json::Value) -> Vec<ApiPosting>;
}

/// Pages through a REST search API.
pub struct ApiAdapter<P, H, R>
where
    P: ApiProvider,
    H: HttpClient,
    R: PageRenderer,
{
    provider: P,
    fetch: FetchClient<H, R>,
    page_delay: Duration,
}

impl<P, H, R> ApiAdapter<P, H, R>
where
    P: ApiProvider,
    H: HttpClient,
    R: PageRenderer,
{
    /// Adapter sleeping **1 s** between pages.
    pub fn new(provider: P, fetch: FetchClient<H, R>) -> Self {
        Self {
            provider,
            fetch,
            page_delay: Duration::from_secs(1),
        }
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> Result<Vec<JobListing>, AppError> {
        let body = self
            .fetch
            .fetch_api(
                self.provider.endpoint(),
                &self.provider.params(query, page),
                &self.provider.headers(),
            )
            .await?;

        Ok(self
            .provider
            .postings(&body)
            .into_iter()
            .filter(|p| has_text(&p.title) && has_text(&p.description))
            .map(|posting| {
                self.fetch.normalize_job(RawListing::Api {
                    posting,
                    fallback_location: query.location.clone(),
                })
            })
            .collect())
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl<P, H, R> SourceAdapter for ApiAdapter<P, H, R>
where
    P: ApiProvider,
    H: HttpClient,
    R: PageRenderer,
{
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn scrape<'a>(
        &'a self,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<Vec<JobListing>, AppError>> {
        Box::pin(async move {
            let mut jobs = Vec::new();
            for page in 1..=query.pages {
                match self.fetch_page(query, page).await {
                    Ok(listings) => {
                        tracing::info!(
                            source = self.provider.name(),
                            page,
                            count = listings.len(),
                            "Fetched page"
                        );
                        jobs.extend(listings);
                    }
                    Err(e) => {
                        tracing::warn!(source = self.provider.name(), page, error = %e, "Page failed");
                    }
                }
                if page < query.pages {
                    tokio::time::sleep(self.page_delay).await;
                }
            }
            Ok(jobs)
        })
    }
}
