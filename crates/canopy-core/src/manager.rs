use futures::future::join_all;

use crate::aggregate::analyze;
use crate::error::AppError;
use crate::models::{JobListing, ScrapeReport, SearchQuery};
use crate::traits::SourceAdapter;

/// What to do when a scrape yields fewer listings than the policy wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortfallAction {
    /// Log a warning and analyze whatever was collected.
    #[default]
    Warn,
    /// Fail with [`AppError::InsufficientData`].
    Reject,
}

/// Minimum data volume expected from a scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataVolumePolicy {
    pub min_jobs: usize,
    pub action: ShortfallAction,
}

impl DataVolumePolicy {
    pub const DEFAULT_MIN_JOBS: usize = 5;

    pub fn warn(min_jobs: usize) -> Self {
        Self {
            min_jobs,
            action: ShortfallAction::Warn,
        }
    }

    pub fn reject(min_jobs: usize) -> Self {
        Self {
            min_jobs,
            action: ShortfallAction::Reject,
        }
    }

    fn check(&self, count: usize) -> Result<(), AppError> {
        if count >= self.min_jobs {
            return Ok(());
        }
        match self.action {
            ShortfallAction::Warn => {
                tracing::warn!(
                    count,
                    required = self.min_jobs,
                    "Collected fewer jobs than expected, analysis may be unreliable"
                );
                Ok(())
            }
            ShortfallAction::Reject => Err(AppError::InsufficientData {
                count,
                required: self.min_jobs,
            }),
        }
    }
}

impl Default for DataVolumePolicy {
    fn default() -> Self {
        Self::warn(Self::DEFAULT_MIN_JOBS)
    }
}

/// Fans a query out to every registered source and aggregates the results.
#[derive(Default)]
pub struct ScraperManager {
    adapters: Vec<Box<dyn SourceAdapter>>,
    policy: DataVolumePolicy,
}

impl ScraperManager {
    pub fn new(policy: DataVolumePolicy) -> Self {
        Self {
            adapters: Vec::new(),
            policy,
        }
    }

    /// Add a source. Listings are concatenated in registration order.
    pub fn register(&mut self, adapter: impl SourceAdapter + 'static) -> &mut Self {
        tracing::debug!(source = adapter.name(), "Registered source");
        self.adapters.push(Box::new(adapter));
        self
    }

    pub fn with_adapter(mut self, adapter: impl SourceAdapter + 'static) -> Self {
        self.register(adapter);
        self
    }

    pub fn sources(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn policy(&self) -> DataVolumePolicy {
        self.policy
    }

    /// Scrape all sources concurrently and analyze the combined listings.
    ///
    /// A failing source contributes no listings. Fails only when the
    /// [`DataVolumePolicy`] rejects the result.
    pub async fn scrape_jobs(&self, query: &SearchQuery) -> Result<ScrapeReport, AppError> {
        tracing::info!(
            query = %query.query,
            location = %query.location,
            pages = query.pages,
            sources = self.adapters.len(),
            "Starting scrape"
        );

        let results = join_all(self.adapters.iter().map(|a| a.scrape(query))).await;

        let mut jobs: Vec<JobListing> = Vec::new();
        for (adapter, result) in self.adapters.iter().zip(results) {
            match result {
                Ok(listings) => {
                    tracing::info!(
                        source = adapter.name(),
                        count = listings.len(),
                        "Source finished"
                    );
                    jobs.extend(listings);
                }
                Err(e) => {
                    tracing::error!(source = adapter.name(), error = %e, "Source failed");
                }
            }
        }

        self.policy.check(jobs.len())?;

        let analysis = analyze(&jobs);
        tracing::info!(total = jobs.len(), "Scrape complete");
        Ok(ScrapeReport { jobs, analysis })
    }
}
