use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use futures::future::BoxFuture;

use canopy_client::OpenAiCompleter;
use canopy_client::llm::DEFAULT_MODEL;
use canopy_core::aggregate::analyze;
use canopy_core::error::AppError;
use canopy_core::models::{ScrapeReport, SearchQuery};
use canopy_core::testutil::listings;
use canopy_core::{GatewayConfig, LlmGateway};
use canopy_server::routes;
use canopy_server::state::{AppState, JobScraper};

/// Nothing listens on the discard port, so every completion fails fast.
const UNREACHABLE_LLM: &str = "http://127.0.0.1:9/v1";

type Outcome = Arc<dyn Fn(&SearchQuery) -> Result<ScrapeReport, AppError> + Send + Sync>;

/// Scraper returning a canned outcome and recording every query.
#[derive(Clone)]
pub struct FakeScraper {
    outcome: Outcome,
    queries: Arc<Mutex<Vec<SearchQuery>>>,
}

impl FakeScraper {
    pub fn with_jobs(count: usize) -> Self {
        Self::with_outcome(move |_| {
            let jobs = listings("Full Stack Developer", "test", count);
            Ok(ScrapeReport {
                analysis: analyze(&jobs),
                jobs,
            })
        })
    }

    pub fn insufficient() -> Self {
        Self::with_outcome(|_| {
            Err(AppError::InsufficientData {
                count: 1,
                required: 5,
            })
        })
    }

    fn with_outcome(
        outcome: impl Fn(&SearchQuery) -> Result<ScrapeReport, AppError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            outcome: Arc::new(outcome),
            queries: Arc::default(),
        }
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }
}

impl JobScraper for FakeScraper {
    fn scrape<'a>(
        &'a self,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<ScrapeReport, AppError>> {
        self.queries.lock().unwrap().push(query.clone());
        let result = (self.outcome)(query);
        Box::pin(async move { result })
    }
}

/// Router backed by `scraper` and a completer that cannot be reached.
pub fn setup_test_app(scraper: FakeScraper) -> Router {
    let completer = OpenAiCompleter::with_base_url("test-key", DEFAULT_MODEL, UNREACHABLE_LLM)
        .unwrap()
        .with_timeout(Duration::from_secs(2))
        .unwrap();
    let gateway = LlmGateway::new(completer, GatewayConfig::default()).unwrap();

    let state = Arc::new(AppState {
        scraper: Box::new(scraper),
        gateway,
    });
    routes::router(state)
}
