pub mod aggregate;
pub mod config;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod gateway;
pub mod manager;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod rate_limit;
pub mod session;
pub mod skills;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::PipelineConfig;
pub use error::AppError;
pub use fetch::FetchClient;
pub use gateway::{GatewayConfig, LlmGateway};
pub use manager::{DataVolumePolicy, ScraperManager, ShortfallAction};
pub use models::{
    AnalysisSummary, GenerationResult, JobListing, ProjectIdea, ScrapeReport, SearchQuery,
    compute_hash,
};
pub use normalize::{ApiPosting, Normalizer, RawListing, ScrapedCard};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use session::ScrapeSession;
pub use skills::SkillTable;
pub use traits::{
    Completer, CompletionRequest, HttpClient, HttpResponse, NullRenderer, PageRenderer,
    SourceAdapter,
};
