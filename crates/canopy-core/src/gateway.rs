use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::error::AppError;
use crate::fallback::fallback_for;
use crate::models::{GenerationResult, ScrapeReport, compute_hash};
use crate::prompt::{
    DEFAULT_SAMPLE_SIZE, SYSTEM_PROMPT, build_prompt, envelope_schema, strip_code_fence,
};
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::traits::{Completer, CompletionRequest};

/// Cache key: job title and SHA-256 of the serialized job data.
type CacheKey = (String, String);

/// Configuration for [`LlmGateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Maximum number of cached generation results.
    pub cache_capacity: u64,
    /// Completion budget. Calls never wait for a window reset.
    pub limits: RateLimitConfig,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Require `tasks` and `difficulty` on every project.
    pub strict_validation: bool,
    /// Serve the fallback without calling the model below this many jobs.
    pub min_jobs_for_model: Option<usize>,
    /// Listings quoted in the prompt.
    pub sample_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            limits: RateLimitConfig::for_completions(),
            temperature: 0.7,
            max_tokens: 1500,
            strict_validation: true,
            min_jobs_for_model: None,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

/// Turns scraped market data into insights and project ideas.
///
/// Successful generations are cached per `(job title, job data)`. Any
/// failure (rate limit, transport, malformed output) degrades to the
/// deterministic fallback, so [`generate`](Self::generate) always returns a
/// result with 5 insights and 3 projects.
pub struct LlmGateway<C: Completer> {
    completer: C,
    config: GatewayConfig,
    limiter: RateLimiter,
    cache: Cache<CacheKey, GenerationResult>,
    validator: jsonschema::Validator,
}

impl<C: Completer> LlmGateway<C> {
    pub fn new(completer: C, config: GatewayConfig) -> Result<Self, AppError> {
        let validator = jsonschema::validator_for(&envelope_schema(config.strict_validation))
            .map_err(|e| AppError::ConfigError(format!("Invalid envelope schema: {e}")))?;
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Ok(Self {
            completer,
            limiter: RateLimiter::new("llm", config.limits.clone()),
            config,
            cache,
            validator,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Number of cached results, after pending evictions are applied.
    pub async fn cached_entries(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    /// Insights and project ideas for `job_title`. Never fails.
    pub async fn generate(&self, job_title: &str, job_data: &ScrapeReport) -> GenerationResult {
        let key = match cache_key(job_title, job_data) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(job_title, error = %e, "Failed to hash job data, using fallback");
                return fallback_for(job_title);
            }
        };

        if let Some(hit) = self.cache.get(&key).await {
            tracing::debug!(job_title, "Generation cache hit");
            return hit;
        }

        if let Some(min_jobs) = self.config.min_jobs_for_model {
            if job_data.jobs.len() < min_jobs {
                tracing::info!(
                    job_title,
                    count = job_data.jobs.len(),
                    required = min_jobs,
                    "Too few jobs for the model, using fallback"
                );
                return fallback_for(job_title);
            }
        }

        if self.limiter.try_acquire().is_err() {
            tracing::warn!(job_title, "Completion budget spent");
            return match self.cache.get(&key).await {
                Some(hit) => hit,
                None => fallback_for(job_title),
            };
        }

        match self.request_model(job_title, job_data).await {
            Ok(result) => {
                self.cache.insert(key, result.clone()).await;
                tracing::info!(
                    job_title,
                    projects = result.projects.len(),
                    insights = result.insights.len(),
                    "Generated project ideas"
                );
                result
            }
            Err(e) => {
                tracing::warn!(job_title, error = %e, "Generation failed, using fallback");
                fallback_for(job_title)
            }
        }
    }

    async fn request_model(
        &self,
        job_title: &str,
        job_data: &ScrapeReport,
    ) -> Result<GenerationResult, AppError> {
        let request = CompletionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(job_title, job_data, self.config.sample_size),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        let text = self.completer.complete(&request).await?;
        tracing::debug!(job_title, chars = text.len(), "Completion received");
        self.parse_completion(&text)
    }

    /// Validate completion text against the envelope and decode it.
    pub fn parse_completion(&self, text: &str) -> Result<GenerationResult, AppError> {
        let value: serde_json::Value = serde_json::from_str(strip_code_fence(text))
            .map_err(|e| AppError::ParseError(format!("Completion is not JSON: {e}")))?;

        let errors: Vec<String> = self
            .validator
            .iter_errors(&value)
            .map(|e| e.to_string())
            .collect();
        if !errors.is_empty() {
            return Err(AppError::ParseError(errors.join("; ")));
        }

        serde_json::from_value(value)
            .map_err(|e| AppError::ParseError(format!("Completion does not decode: {e}")))
    }
}

fn cache_key(job_title: &str, job_data: &ScrapeReport) -> Result<CacheKey, AppError> {
    let serialized = serde_json::to_string(job_data)?;
    Ok((job_title.to_string(), compute_hash(&serialized)))
}
