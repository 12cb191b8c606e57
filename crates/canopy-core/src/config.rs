use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::gateway::GatewayConfig;
use crate::manager::DataVolumePolicy;
use crate::rate_limit::RateLimitConfig;

/// Pipeline settings read from `CANOPY_*` environment variables.
///
/// Every variable is optional; unset variables keep their defaults and
/// malformed ones are a [`AppError::ConfigError`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Limits applied to each source's fetch client.
    pub fetch_limits: RateLimitConfig,
    pub http_timeout: Duration,
    pub render_timeout: Duration,
    pub data_volume: DataVolumePolicy,
    pub gateway: GatewayConfig,
    /// Skill table to load instead of the bundled one.
    pub skills_file: Option<PathBuf>,
    /// Enables the JSearch source when set.
    pub jsearch_api_key: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_limits: RateLimitConfig::default(),
            http_timeout: Duration::from_secs(10),
            render_timeout: Duration::from_secs(30),
            data_volume: DataVolumePolicy::default(),
            gateway: GatewayConfig::default(),
            skills_file: None,
            jsearch_api_key: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);
        let defaults = Self::default();

        let fetch_limits = RateLimitConfig::new(
            vars.positive("CANOPY_FETCH_MAX_REQUESTS", defaults.fetch_limits.max_requests)?,
            Duration::from_secs(vars.positive("CANOPY_FETCH_WINDOW_SECS", 60)?),
        )
        .with_max_retries(
            vars.parse("CANOPY_FETCH_MAX_RETRIES", defaults.fetch_limits.max_retries)?,
        );

        let min_jobs = vars.parse("CANOPY_MIN_JOBS", defaults.data_volume.min_jobs)?;
        let data_volume = if vars.flag("CANOPY_REJECT_INSUFFICIENT", false)? {
            DataVolumePolicy::reject(min_jobs)
        } else {
            DataVolumePolicy::warn(min_jobs)
        };

        let gateway = GatewayConfig {
            cache_capacity: vars
                .positive("CANOPY_LLM_CACHE_CAPACITY", defaults.gateway.cache_capacity)?,
            limits: RateLimitConfig::new(
                vars.positive("CANOPY_LLM_MAX_CALLS", defaults.gateway.limits.max_requests)?,
                Duration::from_secs(vars.positive("CANOPY_LLM_WINDOW_SECS", 60)?),
            )
            .with_max_retries(0),
            strict_validation: vars.flag("CANOPY_LLM_STRICT", true)?,
            min_jobs_for_model: vars.optional("CANOPY_LLM_MIN_JOBS")?,
            ..defaults.gateway
        };

        Ok(Self {
            fetch_limits,
            http_timeout: Duration::from_secs(vars.positive("CANOPY_HTTP_TIMEOUT_SECS", 10)?),
            render_timeout: Duration::from_secs(vars.positive("CANOPY_RENDER_TIMEOUT_SECS", 30)?),
            data_volume,
            gateway,
            skills_file: vars.get("CANOPY_SKILLS_FILE").map(PathBuf::from),
            jsearch_api_key: vars.get("JSEARCH_API_KEY"),
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value, `None` when unset or blank.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn optional<T: FromStr>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::ConfigError(format!("Invalid {key} '{raw}'"))),
        }
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T, AppError> {
        Ok(self.optional(key)?.unwrap_or(default))
    }

    fn positive<T>(&self, key: &str, default: T) -> Result<T, AppError>
    where
        T: FromStr + PartialEq + Default,
    {
        let value = self.parse(key, default)?;
        if value == T::default() {
            return Err(AppError::ConfigError(format!("{key} must be at least 1")));
        }
        Ok(value)
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, AppError> {
        match self.get(key).map(|v| v.to_lowercase()) {
            None => Ok(default),
            Some(v) => match v.as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(AppError::ConfigError(format!(
                    "Invalid {key} '{v}': expected true or false"
                ))),
            },
        }
    }
}
