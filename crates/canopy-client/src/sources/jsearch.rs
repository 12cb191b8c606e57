use canopy_core::error::AppError;
use canopy_core::models::SearchQuery;
use canopy_core::normalize::ApiPosting;
use serde::Deserialize;

use super::api::ApiProvider;

const ENDPOINT: &str = "https://jsearch.p.rapidapi.com/search";
const HOST: &str = "jsearch.p.rapidapi.com";

/// The JSearch API on RapidAPI.
#[derive(Clone)]
pub struct JSearchProvider {
    api_key: String,
}

impl JSearchProvider {
    /// Fails unless `api_key` is non-empty and made of `[A-Za-z0-9_-]`.
    pub fn new(api_key: &str) -> Result<Self, AppError> {
        let api_key = api_key.trim();
        let valid = !api_key.is_empty()
            && api_key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::ConfigError(
                "Invalid JSEARCH_API_KEY format".into(),
            ));
        }
        Ok(Self {
            api_key: api_key.to_string(),
        })
    }
}

/// One record of the `data` array.
#[derive(Deserialize)]
struct JSearchJob {
    job_title: Option<String>,
    employer_name: Option<String>,
    job_city: Option<String>,
    job_country: Option<String>,
    job_description: Option<String>,
    job_min_salary: Option<f64>,
    job_max_salary: Option<f64>,
    job_salary_currency: Option<String>,
    job_apply_link: Option<String>,
    job_required_skills: Option<Vec<String>>,
}

impl From<JSearchJob> for ApiPosting {
    fn from(job: JSearchJob) -> Self {
        ApiPosting {
            title: job.job_title,
            company: job.employer_name,
            city: job.job_city,
            country: job.job_country,
            description: job.job_description,
            salary_min: job.job_min_salary,
            salary_max: job.job_max_salary,
            salary_currency: job.job_salary_currency,
            apply_url: job.job_apply_link,
            skills: job.job_required_skills,
        }
    }
}

impl ApiProvider for JSearchProvider {
    fn name(&self) -> &str {
        "jsearch"
    }

    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("X-RapidAPI-Key".to_string(), self.api_key.clone()),
            ("X-RapidAPI-Host".to_string(), HOST.to_string()),
        ]
    }

    fn params(&self, query: &SearchQuery, page: u32) -> Vec<(String, String)> {
        vec![
            (
                "query".to_string(),
                format!("{} in {}", query.query, query.location),
            ),
            ("page".to_string(), page.to_string()),
            ("num_pages".to_string(), "1".to_string()),
        ]
    }

    fn postings(&self, body: &serde_json::Value) -> Vec<ApiPosting> {
        let Some(records) = body.get("data").and_then(|d| d.as_array()) else {
            tracing::warn!(source = "jsearch", "Response has no data array");
            return Vec::new();
        };
        records
            .iter()
            .filter_map(|record| match JSearchJob::deserialize(record) {
                Ok(job) => Some(ApiPosting::from(job)),
                Err(e) => {
                    tracing::debug!(source = "jsearch", error = %e, "Skipping malformed record");
                    None
                }
            })
            .collect()
    }
}
