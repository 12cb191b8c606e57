use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use canopy_core::models::{
    AnalysisSummary, CompanyCount, GenerationResult, JobListing, LocationCount, ProjectIdea,
    SalaryRange, ScrapeReport, SearchQuery, SkillCount,
};

use crate::error::ApiError;

pub const MAX_PAGES: u32 = 10;
/// Pages scraped per source by `/v1/projects/build`.
pub const BUILD_PAGES: u32 = 2;
const SAMPLE_JOBS: usize = 5;

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ScrapeRequest {
    /// Search keywords
    pub query: String,
    /// Location to search in (default: India)
    pub location: Option<String>,
    /// Result pages per source, 1 to 10 (default: 1)
    pub pages: Option<u32>,
}

impl ScrapeRequest {
    pub fn into_query(self) -> Result<SearchQuery, ApiError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(ApiError::Validation("query must not be empty".into()));
        }
        let pages = self.pages.unwrap_or(1);
        if !(1..=MAX_PAGES).contains(&pages) {
            return Err(ApiError::Validation(format!(
                "pages must be between 1 and {MAX_PAGES}"
            )));
        }
        Ok(SearchQuery::new(query, location_or_default(self.location), pages))
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ScrapeResponse {
    #[schema(value_type = Vec<Object>)]
    pub jobs: Vec<JobListing>,
    #[schema(value_type = Object)]
    pub analysis: AnalysisSummary,
}

impl From<ScrapeReport> for ScrapeResponse {
    fn from(report: ScrapeReport) -> Self {
        Self {
            jobs: report.jobs,
            analysis: report.analysis,
        }
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub job_title: String,
    /// A scrape report to ground the ideas in (default: empty)
    #[schema(value_type = Option<Object>)]
    pub job_data: Option<ScrapeReport>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GenerateResponse {
    #[schema(value_type = Vec<Object>)]
    pub projects: Vec<ProjectIdea>,
    pub insights: Vec<String>,
}

impl From<GenerationResult> for GenerateResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            projects: result.projects,
            insights: result.insights,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub job_title: String,
    /// Location to search in (default: India)
    pub location: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SampleJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub skills: Vec<String>,
}

impl From<&JobListing> for SampleJob {
    fn from(job: &JobListing) -> Self {
        Self {
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            description: job.description.clone(),
            skills: job.skills.clone(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketInsights {
    pub total_jobs: usize,
    #[schema(value_type = Vec<Object>)]
    pub top_skills: Vec<SkillCount>,
    pub sample_jobs: Vec<SampleJob>,
    #[schema(value_type = Vec<Object>)]
    pub salary_ranges: Vec<SalaryRange>,
    #[schema(value_type = Vec<Object>)]
    pub locations: Vec<LocationCount>,
    #[schema(value_type = Vec<Object>)]
    pub companies: Vec<CompanyCount>,
}

impl MarketInsights {
    /// Market statistics plus the first few listings.
    pub fn from_report(report: &ScrapeReport) -> Self {
        let analysis = report.analysis.clone();
        Self {
            total_jobs: report.jobs.len(),
            top_skills: analysis.top_skills,
            sample_jobs: report.jobs.iter().take(SAMPLE_JOBS).map(SampleJob::from).collect(),
            salary_ranges: analysis.salary_ranges,
            locations: analysis.locations,
            companies: analysis.companies,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    pub job_title: String,
    pub location: String,
    #[schema(value_type = Vec<Object>)]
    pub projects: Vec<ProjectIdea>,
    pub insights: MarketInsights,
    pub timestamp: DateTime<Utc>,
}

/// A trimmed job title, or a validation error when blank.
pub fn require_title(job_title: &str) -> Result<&str, ApiError> {
    let title = job_title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("jobTitle must not be empty".into()));
    }
    Ok(title)
}

pub fn location_or_default(location: Option<String>) -> String {
    location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| SearchQuery::DEFAULT_LOCATION.to_string())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use canopy_core::aggregate::analyze;
    use canopy_core::testutil::listings;

    use super::*;

    #[test]
    fn test_scrape_request_defaults() {
        let request = ScrapeRequest {
            query: " Rust Developer ".into(),
            location: None,
            pages: None,
        };
        let query = request.into_query().unwrap();
        assert_eq!(query.query, "Rust Developer");
        assert_eq!(query.location, "India");
        assert_eq!(query.pages, 1);
    }

    #[test]
    fn test_scrape_request_rejects_bad_input() {
        let empty = ScrapeRequest {
            query: "  ".into(),
            location: None,
            pages: None,
        };
        assert!(matches!(empty.into_query(), Err(ApiError::Validation(_))));

        for pages in [0, 11] {
            let request = ScrapeRequest {
                query: "rust".into(),
                location: None,
                pages: Some(pages),
            };
            assert!(matches!(request.into_query(), Err(ApiError::Validation(_))));
        }
    }

    #[test]
    fn test_market_insights_samples_first_five() {
        let jobs = listings("Engineer", "indeed", 7);
        let report = ScrapeReport {
            analysis: analyze(&jobs),
            jobs,
        };
        let insights = MarketInsights::from_report(&report);

        assert_eq!(insights.total_jobs, 7);
        assert_eq!(insights.sample_jobs.len(), 5);
        assert_eq!(insights.sample_jobs[0].title, "Engineer 0");
        assert_eq!(insights.top_skills[0].skill, "react");
        assert_eq!(insights.companies[0].count, 7);
    }

    #[test]
    fn test_location_or_default() {
        assert_eq!(location_or_default(None), "India");
        assert_eq!(location_or_default(Some(" ".into())), "India");
        assert_eq!(location_or_default(Some("Pune".into())), "Pune");
    }
}
