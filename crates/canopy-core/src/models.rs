use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of insight strings a generation result must carry.
pub const INSIGHT_COUNT: usize = 5;

/// Number of project ideas a generation result must carry.
pub const PROJECT_COUNT: usize = 3;

/// A job search across all registered sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub location: String,
    pub pages: u32,
}

impl SearchQuery {
    pub const DEFAULT_LOCATION: &'static str = "India";

    pub fn new(query: impl Into<String>, location: impl Into<String>, pages: u32) -> Self {
        Self {
            query: query.into(),
            location: location.into(),
            pages,
        }
    }

    /// A single-page search in the default location.
    pub fn simple(query: impl Into<String>) -> Self {
        Self::new(query, Self::DEFAULT_LOCATION, 1)
    }
}

/// Canonical record of one scraped or fetched job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    /// Free-text salary as published by the source.
    pub salary: String,
    /// Lowercase, deduplicated, in first-seen order.
    pub skills: Vec<String>,
    /// Identifier of the adapter that produced the listing.
    pub source: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCount {
    pub skill: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCount {
    pub location: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCount {
    pub company: String,
    pub count: usize,
}

/// One 10,000-wide salary bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    /// Label of the form `"50000-59999"`.
    pub range: String,
    pub count: usize,
}

/// Aggregated market statistics derived from a batch of listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_jobs: usize,
    pub top_skills: Vec<SkillCount>,
    pub salary_ranges: Vec<SalaryRange>,
    pub locations: Vec<LocationCount>,
    pub companies: Vec<CompanyCount>,
}

/// Output of one scrape session: the listings and their analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub jobs: Vec<JobListing>,
    pub analysis: AnalysisSummary,
}

/// A portfolio project suggested for a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIdea {
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default = "default_difficulty", deserialize_with = "integral_u8")]
    pub difficulty: u8,
}

fn default_difficulty() -> u8 {
    3
}

/// Accepts `3` as well as `3.0`; models often emit whole numbers as floats.
fn integral_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || !(0.0..=f64::from(u8::MAX)).contains(&value) {
        return Err(serde::de::Error::custom(format!(
            "expected a whole number in 0..=255, got {value}"
        )));
    }
    Ok(value as u8)
}

/// Insights and project ideas for one job title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub insights: Vec<String>,
    pub projects: Vec<ProjectIdea>,
}

impl GenerationResult {
    /// True when the 5-insight / 3-project cardinality holds.
    pub fn is_well_formed(&self) -> bool {
        self.insights.len() == INSIGHT_COUNT && self.projects.len() == PROJECT_COUNT
    }
}

/// Compute a SHA-256 hash of a string, returned as 64-char hex.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
