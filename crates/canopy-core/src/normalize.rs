use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::JobListing;
use crate::skills::SkillTable;

/// A result card scraped from a rendered search page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedCard {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub description: String,
    pub url: String,
}

/// A posting returned by a REST search API, after the provider's field
/// names have been mapped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiPosting {
    pub title: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub apply_url: Option<String>,
    /// Structured skills, when the provider publishes them.
    pub skills: Option<Vec<String>>,
}

/// Raw listing as produced by one kind of source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawListing {
    Scraped(ScrapedCard),
    Api {
        posting: ApiPosting,
        /// Location used when the posting names neither city nor country.
        fallback_location: String,
    },
}

/// Converts raw listings into canonical [`JobListing`]s.
#[derive(Debug, Clone)]
pub struct Normalizer {
    skills: Arc<SkillTable>,
}

impl Normalizer {
    pub fn new(skills: Arc<SkillTable>) -> Self {
        Self { skills }
    }

    pub fn extract_skills(&self, text: &str) -> Vec<String> {
        self.skills.extract(text)
    }

    pub fn normalize(&self, raw: RawListing, source: &str) -> JobListing {
        match raw {
            RawListing::Scraped(card) => self.from_card(card, source),
            RawListing::Api {
                posting,
                fallback_location,
            } => self.from_api(posting, &fallback_location, source),
        }
    }

    fn from_card(&self, card: ScrapedCard, source: &str) -> JobListing {
        let description = card.description.trim().to_string();
        JobListing {
            title: card.title.trim().to_string(),
            company: card.company.trim().to_string(),
            location: card.location.trim().to_string(),
            skills: self.extract_skills(&description),
            description,
            salary: card.salary.trim().to_string(),
            source: source.to_string(),
            url: card.url.trim().to_string(),
            timestamp: Utc::now(),
        }
    }

    fn from_api(&self, posting: ApiPosting, fallback_location: &str, source: &str) -> JobListing {
        let description = trimmed(posting.description);
        let skills = match posting.skills {
            Some(skills) if skills.iter().any(|s| !s.trim().is_empty()) => {
                lowercase_unique(skills)
            }
            _ => self.extract_skills(&description),
        };

        let location = [posting.city, posting.country]
            .into_iter()
            .map(trimmed)
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| fallback_location.trim().to_string());

        JobListing {
            title: trimmed(posting.title),
            company: trimmed(posting.company),
            location,
            description,
            salary: format_salary(
                posting.salary_min,
                posting.salary_max,
                posting.salary_currency.as_deref(),
            ),
            skills,
            source: source.to_string(),
            url: trimmed(posting.apply_url),
            timestamp: Utc::now(),
        }
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Lowercase, trim and deduplicate, keeping first-seen order.
fn lowercase_unique(skills: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim().to_lowercase();
        if !skill.is_empty() && !out.contains(&skill) {
            out.push(skill);
        }
    }
    out
}

/// Render provider salary fields as `"{min}-{max} {currency}"`.
///
/// Empty when no minimum is published.
fn format_salary(min: Option<f64>, max: Option<f64>, currency: Option<&str>) -> String {
    let Some(min) = min else {
        return String::new();
    };
    let max = max.map(|m| m.to_string()).unwrap_or_default();
    let currency = currency.unwrap_or_default();
    format!("{min}-{max} {currency}").trim().to_string()
}
