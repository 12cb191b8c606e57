//! Prompt construction and response-envelope schemas for project generation.

use std::fmt::Write as _;

use serde_json::{Value, json};

use crate::models::{INSIGHT_COUNT, JobListing, PROJECT_COUNT, ScrapeReport};

/// System prompt sent with every generation request.
pub const SYSTEM_PROMPT: &str = "You are a career assistant that analyzes job market trends and \
suggests practical portfolio projects that help developers get hired. Always respond with valid \
JSON in the exact format requested.";

/// Number of listings quoted verbatim in the prompt.
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Longest description excerpt quoted per sample listing, in characters.
const DESCRIPTION_EXCERPT: usize = 400;

/// Deterministic prompt for `job_title` and the scraped `report`.
pub fn build_prompt(job_title: &str, report: &ScrapeReport, sample_size: usize) -> String {
    let mut prompt = String::new();
    prompt.push_str(&market_summary(job_title, report));
    prompt.push('\n');

    if !report.jobs.is_empty() {
        prompt.push_str("Sample listings:\n\n");
        for (i, job) in report.jobs.iter().take(sample_size).enumerate() {
            prompt.push_str(&sample_listing(i + 1, job));
        }
    }

    prompt.push_str(&instructions(job_title));
    prompt
}

fn market_summary(job_title: &str, report: &ScrapeReport) -> String {
    if report.jobs.is_empty() {
        return format!(
            "Limited job data available for {job_title}. Focus on general industry trends.\n"
        );
    }

    let analysis = &report.analysis;
    let mut out = format!("Job market analysis for {job_title}:\n");
    let _ = writeln!(out, "- Total jobs: {}", analysis.total_jobs);

    let ranked = |items: Vec<String>| {
        if items.is_empty() {
            "none reported".to_string()
        } else {
            items.join(", ")
        }
    };
    let _ = writeln!(
        out,
        "- Top skills: {}",
        ranked(
            analysis
                .top_skills
                .iter()
                .map(|s| format!("{} ({})", s.skill, s.count))
                .collect()
        )
    );
    let _ = writeln!(
        out,
        "- Locations: {}",
        ranked(
            analysis
                .locations
                .iter()
                .map(|l| format!("{} ({})", l.location, l.count))
                .collect()
        )
    );
    let _ = writeln!(
        out,
        "- Companies: {}",
        ranked(
            analysis
                .companies
                .iter()
                .map(|c| format!("{} ({})", c.company, c.count))
                .collect()
        )
    );
    let _ = writeln!(
        out,
        "- Salary bands: {}",
        ranked(
            analysis
                .salary_ranges
                .iter()
                .map(|r| format!("{} ({})", r.range, r.count))
                .collect()
        )
    );
    out
}

fn sample_listing(n: usize, job: &JobListing) -> String {
    let description: String = job.description.chars().take(DESCRIPTION_EXCERPT).collect();
    let skills = if job.skills.is_empty() {
        "not listed".to_string()
    } else {
        job.skills.join(", ")
    };
    format!(
        "Job {n}:\n- Title: {}\n- Company: {}\n- Location: {}\n- Description: {}\n- Required skills: {}\n\n",
        job.title, job.company, job.location, description, skills
    )
}

fn instructions(job_title: &str) -> String {
    format!(
        r#"
Based on this data:

1. Identify the top {INSIGHT_COUNT} most in-demand skills or trends for {job_title} roles.
2. Suggest exactly {PROJECT_COUNT} project ideas that would help someone get hired in this field.

Each project must have:
- "title": creative but professional
- "description": what problem it solves and why it is valuable
- "techStack": 3 to 6 specific technologies
- "tasks": 5 concrete steps to complete the project
- "difficulty": an integer from 1 (easiest) to 5 (hardest)

Respond with JSON only, in exactly this shape:
{{
  "insights": ["skill 1", "skill 2", "skill 3", "skill 4", "skill 5"],
  "projects": [
    {{
      "title": "Project title",
      "description": "Project description",
      "techStack": ["Tech 1", "Tech 2", "Tech 3"],
      "tasks": ["Task 1", "Task 2", "Task 3", "Task 4", "Task 5"],
      "difficulty": 3
    }}
  ]
}}

The projects should be practical, directly relevant to {job_title} roles, use modern in-demand
technologies and show business value. Return ONLY the JSON, no other text."#
    )
}

/// Remove a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line.
    let body = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// JSON Schema of the completion envelope.
///
/// The strict variant also requires `tasks` and an integer `difficulty` in
/// 1..=5 on every project.
pub fn envelope_schema(strict: bool) -> Value {
    let mut project = json!({
        "type": "object",
        "required": ["title", "description", "techStack"],
        "properties": {
            "title": { "type": "string", "minLength": 1 },
            "description": { "type": "string", "minLength": 1 },
            "techStack": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
            "tasks": { "type": "array", "items": { "type": "string" } },
            "difficulty": { "type": "integer", "multipleOf": 1, "minimum": 1, "maximum": 5 }
        }
    });
    if strict {
        project["required"] = json!(["title", "description", "techStack", "tasks", "difficulty"]);
    }

    json!({
        "type": "object",
        "required": ["insights", "projects"],
        "properties": {
            "insights": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": INSIGHT_COUNT,
                "maxItems": INSIGHT_COUNT
            },
            "projects": {
                "type": "array",
                "items": project,
                "minItems": PROJECT_COUNT,
                "maxItems": PROJECT_COUNT
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::analyze;
    use crate::testutil::sample_listing as listing;

    fn report(jobs: Vec<JobListing>) -> ScrapeReport {
        let analysis = analyze(&jobs);
        ScrapeReport { jobs, analysis }
    }

    #[test]
    fn test_prompt_without_jobs_mentions_limited_data() {
        let prompt = build_prompt("Data Scientist", &ScrapeReport::default(), DEFAULT_SAMPLE_SIZE);
        assert!(prompt.starts_with("Limited job data available for Data Scientist"));
        assert!(prompt.contains("exactly 3 project ideas"));
        assert!(!prompt.contains("Sample listings"));
    }

    #[test]
    fn test_prompt_includes_summary_and_samples() {
        let jobs = (0..7)
            .map(|i| listing(&format!("Role {i}"), "Acme", "Pune", &["rust", "go"]))
            .collect();
        let prompt = build_prompt("Backend Developer", &report(jobs), DEFAULT_SAMPLE_SIZE);

        assert!(prompt.contains("- Total jobs: 7"));
        assert!(prompt.contains("rust (7), go (7)"));
        assert!(prompt.contains("Acme (7)"));
        assert!(prompt.contains("Job 5:"));
        assert!(!prompt.contains("Job 6:"));
        assert!(prompt.contains("top 5 most in-demand"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let jobs = vec![listing("Dev", "Acme", "Pune", &["react"])];
        let r = report(jobs);
        assert_eq!(build_prompt("Dev", &r, 5), build_prompt("Dev", &r, 5));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fence("  {\"plain\": true} "), "{\"plain\": true}");
    }

    #[test]
    fn test_strict_schema_requires_tasks() {
        let strict = envelope_schema(true);
        let lenient = envelope_schema(false);
        let required = |s: &Value| s["properties"]["projects"]["items"]["required"].clone();
        assert_eq!(required(&strict).as_array().unwrap().len(), 5);
        assert_eq!(required(&lenient).as_array().unwrap().len(), 3);
        assert_eq!(strict["properties"]["insights"]["minItems"], 5);

        for schema in [&strict, &lenient] {
            let tech = &schema["properties"]["projects"]["items"]["properties"]["techStack"];
            assert_eq!(tech["minItems"], 1);
        }
    }
}
