//! Market statistics over a batch of listings.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{
    AnalysisSummary, CompanyCount, JobListing, LocationCount, SalaryRange, SkillCount,
};

/// Length of the ranked skill, location and company lists.
pub const TOP_N: usize = 10;

/// Width of one salary bin.
pub const SALARY_BIN: u64 = 10_000;

/// Salaries above this are treated as malformed and left unbinned.
const MAX_SALARY: f64 = 1e12;

static SALARY_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+[\d,.]*)\s*-\s*(\d+[\d,.]*)").unwrap());

static SALARY_SINGLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+[\d,.]*").unwrap());

/// Frequency counter that remembers first-seen order for tiebreaks.
#[derive(Debug, Default)]
struct Tally {
    counts: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.counts.len());
                self.counts.push((key.to_string(), 1));
            }
        }
    }

    /// Descending by count, ties in first-seen order.
    fn ranked(mut self, limit: usize) -> Vec<(String, usize)> {
        // `sort_by` is stable.
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts.truncate(limit);
        self.counts
    }
}

/// Compute the [`AnalysisSummary`] of `jobs`.
pub fn analyze(jobs: &[JobListing]) -> AnalysisSummary {
    let mut skills = Tally::default();
    let mut locations = Tally::default();
    let mut companies = Tally::default();
    let mut salary_bins: BTreeMap<u64, usize> = BTreeMap::new();

    for job in jobs {
        for skill in &job.skills {
            skills.add(skill);
        }
        if !job.location.is_empty() {
            locations.add(&job.location);
        }
        if !job.company.is_empty() {
            companies.add(&job.company);
        }
        if let Some(floor) = salary_floor(&job.salary) {
            *salary_bins.entry(floor).or_default() += 1;
        }
    }

    AnalysisSummary {
        total_jobs: jobs.len(),
        top_skills: skills
            .ranked(TOP_N)
            .into_iter()
            .map(|(skill, count)| SkillCount { skill, count })
            .collect(),
        salary_ranges: salary_bins
            .into_iter()
            .map(|(floor, count)| SalaryRange {
                range: format!("{floor}-{}", floor.saturating_add(SALARY_BIN - 1)),
                count,
            })
            .collect(),
        locations: locations
            .ranked(TOP_N)
            .into_iter()
            .map(|(location, count)| LocationCount { location, count })
            .collect(),
        companies: companies
            .ranked(TOP_N)
            .into_iter()
            .map(|(company, count)| CompanyCount { company, count })
            .collect(),
    }
}

/// Lower edge of the salary bin `text` falls in.
///
/// Uses the minimum of a `min - max` pair when present, otherwise the first
/// number in the text. `None` when the text holds no number or an
/// implausibly large one.
pub fn salary_floor(text: &str) -> Option<u64> {
    if text.trim().is_empty() {
        return None;
    }
    let token = match SALARY_PAIR.captures(text) {
        Some(caps) => caps.get(1)?.as_str(),
        None => SALARY_SINGLE.find(text)?.as_str(),
    };
    let lower = leading_number(&token.replace(',', ""))?;
    if !lower.is_finite() || lower > MAX_SALARY {
        return None;
    }
    let bin = SALARY_BIN as f64;
    Some(((lower / bin).floor() * bin) as u64)
}

/// Parse the longest prefix of `s` that reads as a decimal number.
fn leading_number(s: &str) -> Option<f64> {
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
    }
    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_listing;

    fn with_salary(salary: &str) -> JobListing {
        let mut job = sample_listing("Dev", "Acme", "Pune", &[]);
        job.salary = salary.to_string();
        job
    }

    #[test]
    fn test_skill_counts_ranked_descending() {
        let mut jobs = Vec::new();
        for _ in 0..3 {
            jobs.push(sample_listing("a", "A", "X", &["react"]));
        }
        for _ in 0..5 {
            jobs.push(sample_listing("b", "B", "Y", &["node"]));
        }

        let summary = analyze(&jobs);
        assert_eq!(
            summary.top_skills,
            vec![
                SkillCount {
                    skill: "node".into(),
                    count: 5
                },
                SkillCount {
                    skill: "react".into(),
                    count: 3
                },
            ]
        );
        assert_eq!(summary.total_jobs, 8);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let jobs = vec![
            sample_listing("a", "Zeta", "Pune", &["go", "rust"]),
            sample_listing("b", "Alpha", "Delhi", &["rust", "go"]),
        ];
        let summary = analyze(&jobs);
        let skills: Vec<&str> = summary.top_skills.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(skills, vec!["go", "rust"]);
        assert_eq!(summary.companies[0].company, "Zeta");
        assert_eq!(summary.locations[1].location, "Delhi");
    }

    #[test]
    fn test_ranked_lists_capped_at_ten() {
        let jobs: Vec<JobListing> = (0..15)
            .map(|i| sample_listing("Dev", &format!("Co {i}"), &format!("City {i}"), &[]))
            .collect();
        let summary = analyze(&jobs);
        assert_eq!(summary.companies.len(), TOP_N);
        assert_eq!(summary.locations.len(), TOP_N);
        assert_eq!(summary.companies[0].company, "Co 0");
    }

    #[test]
    fn test_salary_bucket_from_single_number() {
        assert_eq!(salary_floor("₹54,321 a month"), Some(50_000));
        let summary = analyze(&[with_salary("54321")]);
        assert_eq!(
            summary.salary_ranges,
            vec![SalaryRange {
                range: "50000-59999".into(),
                count: 1
            }]
        );
    }

    #[test]
    fn test_salary_pair_uses_minimum() {
        assert_eq!(salary_floor("₹3,00,000 - ₹5,00,000 a year"), Some(300_000));
        assert_eq!(salary_floor("45000-70000 USD"), Some(40_000));
        assert_eq!(salary_floor("12500.50 - 20000"), Some(10_000));
    }

    #[test]
    fn test_salary_without_number_is_skipped() {
        assert_eq!(salary_floor(""), None);
        assert_eq!(salary_floor("Competitive"), None);
        let summary = analyze(&[with_salary("Not disclosed"), with_salary("")]);
        assert!(summary.salary_ranges.is_empty());
    }

    #[test]
    fn test_oversized_salary_is_dropped() {
        let text = "₹99999999999999999999999 a year";
        assert_eq!(salary_floor(text), None);
        assert_eq!(salary_floor("9".repeat(400).as_str()), None);

        let summary = analyze(&[with_salary(text), with_salary("54321")]);
        assert_eq!(summary.total_jobs, 2);
        assert_eq!(
            summary.salary_ranges,
            vec![SalaryRange {
                range: "50000-59999".into(),
                count: 1
            }]
        );
    }

    #[test]
    fn test_salary_ranges_ascending() {
        let jobs = vec![
            with_salary("95000"),
            with_salary("12000"),
            with_salary("15000"),
            with_salary("51000"),
        ];
        let ranges: Vec<(String, usize)> = analyze(&jobs)
            .salary_ranges
            .into_iter()
            .map(|r| (r.range, r.count))
            .collect();
        assert_eq!(
            ranges,
            vec![
                ("10000-19999".to_string(), 2),
                ("50000-59999".to_string(), 1),
                ("90000-99999".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let summary = analyze(&[]);
        assert_eq!(summary, AnalysisSummary::default());
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("1.2.3"), Some(1.2));
        assert_eq!(leading_number("70000"), Some(70000.0));
        assert_eq!(leading_number(""), None);
    }
}
