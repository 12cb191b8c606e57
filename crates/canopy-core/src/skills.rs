//! Data-driven skill extraction.
//!
//! A [`SkillTable`] is a list of `(category, pattern, canonical skill)`
//! entries loaded at startup, either from the bundled `data/skills.json` or
//! from a user-supplied JSON file with the same shape:
//!
//! ```json
//! [
//!   { "category": "languages", "pattern": "\\b(rust|go)\\b" },
//!   { "category": "languages", "pattern": "\\bc\\+\\+", "skill": "c++" }
//! ]
//! ```
//!
//! Patterns match case-insensitively. Entries without `skill` contribute the
//! lowercased matched text.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::error::AppError;

const BUNDLED_SKILLS: &str = include_str!("../data/skills.json");

/// One entry of a skill table as written in JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillPattern {
    pub category: String,
    pub pattern: String,
    /// Canonical name reported for every match of `pattern`.
    #[serde(default)]
    pub skill: Option<String>,
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    category: String,
    regex: Regex,
    skill: Option<String>,
}

/// Compiled skill patterns, matched in table order.
#[derive(Debug, Clone)]
pub struct SkillTable {
    patterns: Vec<CompiledPattern>,
}

impl SkillTable {
    pub fn from_patterns(patterns: Vec<SkillPattern>) -> Result<Self, AppError> {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let regex = RegexBuilder::new(&p.pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        AppError::ConfigError(format!(
                            "Invalid skill pattern '{}' ({}): {e}",
                            p.pattern, p.category
                        ))
                    })?;
                Ok(CompiledPattern {
                    category: p.category,
                    regex,
                    skill: p.skill.map(|s| s.to_lowercase()),
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(Self { patterns })
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let patterns: Vec<SkillPattern> = serde_json::from_str(json)
            .map_err(|e| AppError::ConfigError(format!("Invalid skill table: {e}")))?;
        Self::from_patterns(patterns)
    }

    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!(
                "Failed to read skill table {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }

    /// The table shipped with the crate.
    pub fn bundled() -> Result<Self, AppError> {
        Self::from_json(BUNDLED_SKILLS)
    }

    /// Load from `path` when given, otherwise the bundled table.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => {
                let table = Self::from_path(path)?;
                tracing::info!(
                    path = %path.display(),
                    patterns = table.len(),
                    "Loaded skill table"
                );
                Ok(table)
            }
            None => Self::bundled(),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Distinct categories, in table order.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for p in &self.patterns {
            if !out.contains(&p.category.as_str()) {
                out.push(&p.category);
            }
        }
        out
    }

    /// Every skill mentioned in `text`, lowercase and deduplicated, in the
    /// order patterns and matches are encountered.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        if text.is_empty() {
            return found;
        }
        for pattern in &self.patterns {
            for m in pattern.regex.find_iter(text) {
                let skill = match &pattern.skill {
                    Some(canonical) => canonical.clone(),
                    None => m.as_str().to_lowercase(),
                };
                if !found.contains(&skill) {
                    found.push(skill);
                }
            }
        }
        found
    }
}
