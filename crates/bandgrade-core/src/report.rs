//! Grade report types with JSON persistence.
//!
//! A report wraps one grading run with an id and timestamp so the caller can
//! store it verbatim and render a human-readable summary later.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::GradingResult;
use crate::model::Test;

/// A complete grading report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the submission was graded.
    pub created_at: DateTime<Utc>,
    /// Summary of the graded test.
    pub test: TestSummary,
    /// The grading outcome.
    pub result: GradingResult,
}

/// Summary of a test (without content or answer keys).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSummary {
    pub id: String,
    pub name: String,
    pub question_count: u32,
}

impl GradeReport {
    pub fn new(test: &Test, result: GradingResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            test: TestSummary {
                id: test.id.clone(),
                name: test.name.clone(),
                question_count: test.question_count(),
            },
            result,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**{}**: overall band {:.1}\n\n",
            self.test.name, self.result.overall_band
        ));
        if self.result.needs_review {
            md.push_str("_Contains responses that need manual review._\n\n");
        }

        md.push_str("| Section | Correct | Total | Percentage | Band |\n");
        md.push_str("|---------|---------|-------|------------|------|\n");
        for s in &self.result.sections {
            md.push_str(&format!(
                "| {} | {} | {} | {:.1}% | {:.1} |\n",
                s.section, s.correct, s.total, s.percentage, s.band
            ));
        }
        md.push('\n');

        let incorrect: Vec<_> = self
            .result
            .questions
            .iter()
            .filter(|q| !q.is_correct && !q.needs_review)
            .collect();
        if !incorrect.is_empty() {
            md.push_str("### Incorrect answers\n\n");
            md.push_str("| # | Section | Submitted | Correct |\n");
            md.push_str("|---|---------|-----------|--------|\n");
            for q in incorrect {
                let submitted = q
                    .user_answer
                    .as_ref()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_else(|| "-".to_string());
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    q.number, q.section, submitted, q.correct_answer
                ));
            }
        }

        md
    }
}
