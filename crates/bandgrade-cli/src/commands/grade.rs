//! The `bandgrade grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::Table;

use bandgrade_core::grading;
use bandgrade_core::model::Submission;
use bandgrade_core::report::GradeReport;

pub fn execute(
    test_path: PathBuf,
    submission_path: PathBuf,
    output: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let test = bandgrade_core::parser::parse_test(&test_path)?;

    let raw = std::fs::read_to_string(&submission_path)
        .with_context(|| format!("failed to read submission: {}", submission_path.display()))?;
    let submission = Submission::from_json_str(&raw)
        .with_context(|| format!("invalid submission: {}", submission_path.display()))?;

    tracing::info!(
        test_id = %test.id,
        questions = test.question_count(),
        "grading submission"
    );

    let result = grading::grade(&test, &submission);
    let report = GradeReport::new(&test, result);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" => println!("{}", report.to_markdown()),
        _ => print_text(&report),
    }

    if let Some(dir) = output {
        let path = dir.join(format!("report-{}.json", report.id));
        report.save_json(&path)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn print_text(report: &GradeReport) {
    println!(
        "Test: {} ({} questions)",
        report.test.name, report.test.question_count
    );

    let mut table = Table::new();
    table.set_header(vec!["Section", "Correct", "Total", "Percentage", "Band"]);
    for s in &report.result.sections {
        let band = if s.band > 0.0 {
            format!("{:.1}", s.band)
        } else {
            "manual".to_string()
        };
        table.add_row(vec![
            s.section.to_string(),
            s.correct.to_string(),
            s.total.to_string(),
            format!("{:.1}%", s.percentage),
            band,
        ]);
    }
    println!("{table}");

    println!("Overall band: {:.1}", report.result.overall_band);

    if report.result.needs_review {
        let n = report
            .result
            .questions
            .iter()
            .filter(|q| q.needs_review)
            .count();
        println!("{n} response(s) require manual review.");
    }
}
