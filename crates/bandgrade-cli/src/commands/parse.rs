//! The `bandgrade parse` command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::Table;

use bandgrade_core::model::{AnswerSpec, Test};
use bandgrade_core::student::{self, StudentView};

pub fn execute(test_path: PathBuf, student_view: Option<PathBuf>, format: String) -> Result<()> {
    let test = bandgrade_core::parser::parse_test(&test_path)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&test)?),
        _ => print_question_table(&test),
    }

    if let Some(path) = student_view {
        let views: BTreeMap<String, StudentView> = test
            .sections
            .iter()
            .map(|ts| (ts.section.to_string(), student::student_view(&ts.parsed)))
            .collect();
        let json = serde_json::to_string_pretty(&views)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write student view to {}", path.display()))?;
        println!("Student view written to {}", path.display());
    }

    Ok(())
}

fn print_question_table(test: &Test) {
    println!("Test: {} ({} questions)", test.name, test.question_count());

    for ts in &test.sections {
        let title = if ts.title.is_empty() {
            ts.section.to_string()
        } else {
            format!("{} / {}", ts.section, ts.title)
        };
        println!("\n{title}");

        let mut table = Table::new();
        table.set_header(vec!["#", "Id", "Type", "Prompt", "Answer key"]);
        for q in &ts.parsed.questions {
            table.add_row(vec![
                q.number.to_string(),
                q.id.clone(),
                q.question_type().to_string(),
                q.prompt.clone(),
                answer_summary(&q.answer),
            ]);
        }
        println!("{table}");
    }
}

fn answer_summary(answer: &AnswerSpec) -> String {
    match answer {
        AnswerSpec::Blank { accepted } => accepted.join(" / "),
        AnswerSpec::MultipleChoice { options, correct } => {
            options.get(*correct).cloned().unwrap_or_default()
        }
        AnswerSpec::Matching { left, right } => left
            .iter()
            .zip(right)
            .map(|(l, r)| format!("{l} -> {r}"))
            .collect::<Vec<_>>()
            .join(", "),
        AnswerSpec::Map { regions, .. } => regions
            .iter()
            .map(|r| {
                let answer = if r.answer.is_empty() {
                    &r.label
                } else {
                    &r.answer
                };
                format!("{} = {}", r.label, answer)
            })
            .collect::<Vec<_>>()
            .join("; "),
    }
}
