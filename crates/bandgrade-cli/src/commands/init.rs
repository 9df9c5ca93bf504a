//! The `bandgrade init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    std::fs::create_dir_all("test-sets")?;

    let test_path = std::path::Path::new("test-sets/example.toml");
    if test_path.exists() {
        println!("test-sets/example.toml already exists, skipping.");
    } else {
        std::fs::write(test_path, EXAMPLE_TEST)?;
        println!("Created test-sets/example.toml");
    }

    let submission_path = std::path::Path::new("test-sets/example-submission.json");
    if submission_path.exists() {
        println!("test-sets/example-submission.json already exists, skipping.");
    } else {
        std::fs::write(submission_path, EXAMPLE_SUBMISSION)?;
        println!("Created test-sets/example-submission.json");
    }

    println!("\nNext steps:");
    println!("  1. Run: bandgrade validate --test test-sets/example.toml");
    println!("  2. Run: bandgrade parse --test test-sets/example.toml");
    println!(
        "  3. Run: bandgrade grade --test test-sets/example.toml --submission test-sets/example-submission.json"
    );

    Ok(())
}

const EXAMPLE_TEST: &str = r#"[test]
id = "example"
name = "Example Test"
description = "A simple example test to get started"

[[sections]]
kind = "reading"
title = "Passage 1"
content = """
Dining table: - [round] shape - seats [six] people
[3:MCQ] The table is made of {plastic|oak*|glass}
"""
"#;

const EXAMPLE_SUBMISSION: &str = r#"{
  "q_1": "round",
  "q_2": "six",
  "mcq_3": "oak"
}
"#;
