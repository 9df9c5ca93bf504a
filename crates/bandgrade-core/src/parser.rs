//! TOML test-file parser.
//!
//! Loads authored tests from TOML files and directories, parses each
//! section's marker content, and validates the result.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::markup;
use crate::model::{AnswerSpec, Section, Test, TestSection};

/// Intermediate TOML structure for parsing test files.
#[derive(Debug, Deserialize)]
struct TomlTestFile {
    test: TomlTestHeader,
    #[serde(default)]
    sections: Vec<TomlSection>,
}

#[derive(Debug, Deserialize)]
struct TomlTestHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlSection {
    kind: String,
    #[serde(default)]
    title: String,
    content: String,
}

/// Parse a single TOML file into a `Test`.
pub fn parse_test(path: &Path) -> Result<Test> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test file: {}", path.display()))?;

    parse_test_str(&content, path)
}

/// Parse a TOML string into a `Test` (useful for testing).
pub fn parse_test_str(content: &str, source_path: &Path) -> Result<Test> {
    let parsed: TomlTestFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let sections = parsed
        .sections
        .into_iter()
        .map(|s| {
            let section: Section = s
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("{}", e))?;

            Ok(TestSection {
                section,
                title: s.title,
                parsed: markup::parse(section, &s.content),
                source: s.content,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Test {
        id: parsed.test.id,
        name: parsed.test.name,
        description: parsed.test.description,
        sections,
    })
}

/// Recursively load all `.toml` test files from a directory.
pub fn load_test_directory(dir: &Path) -> Result<Vec<Test>> {
    let mut tests = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            tests.extend(load_test_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_test(&path) {
                Ok(test) => tests.push(test),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(tests)
}

/// A warning from test validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The section the warning applies to (if any).
    pub section: Option<Section>,
    /// Warning message.
    pub message: String,
}

/// Validate a parsed test for common authoring issues.
pub fn validate_test(test: &Test) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Check for duplicate section kinds
    let mut seen = std::collections::HashSet::new();
    for ts in &test.sections {
        if !seen.insert(ts.section) {
            warnings.push(ValidationWarning {
                section: Some(ts.section),
                message: format!("duplicate section: {}", ts.section),
            });
        }
    }

    for ts in &test.sections {
        if ts.source.trim().is_empty() {
            warnings.push(ValidationWarning {
                section: Some(ts.section),
                message: "section content is empty".into(),
            });
            continue;
        }

        if ts.parsed.questions.is_empty() {
            warnings.push(ValidationWarning {
                section: Some(ts.section),
                message: "section contains no answer markers".into(),
            });
        }

        // Grammar-level issues from the marker parser.
        for message in markup::lint(&ts.source) {
            warnings.push(ValidationWarning {
                section: Some(ts.section),
                message,
            });
        }

        // Model-level issues visible only after parsing.
        for q in &ts.parsed.questions {
            match &q.answer {
                AnswerSpec::Blank { accepted } if accepted.is_empty() => {
                    warnings.push(ValidationWarning {
                        section: Some(ts.section),
                        message: format!("question {} has no accepted answers", q.number),
                    });
                }
                AnswerSpec::MultipleChoice { options, .. } if options.is_empty() => {
                    warnings.push(ValidationWarning {
                        section: Some(ts.section),
                        message: format!("question {} has no options", q.number),
                    });
                }
                AnswerSpec::Map { regions, .. } => {
                    if regions.is_empty() {
                        warnings.push(ValidationWarning {
                            section: Some(ts.section),
                            message: format!("question {} has no map areas", q.number),
                        });
                    }
                    for region in regions {
                        if region.answer.is_empty() && region.label.is_empty() {
                            warnings.push(ValidationWarning {
                                section: Some(ts.section),
                                message: format!(
                                    "question {} has a map area with neither answer nor label",
                                    q.number
                                ),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[test]
id = "mock-1"
name = "Mock Test 1"
description = "A sample IELTS-style mock"

[[sections]]
kind = "listening"
title = "Part 1"
content = """
The caller's name is [Sarah Hopkins].
[1:MCQ] The booking is for {a single room|a double room*|a suite}
"""

[[sections]]
kind = "reading"
title = "Passage 1"
content = """
Dining table: - [round] shape
"""
"#;

    #[test]
    fn parse_valid_toml() {
        let test = parse_test_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(test.id, "mock-1");
        assert_eq!(test.name, "Mock Test 1");
        assert_eq!(test.sections.len(), 2);
        assert_eq!(test.sections[0].section, Section::Listening);
        assert_eq!(test.sections[0].parsed.questions.len(), 2);
        assert_eq!(test.sections[1].parsed.questions.len(), 1);
        // Numbering restarts per section.
        assert_eq!(test.sections[1].parsed.questions[0].number, 1);
        assert_eq!(test.question_count(), 3);
    }

    #[test]
    fn parse_missing_optional_fields() {
        let toml = r#"
[test]
id = "minimal"
name = "Minimal"
"#;
        let test = parse_test_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert!(test.description.is_empty());
        assert!(test.sections.is_empty());
    }

    #[test]
    fn parse_unknown_section_kind_is_an_error() {
        let toml = r#"
[test]
id = "bad"
name = "Bad"

[[sections]]
kind = "speaking"
content = "[hello]"
"#;
        assert!(parse_test_str(toml, &PathBuf::from("test.toml")).is_err());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_test_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_duplicate_sections() {
        let toml = r#"
[test]
id = "dupes"
name = "Dupes"

[[sections]]
kind = "reading"
content = "[a]"

[[sections]]
kind = "reading"
content = "[b]"
"#;
        let test = parse_test_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_test(&test);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
    }

    #[test]
    fn validate_empty_and_markerless_sections() {
        let toml = r#"
[test]
id = "thin"
name = "Thin"

[[sections]]
kind = "reading"
content = "  "

[[sections]]
kind = "listening"
content = "prose without any markers"
"#;
        let test = parse_test_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_test(&test);
        assert!(warnings.iter().any(|w| w.message.contains("empty")));
        assert!(warnings.iter().any(|w| w.message.contains("no answer markers")));
    }

    #[test]
    fn validate_surfaces_lint_warnings() {
        let toml = r#"
[test]
id = "lint"
name = "Lint"

[[sections]]
kind = "reading"
content = "[1:MCQ] Pick one {A|B|C}"
"#;
        let test = parse_test_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_test(&test);
        assert!(warnings.iter().any(|w| w.message.contains("no starred")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        std::fs::write(&file_path, VALID_TOML).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let tests = load_test_directory(dir.path()).unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].id, "mock-1");
    }
}
