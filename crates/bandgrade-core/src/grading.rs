//! The grading engine.
//!
//! For each question: resolve the submitted answer through the reconciler,
//! compare it with the answer matcher, emit one result row per sub-item, and
//! aggregate rows into per-section counts and band scores. Every per-question
//! step is guarded so one irregular question (out-of-range index, arity
//! mismatch, unexpected payload shape) degrades to an incorrect row instead
//! of aborting the rest of the submission. `grade` never fails.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bands;
use crate::matcher;
use crate::model::{AnswerMap, AnswerSpec, MapRegion, Question, QuestionType, Section, Submission, Test};
use crate::reconcile::{self, ResolvedAnswer};

/// The outcome for one question (or one sub-item of a matching/map
/// question). Rows align one-to-one with question numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub number: u32,
    #[serde(default)]
    pub question_text: String,
    pub question_type: QuestionType,
    pub section: Section,
    pub user_answer: Option<Value>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub points: f64,
    #[serde(default)]
    pub needs_review: bool,
}

/// Aggregated outcome for one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub section: Section,
    pub correct: u32,
    pub total: u32,
    pub percentage: f64,
    pub band: f64,
}

/// The complete result of grading one submission against one test.
/// Constructed fresh per invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    pub questions: Vec<QuestionResult>,
    pub sections: Vec<SectionSummary>,
    pub overall_band: f64,
    pub needs_review: bool,
}

/// Grade a submission against a parsed test.
pub fn grade(test: &Test, submission: &Submission) -> GradingResult {
    let empty = AnswerMap::new();
    let mut questions = Vec::new();
    let mut sections = Vec::new();

    for ts in &test.sections {
        let answers = submission.answers_for(ts.section).unwrap_or(&empty);
        let (mut rows, summary) = grade_section(ts.section, &ts.parsed.questions, answers);
        questions.append(&mut rows);
        sections.push(summary);
    }

    let section_bands: Vec<f64> = sections.iter().map(|s| s.band).collect();
    let needs_review = questions.iter().any(|q| q.needs_review);

    GradingResult {
        questions,
        sections,
        overall_band: bands::overall_band(&section_bands),
        needs_review,
    }
}

/// Grade one section's questions against one answer map.
pub fn grade_section(
    section: Section,
    questions: &[Question],
    answers: &AnswerMap,
) -> (Vec<QuestionResult>, SectionSummary) {
    let mut rows = Vec::new();
    for question in questions {
        rows.extend(grade_question(section, question, answers));
    }

    let total = rows.len() as u32;
    let correct = rows.iter().filter(|r| r.is_correct).count() as u32;
    let percentage = if total == 0 {
        0.0
    } else {
        f64::from(correct) / f64::from(total) * 100.0
    };

    let summary = SectionSummary {
        section,
        correct,
        total,
        percentage,
        band: bands::band_for(section, correct),
    };

    (rows, summary)
}

fn grade_question(section: Section, question: &Question, answers: &AnswerMap) -> Vec<QuestionResult> {
    let resolved = reconcile::resolve(question, answers);

    // Writing gets non-semantic partial credit and always needs a human.
    if section == Section::Writing {
        return vec![grade_writing(question, &resolved)];
    }

    match &question.answer {
        AnswerSpec::Blank { accepted } => vec![grade_blank(question, &resolved, accepted)],
        AnswerSpec::MultipleChoice { options, correct } => {
            vec![grade_choice(question, &resolved, options, *correct)]
        }
        AnswerSpec::Matching { left, right } => grade_matching(question, &resolved, left, right),
        AnswerSpec::Map { regions, .. } => grade_map(question, &resolved, regions),
    }
}

fn grade_blank(
    question: &Question,
    resolved: &ResolvedAnswer<'_>,
    accepted: &[String],
) -> QuestionResult {
    let user = single_value(resolved);
    let user_text = user.map(value_text).unwrap_or_default();
    let is_correct = matcher::matches_any(&user_text, accepted);

    row(
        question,
        question.number,
        &question.prompt,
        user,
        accepted.join(" / "),
        is_correct,
    )
}

fn grade_choice(
    question: &Question,
    resolved: &ResolvedAnswer<'_>,
    options: &[String],
    correct: usize,
) -> QuestionResult {
    let correct_text = options.get(correct);
    if correct_text.is_none() && !options.is_empty() {
        tracing::warn!(
            question_id = %question.id,
            correct,
            "correct index is out of range for the option list"
        );
    }

    let user = single_value(resolved);
    let is_correct = match (user, correct_text) {
        // Submissions normally carry the chosen option's text; a numeric
        // value is accepted as a direct index.
        (Some(Value::Number(n)), _) => n.as_u64().is_some_and(|i| i as usize == correct),
        (Some(value), Some(correct_text)) => matcher::matches(&value_text(value), correct_text),
        _ => false,
    };

    row(
        question,
        question.number,
        &question.prompt,
        user,
        correct_text.cloned().unwrap_or_default(),
        is_correct,
    )
}

fn grade_matching(
    question: &Question,
    resolved: &ResolvedAnswer<'_>,
    left: &[String],
    right: &[String],
) -> Vec<QuestionResult> {
    if left.is_empty() {
        // A degenerate marker still occupies one number; keep counts aligned.
        return vec![row(question, question.number, &question.prompt, None, String::new(), false)];
    }

    if left.len() != right.len() {
        tracing::warn!(
            question_id = %question.id,
            left = left.len(),
            right = right.len(),
            "matching question has mismatched prompt/target counts"
        );
    }

    left.iter()
        .enumerate()
        .map(|(i, prompt)| {
            let number = question.number + i as u32;
            let correct = right.get(i);
            let user = match resolved {
                ResolvedAnswer::Single(Value::Array(items)) => items.get(i),
                ResolvedAnswer::Single(Value::Object(map)) => {
                    map.get(prompt).or_else(|| map.get(&i.to_string()))
                }
                ResolvedAnswer::Single(value) if left.len() == 1 => Some(*value),
                ResolvedAnswer::Many(values) => values.get(i).copied(),
                _ => None,
            };
            let user_text = user.map(value_text).unwrap_or_default();
            let is_correct = correct.is_some_and(|c| matcher::matches(&user_text, c));

            row(
                question,
                number,
                prompt,
                user,
                correct.cloned().unwrap_or_default(),
                is_correct,
            )
        })
        .collect()
}

fn grade_map(
    question: &Question,
    resolved: &ResolvedAnswer<'_>,
    regions: &[MapRegion],
) -> Vec<QuestionResult> {
    if regions.is_empty() {
        return vec![row(question, question.number, &question.prompt, None, String::new(), false)];
    }

    regions
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let number = question.number + i as u32;
            // Regions without an explicit answer fall back to their label.
            let correct = if region.answer.is_empty() {
                region.label.as_str()
            } else {
                region.answer.as_str()
            };

            let user = match resolved {
                ResolvedAnswer::Single(Value::Array(entries)) => {
                    region_entry(entries, region).or_else(|| match entries.get(i) {
                        Some(v) if !v.is_object() => Some(v),
                        _ => None,
                    })
                }
                ResolvedAnswer::Single(Value::Object(map)) => map.get(&region.id),
                ResolvedAnswer::Many(values) => values.get(i).copied(),
                _ => None,
            };
            let user_text = user.map(value_text).unwrap_or_default();
            let is_correct = matcher::matches(&user_text, correct);

            row(
                question,
                number,
                &region.label,
                user,
                correct.to_string(),
                is_correct,
            )
        })
        .collect()
}

/// Find a `{regionKey, value}` entry for `region` in a submitted list.
fn region_entry<'a>(entries: &'a [Value], region: &MapRegion) -> Option<&'a Value> {
    entries.iter().find_map(|entry| {
        let map = entry.as_object()?;
        let key = map
            .get("region")
            .or_else(|| map.get("regionKey"))
            .or_else(|| map.get("id"))?
            .as_str()?;
        if key == region.id {
            map.get("value")
        } else {
            None
        }
    })
}

fn grade_writing(question: &Question, resolved: &ResolvedAnswer<'_>) -> QuestionResult {
    let user = single_value(resolved);
    let user_text = user.map(value_text).unwrap_or_default();
    let has_answer = !user_text.trim().is_empty();

    let mut result = row(question, question.number, &question.prompt, user, String::new(), false);
    result.points = if has_answer {
        0.6 * f64::from(question.points.max(1))
    } else {
        0.0
    };
    result.needs_review = true;
    result
}

fn single_value<'a>(resolved: &ResolvedAnswer<'a>) -> Option<&'a Value> {
    match resolved {
        ResolvedAnswer::Single(value) => Some(value),
        ResolvedAnswer::Many(values) => values.first().copied(),
        ResolvedAnswer::Absent => None,
    }
}

/// Render a submitted value the way a student typed it.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn row(
    question: &Question,
    number: u32,
    text: &str,
    user: Option<&Value>,
    correct_answer: String,
    is_correct: bool,
) -> QuestionResult {
    QuestionResult {
        question_id: question.id.clone(),
        number,
        question_text: text.to_string(),
        question_type: question.question_type(),
        section: question.section,
        user_answer: user.cloned(),
        correct_answer,
        is_correct,
        points: if is_correct {
            f64::from(question.points)
        } else {
            0.0
        },
        needs_review: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;
    use crate::model::TestSection;
    use serde_json::json;

    fn test_with(section: Section, source: &str) -> Test {
        Test {
            id: "t1".into(),
            name: "Test".into(),
            description: String::new(),
            sections: vec![TestSection {
                section,
                title: String::new(),
                source: source.into(),
                parsed: markup::parse(section, source),
            }],
        }
    }

    fn flat(pairs: &[(&str, Value)]) -> Submission {
        Submission::Flat(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn end_to_end_blank_scenario() {
        let test = test_with(Section::Reading, "Dining table: - [round] shape");
        let result = grade(&test, &flat(&[("1", json!("round"))]));

        assert_eq!(result.questions.len(), 1);
        let q = &result.questions[0];
        assert_eq!(q.number, 1);
        assert!(q.is_correct);
        assert_eq!(q.points, 1.0);
        assert_eq!(result.sections[0].correct, 1);
    }

    #[test]
    fn mcq_index_converts_to_option_text() {
        let test = test_with(Section::Reading, "[1:MCQ] Capital? {London|Paris*|Berlin}");

        let by_text = grade(&test, &flat(&[("mcq_1", json!("Paris"))]));
        assert!(by_text.questions[0].is_correct);
        assert_eq!(by_text.questions[0].correct_answer, "Paris");

        let by_index = grade(&test, &flat(&[("mcq_1", json!(1))]));
        assert!(by_index.questions[0].is_correct);

        let wrong = grade(&test, &flat(&[("mcq_1", json!("London"))]));
        assert!(!wrong.questions[0].is_correct);
    }

    #[test]
    fn matching_grades_each_pair_positionally() {
        let test = test_with(
            Section::Reading,
            "[1:MATCH] Match {Left:A,B|Right:ant,bee}",
        );

        let result = grade(&test, &flat(&[("matching_1", json!(["ant", "wasp"]))]));
        assert_eq!(result.questions.len(), 2);
        assert!(result.questions[0].is_correct);
        assert!(!result.questions[1].is_correct);
        assert_eq!(result.questions[0].number, 1);
        assert_eq!(result.questions[1].number, 2);
        assert_eq!(result.questions[1].correct_answer, "bee");
    }

    #[test]
    fn matching_accepts_pairing_objects_and_per_item_keys() {
        let test = test_with(
            Section::Reading,
            "[1:MATCH] Match {Left:A,B|Right:ant,bee}",
        );

        let by_object = grade(&test, &flat(&[("matching_1", json!({"A": "ant", "B": "bee"}))]));
        assert_eq!(by_object.sections[0].correct, 2);

        let by_keys = grade(
            &test,
            &flat(&[
                ("matching_1754321456_0", json!("ant")),
                ("matching_1754321456_1", json!("bee")),
            ]),
        );
        assert_eq!(by_keys.sections[0].correct, 2);
    }

    #[test]
    fn map_regions_grade_with_label_fallback() {
        let test = test_with(
            Section::Listening,
            "[1:MAP] Label {image:p.png|areas:Kitchen=stove@10,20;Garden=@30,40}",
        );

        let result = grade(
            &test,
            &flat(&[(
                "map_1",
                json!([
                    {"region": "area_1", "value": "stove"},
                    {"region": "area_2", "value": "garden"}
                ]),
            )]),
        );

        assert!(result.questions[0].is_correct);
        // No explicit answer for area_2, so its label is the key.
        assert_eq!(result.questions[1].correct_answer, "Garden");
        assert!(result.questions[1].is_correct);
    }

    #[test]
    fn missing_submission_grades_incorrect_without_error() {
        let test = test_with(Section::Reading, "A [round] table and [1:MCQ] pick {A*|B}");
        let result = grade(&test, &Submission::Flat(AnswerMap::new()));

        assert_eq!(result.questions.len(), 2);
        assert!(result.questions.iter().all(|q| !q.is_correct));
        assert!(result.questions.iter().all(|q| q.points == 0.0));
        assert_eq!(result.sections[0].percentage, 0.0);
    }

    #[test]
    fn empty_section_avoids_division_by_zero() {
        let test = test_with(Section::Reading, "no markers here");
        let result = grade(&test, &Submission::Flat(AnswerMap::new()));

        assert_eq!(result.sections[0].total, 0);
        assert_eq!(result.sections[0].percentage, 0.0);
    }

    #[test]
    fn writing_gets_partial_credit_and_review_flag() {
        let test = test_with(Section::Writing, "Task 1: [essay]");

        let answered = grade(&test, &flat(&[("q_1", json!("My full response..."))]));
        let q = &answered.questions[0];
        assert!(!q.is_correct);
        assert!((q.points - 0.6).abs() < f64::EPSILON);
        assert!(q.needs_review);
        assert!(answered.needs_review);
        // Writing is excluded from the overall mean.
        assert_eq!(answered.sections[0].band, 0.0);
        assert_eq!(answered.overall_band, 1.0);

        let blank_submission = grade(&test, &Submission::Flat(AnswerMap::new()));
        assert_eq!(blank_submission.questions[0].points, 0.0);
        assert!(blank_submission.questions[0].needs_review);
    }

    #[test]
    fn section_bands_and_overall_combine() {
        let listening_src: String = (0..30).map(|i| format!("[ans{i}] ")).collect();
        let reading_src: String = (0..29).map(|i| format!("[ans{i}] ")).collect();

        let test = Test {
            id: "t".into(),
            name: "T".into(),
            description: String::new(),
            sections: vec![
                TestSection {
                    section: Section::Listening,
                    title: String::new(),
                    source: listening_src.clone(),
                    parsed: markup::parse(Section::Listening, &listening_src),
                },
                TestSection {
                    section: Section::Reading,
                    title: String::new(),
                    source: reading_src.clone(),
                    parsed: markup::parse(Section::Reading, &reading_src),
                },
            ],
        };

        // Answer everything correctly in both sections.
        let mut sections = std::collections::BTreeMap::new();
        sections.insert(
            Section::Listening,
            (0..30)
                .map(|i| (format!("q_{}", i + 1), json!(format!("ans{i}"))))
                .collect::<AnswerMap>(),
        );
        sections.insert(
            Section::Reading,
            (0..29)
                .map(|i| (format!("q_{}", i + 1), json!(format!("ans{i}"))))
                .collect::<AnswerMap>(),
        );

        let result = grade(&test, &Submission::Sectioned(sections));
        // Listening 30/30 is band 7.0; reading 29/29 is band 6.5.
        assert_eq!(result.sections[0].band, 7.0);
        assert_eq!(result.sections[1].band, 6.5);
        // Mean 6.75 rounds to 7.0.
        assert_eq!(result.overall_band, 7.0);
    }

    #[test]
    fn out_of_range_correct_index_degrades_to_incorrect() {
        let mut test = test_with(Section::Reading, "[1:MCQ] Pick {A|B}");
        // Force a bad stored index, as a corrupted answer key would have.
        if let AnswerSpec::MultipleChoice { correct, .. } =
            &mut test.sections[0].parsed.questions[0].answer
        {
            *correct = 9;
        }

        let result = grade(&test, &flat(&[("mcq_1", json!("A"))]));
        assert!(!result.questions[0].is_correct);
        assert_eq!(result.questions[0].correct_answer, "");
    }
}
