//! Answer-key reconciliation.
//!
//! Submitted answer keys are not guaranteed to equal persisted question ids:
//! editor sessions generate transient keys like `mcq_1754321456_2`, and some
//! clients key answers by bare question number. Resolution tries the direct
//! id first, then the question number, then falls back to scanning for keys
//! with the question type's prefix. The fallback is a heuristic; when more
//! than one key could satisfy a single-answer question the ambiguity is
//! logged rather than silently mis-graded.

use std::cmp::Ordering;

use serde_json::Value;

use crate::model::{AnswerMap, Question, QuestionType};

/// The submitted value(s) resolved for one question.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAnswer<'a> {
    /// One value, for single-answer questions or a multi-item value
    /// submitted under a single key.
    Single(&'a Value),
    /// One value per sub-item, in positional order, for matching/map
    /// questions submitted under per-item keys.
    Many(Vec<&'a Value>),
    /// Nothing submitted; graded as incorrect, never an error.
    Absent,
}

impl ResolvedAnswer<'_> {
    pub fn is_absent(&self) -> bool {
        matches!(self, ResolvedAnswer::Absent)
    }
}

/// Locate the submitted answer for `question` inside `answers`.
pub fn resolve<'a>(question: &Question, answers: &'a AnswerMap) -> ResolvedAnswer<'a> {
    if let Some(value) = answers.get(&question.id) {
        return ResolvedAnswer::Single(value);
    }

    if let Some(value) = answers.get(&question.number.to_string()) {
        return ResolvedAnswer::Single(value);
    }

    let prefix = format!("{}_", question.question_type().key_prefix());
    let mut keys: Vec<&String> = answers.keys().filter(|k| k.starts_with(&prefix)).collect();
    if keys.is_empty() {
        return ResolvedAnswer::Absent;
    }
    keys.sort_by(|a, b| natural_cmp(a.as_str(), b.as_str()));

    match question.question_type() {
        QuestionType::Matching | QuestionType::Map => ResolvedAnswer::Many(
            keys.iter()
                .filter_map(|k| answers.get(k.as_str()))
                .collect(),
        ),
        _ => {
            if keys.len() > 1 {
                tracing::warn!(
                    question_id = %question.id,
                    candidates = keys.len(),
                    "ambiguous prefix fallback: multiple submitted keys share the type prefix"
                );
            }
            match answers.get(keys[0].as_str()) {
                Some(value) => ResolvedAnswer::Single(value),
                None => ResolvedAnswer::Absent,
            }
        }
    }
}

/// Numeric-aware key comparison so `map_x_10` sorts after `map_x_2`.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.split('_').peekable();
    let mut right = b.split('_').peekable();

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
