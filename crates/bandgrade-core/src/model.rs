//! Core data model types for bandgrade.
//!
//! These are the fundamental types that the entire bandgrade system uses
//! to represent authored tests, questions, answer keys, and submissions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::error::SubmissionError;

/// A graded test section. Each section is numbered and banded independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Listening,
    Reading,
    Writing,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Listening => write!(f, "listening"),
            Section::Reading => write!(f, "reading"),
            Section::Writing => write!(f, "writing"),
        }
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "listening" => Ok(Section::Listening),
            "reading" => Ok(Section::Reading),
            "writing" => Ok(Section::Writing),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

/// The four question kinds the marker grammar can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[serde(alias = "short_answer")]
    Blank,
    MultipleChoice,
    Matching,
    Map,
}

impl QuestionType {
    /// The submission-key prefix runtime clients generate for this type
    /// (e.g. `mcq_1754321456_2`). Used by the reconciler's fallback lookup.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            QuestionType::Blank => "q",
            QuestionType::MultipleChoice => "mcq",
            QuestionType::Matching => "matching",
            QuestionType::Map => "map",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Blank => write!(f, "blank"),
            QuestionType::MultipleChoice => write!(f, "multiple_choice"),
            QuestionType::Matching => write!(f, "matching"),
            QuestionType::Map => write!(f, "map"),
        }
    }
}

/// One clickable region of a map/diagram question.
///
/// Coordinates are percentages (0-100) of the associated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub label: String,
    /// Expected answer for this region. When empty, grading falls back to
    /// the label.
    #[serde(default)]
    pub answer: String,
}

/// The stored answer key for a single question, by question kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerSpec {
    /// One or more acceptable literal answers for a fill-in blank.
    Blank { accepted: Vec<String> },
    /// Ordered options with a zero-based correct index.
    MultipleChoice { options: Vec<String>, correct: usize },
    /// Positional pairs: `left[i]` is correctly matched with `right[i]`.
    Matching { left: Vec<String>, right: Vec<String> },
    /// Labelled regions over an image.
    Map { image: String, regions: Vec<MapRegion> },
}

impl AnswerSpec {
    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerSpec::Blank { .. } => QuestionType::Blank,
            AnswerSpec::MultipleChoice { .. } => QuestionType::MultipleChoice,
            AnswerSpec::Matching { .. } => QuestionType::Matching,
            AnswerSpec::Map { .. } => QuestionType::Map,
        }
    }

    /// How many consecutive question numbers this spec occupies.
    ///
    /// Matching and map questions reserve one number per sub-item; an empty
    /// sub-item list still occupies a single number so numbering stays
    /// contiguous.
    pub fn span(&self) -> u32 {
        match self {
            AnswerSpec::Blank { .. } | AnswerSpec::MultipleChoice { .. } => 1,
            AnswerSpec::Matching { left, .. } => (left.len() as u32).max(1),
            AnswerSpec::Map { regions, .. } => (regions.len() as u32).max(1),
        }
    }

    /// Decode an answer spec that was persisted as a JSON string.
    ///
    /// Malformed JSON is recovered locally: the failure is logged and `None`
    /// is returned, which grades as "no correct answer set" rather than
    /// aborting the surrounding grading run.
    pub fn from_stored_json(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(spec) => Some(spec),
            Err(e) => {
                tracing::warn!("malformed stored answer spec, treating as unset: {e}");
                None
            }
        }
    }
}

fn default_points() -> u32 {
    1
}

/// A single question extracted from authored content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier, `{prefix}_{number}` (e.g. `mcq_3`).
    pub id: String,
    /// 1-based display number, contiguous in document order within a
    /// section. Matching/map questions hold the first number of their range.
    pub number: u32,
    pub section: Section,
    /// Prompt text. Empty for simple blanks, where the surrounding content
    /// is the prompt.
    #[serde(default)]
    pub prompt: String,
    pub answer: AnswerSpec,
    #[serde(default = "default_points")]
    pub points: u32,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.answer.question_type()
    }

    /// Consecutive numbers occupied by this question (see [`AnswerSpec::span`]).
    pub fn span(&self) -> u32 {
        self.answer.span()
    }
}

/// Parsed content with markers replaced by opaque placeholders.
///
/// Both authoring representations (flat marker text and the editor document
/// tree) normalize into this one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "repr", rename_all = "snake_case")]
pub enum Content {
    /// Source text with each marker replaced by a `{{q:<id>}}` token.
    Markup { text: String },
    /// Editor document with each question inline replaced by a slot.
    Document { document: Document },
}

/// The output contract shared by both parser adapters: placeholder content
/// plus the ordered question list it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parsed {
    pub content: Content,
    pub questions: Vec<Question>,
}

/// One authored section of a test, with its parse result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSection {
    pub section: Section,
    #[serde(default)]
    pub title: String,
    /// Raw authored marker text, kept for linting and re-parsing.
    pub source: String,
    pub parsed: Parsed,
}

/// A complete authored test: metadata plus parsed sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sections: Vec<TestSection>,
}

impl Test {
    /// All questions across sections, in document order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|s| s.parsed.questions.iter())
    }

    /// Total answerable slots (matching/map count one per sub-item).
    pub fn question_count(&self) -> u32 {
        self.questions().map(Question::span).sum()
    }
}

/// Raw answers keyed by answer-key string, in stable order.
pub type AnswerMap = BTreeMap<String, Value>;

/// A student's submitted answers.
///
/// Either a flat answer map (keys follow the question-id / type-prefix
/// conventions) or one map per section for multi-section tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Submission {
    Sectioned(BTreeMap<Section, AnswerMap>),
    Flat(AnswerMap),
}

impl Submission {
    /// Decode a submission from raw JSON.
    ///
    /// An object whose keys are all section names (with object values) is
    /// treated as sectioned; any other object is a flat answer map.
    pub fn from_json_str(raw: &str) -> Result<Self, SubmissionError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, SubmissionError> {
        let obj = match value {
            Value::Object(obj) => obj,
            other => return Err(SubmissionError::NotAnObject(json_type_name(&other))),
        };

        let sectioned = !obj.is_empty()
            && obj
                .iter()
                .all(|(k, v)| k.parse::<Section>().is_ok() && v.is_object());

        if sectioned {
            let mut sections = BTreeMap::new();
            for (key, value) in obj {
                let section: Section = key
                    .parse()
                    .map_err(|_| SubmissionError::UnknownSection(key.clone()))?;
                if let Value::Object(answers) = value {
                    sections.insert(section, answers.into_iter().collect());
                }
            }
            Ok(Submission::Sectioned(sections))
        } else {
            Ok(Submission::Flat(obj.into_iter().collect()))
        }
    }

    /// The answer map that applies to `section`. A flat submission applies
    /// to every section.
    pub fn answers_for(&self, section: Section) -> Option<&AnswerMap> {
        match self {
            Submission::Flat(answers) => Some(answers),
            Submission::Sectioned(sections) => sections.get(&section),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Submission::Flat(answers) => answers.is_empty(),
            Submission::Sectioned(sections) => sections.values().all(|a| a.is_empty()),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
