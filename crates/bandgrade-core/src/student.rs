//! Student view generation.
//!
//! Turns parsed content into the rendering-agnostic value shown to
//! test-takers: surrounding text is preserved byte-for-byte, and every
//! placeholder becomes a numbered input slot with the correct-answer fields
//! stripped. Choice options are kept in authored order; any shuffling for
//! display is a later, external concern, so the output is deterministic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::Inline;
use crate::markup::PLACEHOLDER;
use crate::model::{AnswerSpec, Content, Parsed, Question, QuestionType};

/// Student-facing content: blocks of text and input slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentView {
    pub blocks: Vec<StudentBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentBlock {
    pub nodes: Vec<StudentNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum StudentNode {
    Text { text: String },
    Slot(Slot),
}

/// One anonymized input slot, keyed for submission by `question_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub question_id: String,
    pub number: u32,
    pub kind: QuestionType,
    #[serde(default)]
    pub prompt: String,
    pub input: SlotInput,
}

/// Type-specific input description, with all correct answers removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotInput {
    /// Free-text entry for a blank.
    Text,
    /// Options in authored order; which one is correct is not included.
    Choice { options: Vec<String> },
    /// Left prompts and the pool of right-hand choices; the correct pairing
    /// is not included.
    Pairing { left: Vec<String>, choices: Vec<String> },
    /// Image regions to label; expected answers are not included.
    Regions { image: String, regions: Vec<SlotRegion> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRegion {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// Build the student view for parsed content.
pub fn student_view(parsed: &Parsed) -> StudentView {
    let by_id: HashMap<&str, &Question> = parsed
        .questions
        .iter()
        .map(|q| (q.id.as_str(), q))
        .collect();

    let blocks = match &parsed.content {
        Content::Markup { text } => vec![markup_block(text, &by_id)],
        Content::Document { document } => document
            .blocks
            .iter()
            .map(|block| {
                let mut nodes = Vec::new();
                for inline in &block.inlines {
                    match inline {
                        Inline::Text { text } => nodes.push(StudentNode::Text {
                            text: text.clone(),
                        }),
                        Inline::Slot { id, .. } => match by_id.get(id.as_str()) {
                            Some(q) => nodes.push(StudentNode::Slot(slot_for(q))),
                            None => {
                                tracing::warn!("slot references unknown question id {id}");
                            }
                        },
                        Inline::Question { .. } => {
                            tracing::warn!("unparsed question seed in content, skipping");
                        }
                    }
                }
                StudentBlock { nodes }
            })
            .collect(),
    };

    StudentView { blocks }
}

fn markup_block(text: &str, by_id: &HashMap<&str, &Question>) -> StudentBlock {
    let mut nodes = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        if m.start() > last {
            nodes.push(StudentNode::Text {
                text: text[last..m.start()].to_string(),
            });
        }
        match by_id.get(&caps[1]) {
            Some(q) => nodes.push(StudentNode::Slot(slot_for(q))),
            // An unknown id means the placeholder was not produced by this
            // parse; keep it as literal text rather than dropping bytes.
            None => nodes.push(StudentNode::Text {
                text: m.as_str().to_string(),
            }),
        }
        last = m.end();
    }

    if last < text.len() {
        nodes.push(StudentNode::Text {
            text: text[last..].to_string(),
        });
    }

    StudentBlock { nodes }
}

fn slot_for(question: &Question) -> Slot {
    let input = match &question.answer {
        AnswerSpec::Blank { .. } => SlotInput::Text,
        AnswerSpec::MultipleChoice { options, .. } => SlotInput::Choice {
            options: options.clone(),
        },
        AnswerSpec::Matching { left, right } => SlotInput::Pairing {
            left: left.clone(),
            choices: right.clone(),
        },
        AnswerSpec::Map { image, regions } => SlotInput::Regions {
            image: image.clone(),
            regions: regions
                .iter()
                .map(|r| SlotRegion {
                    id: r.id.clone(),
                    x: r.x,
                    y: r.y,
                    label: r.label.clone(),
                })
                .collect(),
        },
    };

    Slot {
        question_id: question.id.clone(),
        number: question.number,
        kind: question.question_type(),
        prompt: question.prompt.clone(),
        input,
    }
}
