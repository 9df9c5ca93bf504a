//! The editable-document content representation.
//!
//! Rich-text editors emit authored content as a tree of blocks and inline
//! segments instead of flat marker text. This module models that tree as a
//! plain value (no rendering widget attached) and adapts it into the same
//! [`Parsed`] shape the marker grammar produces, so grading never needs to
//! know which authoring surface produced the content.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerSpec, Content, Parsed, Question, Section};
use crate::numbering::Numbering;

/// An editable document: ordered blocks of inline segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// One paragraph-level block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub inlines: Vec<Inline>,
}

/// An inline segment of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "inline", rename_all = "snake_case")]
pub enum Inline {
    /// Plain text, preserved verbatim.
    Text { text: String },
    /// An authored question seed, before parsing.
    Question {
        #[serde(default)]
        prompt: String,
        answer: AnswerSpec,
    },
    /// A placeholder left behind by parsing; points at a question by id.
    Slot { id: String, number: u32 },
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Number of question seeds still embedded in the document.
    pub fn question_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| &b.inlines)
            .filter(|i| matches!(i, Inline::Question { .. }))
            .count()
    }
}

/// Parse an editor document into placeholder content plus its question list.
///
/// Numbers come from node order alone; any `number` the editor had stored is
/// ignored. Re-running on an unchanged document is idempotent, and a seed
/// inserted mid-document takes that position's number on the next run.
pub fn parse(section: Section, document: &Document) -> Parsed {
    parse_with(section, document, &mut Numbering::default())
}

/// Like [`parse`], with an explicit numbering counter so callers can
/// continue numbering across documents.
pub fn parse_with(section: Section, document: &Document, numbering: &mut Numbering) -> Parsed {
    let mut questions = Vec::new();
    let blocks = document
        .blocks
        .iter()
        .map(|block| Block {
            inlines: block
                .inlines
                .iter()
                .map(|inline| match inline {
                    Inline::Question { prompt, answer } => {
                        let number = numbering.assign(answer.span());
                        let id = format!("{}_{}", answer.question_type().key_prefix(), number);
                        questions.push(Question {
                            id: id.clone(),
                            number,
                            section,
                            prompt: prompt.clone(),
                            answer: answer.clone(),
                            points: 1,
                        });
                        Inline::Slot { id, number }
                    }
                    other => other.clone(),
                })
                .collect(),
        })
        .collect();

    Parsed {
        content: Content::Document {
            document: Document { blocks },
        },
        questions,
    }
}
