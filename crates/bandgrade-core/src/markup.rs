//! The bracket/marker grammar parser.
//!
//! Authored section text embeds answer slots inline with two marker
//! families:
//!
//! - simple blanks: `[answer]` (comma-separated alternatives accepted)
//! - advanced markers: `[n:MCQ] prompt {A|B*|C}`,
//!   `[n:MATCH] prompt {Left:a,b|Right:x,y}`,
//!   `[n:MAP] prompt {image:url|areas:label=answer@x,y;...}`
//!
//! Parsing is single-pass left-to-right per family, non-nesting. Advanced
//! markers are matched and replaced before simple ones so their bodies are
//! never mistaken for blanks. Every match is replaced by an opaque
//! `{{q:<id>}}` placeholder, and the final numbers are assigned from
//! placeholder order, so a `number:` written in a marker seeds but never
//! forces the display number. Malformed syntax never fails: unmatched
//! brackets stay literal text, empty option blocks yield empty option lists.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::{AnswerSpec, Content, MapRegion, Parsed, Question, Section};
use crate::numbering::Numbering;

static ADVANCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d+):(MCQ|MATCH|MAP)\]\s*([^{}\[\]]*?)\s*\{([^{}]*)\}")
        .expect("advanced marker regex")
});

static SIMPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("simple marker regex"));

/// Interim token emitted while seeds are collected, before numbering.
static PENDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{q:#(\d+)\}\}").expect("pending token regex"));

/// The opaque placeholder a rendering stage substitutes later.
pub(crate) static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{q:([A-Za-z0-9_]+)\}\}").expect("placeholder regex"));

/// A question collected during scanning, before numbers are assigned.
struct Seed {
    answer: AnswerSpec,
    prompt: String,
    number_hint: Option<u32>,
}

struct Scanned {
    text: String,
    seeds: Vec<Seed>,
    warnings: Vec<String>,
}

/// Parse marker text into placeholder content plus its question list,
/// numbering from 1.
pub fn parse(section: Section, source: &str) -> Parsed {
    parse_with(section, source, &mut Numbering::default())
}

/// Like [`parse`], with an explicit numbering counter so callers can
/// continue numbering across fragments.
pub fn parse_with(section: Section, source: &str, numbering: &mut Numbering) -> Parsed {
    let scanned = scan(source);
    let mut questions = Vec::new();

    let text = PENDING
        .replace_all(&scanned.text, |caps: &Captures<'_>| {
            let Ok(idx) = caps[1].parse::<usize>() else {
                return caps[0].to_string();
            };
            let Some(seed) = scanned.seeds.get(idx) else {
                return caps[0].to_string();
            };
            let number = numbering.assign(seed.answer.span());
            let id = format!("{}_{}", seed.answer.question_type().key_prefix(), number);
            questions.push(Question {
                id: id.clone(),
                number,
                section,
                prompt: seed.prompt.clone(),
                answer: seed.answer.clone(),
                points: 1,
            });
            format!("{{{{q:{id}}}}}")
        })
        .into_owned();

    Parsed {
        content: Content::Markup { text },
        questions,
    }
}

/// Report grammar-level issues in marker text without failing the parse:
/// choice markers with no starred option, matching arity mismatches,
/// unparseable map areas, and `number:` seeds that disagree with document
/// order.
pub fn lint(source: &str) -> Vec<String> {
    let scanned = scan(source);
    let mut warnings = scanned.warnings;

    let mut numbering = Numbering::default();
    for caps in PENDING.captures_iter(&scanned.text) {
        let Ok(idx) = caps[1].parse::<usize>() else {
            continue;
        };
        let Some(seed) = scanned.seeds.get(idx) else {
            continue;
        };
        let number = numbering.assign(seed.answer.span());
        if let Some(hint) = seed.number_hint {
            if hint != number {
                warnings.push(format!(
                    "marker written as number {hint} is assigned number {number} by document order"
                ));
            }
        }
    }

    warnings
}

/// Run both marker passes, collecting seeds and replacing matches with
/// pending tokens. Advanced markers first, then simple blanks.
fn scan(source: &str) -> Scanned {
    let mut seeds: Vec<Seed> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let advanced = ADVANCED.replace_all(source, |caps: &Captures<'_>| {
        let ordinal = seeds.len() + 1;
        let number_hint = caps[1].parse::<u32>().ok();
        let prompt = caps[3].trim().to_string();
        let answer = match &caps[2] {
            "MCQ" => parse_choice_block(ordinal, &caps[4], &mut warnings),
            "MATCH" => parse_match_block(ordinal, &caps[4], &mut warnings),
            _ => parse_map_block(ordinal, &caps[4], &mut warnings),
        };
        let idx = seeds.len();
        seeds.push(Seed {
            answer,
            prompt,
            number_hint,
        });
        format!("{{{{q:#{idx}}}}}")
    });

    let text = SIMPLE
        .replace_all(&advanced, |caps: &Captures<'_>| {
            let idx = seeds.len();
            seeds.push(Seed {
                answer: AnswerSpec::Blank {
                    accepted: split_list(&caps[1]),
                },
                prompt: String::new(),
                number_hint: None,
            });
            format!("{{{{q:#{idx}}}}}")
        })
        .into_owned();

    Scanned {
        text,
        seeds,
        warnings,
    }
}

/// `A|B*|C`: pipe-separated options, one starred as correct.
fn parse_choice_block(ordinal: usize, block: &str, warnings: &mut Vec<String>) -> AnswerSpec {
    let mut options = Vec::new();
    let mut correct = None;

    for raw in block.split('|') {
        let opt = raw.trim();
        if opt.is_empty() {
            continue;
        }
        if let Some(stripped) = opt.strip_suffix('*') {
            if correct.is_some() {
                warnings.push(format!("choice marker {ordinal} stars more than one option"));
            }
            correct = Some(options.len());
            options.push(stripped.trim().to_string());
        } else {
            options.push(opt.to_string());
        }
    }

    if correct.is_none() && !options.is_empty() {
        warnings.push(format!("choice marker {ordinal} has no starred correct option"));
    }

    AnswerSpec::MultipleChoice {
        options,
        correct: correct.unwrap_or(0),
    }
}

/// `Left:a,b|Right:x,y`: order-significant positional pairs.
fn parse_match_block(ordinal: usize, block: &str, warnings: &mut Vec<String>) -> AnswerSpec {
    let mut left = Vec::new();
    let mut right = Vec::new();

    for part in block.split('|') {
        let part = part.trim();
        if let Some(items) = part.strip_prefix("Left:") {
            left = split_list(items);
        } else if let Some(items) = part.strip_prefix("Right:") {
            right = split_list(items);
        } else if !part.is_empty() {
            warnings.push(format!(
                "matching marker {ordinal} has an unlabelled segment (expected Left:/Right:)"
            ));
        }
    }

    if left.len() != right.len() {
        warnings.push(format!(
            "matching marker {ordinal} pairs {} prompts with {} targets",
            left.len(),
            right.len()
        ));
    }

    AnswerSpec::Matching { left, right }
}

/// `image:url|areas:label=answer@x,y;...`: labelled regions over an image.
fn parse_map_block(ordinal: usize, block: &str, warnings: &mut Vec<String>) -> AnswerSpec {
    let mut image = String::new();
    let mut regions = Vec::new();

    for part in block.split('|') {
        let part = part.trim();
        if let Some(url) = part.strip_prefix("image:") {
            image = url.trim().to_string();
        } else if let Some(areas) = part.strip_prefix("areas:") {
            for raw in areas.split(';') {
                let raw = raw.trim();
                if raw.is_empty() {
                    continue;
                }
                match parse_area(raw, regions.len()) {
                    Some(region) => regions.push(region),
                    None => warnings.push(format!(
                        "map marker {ordinal} has an unparseable area: {raw}"
                    )),
                }
            }
        }
    }

    AnswerSpec::Map { image, regions }
}

/// `label=answer@x,y`; a trailing `*` on a coordinate is tolerated and
/// stripped.
fn parse_area(raw: &str, index: usize) -> Option<MapRegion> {
    let (label, rest) = raw.split_once('=')?;
    let (answer, coords) = rest.rsplit_once('@')?;
    let (x, y) = coords.split_once(',')?;
    let x: f64 = x.trim().trim_end_matches('*').parse().ok()?;
    let y: f64 = y.trim().trim_end_matches('*').parse().ok()?;

    Some(MapRegion {
        id: format!("area_{}", index + 1),
        x,
        y,
        label: label.trim().to_string(),
        answer: answer.trim().to_string(),
    })
}

fn split_list(items: &str) -> Vec<String> {
    items
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_blank_end_to_end() {
        let parsed = parse(Section::Reading, "Dining table: - [round] shape");

        assert_eq!(parsed.questions.len(), 1);
        let q = &parsed.questions[0];
        assert_eq!(q.number, 1);
        assert_eq!(q.id, "q_1");
        assert_eq!(
            q.answer,
            AnswerSpec::Blank {
                accepted: vec!["round".into()]
            }
        );

        let Content::Markup { text } = &parsed.content else {
            panic!("expected markup content");
        };
        assert_eq!(text, "Dining table: - {{q:q_1}} shape");
    }

    #[test]
    fn blank_with_alternatives_splits_on_commas() {
        let parsed = parse(Section::Reading, "Spelling: [color, colour] accepted");
        assert_eq!(
            parsed.questions[0].answer,
            AnswerSpec::Blank {
                accepted: vec!["color".into(), "colour".into()]
            }
        );
    }

    #[test]
    fn mcq_marker_stores_correct_index_and_strips_star() {
        let parsed = parse(
            Section::Reading,
            "[1:MCQ] Capital of France? {London|Paris*|Berlin}",
        );

        assert_eq!(parsed.questions.len(), 1);
        let q = &parsed.questions[0];
        assert_eq!(q.id, "mcq_1");
        assert_eq!(q.prompt, "Capital of France?");
        assert_eq!(
            q.answer,
            AnswerSpec::MultipleChoice {
                options: vec!["London".into(), "Paris".into(), "Berlin".into()],
                correct: 1,
            }
        );
    }

    #[test]
    fn match_marker_pairs_positionally() {
        let parsed = parse(
            Section::Listening,
            "[1:MATCH] Match speakers to views {Left:Speaker A,Speaker B|Right:optimist,skeptic}",
        );

        let q = &parsed.questions[0];
        assert_eq!(
            q.answer,
            AnswerSpec::Matching {
                left: vec!["Speaker A".into(), "Speaker B".into()],
                right: vec!["optimist".into(), "skeptic".into()],
            }
        );
        assert_eq!(q.span(), 2);
    }

    #[test]
    fn map_marker_parses_regions_and_tolerates_trailing_star() {
        let parsed = parse(
            Section::Listening,
            "[1:MAP] Label the floor plan {image:https://example.com/plan.png|areas:Kitchen=stove@10,20;Hall=entrance@55.5,80*}",
        );

        let q = &parsed.questions[0];
        let AnswerSpec::Map { image, regions } = &q.answer else {
            panic!("expected map answer");
        };
        assert_eq!(image, "https://example.com/plan.png");
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].id, "area_1");
        assert_eq!(regions[0].label, "Kitchen");
        assert_eq!(regions[0].answer, "stove");
        assert_eq!((regions[0].x, regions[0].y), (10.0, 20.0));
        assert_eq!((regions[1].x, regions[1].y), (55.5, 80.0));
        assert_eq!(q.span(), 2);
    }

    #[test]
    fn numbers_follow_document_order_across_families() {
        // The simple blank comes first in the document even though the
        // advanced marker is matched first.
        let parsed = parse(
            Section::Reading,
            "First: [round]. Then [9:MCQ] Pick one {A|B*} and last [wood].",
        );

        let ids: Vec<&str> = parsed.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q_1", "mcq_2", "q_3"]);
        let numbers: Vec<u32> = parsed.questions.iter().map(|q| q.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn multi_item_markers_shift_following_numbers() {
        let parsed = parse(
            Section::Listening,
            "[1:MATCH] Match {Left:a,b,c|Right:x,y,z} then [answer]",
        );

        assert_eq!(parsed.questions[0].number, 1);
        assert_eq!(parsed.questions[0].span(), 3);
        assert_eq!(parsed.questions[1].number, 4);
        assert_eq!(parsed.questions[1].id, "q_4");
    }

    #[test]
    fn unmatched_brackets_stay_literal() {
        let parsed = parse(Section::Reading, "A stray ] close and an [unclosed opener");
        assert!(parsed.questions.is_empty());

        let Content::Markup { text } = &parsed.content else {
            panic!("expected markup content");
        };
        assert_eq!(text, "A stray ] close and an [unclosed opener");
    }

    #[test]
    fn empty_option_block_yields_empty_options() {
        let parsed = parse(Section::Reading, "[1:MCQ] Pick {}");
        assert_eq!(
            parsed.questions[0].answer,
            AnswerSpec::MultipleChoice {
                options: vec![],
                correct: 0,
            }
        );

        let parsed = parse(Section::Reading, "[1:MAP] Label {image:x.png|areas:}");
        let AnswerSpec::Map { regions, .. } = &parsed.questions[0].answer else {
            panic!("expected map answer");
        };
        assert!(regions.is_empty());
    }

    #[test]
    fn malformed_advanced_marker_degrades_to_blank() {
        // No options block, so the advanced pass skips it and the simple
        // pass picks up the bracketed text literally.
        let parsed = parse(Section::Reading, "[2:XYZ] not a real type {A|B}");
        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(
            parsed.questions[0].answer,
            AnswerSpec::Blank {
                accepted: vec!["2:XYZ".into()]
            }
        );
    }

    #[test]
    fn parse_with_continues_numbering() {
        let mut numbering = Numbering::default();
        let first = parse_with(Section::Reading, "[one] and [two]", &mut numbering);
        let second = parse_with(Section::Reading, "[three]", &mut numbering);

        assert_eq!(first.questions[1].number, 2);
        assert_eq!(second.questions[0].number, 3);
    }

    #[test]
    fn lint_flags_missing_star() {
        let warnings = lint("[1:MCQ] Pick one {A|B|C}");
        assert!(warnings.iter().any(|w| w.contains("no starred")));
    }

    #[test]
    fn lint_flags_arity_mismatch() {
        let warnings = lint("[1:MATCH] Match {Left:a,b,c|Right:x}");
        assert!(warnings.iter().any(|w| w.contains("3 prompts with 1")));
    }

    #[test]
    fn lint_flags_number_hint_mismatch() {
        let warnings = lint("[5:MCQ] Pick {A*|B}");
        assert!(warnings.iter().any(|w| w.contains("number 5")));

        let clean = lint("[1:MCQ] Pick {A*|B}");
        assert!(clean.is_empty());
    }

    #[test]
    fn lint_flags_unparseable_area() {
        let warnings = lint("[1:MAP] Label {image:x.png|areas:no-coords-here}");
        assert!(warnings.iter().any(|w| w.contains("unparseable area")));
    }
}
