use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bandgrade_core::grading::grade;
use bandgrade_core::markup;
use bandgrade_core::matcher;
use bandgrade_core::model::{AnswerMap, Section, Submission, Test, TestSection};
use serde_json::json;

fn make_test(blanks: usize) -> Test {
    let source: String = (0..blanks).map(|i| format!("Item {i}: [answer{i}]. ")).collect();
    Test {
        id: "bench".into(),
        name: "Benchmark".into(),
        description: String::new(),
        sections: vec![TestSection {
            section: Section::Reading,
            title: String::new(),
            parsed: markup::parse(Section::Reading, &source),
            source,
        }],
    }
}

fn make_submission(blanks: usize, correct: usize) -> Submission {
    let answers: AnswerMap = (0..blanks)
        .map(|i| {
            let value = if i < correct {
                json!(format!("answer{i}"))
            } else {
                json!("wrong")
            };
            (format!("q_{}", i + 1), value)
        })
        .collect();
    Submission::Flat(answers)
}

fn bench_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("matcher");

    group.bench_function("exact", |b| {
        b.iter(|| matcher::matches(black_box("round"), black_box("round")))
    });

    group.bench_function("token_scan", |b| {
        b.iter(|| {
            matcher::matches(
                black_box("I think it was the child, probably"),
                black_box("child"),
            )
        })
    });

    group.bench_function("comma_set", |b| {
        b.iter(|| matcher::matches(black_box("colour"), black_box("color, colour, coloring")))
    });

    group.finish();
}

fn bench_grade(c: &mut Criterion) {
    let mut group = c.benchmark_group("grade");

    let small_test = make_test(10);
    let small_submission = make_submission(10, 7);

    let full_test = make_test(40);
    let full_submission = make_submission(40, 30);

    group.bench_function("10_questions", |b| {
        b.iter(|| grade(black_box(&small_test), black_box(&small_submission)))
    });

    group.bench_function("40_questions", |b| {
        b.iter(|| grade(black_box(&full_test), black_box(&full_submission)))
    });

    group.bench_function("40_questions_empty_submission", |b| {
        let empty = Submission::Flat(AnswerMap::new());
        b.iter(|| grade(black_box(&full_test), black_box(&empty)))
    });

    group.finish();
}

criterion_group!(benches, bench_matcher, bench_grade);
criterion_main!(benches);
