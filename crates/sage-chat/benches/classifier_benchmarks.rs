//! Benchmarks for the keyword router.
//!
//! Routing runs on every turn before any network call, so it should stay in
//! the sub-microsecond range even for long questions that match nothing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sage_chat::QueryClassifier;

fn bench_classify(c: &mut Criterion) {
    let classifier = QueryClassifier::default();

    let cases = [
        ("math_hit", "Calculate 2+2".to_string()),
        ("lookup_hit", "Who is the president of France?".to_string()),
        ("fallback_short", "Explain how gravity works".to_string()),
        (
            "fallback_long",
            "Explain the causes of seasonal climate change in detail ".repeat(40),
        ),
    ];

    let mut group = c.benchmark_group("classify");
    for (name, question) in &cases {
        group.bench_function(*name, |b| b.iter(|| classifier.classify(black_box(question))));
    }
    group.finish();
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
