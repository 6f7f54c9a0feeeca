use criterion::{Criterion, black_box, criterion_group, criterion_main};
use paperfold_core::{AssembleOptions, Readability, assemble, flatten, sanitize_fragment};

fn fixture() -> String {
    std::fs::read_to_string("../../tests/fixtures/article.html").unwrap()
}

fn bench_readability(c: &mut Criterion) {
    let html = fixture();
    let readability = Readability::new();

    c.bench_function("readability", |b| b.iter(|| readability.parse(black_box(&html))));
}

fn bench_sanitize(c: &mut Criterion) {
    let html = fixture();

    c.bench_function("sanitize", |b| b.iter(|| sanitize_fragment(black_box(&html))));
}

fn bench_flatten(c: &mut Criterion) {
    let article = Readability::new().parse(&fixture()).unwrap();

    c.bench_function("flatten", |b| b.iter(|| flatten(black_box(&article.article_body_html))));
}

fn bench_assemble(c: &mut Criterion) {
    let article = Readability::new().parse(&fixture()).unwrap();
    let options = AssembleOptions::default();

    let mut group = c.benchmark_group("assemble");
    group.sample_size(20);
    group.bench_function("three_profiles", |b| b.iter(|| assemble(black_box(&article), &options, None)));
    group.finish();
}

criterion_group!(benches, bench_readability, bench_sanitize, bench_flatten, bench_assemble);
criterion_main!(benches);
