use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use folio_engine::markdown::{canonicalize, parse, serialize};
use folio_engine::{BlockRegistry, InsertTarget, Position, allocate};
mod common;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.sample_size(10);

    for size in [1, 10, 100] {
        let content = common::generate_markdown_content(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &content, |b, content| {
            b.iter(|| std::hint::black_box(parse(std::hint::black_box(content))));
        });
    }

    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    group.sample_size(10);

    let registry = BlockRegistry::with_builtin();
    let content = common::generate_article(50);
    let Some(record) = parse(&content) else {
        return;
    };
    let block = registry.create(record);
    group.bench_function("article_50_sections", |b| {
        b.iter(|| std::hint::black_box(serialize(std::hint::black_box(&block))));
    });

    group.finish();
}

fn bench_canonicalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonicalize");
    group.sample_size(10);

    let registry = BlockRegistry::with_builtin();
    let content = common::generate_markdown_content(100);
    group.bench_function("mixed_100", |b| {
        b.iter(|| std::hint::black_box(canonicalize(&registry, std::hint::black_box(&content))));
    });

    group.finish();
}

fn bench_allocate(c: &mut Criterion) {
    let registry = BlockRegistry::with_builtin();
    let Some(record) = parse(&common::generate_article(200)) else {
        return;
    };
    let siblings = registry.create(record).children().to_vec();

    c.bench_function("allocate_end_of_large_article", |b| {
        b.iter(|| {
            std::hint::black_box(allocate(&siblings, &InsertTarget::End, Position::After, 5))
        });
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_serialize,
    bench_canonicalize,
    bench_allocate
);
criterion_main!(benches);
