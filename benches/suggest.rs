//! Benchmarks for taxonomy suggestion.
//!
//! Benchmark targets:
//! - 100 classified entries: <1ms
//! - 2,000 classified entries (default scan limit): <20ms
//!
//! Covers tokenization, Jaccard scoring and the in-memory ranking. The store
//! scan is measured separately against an in-memory SQLite database.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use symmem::models::{SaveRequest, Symbol, TextEntry};
use symmem::services::{SuggestionConfig, TaxonomySuggester};
use symmem::similarity::{DEFAULT_MAX_TOKENS, tokenize};
use symmem::{SqliteSymbolStore, SymbolStore};

const CATEGORIES: [&str; 4] = ["ai", "ops", "research", "smoke"];
const WORDS: [&str; 12] = [
    "hybrid",
    "intelligence",
    "symbolic",
    "memory",
    "agent",
    "retrieval",
    "graph",
    "policy",
    "storage",
    "latency",
    "planner",
    "context",
];

fn body_for(i: usize) -> String {
    (0..8)
        .map(|k| WORDS[(i * 7 + k * 5) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn candidates(count: usize) -> Vec<TextEntry> {
    (0..count)
        .map(|i| TextEntry {
            symbol: Symbol::new(format!("BENCH.{i}")),
            body: body_for(i),
            category: Some(CATEGORIES[i % CATEGORIES.len()].to_string()),
            subcategory: Some(format!("{}.sub{}", CATEGORIES[i % CATEGORIES.len()], i % 3)),
            content_hash: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    let short = "HGI = AI:n ja ihmisen yhteistyö";
    let long = body_for(3).repeat(40);

    group.bench_function("short", |b| {
        b.iter(|| tokenize(black_box(short), DEFAULT_MAX_TOKENS));
    });
    group.bench_function("long_capped", |b| {
        b.iter(|| tokenize(black_box(&long), DEFAULT_MAX_TOKENS));
    });

    group.finish();
}

fn bench_suggest_from(c: &mut Criterion) {
    let mut group = c.benchmark_group("suggest_from");
    let suggester = TaxonomySuggester::default();

    for size in [100usize, 500, 2000] {
        let entries = candidates(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("entries", size), &entries, |b, entries| {
            b.iter(|| {
                suggester.suggest_from(
                    black_box("TST.TWO"),
                    black_box("hybrid intelligence and symbolic memory"),
                    entries,
                )
            });
        });
    }

    group.finish();
}

fn bench_suggest_from_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("suggest_store");
    group.sample_size(20);

    let store = SqliteSymbolStore::in_memory().unwrap();
    for entry in candidates(2000) {
        let mut request = SaveRequest::new(entry.symbol.as_str(), entry.body);
        request.category = entry.category;
        request.subcategory = entry.subcategory;
        store.save(&request).unwrap();
    }

    for limit_rows in [200usize, 2000] {
        let suggester = TaxonomySuggester::new(SuggestionConfig {
            limit_rows,
            ..SuggestionConfig::default()
        });
        group.bench_with_input(
            BenchmarkId::new("limit_rows", limit_rows),
            &suggester,
            |b, suggester| {
                b.iter(|| {
                    suggester
                        .suggest(&store, black_box("TST.TWO"), black_box("hybrid memory"))
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_suggest_from,
    bench_suggest_from_store
);
criterion_main!(benches);
