//! Benchmarks for record validation and the embedded store.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, Criterion};
use recruit::storage::RedbStore;
use recruit::{validate, ApplicationFilter, ApplicationRecord, ApplicationStore, Catalog};
use std::hint::black_box;
use tempfile::tempdir;

fn record(n: usize) -> ApplicationRecord {
    ApplicationRecord {
        name: format!("Applicant {}", n),
        email: format!("applicant{}@example.com", n),
        university: "VIT".into(),
        year: "2nd".into(),
        position: "Technical Team".into(),
        skills: "Python, Go, systems design".into(),
        experience: String::new(),
        motivation: "I want to build real infrastructure and learn from peers".into(),
    }
}

/// Benchmark validating a well-formed record.
fn bench_validate_valid(c: &mut Criterion) {
    let catalog = Catalog::default();
    let record = record(0);

    c.bench_function("validate_valid_record", |b| {
        b.iter(|| validate(black_box(&record), &catalog));
    });
}

/// Benchmark validating a record where every rule fails.
fn bench_validate_invalid(c: &mut Criterion) {
    let catalog = Catalog::default();
    let record = ApplicationRecord {
        name: " ".into(),
        email: "nope".into(),
        university: "Elsewhere".into(),
        ..ApplicationRecord::default()
    };

    c.bench_function("validate_invalid_record", |b| {
        b.iter(|| validate(black_box(&record), &catalog));
    });
}

/// Benchmark inserting into the embedded store.
fn bench_insert(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempdir().unwrap();
    let store = RedbStore::open(dir.path().join("bench.db")).unwrap();
    let mut n = 0usize;

    c.bench_function("redb_insert", |b| {
        b.iter(|| {
            n += 1;
            rt.block_on(store.insert(&record(n))).unwrap();
        });
    });
}

/// Benchmark listing 1K stored applications with a search filter.
fn bench_list(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempdir().unwrap();
    let store = RedbStore::open(dir.path().join("bench.db")).unwrap();
    for n in 0..1_000 {
        rt.block_on(store.insert(&record(n))).unwrap();
    }
    let filter = ApplicationFilter {
        search: Some("applicant9".into()),
        ..Default::default()
    };

    c.bench_function("redb_list_search_1k", |b| {
        b.iter(|| rt.block_on(store.list(black_box(&filter))).unwrap());
    });
}

criterion_group!(
    benches,
    bench_validate_valid,
    bench_validate_invalid,
    bench_insert,
    bench_list
);
criterion_main!(benches);
