use cget::lock::LockDocument;
use cget::manifest::ManifestDocument;
use cget::resolve::{parse_constraint, parse_tag, select};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const MOCK_MANIFEST: &str = r#"{
  "name": "benchmark_project",
  "version": "0.1.0",
  "dependencies": [
    { "name": "json", "source": "nlohmann/json", "version": ">=3.10,<4.0" },
    { "name": "fmt", "source": "fmtlib/fmt", "version": "latest" },
    { "name": "wil", "source": "microsoft/wil", "version": "latest", "platforms": ["windows"] }
  ],
  "devDependencies": [
    { "name": "doctest", "source": "doctest/doctest", "version": "^2.4" }
  ]
}"#;

const MOCK_LOCK: &str = r#"{
  "json": {
    "name": "json",
    "source": "nlohmann/json",
    "resolved": "https://github.com/nlohmann/json.git",
    "version": "3.11.3",
    "tag": "v3.11.3"
  },
  "fmt": {
    "name": "fmt",
    "source": "fmtlib/fmt",
    "resolved": "https://github.com/fmtlib/fmt.git",
    "version": "10.2.1",
    "tag": "10.2.1"
  }
}"#;

/// A busy repository: mixed prefixes, release candidates and junk tags.
fn mock_tags() -> Vec<String> {
    let mut tags = Vec::new();
    for major in 0..10 {
        for minor in 0..10 {
            for patch in 0..5 {
                tags.push(format!("v{major}.{minor}.{patch}"));
            }
            tags.push(format!("{major}.{minor}"));
            tags.push(format!("v{major}.{minor}.0-rc1"));
        }
        tags.push(format!("release-{major}"));
    }
    tags
}

fn bench_manifest_parse(c: &mut Criterion) {
    c.bench_function("parse_cget_json", |b| {
        b.iter(|| {
            let _: ManifestDocument = serde_json::from_str(black_box(MOCK_MANIFEST)).unwrap();
        })
    });
}

fn bench_lock_parse(c: &mut Criterion) {
    c.bench_function("parse_cget_lock", |b| {
        b.iter(|| {
            let _: LockDocument = serde_json::from_str(black_box(MOCK_LOCK)).unwrap();
        })
    });
}

fn bench_constraints(c: &mut Criterion) {
    c.bench_function("parse_constraint", |b| {
        b.iter(|| {
            let _ = parse_constraint(black_box(">=3.10,<4.0"));
            let _ = parse_constraint(black_box("latest"));
            let _ = parse_constraint(black_box("1.2.3"));
        })
    });

    c.bench_function("parse_tag", |b| {
        b.iter(|| {
            let _ = parse_tag(black_box("v3.11.3"));
            let _ = parse_tag(black_box("10.2"));
            let _ = parse_tag(black_box("release-1"));
        })
    });
}

fn bench_select(c: &mut Criterion) {
    let tags = mock_tags();
    let ranged = parse_constraint(">=3.1,<7.0").unwrap();
    let any = parse_constraint("latest").unwrap();

    c.bench_function("select_ranged", |b| {
        b.iter(|| select(black_box(&tags), black_box(&ranged)))
    });
    c.bench_function("select_latest", |b| {
        b.iter(|| select(black_box(&tags), black_box(&any)))
    });
}

criterion_group!(
    benches,
    bench_manifest_parse,
    bench_lock_parse,
    bench_constraints,
    bench_select
);
criterion_main!(benches);
