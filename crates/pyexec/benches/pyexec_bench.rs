// crates/pyexec/benches/pyexec_bench.rs
//
// Two Criterion benchmark groups:
//   sandboxed_cold_start — full evaluate() pipeline (template render, temp
//                          file, resource cage, subprocess spawn, JSON parse)
//   bare_cold_start      — a raw `python3 -c` spawn, as a baseline for how
//                          much the sandboxing machinery adds over a bare
//                          interpreter spawn
//
// Every evaluation here is a cold start: there is no warm pool to benchmark
// separately, since each `evaluate()` call spawns its own interpreter.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pyexec::{evaluate, Limits};
use std::time::Duration;

const SNIPPET_ARITHMETIC: &str = "sum(i*i for i in range(1000))";

const SNIPPET_JSON_ROUNDTRIP: &str = concat!(
    "import json\n",
    "data = {\"key\": \"value\", \"numbers\": [1, 2, 3], \"nested\": {\"a\": 1}}\n",
    "print(json.dumps(json.loads(json.dumps(data))))"
);

fn sandboxed_cold_start(c: &mut Criterion) {
    let mut group = c.benchmark_group("sandboxed_cold_start");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(200));
    group.measurement_time(Duration::from_secs(5));

    for (name, snippet) in [
        ("arithmetic", SNIPPET_ARITHMETIC),
        ("json_roundtrip", SNIPPET_JSON_ROUNDTRIP),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| evaluate(black_box(snippet), Limits::default()))
        });
    }
    group.finish();
}

fn bare_cold_start(c: &mut Criterion) {
    if std::process::Command::new("python3")
        .arg("--version")
        .output()
        .is_err()
    {
        eprintln!("python3 not found; skipping bare_cold_start benchmark");
        return;
    }

    let mut group = c.benchmark_group("bare_cold_start");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(200));
    group.measurement_time(Duration::from_secs(5));

    for (name, snippet) in [
        ("arithmetic", SNIPPET_ARITHMETIC),
        ("json_roundtrip", SNIPPET_JSON_ROUNDTRIP),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                black_box(
                    std::process::Command::new("python3")
                        .arg("-c")
                        .arg(snippet)
                        .output()
                        .ok(),
                )
            })
        });
    }
    group.finish();
}

criterion_group!(benches_sandboxed, sandboxed_cold_start);
criterion_group!(benches_bare, bare_cold_start);
criterion_main!(benches_sandboxed, benches_bare);
