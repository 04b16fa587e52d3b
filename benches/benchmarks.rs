// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// Hot paths that run on every cycle, outside the measured child process:
//   1. Fence stripping of advisor replies
//   2. Instruction rendering
//   3. Averaging and judging metrics
//   4. Registry snapshot reads while a loop writes

use std::sync::Arc;

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use perftune::core::advisor::{strip_code_fences, Advisor};
use perftune::core::policy::judge;
use perftune::core::registry::TaskRegistry;
use perftune::core::types::{BackendKind, CycleOutcome, HistoryEntry, Metrics, Task};
use perftune::infra::errors::PerfTuneError;
use perftune::provider::{ChatRequest, ChatResponse, ModelProvider};

// ─── Helpers ────────────────────────────────────────────────────────────────

struct NullProvider;

#[async_trait]
impl ModelProvider for NullProvider {
    fn id(&self) -> &str {
        "null"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, PerfTuneError> {
        Err(PerfTuneError::Provider {
            provider: "null".into(),
            message: "benchmarks never call the backend".into(),
            retriable: false,
        })
    }
}

fn build_code(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("total_{i} = sum(x * x for x in range({i}))"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn metrics(seed: f64) -> Metrics {
    Metrics {
        cpu: 10.0 + seed,
        memory: 2.0 + seed / 10.0,
        time: 0.5 + seed / 100.0,
        success: true,
    }
}

// ─── Benchmark: Fence stripping ─────────────────────────────────────────────

fn bench_strip_fences(c: &mut Criterion) {
    let code = build_code(200);
    let fenced = format!("Here is a faster version:\n```python\n{code}\n```\nEnjoy.");
    let plain = code.clone();

    let mut group = c.benchmark_group("strip_fences");
    group.bench_function("fenced_200_lines", |b| {
        b.iter(|| strip_code_fences(black_box(&fenced)))
    });
    group.bench_function("plain_200_lines", |b| {
        b.iter(|| strip_code_fences(black_box(&plain)))
    });
    group.finish();
}

// ─── Benchmark: Instruction rendering ───────────────────────────────────────

fn bench_instruction(c: &mut Criterion) {
    let advisor = Advisor::new(Arc::new(NullProvider), "bench");
    let code = build_code(500);
    let m = metrics(1.0);

    c.bench_function("build_instruction_500_lines", |b| {
        b.iter(|| advisor.build_instruction(black_box(&code), black_box(&m)))
    });
}

// ─── Benchmark: Metrics ─────────────────────────────────────────────────────

fn bench_metrics(c: &mut Criterion) {
    let samples: Vec<Metrics> = (0..100).map(|i| metrics(i as f64)).collect();
    let best = metrics(5.0);
    let worse = metrics(9.0);

    let mut group = c.benchmark_group("metrics");
    group.bench_function("mean_100_runs", |b| {
        b.iter(|| Metrics::mean(black_box(&samples)))
    });
    group.bench_function("judge_rejected", |b| {
        b.iter(|| judge(black_box(&best), black_box(&worse)))
    });
    group.finish();
}

// ─── Benchmark: Registry ────────────────────────────────────────────────────

fn bench_registry(c: &mut Criterion) {
    let registry = TaskRegistry::new();
    for t in 0..100 {
        let mut task = Task::new(format!("task-{t}"), build_code(20), BackendKind::Local, 5, 3);
        for i in 0..50 {
            task.history
                .push(HistoryEntry::new(i, &metrics(i as f64), CycleOutcome::Rejected));
        }
        registry.insert(task);
    }

    let mut group = c.benchmark_group("registry");
    group.bench_function("snapshot_50_entries", |b| {
        b.iter(|| registry.get(black_box("task-42")))
    });
    group.bench_function("list_100_tasks", |b| b.iter(|| registry.list()));
    group.bench_function("update_iteration", |b| {
        b.iter(|| registry.update(black_box("task-7"), |t| t.current_iteration += 1))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_strip_fences,
    bench_instruction,
    bench_metrics,
    bench_registry
);
criterion_main!(benches);
