//! Benchmarks for runner-output classification.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stepflow::execution::{ExecutionPlan, MakeOutputAdapter};

fn plan_benchmark(c: &mut Criterion) {
    let subgraph: Vec<String> = (0..32).map(|i| format!("step_{i}")).collect();
    let mut lines: Vec<String> = Vec::new();
    for i in 0..2000 {
        lines.push(format!("compiling object {i} of 2000"));
        if i % 100 == 0 {
            lines.push(format!("# Run step: step_{}", i / 100));
        }
    }
    let adapter = MakeOutputAdapter::new();

    c.bench_function("execution_plan_parse", |b| {
        b.iter(|| {
            black_box(ExecutionPlan::new(
                black_box("step_31"),
                black_box(&lines),
                black_box(&subgraph),
                &adapter,
            ))
        })
    });

    let cached = vec!["make: Nothing to be done for 'step_31'.".to_string()];
    c.bench_function("execution_plan_cache_hit", |b| {
        b.iter(|| {
            black_box(ExecutionPlan::new(
                black_box("step_31"),
                black_box(&cached),
                black_box(&subgraph),
                &adapter,
            ))
        })
    });
}

criterion_group!(benches, plan_benchmark);
criterion_main!(benches);
