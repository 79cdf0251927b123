//! Benchmarks for workflow execution and curve analysis.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;

use curveflow::analysis::{CurveAnalysis, ParameterSuggestions};
use curveflow::events::NoOpEventSink;
use curveflow::stages::StageHandlers;
use curveflow::testing::fixtures;
use curveflow::workflow::{Sequencer, WorkflowDriver};

fn sequencer_benchmark(c: &mut Criterion) {
    c.bench_function("run_to_completion", |b| {
        let mut sequencer = Sequencer::new(StageHandlers::pass_through(), Arc::new(NoOpEventSink));
        b.iter(|| {
            sequencer.reset();
            black_box(sequencer.run_to_completion())
        });
    });

    c.bench_function("driver_run", |b| {
        let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
        let sequencer = Sequencer::new(StageHandlers::pass_through(), Arc::new(NoOpEventSink));
        let mut driver = WorkflowDriver::new(sequencer);
        b.iter(|| {
            driver.reset();
            black_box(runtime.block_on(driver.run()))
        });
    });
}

fn analysis_benchmark(c: &mut Criterion) {
    let points = fixtures::circle(250.0, 1_000);
    c.bench_function("analyze_and_suggest_1000_points", |b| {
        b.iter(|| {
            let analysis = CurveAnalysis::analyze(black_box(&points));
            analysis.map(|a| ParameterSuggestions::from_analysis(&a))
        });
    });
}

criterion_group!(benches, sequencer_benchmark, analysis_benchmark);
criterion_main!(benches);
