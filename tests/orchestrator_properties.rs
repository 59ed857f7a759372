mod common;

use std::sync::{Arc, Mutex};

use common::{service_with, FailingEngine, ScriptedEngine};
use rambench::bench::{progress_fraction, BenchmarkRunner, CancelToken, PortableEngine};
use rambench::{BenchmarkKind, BenchmarkRequest, BenchmarkResult, ProgressEvent, RunOutcome, FAILURE_SENTINEL};

fn request(iterations: u32) -> BenchmarkRequest {
    BenchmarkRequest::new(1024, iterations, false).unwrap()
}

#[test]
fn test_averages_of_deterministic_samples() {
    let engine = Arc::new(ScriptedEngine::new(
        vec![1000.0, 2000.0, 3000.0],
        vec![500.0, 700.0, 600.0],
        vec![10.0, 20.0, 60.0],
    ));
    let runner = BenchmarkRunner::new(engine.clone());

    let outcome = runner.run(&request(3), &CancelToken::new(), |_| {});
    assert_eq!(outcome, RunOutcome::Completed(BenchmarkResult::new(2000.0, 600.0, 30.0)));
    for kind in BenchmarkKind::ALL {
        assert_eq!(engine.calls(kind), 3);
    }
}

#[test]
fn test_progress_reports_exact_band_edges() {
    for iterations in [1u32, 5, 10] {
        let engine = Arc::new(ScriptedEngine::new(vec![1.0], vec![1.0], vec![1.0]));
        let runner = BenchmarkRunner::new(engine);
        let mut fractions = Vec::new();

        runner.run(&request(iterations), &CancelToken::new(), |event: ProgressEvent| {
            fractions.push((event.kind, event.iteration_index, event.fraction(iterations)));
        });

        assert_eq!(fractions.len(), 3 * iterations as usize);
        let last = iterations - 1;
        for (kind, index, fraction) in fractions {
            if index == last {
                let edge = (kind.band_index() as f64 + 1.0) / 3.0;
                assert_eq!(fraction, edge, "{} iterations={}", kind, iterations);
            }
            assert!((0.0..=1.0).contains(&fraction));
        }
    }
}

#[test]
fn test_single_iteration_progress_sequence() {
    let values: Vec<f64> = BenchmarkKind::ALL
        .iter()
        .map(|&kind| progress_fraction(kind, 0, 1))
        .collect();
    assert_eq!(values, vec![1.0 / 3.0, 2.0 / 3.0, 1.0]);
}

#[test]
fn test_failure_anywhere_is_uniform_sentinel() {
    for fail_at in 0..6 {
        let runner = BenchmarkRunner::new(Arc::new(FailingEngine::new(fail_at)));
        let outcome = runner.run(&request(2), &CancelToken::new(), |_| {});
        let result = outcome.result().unwrap();
        assert_eq!(result.average_read_mbps, FAILURE_SENTINEL);
        assert_eq!(result.average_write_mbps, FAILURE_SENTINEL);
        assert_eq!(result.average_copy_mbps, FAILURE_SENTINEL);
    }
}

#[test]
fn test_no_callbacks_after_cancel() {
    let runner = BenchmarkRunner::new(Arc::new(ScriptedEngine::new(vec![1.0], vec![1.0], vec![1.0])));
    let cancel = CancelToken::new();
    let mut events = Vec::new();

    let outcome = runner.run(&request(4), &cancel, |event| {
        events.push(event);
        if events.len() == 6 {
            cancel.cancel();
        }
    });

    assert!(outcome.is_cancelled());
    assert!(outcome.result().is_none());
    assert_eq!(events.len(), 6);
}

#[test]
fn test_real_portable_run_is_positive() {
    let runner = BenchmarkRunner::new(Arc::new(PortableEngine::new()));
    assert_eq!(runner.engine_name(), "portable");

    let request = BenchmarkRequest::new(64 * 1024, 2, false).unwrap();
    let outcome = runner.run(&request, &CancelToken::new(), |_| {});
    let result = outcome.result().unwrap();
    for kind in BenchmarkKind::ALL {
        let mbps = result.average_for(kind);
        assert!(mbps.is_finite() && mbps > 0.0, "{} {}", kind, mbps);
    }
}

#[tokio::test]
async fn test_service_callbacks_follow_phase_order() {
    let engine = Arc::new(ScriptedEngine::new(vec![4.0], vec![5.0], vec![6.0]));
    let service = service_with(engine);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);

    let result = service
        .run_benchmarks(false, 64, 2, move |event| sink.lock().unwrap().push(event))
        .await;
    assert_eq!(result, BenchmarkResult::new(4.0, 5.0, 6.0));

    let order: Vec<_> = events
        .lock()
        .unwrap()
        .iter()
        .map(|event| (event.kind, event.iteration_index))
        .collect();
    assert_eq!(
        order,
        vec![
            (BenchmarkKind::Read, 0),
            (BenchmarkKind::Read, 1),
            (BenchmarkKind::Write, 0),
            (BenchmarkKind::Write, 1),
            (BenchmarkKind::Copy, 0),
            (BenchmarkKind::Copy, 1),
        ]
    );
}

#[tokio::test]
async fn test_service_allocation_failure_yields_sentinel() {
    let service = service_with(Arc::new(FailingEngine::new(4)));
    let result = service.run_benchmarks(true, 2048, 3, |_| {}).await;
    assert!(result.is_failure());
    assert_eq!(result.summary(), "Error: Benchmark failed");
}
