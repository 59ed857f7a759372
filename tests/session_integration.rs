mod common;

use std::sync::Arc;

use common::{eventually, service_with, FailingEngine, GatedEngine, ScriptedEngine};
use rambench::{BenchmarkConfig, BenchmarkResult, BenchmarkSession, FAILURE_SENTINEL};

fn portable(iterations: u32) -> BenchmarkConfig {
    BenchmarkConfig::portable().with_size_mb(64).with_iterations(iterations)
}

#[tokio::test]
async fn test_start_while_running_is_noop() {
    let engine = Arc::new(GatedEngine::default());
    let session = BenchmarkSession::with_service(portable(2), service_with(engine.clone()));

    assert!(session.start_benchmark());
    assert!(session.is_running());
    assert!(!session.start_benchmark());
    assert!(session.state().is_running);

    engine.open();
    let state = session.wait_until_idle().await;
    assert_eq!(state.completed_runs, 1);
    assert_eq!(state.result(), BenchmarkResult::new(500.0, 500.0, 500.0));
    assert_eq!(engine.calls(), 6);
}

#[tokio::test]
async fn test_cancel_resets_state_and_drops_result() {
    let engine = Arc::new(GatedEngine::default());
    let session = BenchmarkSession::with_service(portable(2), service_with(engine.clone()));

    assert!(session.start_benchmark());
    assert!(eventually(|| engine.calls() >= 1).await);

    assert!(session.cancel_benchmark());
    let state = session.state();
    assert!(!state.is_running);
    assert_eq!(state.progress, 0.0);
    assert!(state.current_test.is_empty());
    assert_eq!(state.completed_runs, 0);
    assert!(!session.cancel_benchmark());

    // The next run queues behind the cancelled one on the worker
    engine.open();
    assert!(session.start_benchmark());
    let state = session.wait_until_idle().await;
    assert_eq!(state.completed_runs, 1);
    assert_eq!(engine.calls(), 1 + 6);
}

#[tokio::test]
async fn test_failed_run_publishes_sentinel() {
    let session = BenchmarkSession::with_service(portable(3), service_with(Arc::new(FailingEngine::new(4))));

    assert!(session.start_benchmark());
    let state = session.wait_until_idle().await;

    assert_eq!(state.read_speed, FAILURE_SENTINEL);
    assert_eq!(state.write_speed, FAILURE_SENTINEL);
    assert_eq!(state.copy_speed, FAILURE_SENTINEL);
    assert_eq!(state.completed_runs, 1);
    assert!(state.current_test.is_empty());
    assert_eq!(state.progress, 0.0);
}

#[tokio::test]
async fn test_observed_progress_is_monotonic() {
    let engine = Arc::new(ScriptedEngine::new(vec![1.0, 3.0], vec![2.0], vec![3.0]));
    let session = BenchmarkSession::with_service(portable(4), service_with(engine));
    let mut updates = session.subscribe();

    assert!(session.start_benchmark());

    let mut seen = Vec::new();
    let mut labels = Vec::new();
    loop {
        updates.changed().await.unwrap();
        let state = updates.borrow_and_update().clone();
        if !state.is_running {
            assert_eq!(state.result(), BenchmarkResult::new(2.0, 2.0, 3.0));
            break;
        }
        seen.push(state.progress);
        labels.push(state.current_test);
    }

    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", seen);
    assert!(seen.iter().all(|&p| (0.0..=1.0).contains(&p)));
    assert!(labels
        .iter()
        .filter(|label| !label.is_empty())
        .all(|label| label.contains("(Iteration ") && label.ends_with("/4)")));
}

#[tokio::test]
async fn test_runs_can_repeat() {
    let engine = Arc::new(ScriptedEngine::new(vec![10.0], vec![20.0], vec![30.0]));
    let session = BenchmarkSession::with_service(portable(1), service_with(engine));

    for expected_runs in 1..=3 {
        assert!(session.start_benchmark());
        let state = session.wait_until_idle().await;
        assert_eq!(state.completed_runs, expected_runs);
    }
}

#[test]
fn test_available_sizes_follow_path() {
    let engine = Arc::new(ScriptedEngine::new(vec![1.0], vec![1.0], vec![1.0]));
    let session = BenchmarkSession::with_service(BenchmarkConfig::default(), service_with(engine));

    assert_eq!(session.available_sizes(), &[64, 128, 256, 512, 1024, 2048]);
    session.set_size_mb(2048).unwrap();

    session.set_use_accelerated(false);
    assert_eq!(session.available_sizes(), &[64, 128]);
    assert_eq!(session.config().size_mb, 128);

    session.set_use_accelerated(true);
    assert_eq!(session.config().size_mb, 128);
    assert!(session.set_size_mb(4096).is_err());
}
