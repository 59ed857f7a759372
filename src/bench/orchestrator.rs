//! Benchmark orchestration
//!
//! Runs every iteration of Read, then Write, then Copy against one engine,
//! strictly one after another, averages each kind and reports progress
//! after every completed iteration. Cancellation is cooperative and
//! checked at iteration boundaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bench::engine::MeasurementEngine;
use crate::models::{BenchmarkKind, BenchmarkRequest, BenchmarkResult, ProgressEvent, RunOutcome};
use crate::Result;

/// Number of progress bands (one per kind)
pub const TOTAL_KINDS: f64 = 3.0;

/// Overall progress after `iteration_index` of `kind` completed
///
/// Each kind owns an equal band in the order Read, Write, Copy. Progress
/// moves linearly inside a band, and the last iteration of a band reports
/// exactly its upper edge: `1/3`, `2/3` and `1.0`.
pub fn progress_fraction(kind: BenchmarkKind, iteration_index: u32, iterations: u32) -> f64 {
    let band = kind.band_index() as f64;
    let completed = iteration_index.saturating_add(1);

    if completed >= iterations {
        return (band + 1.0) / TOTAL_KINDS;
    }

    band / TOTAL_KINDS + (1.0 / TOTAL_KINDS) * f64::from(completed) / f64::from(iterations)
}

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect at the next iteration boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives a full run against a single engine
pub struct BenchmarkRunner {
    engine: Arc<dyn MeasurementEngine>,
}

impl BenchmarkRunner {
    /// Create a runner around an engine
    pub fn new(engine: Arc<dyn MeasurementEngine>) -> Self {
        Self { engine }
    }

    /// Name of the engine in use
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Execute the run, folding any engine failure into the failure result
    pub fn run<F>(&self, request: &BenchmarkRequest, cancel: &CancelToken, on_progress: F) -> RunOutcome
    where
        F: FnMut(ProgressEvent),
    {
        self.try_run(request, cancel, on_progress)
            .unwrap_or(RunOutcome::Completed(BenchmarkResult::failed()))
    }

    /// Execute the run, surfacing the first engine failure
    ///
    /// Partial totals are dropped on both failure and cancellation. No
    /// progress callback fires once cancellation has been observed.
    pub fn try_run<F>(&self, request: &BenchmarkRequest, cancel: &CancelToken, mut on_progress: F) -> Result<RunOutcome>
    where
        F: FnMut(ProgressEvent),
    {
        let mut averages = [0.0f64; 3];

        for kind in BenchmarkKind::ALL {
            let mut total = 0.0;

            for iteration_index in 0..request.iterations {
                if cancel.is_cancelled() {
                    return Ok(RunOutcome::Cancelled);
                }

                total += self.engine.measure(kind, request.size_bytes)?;

                if cancel.is_cancelled() {
                    return Ok(RunOutcome::Cancelled);
                }
                on_progress(ProgressEvent {
                    kind,
                    iteration_index,
                });
            }

            averages[kind.band_index()] = total / f64::from(request.iterations);
        }

        let [read, write, copy] = averages;
        Ok(RunOutcome::Completed(BenchmarkResult::new(read, write, copy)))
    }
}
