//! Benchmark worker
//!
//! A single dedicated OS thread executes every run, one at a time, so
//! concurrent runs never contend for the memory bus and callers never block
//! on a measurement. Callers talk to it through an async API; progress
//! callbacks execute on the worker thread.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use tokio::sync::{mpsc, oneshot};

use crate::bench::engine::{select_engine, MeasurementEngine};
use crate::bench::orchestrator::{BenchmarkRunner, CancelToken};
use crate::models::{BenchmarkRequest, BenchmarkResult, ProgressEvent, RunOutcome};
use crate::{RamBenchError, Result};

/// Name given to the worker thread
pub const WORKER_THREAD_NAME: &str = "rambench-worker";

/// Chooses the engine for a run; the flag selects the accelerated path
pub type EngineFactory = Arc<dyn Fn(bool) -> Result<Arc<dyn MeasurementEngine>> + Send + Sync>;

type Job = Box<dyn FnOnce() + Send + 'static>;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Async front of the worker thread
///
/// The thread exits once the service is dropped and its queue drains.
pub struct BenchmarkService {
    jobs: mpsc::UnboundedSender<Job>,
    engine_factory: EngineFactory,
}

impl BenchmarkService {
    /// Create a service using the real accelerated and portable engines
    pub fn new() -> Result<Self> {
        Self::with_engine_factory(Arc::new(select_engine))
    }

    /// Create a service with a custom engine selection
    pub fn with_engine_factory(engine_factory: EngineFactory) -> Result<Self> {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();

        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                while let Some(job) = queue.blocking_recv() {
                    job();
                }
            })
            .map_err(|e| RamBenchError::WorkerError(format!("Failed to spawn worker thread: {}", e)))?;

        Ok(Self {
            jobs,
            engine_factory,
        })
    }

    /// Queue a run on the worker and wait for its outcome
    ///
    /// Errors cover engine selection (e.g. the accelerated path being
    /// unavailable), engine failures during the run, and a dead worker.
    /// A panic inside the engine or the callback fails only this run.
    /// Dropping the returned future does not stop the run; cancel the
    /// token for that.
    pub async fn submit<F>(&self, request: BenchmarkRequest, cancel: CancelToken, on_progress: F) -> Result<RunOutcome>
    where
        F: FnMut(ProgressEvent) + Send + 'static,
    {
        let engine = (self.engine_factory)(request.use_accelerated_path)?;
        let (done_tx, done_rx) = oneshot::channel();

        let job: Job = Box::new(move || {
            let runner = BenchmarkRunner::new(engine);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| runner.try_run(&request, &cancel, on_progress)))
                .unwrap_or_else(|payload| {
                    Err(RamBenchError::BenchmarkError(format!(
                        "Run panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });
            // Receiver gone means the caller stopped waiting
            let _ = done_tx.send(outcome);
        });

        self.jobs
            .send(job)
            .map_err(|_| RamBenchError::WorkerError("Worker thread has stopped".to_string()))?;

        done_rx.await.map_err(|_| {
            RamBenchError::WorkerError("Worker dropped the run before finishing it".to_string())
        })?
    }

    /// Run a full benchmark and return the three averages
    ///
    /// Any failure, including an unavailable accelerated path or an invalid
    /// size, yields [`BenchmarkResult::failed`].
    pub async fn run_benchmarks<F>(&self, use_accelerated: bool, size_mb: u32, iterations: u32, on_progress: F) -> BenchmarkResult
    where
        F: FnMut(ProgressEvent) + Send + 'static,
    {
        let request = match BenchmarkRequest::from_megabytes(use_accelerated, size_mb, iterations) {
            Ok(request) => request,
            Err(_) => return BenchmarkResult::failed(),
        };

        match self.submit(request, CancelToken::new(), on_progress).await {
            Ok(RunOutcome::Completed(result)) => result,
            Ok(RunOutcome::Cancelled) | Err(_) => BenchmarkResult::failed(),
        }
    }
}
