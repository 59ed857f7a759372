//! Benchmark session
//!
//! Caller-facing controller that holds the current configuration, starts
//! and cancels runs on the shared [`BenchmarkService`] and publishes a
//! [`SessionState`] snapshot that observers can watch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::bench::orchestrator::CancelToken;
use crate::bench::worker::BenchmarkService;
use crate::config::BenchmarkConfig;
use crate::models::{BenchmarkResult, ProgressEvent, RunOutcome};
use crate::Result;

/// Observable state of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    /// Average read speed of the last finished run, MB/s
    pub read_speed: f64,
    pub write_speed: f64,
    pub copy_speed: f64,
    pub is_running: bool,
    /// Overall progress of the active run in `[0, 1]`
    pub progress: f32,
    /// e.g. `READ (Iteration 2/5)`, empty when idle
    pub current_test: String,
    /// Runs that delivered a result, failed ones included
    pub completed_runs: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            read_speed: 0.0,
            write_speed: 0.0,
            copy_speed: 0.0,
            is_running: false,
            progress: 0.0,
            current_test: String::new(),
            completed_runs: 0,
        }
    }
}

impl SessionState {
    /// Result of the last finished run
    pub fn result(&self) -> BenchmarkResult {
        BenchmarkResult::new(self.read_speed, self.write_speed, self.copy_speed)
    }

    fn reset_progress(&mut self) {
        self.is_running = false;
        self.progress = 0.0;
        self.current_test.clear();
    }

    fn show_result(&mut self, result: BenchmarkResult) {
        self.read_speed = result.average_read_mbps;
        self.write_speed = result.average_write_mbps;
        self.copy_speed = result.average_copy_mbps;
    }

    fn finish(&mut self, result: BenchmarkResult) {
        self.show_result(result);
        self.completed_runs += 1;
        self.reset_progress();
    }
}

#[derive(Debug)]
struct ActiveRun {
    id: u64,
    cancel: CancelToken,
}

type ActiveSlot = Arc<Mutex<Option<ActiveRun>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Whether `id` is still the live, uncancelled run
fn is_current(active: &Option<ActiveRun>, id: u64) -> bool {
    matches!(active, Some(run) if run.id == id && !run.cancel.is_cancelled())
}

/// Start/cancel controller with at most one active run
pub struct BenchmarkSession {
    service: Arc<BenchmarkService>,
    config: Mutex<BenchmarkConfig>,
    state: Arc<watch::Sender<SessionState>>,
    active: ActiveSlot,
    next_run_id: AtomicU64,
}

impl BenchmarkSession {
    /// Create a session with its own worker thread
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        Ok(Self::with_service(config, Arc::new(BenchmarkService::new()?)))
    }

    /// Create a session on top of an existing service
    pub fn with_service(config: BenchmarkConfig, service: Arc<BenchmarkService>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            service,
            config: Mutex::new(config),
            state: Arc::new(state),
            active: Arc::new(Mutex::new(None)),
            next_run_id: AtomicU64::new(1),
        }
    }

    /// Start a run with the current configuration
    ///
    /// Returns `false` without side effects when a run is already active or
    /// when called outside a Tokio runtime. An invalid configuration
    /// publishes the failure result and also returns `false`.
    pub fn start_benchmark(&self) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            warn!("Benchmark start requested outside a Tokio runtime");
            return false;
        };

        let mut active = lock(&self.active);
        if active.is_some() {
            debug!("Benchmark already running, ignoring start");
            return false;
        }

        let config = self.config();
        let request = match config.to_request() {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Refusing to start benchmark");
                self.state.send_modify(|state| state.show_result(BenchmarkResult::failed()));
                return false;
            }
        };

        let id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancelToken::new();
        *active = Some(ActiveRun {
            id,
            cancel: cancel.clone(),
        });
        self.state.send_modify(|state| {
            state.is_running = true;
            state.progress = 0.0;
            state.current_test.clear();
        });
        drop(active);

        info!(
            run = id,
            path = config.path_name(),
            size_mb = config.size_mb,
            iterations = config.iterations,
            "Starting benchmark"
        );

        let iterations = request.iterations;
        let progress_state = Arc::clone(&self.state);
        let progress_active = Arc::clone(&self.active);
        let on_progress = move |event: ProgressEvent| {
            let active = lock(&progress_active);
            if !is_current(&active, id) {
                return;
            }
            progress_state.send_modify(|state| {
                state.progress = event.fraction(iterations) as f32;
                state.current_test = event.describe(iterations);
            });
        };

        let service = Arc::clone(&self.service);
        let state = Arc::clone(&self.state);
        let active = Arc::clone(&self.active);
        runtime.spawn(async move {
            let outcome = service.submit(request, cancel, on_progress).await;

            let mut slot = lock(&active);
            if !is_current(&slot, id) {
                debug!(run = id, "Discarding outcome of cancelled run");
                return;
            }
            *slot = None;

            let result = match outcome {
                Ok(RunOutcome::Completed(result)) => result,
                Ok(RunOutcome::Cancelled) => {
                    state.send_modify(SessionState::reset_progress);
                    return;
                }
                Err(e) => {
                    warn!(run = id, error = %e, "Benchmark failed");
                    BenchmarkResult::failed()
                }
            };

            info!(
                run = id,
                read_mbps = result.average_read_mbps,
                write_mbps = result.average_write_mbps,
                copy_mbps = result.average_copy_mbps,
                "Benchmark finished"
            );
            state.send_modify(|state| state.finish(result));
        });

        true
    }

    /// Cancel the active run
    ///
    /// Resets the running flag, progress and test label at once; the run's
    /// result is never published. Returns `false` when idle.
    pub fn cancel_benchmark(&self) -> bool {
        let mut active = lock(&self.active);
        let Some(run) = active.take() else {
            return false;
        };

        run.cancel.cancel();
        self.state.send_modify(SessionState::reset_progress);
        info!(run = run.id, "Benchmark cancelled");
        true
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// Wait until no run is active and return the state at that point
    pub async fn wait_until_idle(&self) -> SessionState {
        let mut receiver = self.state.subscribe();
        let idle = match receiver.wait_for(|state| !state.is_running).await {
            Ok(state) => SessionState::clone(&state),
            Err(_) => self.state(),
        };
        idle
    }

    /// Copy of the configuration used by the next run
    pub fn config(&self) -> BenchmarkConfig {
        lock(&self.config).clone()
    }

    /// Switch measurement path, clamping the size into the new menu
    pub fn set_use_accelerated(&self, use_accelerated: bool) {
        lock(&self.config).set_use_accelerated(use_accelerated);
    }

    pub fn set_size_mb(&self, size_mb: u32) -> Result<()> {
        lock(&self.config).set_size_mb(size_mb)
    }

    pub fn set_iterations(&self, iterations: u32) -> Result<()> {
        lock(&self.config).set_iterations(iterations)
    }

    /// Sizes in MB selectable for the current path
    pub fn available_sizes(&self) -> &'static [u32] {
        lock(&self.config).available_sizes()
    }
}
