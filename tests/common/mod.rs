//! Deterministic engines shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rambench::bench::{BenchmarkService, MeasurementEngine};
use rambench::{BenchmarkKind, RamBenchError, Result};

/// Returns the next value of a per-kind script on every call
pub struct ScriptedEngine {
    read: Vec<f64>,
    write: Vec<f64>,
    copy: Vec<f64>,
    calls: [AtomicUsize; 3],
}

impl ScriptedEngine {
    pub fn new(read: Vec<f64>, write: Vec<f64>, copy: Vec<f64>) -> Self {
        Self {
            read,
            write,
            copy,
            calls: Default::default(),
        }
    }

    pub fn calls(&self, kind: BenchmarkKind) -> usize {
        self.calls[kind.band_index()].load(Ordering::SeqCst)
    }

    fn next(&self, kind: BenchmarkKind, script: &[f64]) -> Result<f64> {
        let call = self.calls[kind.band_index()].fetch_add(1, Ordering::SeqCst);
        script
            .get(call % script.len().max(1))
            .copied()
            .ok_or_else(|| RamBenchError::BenchmarkError("empty script".to_string()))
    }
}

impl MeasurementEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn read(&self, _size_bytes: usize) -> Result<f64> {
        self.next(BenchmarkKind::Read, &self.read)
    }

    fn write(&self, _size_bytes: usize) -> Result<f64> {
        self.next(BenchmarkKind::Write, &self.write)
    }

    fn copy(&self, _size_bytes: usize) -> Result<f64> {
        self.next(BenchmarkKind::Copy, &self.copy)
    }
}

/// Simulates the allocator refusing the buffer on the `fail_at`-th measurement
pub struct FailingEngine {
    fail_at: usize,
    calls: AtomicUsize,
}

impl FailingEngine {
    pub fn new(fail_at: usize) -> Self {
        Self {
            fail_at,
            calls: AtomicUsize::new(0),
        }
    }

    fn sample(&self, size_bytes: usize) -> Result<f64> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_at {
            return Err(RamBenchError::AllocationError {
                requested: size_bytes,
            });
        }
        Ok(1000.0)
    }
}

impl MeasurementEngine for FailingEngine {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn read(&self, size_bytes: usize) -> Result<f64> {
        self.sample(size_bytes)
    }

    fn write(&self, size_bytes: usize) -> Result<f64> {
        self.sample(size_bytes)
    }

    fn copy(&self, size_bytes: usize) -> Result<f64> {
        self.sample(size_bytes)
    }
}

/// Blocks every measurement until the gate is opened
#[derive(Default)]
pub struct GatedEngine {
    open: AtomicBool,
    calls: AtomicUsize,
}

impl GatedEngine {
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn sample(&self) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        while !self.open.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        Ok(500.0)
    }
}

impl MeasurementEngine for GatedEngine {
    fn name(&self) -> &'static str {
        "gated"
    }

    fn read(&self, _size_bytes: usize) -> Result<f64> {
        self.sample()
    }

    fn write(&self, _size_bytes: usize) -> Result<f64> {
        self.sample()
    }

    fn copy(&self, _size_bytes: usize) -> Result<f64> {
        self.sample()
    }
}

/// Service whose every run uses `engine`, whichever path is requested
pub fn service_with<E>(engine: Arc<E>) -> Arc<BenchmarkService>
where
    E: MeasurementEngine + 'static,
{
    let service = BenchmarkService::with_engine_factory(Arc::new(
        move |_: bool| -> Result<Arc<dyn MeasurementEngine>> { Ok(engine.clone()) },
    ))
    .expect("worker thread should spawn");
    Arc::new(service)
}

/// Poll `condition` until it holds or a generous timeout expires
pub async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..2000 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
