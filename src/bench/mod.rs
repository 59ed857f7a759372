//! Benchmark engine module
//!
//! Contains the two measurement paths, the orchestrator that sequences a
//! run, the worker thread that executes runs and the session that callers
//! drive with start and cancel.

pub mod accelerated;
pub mod engine;
pub mod orchestrator;
pub mod portable;
pub mod session;
pub mod worker;

// Re-export commonly used types
pub use accelerated::AcceleratedEngine;
pub use engine::{select_engine, AccessKernels, MeasurementEngine};
pub use orchestrator::{progress_fraction, BenchmarkRunner, CancelToken};
pub use portable::PortableEngine;
pub use session::{BenchmarkSession, SessionState};
pub use worker::{BenchmarkService, EngineFactory};
