//! Data models module
//!
//! Contains the benchmark request, progress and result types shared by
//! the measurement engine, the orchestrator and the session layer.

pub mod request;
pub mod result;

// Re-export commonly used types
pub use request::{BenchmarkKind, BenchmarkRequest, ProgressEvent};
pub use result::{BenchmarkReport, BenchmarkResult, RunOutcome};
