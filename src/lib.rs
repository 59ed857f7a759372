//! RAMBENCH - Memory bandwidth benchmark
//!
//! Measures sustained sequential read, write and copy throughput over a
//! caller-selected buffer size and reports per-operation averages in MB/s.

use thiserror::Error;

// Public re-exports
pub mod bench;
pub mod cli;
pub mod config;
pub mod models;
pub mod util;

pub use bench::{BenchmarkRunner, BenchmarkService, BenchmarkSession, CancelToken, MeasurementEngine, SessionState};
pub use config::BenchmarkConfig;
pub use models::{BenchmarkKind, BenchmarkRequest, BenchmarkResult, ProgressEvent, RunOutcome};

// Common error types
#[derive(Debug, Error)]
pub enum RamBenchError {
    /// I/O operation failed (configuration files, terminal)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Configuration validation or parsing error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Requested buffer size is zero or does not fit the address space
    #[error("Invalid buffer size: {0}")]
    InvalidSize(String),
    /// The allocator could not satisfy the requested buffer
    #[error("Failed to allocate {requested} bytes")]
    AllocationError { requested: usize },
    /// Accelerated measurement path failed to initialize
    #[error("Accelerated path unavailable: {0}")]
    AcceleratedUnavailable(String),
    /// Benchmark execution error
    #[error("Benchmark error: {0}")]
    BenchmarkError(String),
    /// Worker thread is gone or refused the job
    #[error("Worker error: {0}")]
    WorkerError(String),
}

impl From<serde_json::Error> for RamBenchError {
    fn from(err: serde_json::Error) -> Self {
        RamBenchError::BenchmarkError(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for RamBenchError {
    fn from(err: toml::de::Error) -> Self {
        RamBenchError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for RamBenchError {
    fn from(err: toml::ser::Error) -> Self {
        RamBenchError::ConfigError(format!("TOML serialization error: {}", err))
    }
}

/// Result type alias for RAMBENCH operations
pub type Result<T> = std::result::Result<T, RamBenchError>;

/// Error presentation helpers
pub mod error {
    use super::RamBenchError;

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &RamBenchError) -> String {
        match error {
            RamBenchError::AllocationError { .. } => {
                "Not enough memory for the selected size. Choose a smaller buffer.".to_string()
            }
            RamBenchError::AcceleratedUnavailable(_) => {
                "Accelerated path is not supported on this CPU. Use the portable path instead."
                    .to_string()
            }
            RamBenchError::InvalidSize(msg) => {
                format!("Invalid size: {}. Pick one of the listed sizes.", msg)
            }
            RamBenchError::ConfigError(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            RamBenchError::WorkerError(_) => {
                "The benchmark worker stopped unexpectedly. Restart the application.".to_string()
            }
            _ => error.to_string(),
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "rambench";
pub const CONFIG_FILE: &str = "rambench.toml";
/// Value stored in every result field when a run fails
pub const FAILURE_SENTINEL: f64 = -1.0;
