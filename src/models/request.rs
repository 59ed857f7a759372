//! Benchmark request and progress data models

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bench::orchestrator::progress_fraction;
use crate::util::units::{mebibytes_to_bytes, MEBIBYTE};
use crate::{RamBenchError, Result};

/// Access pattern a sample belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BenchmarkKind {
    /// Sequential byte summation over a warmed buffer
    Read,
    /// Sequential `i % 128` pattern store
    Write,
    /// Bulk copy between two buffers
    Copy,
}

impl BenchmarkKind {
    /// All kinds in execution order
    pub const ALL: [BenchmarkKind; 3] = [BenchmarkKind::Read, BenchmarkKind::Write, BenchmarkKind::Copy];

    /// Position of this kind's band in the overall progress bar
    pub fn band_index(self) -> usize {
        match self {
            BenchmarkKind::Read => 0,
            BenchmarkKind::Write => 1,
            BenchmarkKind::Copy => 2,
        }
    }

    /// Upper-case label used in progress text
    pub fn label(self) -> &'static str {
        match self {
            BenchmarkKind::Read => "READ",
            BenchmarkKind::Write => "WRITE",
            BenchmarkKind::Copy => "COPY",
        }
    }
}

impl fmt::Display for BenchmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parameters of a single benchmark run, frozen for its duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    /// Buffer size in bytes (always > 0)
    pub size_bytes: usize,
    /// Iterations per kind (always >= 1)
    pub iterations: u32,
    /// Select the accelerated measurement path
    pub use_accelerated_path: bool,
}

impl BenchmarkRequest {
    /// Create a request from a byte count
    pub fn new(size_bytes: usize, iterations: u32, use_accelerated_path: bool) -> Result<Self> {
        if size_bytes == 0 {
            return Err(RamBenchError::InvalidSize(
                "Buffer size must be greater than 0".to_string(),
            ));
        }
        if iterations == 0 {
            return Err(RamBenchError::ConfigError(
                "Iterations must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            size_bytes,
            iterations,
            use_accelerated_path,
        })
    }

    /// Create a request from a size in mebibytes (`size_mb * 1024 * 1024`)
    pub fn from_megabytes(use_accelerated_path: bool, size_mb: u32, iterations: u32) -> Result<Self> {
        Self::new(mebibytes_to_bytes(size_mb)?, iterations, use_accelerated_path)
    }

    /// Buffer size expressed in mebibytes
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / MEBIBYTE as f64
    }
}

/// Emitted after each completed iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub kind: BenchmarkKind,
    /// Zero-based, always below the request's iteration count
    pub iteration_index: u32,
}

impl ProgressEvent {
    /// Overall progress fraction in `[0, 1]` for a run of `iterations` per kind
    pub fn fraction(&self, iterations: u32) -> f64 {
        progress_fraction(self.kind, self.iteration_index, iterations)
    }

    /// Human readable description, e.g. `READ (Iteration 2/5)`
    pub fn describe(&self, iterations: u32) -> String {
        format!("{} (Iteration {}/{})", self.kind, self.iteration_index + 1, iterations)
    }
}
