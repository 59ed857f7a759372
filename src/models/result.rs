//! Benchmark result data models
//!
//! Contains the per-run average triple, the terminal outcome of a run and
//! the serializable report printed by the command-line front end.

use crate::config::BenchmarkConfig;
use crate::models::BenchmarkKind;
use crate::util::units::format_throughput;
use crate::FAILURE_SENTINEL;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Average throughput per kind for one run
///
/// A failed run carries [`FAILURE_SENTINEL`] in all three fields; there is
/// no partially failed state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Average sequential read throughput in MB/s
    pub average_read_mbps: f64,
    /// Average sequential write throughput in MB/s
    pub average_write_mbps: f64,
    /// Average copy throughput in MB/s
    pub average_copy_mbps: f64,
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// All iterations finished, or a failure was folded into the sentinel
    Completed(BenchmarkResult),
    /// The run was abandoned; no result exists
    Cancelled,
}

/// Completed run as reported to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// When the run finished
    pub timestamp: DateTime<Utc>,
    /// Configuration the run was started with
    pub config: BenchmarkConfig,
    /// Averages (or the failure sentinel)
    pub result: BenchmarkResult,
    /// Wall time of the whole run
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
}

impl BenchmarkResult {
    /// Create a result from three averages
    pub fn new(average_read_mbps: f64, average_write_mbps: f64, average_copy_mbps: f64) -> Self {
        Self {
            average_read_mbps,
            average_write_mbps,
            average_copy_mbps,
        }
    }

    /// The uniform failure result
    pub fn failed() -> Self {
        Self::new(FAILURE_SENTINEL, FAILURE_SENTINEL, FAILURE_SENTINEL)
    }

    /// Check whether this result reports a failed run
    pub fn is_failure(&self) -> bool {
        self.average_read_mbps == FAILURE_SENTINEL
            && self.average_write_mbps == FAILURE_SENTINEL
            && self.average_copy_mbps == FAILURE_SENTINEL
    }

    /// Average for a single kind
    pub fn average_for(&self, kind: BenchmarkKind) -> f64 {
        match kind {
            BenchmarkKind::Read => self.average_read_mbps,
            BenchmarkKind::Write => self.average_write_mbps,
            BenchmarkKind::Copy => self.average_copy_mbps,
        }
    }

    /// Get a human-readable summary, one line per kind
    pub fn summary(&self) -> String {
        if self.is_failure() {
            return "Error: Benchmark failed".to_string();
        }

        BenchmarkKind::ALL
            .iter()
            .map(|&kind| format!("{}: {}", title_case(kind), format_throughput(self.average_for(kind))))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RunOutcome {
    /// The result, if the run was not cancelled
    pub fn result(&self) -> Option<BenchmarkResult> {
        match self {
            RunOutcome::Completed(result) => Some(*result),
            RunOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled)
    }
}

impl BenchmarkReport {
    /// Create a report stamped with the current time
    pub fn new(config: BenchmarkConfig, result: BenchmarkResult, elapsed: Duration) -> Self {
        Self {
            timestamp: Utc::now(),
            config,
            result,
            elapsed,
        }
    }
}

fn title_case(kind: BenchmarkKind) -> &'static str {
    match kind {
        BenchmarkKind::Read => "Read",
        BenchmarkKind::Write => "Write",
        BenchmarkKind::Copy => "Copy",
    }
}

/// Elapsed time as fractional seconds in reports
mod duration_serde {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(D::Error::custom)
    }
}
