//! Units formatting and conversion utilities
//!
//! Sizes are mebibyte based throughout: 1 MB = 1,048,576 bytes, and
//! throughput is reported in MB/s on the same convention.

use std::time::Duration;

use byte_unit::{Byte, UnitType};

use crate::{RamBenchError, Result, FAILURE_SENTINEL};

/// Bytes per mebibyte
pub const MEBIBYTE: usize = 1024 * 1024;

/// Shortest elapsed time used as a divisor
///
/// A timed region that the clock reports as zero is treated as having
/// taken one nanosecond, so every completed measurement yields a finite,
/// strictly positive figure.
pub const MIN_ELAPSED: Duration = Duration::from_nanos(1);

/// Convert mebibytes to bytes, rejecting sizes that overflow `usize`
///
/// # Examples
/// ```
/// use rambench::util::units::mebibytes_to_bytes;
///
/// assert_eq!(mebibytes_to_bytes(64).unwrap(), 67_108_864);
/// ```
pub fn mebibytes_to_bytes(size_mb: u32) -> Result<usize> {
    usize::try_from(size_mb)
        .ok()
        .and_then(|mb| mb.checked_mul(MEBIBYTE))
        .ok_or_else(|| {
            RamBenchError::InvalidSize(format!("{} MB does not fit in memory addresses", size_mb))
        })
}

/// Calculate throughput in MB/s from bytes and elapsed time
///
/// Elapsed time is clamped to [`MIN_ELAPSED`].
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use rambench::util::units::calculate_throughput_mbps;
///
/// let mbps = calculate_throughput_mbps(2 * 1024 * 1024, Duration::from_secs(2));
/// assert!((mbps - 1.0).abs() < 1e-9);
/// ```
pub fn calculate_throughput_mbps(bytes: usize, elapsed: Duration) -> f64 {
    let elapsed_secs = elapsed.max(MIN_ELAPSED).as_secs_f64();
    (bytes as f64 / MEBIBYTE as f64) / elapsed_secs
}

/// Format a throughput figure as `1234.56 MB/s`
///
/// The failure sentinel is rendered as `failed`.
pub fn format_throughput(mbps: f64) -> String {
    if mbps == FAILURE_SENTINEL {
        "failed".to_string()
    } else {
        format!("{:.2} MB/s", mbps)
    }
}

/// Format bytes into a human-readable binary size
pub fn format_bytes(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{:.1}", adjusted)
}

/// Format a run's wall time, e.g. `1s 500ms`
pub fn format_elapsed(elapsed: Duration) -> String {
    // Sub-millisecond noise is not worth printing
    let truncated = Duration::from_millis(elapsed.as_millis() as u64);
    humantime::format_duration(truncated).to_string()
}
