//! Measurement engine
//!
//! Each measurement allocates its own buffers, performs an un-timed warm-up
//! so the pages are committed, then times exactly one sequential access
//! pass and converts the elapsed time into MB/s. The accelerated and the
//! portable engine share these routines and differ only in the
//! [`AccessKernels`] they plug in, so both paths time the same work.

use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::bench::accelerated::AcceleratedEngine;
use crate::bench::portable::PortableEngine;
use crate::models::BenchmarkKind;
use crate::util::units::calculate_throughput_mbps;
use crate::{RamBenchError, Result};

/// Byte written into read and copy-source buffers before timing starts
pub const FILL_BYTE: u8 = 1;

/// Period of the write pattern: offset `i` receives `i % PATTERN_PERIOD`
pub const PATTERN_PERIOD: usize = 128;

/// A source of single-run bandwidth samples
///
/// Every operation takes a buffer size in bytes and returns one throughput
/// sample in MB/s. Implementations must not share mutable state between
/// calls.
pub trait MeasurementEngine: Send + Sync {
    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Timed sequential read of a warmed buffer
    fn read(&self, size_bytes: usize) -> Result<f64>;

    /// Timed sequential pattern write
    fn write(&self, size_bytes: usize) -> Result<f64>;

    /// Timed bulk copy between two buffers
    fn copy(&self, size_bytes: usize) -> Result<f64>;

    /// Dispatch on the benchmark kind
    fn measure(&self, kind: BenchmarkKind, size_bytes: usize) -> Result<f64> {
        match kind {
            BenchmarkKind::Read => self.read(size_bytes),
            BenchmarkKind::Write => self.write(size_bytes),
            BenchmarkKind::Copy => self.copy(size_bytes),
        }
    }
}

/// The inner loops of a measurement path
///
/// Kernels must leave identical buffer contents and return identical sums
/// whichever path runs them.
pub trait AccessKernels {
    /// Sum every byte of `buffer` in order
    fn sum_bytes(&self, buffer: &[u8]) -> u64;

    /// Store `i % PATTERN_PERIOD` at every offset `i`
    fn write_pattern(&self, buffer: &mut [u8]);

    /// Copy `src` into `dst`; both have the same length
    fn copy_bytes(&self, src: &[u8], dst: &mut [u8]);
}

/// Pick the engine for a path
///
/// Selecting the accelerated path runs its one-time capability probe and
/// fails with [`RamBenchError::AcceleratedUnavailable`] when it is missing.
pub fn select_engine(use_accelerated: bool) -> Result<Arc<dyn MeasurementEngine>> {
    if use_accelerated {
        Ok(Arc::new(AcceleratedEngine::initialize()?))
    } else {
        Ok(Arc::new(PortableEngine::new()))
    }
}

/// Allocate `size_bytes` filled with `fill`
///
/// The allocation is fallible: an unsatisfiable size becomes
/// [`RamBenchError::AllocationError`] instead of an abort. Filling touches
/// every page, which is what keeps first-touch faults out of the timed
/// region.
pub fn allocate_buffer(size_bytes: usize, fill: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size_bytes)
        .map_err(|_| RamBenchError::AllocationError {
            requested: size_bytes,
        })?;
    buffer.resize(size_bytes, fill);
    Ok(buffer)
}

/// Time one summation pass over `buffer`, returning the sum and elapsed time
pub fn timed_read<K: AccessKernels + ?Sized>(kernels: &K, buffer: &[u8]) -> (u64, Duration) {
    let start = Instant::now();
    let sum = black_box(kernels.sum_bytes(black_box(buffer)));
    (sum, start.elapsed())
}

/// Time one pattern-write pass over `buffer`
pub fn timed_write<K: AccessKernels + ?Sized>(kernels: &K, buffer: &mut [u8]) -> Duration {
    let start = Instant::now();
    kernels.write_pattern(black_box(&mut *buffer));
    black_box(&*buffer);
    start.elapsed()
}

/// Time one bulk copy of `src` into `dst`
pub fn timed_copy<K: AccessKernels + ?Sized>(kernels: &K, src: &[u8], dst: &mut [u8]) -> Result<Duration> {
    if src.len() != dst.len() {
        return Err(RamBenchError::BenchmarkError(format!(
            "Copy buffers differ in length: {} vs {}",
            src.len(),
            dst.len()
        )));
    }

    let start = Instant::now();
    kernels.copy_bytes(black_box(src), black_box(&mut *dst));
    black_box(&*dst);
    Ok(start.elapsed())
}

/// Full read measurement: allocate, warm, time, convert
pub fn measure_read<K: AccessKernels + ?Sized>(kernels: &K, size_bytes: usize) -> Result<f64> {
    ensure_positive(size_bytes)?;
    let buffer = allocate_buffer(size_bytes, FILL_BYTE)?;
    let (_sum, elapsed) = timed_read(kernels, &buffer);
    Ok(calculate_throughput_mbps(size_bytes, elapsed))
}

/// Full write measurement
pub fn measure_write<K: AccessKernels + ?Sized>(kernels: &K, size_bytes: usize) -> Result<f64> {
    ensure_positive(size_bytes)?;
    let mut buffer = allocate_buffer(size_bytes, 0)?;
    let elapsed = timed_write(kernels, &mut buffer);
    Ok(calculate_throughput_mbps(size_bytes, elapsed))
}

/// Full copy measurement
pub fn measure_copy<K: AccessKernels + ?Sized>(kernels: &K, size_bytes: usize) -> Result<f64> {
    ensure_positive(size_bytes)?;
    let src = allocate_buffer(size_bytes, FILL_BYTE)?;
    let mut dst = allocate_buffer(size_bytes, 0)?;
    let elapsed = timed_copy(kernels, &src, &mut dst)?;
    Ok(calculate_throughput_mbps(size_bytes, elapsed))
}

fn ensure_positive(size_bytes: usize) -> Result<()> {
    if size_bytes == 0 {
        return Err(RamBenchError::InvalidSize(
            "Buffer size must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
