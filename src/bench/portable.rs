//! Portable measurement path
//!
//! Byte-at-a-time read and write loops with every element routed through
//! `black_box`, so the optimizer can neither vectorize nor fuse them. Copy
//! is the same single bulk copy the accelerated path uses. Much slower than
//! the accelerated path, which is why only small sizes are offered for it.

use std::hint::black_box;

use crate::bench::engine::{measure_copy, measure_read, measure_write, AccessKernels, MeasurementEngine, PATTERN_PERIOD};
use crate::Result;

/// Scalar engine that runs on every target
#[derive(Debug, Default, Clone, Copy)]
pub struct PortableEngine;

impl PortableEngine {
    pub fn new() -> Self {
        Self
    }
}

impl AccessKernels for PortableEngine {
    fn sum_bytes(&self, buffer: &[u8]) -> u64 {
        let mut sum = 0u64;
        for &byte in buffer {
            sum = sum.wrapping_add(u64::from(black_box(byte)));
        }
        sum
    }

    fn write_pattern(&self, buffer: &mut [u8]) {
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = black_box((i % PATTERN_PERIOD) as u8);
        }
    }

    fn copy_bytes(&self, src: &[u8], dst: &mut [u8]) {
        // One bulk copy, same as the accelerated path
        dst.copy_from_slice(black_box(src));
    }
}

impl MeasurementEngine for PortableEngine {
    fn name(&self) -> &'static str {
        "portable"
    }

    fn read(&self, size_bytes: usize) -> Result<f64> {
        measure_read(self, size_bytes)
    }

    fn write(&self, size_bytes: usize) -> Result<f64> {
        measure_write(self, size_bytes)
    }

    fn copy(&self, size_bytes: usize) -> Result<f64> {
        measure_copy(self, size_bytes)
    }
}
