//! Utility functions module
//!
//! Contains helper functions for unit conversion and formatting of sizes,
//! durations and throughput figures.

pub mod units;

// Re-export commonly used functions
pub use units::{
    calculate_throughput_mbps, format_bytes, format_elapsed, format_throughput,
    mebibytes_to_bytes, MEBIBYTE,
};
