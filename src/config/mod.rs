//! Configuration management module
//!
//! Holds the caller-side benchmark settings (path, size, iterations),
//! the size menus allowed for each path, and loading and saving of the
//! settings file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::BenchmarkRequest;
use crate::{RamBenchError, Result, APP_NAME, CONFIG_FILE};

/// Sizes in MB offered when the accelerated path is selected
pub const ACCELERATED_SIZES_MB: [u32; 6] = [64, 128, 256, 512, 1024, 2048];

/// Sizes in MB offered when the portable path is selected
pub const PORTABLE_SIZES_MB: [u32; 2] = [64, 128];

/// Size picked when switching to the accelerated path from an oversized value
pub const ACCELERATED_FALLBACK_MB: u32 = 256;

pub const MIN_ITERATIONS: u32 = 1;
pub const MAX_ITERATIONS: u32 = 10;

/// Size menu for a path, in ascending order
pub fn available_sizes(use_accelerated: bool) -> &'static [u32] {
    if use_accelerated {
        &ACCELERATED_SIZES_MB
    } else {
        &PORTABLE_SIZES_MB
    }
}

/// Benchmark configuration held by the caller between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Use the accelerated measurement path
    pub use_accelerated: bool,
    /// Buffer size in MB (mebibytes)
    pub size_mb: u32,
    /// Iterations per operation kind
    pub iterations: u32,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            use_accelerated: true,
            size_mb: 256,
            iterations: 5,
        }
    }
}

impl BenchmarkConfig {
    /// Create a new benchmark configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for the portable path at its largest size
    pub fn portable() -> Self {
        Self {
            use_accelerated: false,
            size_mb: 128,
            ..Self::default()
        }
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !available_sizes(self.use_accelerated).contains(&self.size_mb) {
            return Err(RamBenchError::ConfigError(format!(
                "Size {} MB is not available for the {} path (allowed: {:?})",
                self.size_mb,
                self.path_name(),
                available_sizes(self.use_accelerated)
            )));
        }

        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(RamBenchError::ConfigError(format!(
                "Iterations must be between {} and {}",
                MIN_ITERATIONS, MAX_ITERATIONS
            )));
        }

        Ok(())
    }

    /// Human-readable name of the selected path
    pub fn path_name(&self) -> &'static str {
        if self.use_accelerated {
            "accelerated"
        } else {
            "portable"
        }
    }

    /// Sizes allowed for the currently selected path
    pub fn available_sizes(&self) -> &'static [u32] {
        available_sizes(self.use_accelerated)
    }

    /// Switch paths, clamping the size into the new menu
    ///
    /// Switching to portable with more than 128 MB selected clamps to 128;
    /// switching to accelerated with more than 2048 MB clamps to 256.
    pub fn set_use_accelerated(&mut self, use_accelerated: bool) {
        self.use_accelerated = use_accelerated;
        if use_accelerated {
            if self.size_mb > ACCELERATED_SIZES_MB[ACCELERATED_SIZES_MB.len() - 1] {
                self.size_mb = ACCELERATED_FALLBACK_MB;
            }
        } else {
            let largest = PORTABLE_SIZES_MB[PORTABLE_SIZES_MB.len() - 1];
            if self.size_mb > largest {
                self.size_mb = largest;
            }
        }
    }

    /// Select a size from the current path's menu
    pub fn set_size_mb(&mut self, size_mb: u32) -> Result<()> {
        if !self.available_sizes().contains(&size_mb) {
            return Err(RamBenchError::ConfigError(format!(
                "Size {} MB is not available for the {} path",
                size_mb,
                self.path_name()
            )));
        }
        self.size_mb = size_mb;
        Ok(())
    }

    /// Set the iteration count
    pub fn set_iterations(&mut self, iterations: u32) -> Result<()> {
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&iterations) {
            return Err(RamBenchError::ConfigError(format!(
                "Iterations must be between {} and {}",
                MIN_ITERATIONS, MAX_ITERATIONS
            )));
        }
        self.iterations = iterations;
        Ok(())
    }

    /// Set the path without clamping
    pub fn with_use_accelerated(mut self, use_accelerated: bool) -> Self {
        self.use_accelerated = use_accelerated;
        self
    }

    /// Set the buffer size in MB
    pub fn with_size_mb(mut self, size_mb: u32) -> Self {
        self.size_mb = size_mb;
        self
    }

    /// Set the iteration count
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Freeze this configuration into a run request
    pub fn to_request(&self) -> Result<BenchmarkRequest> {
        self.validate()?;
        BenchmarkRequest::from_megabytes(self.use_accelerated, self.size_mb, self.iterations)
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            RamBenchError::ConfigError(format!(
                "Failed to read config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the standard config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RamBenchError::ConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content).map_err(|e| {
            RamBenchError::ConfigError(format!(
                "Failed to write config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/rambench/rambench.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            RamBenchError::ConfigError("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
