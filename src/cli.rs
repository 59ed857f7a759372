//! Command-line interface for the RAM benchmark.

use clap::Parser;

use crate::config::{available_sizes, BenchmarkConfig};
use crate::Result;

/// Measure sustained RAM read, write and copy bandwidth.
///
/// Settings not given on the command line come from the saved
/// configuration file, or the built-in defaults when there is none.
#[derive(Parser, Debug, Default)]
#[command(name = "rambench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use the portable byte-loop path instead of the accelerated one.
    #[arg(long)]
    pub portable: bool,

    /// Force the accelerated path even if the saved configuration says portable.
    #[arg(long, conflicts_with = "portable")]
    pub accelerated: bool,

    /// Buffer size in MB (see --list-sizes).
    #[arg(short = 's', long, value_name = "MB")]
    pub size: Option<u32>,

    /// Iterations per operation (1-10).
    #[arg(short = 'n', long, value_name = "N")]
    pub iterations: Option<u32>,

    /// Print the sizes available for the selected path and exit.
    #[arg(long)]
    pub list_sizes: bool,

    /// Print the result as a JSON report.
    #[arg(long)]
    pub json: bool,

    /// Save the resulting settings as the new defaults.
    #[arg(long)]
    pub save_config: bool,

    /// Verbose output.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply the command-line overrides on top of `base`
    ///
    /// Switching paths clamps the saved size the same way the session does;
    /// an explicit `--size` must then be on the new path's menu.
    pub fn into_config(&self, base: BenchmarkConfig) -> Result<BenchmarkConfig> {
        let mut config = base;

        if self.portable {
            config.set_use_accelerated(false);
        } else if self.accelerated {
            config.set_use_accelerated(true);
        }

        if let Some(size) = self.size {
            config.set_size_mb(size)?;
        }
        if let Some(iterations) = self.iterations {
            config.set_iterations(iterations)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Whether the accelerated path ends up selected for `base`
    pub fn selects_accelerated(&self, base: &BenchmarkConfig) -> bool {
        if self.portable {
            false
        } else if self.accelerated {
            true
        } else {
            base.use_accelerated
        }
    }

    /// Size menu text for `--list-sizes`
    pub fn size_listing(&self, base: &BenchmarkConfig) -> String {
        let use_accelerated = self.selects_accelerated(base);
        let sizes: Vec<String> = available_sizes(use_accelerated)
            .iter()
            .map(|size| size.to_string())
            .collect();
        format!(
            "{} path sizes (MB): {}",
            if use_accelerated { "Accelerated" } else { "Portable" },
            sizes.join(", ")
        )
    }
}
