use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use rambench::bench::AcceleratedEngine;
use rambench::cli::Cli;
use rambench::config::BenchmarkConfig;
use rambench::models::BenchmarkReport;
use rambench::util::{format_bytes, format_elapsed, mebibytes_to_bytes};
use rambench::{error, BenchmarkSession, RamBenchError, Result};

/// Ticks of the progress bar for a full run
const PROGRESS_TICKS: u64 = 1000;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Exiting with error");
            eprintln!("Error: {}", error::user_friendly_message(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let saved = BenchmarkConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring saved configuration");
        BenchmarkConfig::default()
    });

    if cli.list_sizes {
        println!("{}", cli.size_listing(&saved));
        return Ok(());
    }

    let config = cli.into_config(saved)?;
    if config.use_accelerated && !AcceleratedEngine::is_available() {
        return Err(RamBenchError::AcceleratedUnavailable(format!(
            "no vector kernels for {}",
            std::env::consts::ARCH
        )));
    }
    if cli.save_config {
        config.save()?;
        tracing::info!(path = ?BenchmarkConfig::config_file_path().ok(), "Configuration saved");
    }

    if !cli.json {
        println!(
            "RAM benchmark: {} path, {} buffer, {} iteration(s) per test",
            config.path_name(),
            format_bytes(mebibytes_to_bytes(config.size_mb)? as u64),
            config.iterations
        );
    }

    let session = BenchmarkSession::new(config.clone())?;
    let bar = progress_bar(cli.json);
    let mut updates = session.subscribe();
    let render = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let state = updates.borrow_and_update().clone();
                bar.set_position((f64::from(state.progress) * PROGRESS_TICKS as f64) as u64);
                if !state.current_test.is_empty() {
                    bar.set_message(state.current_test);
                }
            }
        })
    };

    let started_at = Instant::now();
    if !session.start_benchmark() {
        render.abort();
        bar.finish_and_clear();
        return Err(RamBenchError::BenchmarkError(
            "Benchmark could not be started".to_string(),
        ));
    }

    let state = tokio::select! {
        state = session.wait_until_idle() => state,
        _ = tokio::signal::ctrl_c() => {
            session.cancel_benchmark();
            render.abort();
            bar.abandon_with_message("Cancelled");
            println!("Benchmark cancelled");
            return Ok(());
        }
    };
    let elapsed = started_at.elapsed();
    render.abort();
    bar.finish_and_clear();

    let result = state.result();
    if cli.json {
        let report = BenchmarkReport::new(config, result, elapsed);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", result.summary());
        println!("Finished in {}", format_elapsed(elapsed));
    }

    Ok(())
}

fn progress_bar(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(PROGRESS_TICKS);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar
}
