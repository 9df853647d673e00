//! File logging. The terminal belongs to the UI, so events go to a daily
//! rolling file under the config directory instead of stdout/stderr.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use mcpchat_core::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub fn log_dir() -> Result<PathBuf> {
    Ok(Config::config_dir()?.join("logs"))
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Keep the guard alive until exit so buffered lines are flushed.
pub fn init(verbose: u8) -> Result<WorkerGuard> {
    let dir = log_dir()?;
    fs::create_dir_all(&dir)?;

    // RUST_LOG overrides the -v flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let appender = tracing_appender::rolling::daily(&dir, "mcpchat.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {}", e))?;

    Ok(guard)
}
