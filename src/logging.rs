//! File-based tracing setup.
//!
//! reel owns the terminal for streamed answers, so diagnostics go to
//! `reel.log` in the cache directory instead of stderr.

use std::fs::{self, OpenOptions};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;
use crate::constants::{LOG_ENV_VAR, LOG_FILENAME};

/// Installs the global subscriber. The filter comes from `REEL_LOG` and
/// defaults to `info`.
pub fn init_logging() -> Result<()> {
    let dir = Config::cache_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
    let path = dir.join(LOG_FILENAME);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Arc::new(log_file))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    info!(path = %path.display(), "logging initialized");
    Ok(())
}
