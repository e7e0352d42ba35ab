//! Per-run logging setup for the CLI binaries.
//!
//! Each binary constructs its subscriber explicitly at startup: a console
//! layer on stderr plus a plain-text layer into
//! `{log_dir}/{stage}_{timestamp}.log`. One log file per run keeps files
//! bounded without a size-based rotation policy, and the timestamped name
//! makes batch runs trivially diffable after the fact.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber for one stage run and return the log file
/// path. `RUST_LOG` overrides the default `info` filter.
pub fn init(log_dir: &Path, stage: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;
    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let log_path = log_dir.join(format!("{stage}_{timestamp}.log"));
    let log_file = File::create(&log_path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();

    Ok(log_path)
}
