//! Logging setup and utilities.

use std::path::Path;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// How much the run should say, collapsed from the CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// No logging at all; beats every other option
    Quiet,
    /// Info-level progress
    Normal,
    /// Debug logging
    Debug,
}

impl Verbosity {
    /// Collapse the two CLI flags; quiet wins over verbose.
    #[must_use]
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Debug
        } else {
            Self::Normal
        }
    }

    const fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "off",
            Self::Normal => "info",
            Self::Debug => "debug",
        }
    }
}

/// Initialize the structured logging system.
///
/// Returns the file appender guard when a log file is configured; dropping
/// it stops the background writer, so hold it for the life of the run.
pub fn init_logging(verbosity: Verbosity, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Quiet is absolute; otherwise the environment may widen the filter.
    let env_filter = if verbosity == Verbosity::Quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(verbosity.directive()))
            .map_err(|e| anyhow::anyhow!("Failed to create log filter: {}", e))?
    };

    // Create registry
    let registry = Registry::default().with(env_filter);

    // Add console layer
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true);

    // Add file layer if a log file is specified
    if let Some(log_path) = log_file {
        let file_appender = rolling::never(
            log_path.parent().unwrap_or(Path::new(".")),
            log_path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("archiver.log")),
        );
        let (non_blocking_appender, guard) = non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(true)
            .json();

        registry.with(console_layer).with(file_layer).init();
        info!("Logging system initialized");
        Ok(Some(guard))
    } else {
        registry.with(console_layer).init();
        info!("Logging system initialized");
        Ok(None)
    }
}

/// Performance timing utilities
pub struct OperationTimer {
    operation: String,
    start: std::time::Instant,
}

impl OperationTimer {
    /// Start timing a named operation.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: std::time::Instant::now(),
        }
    }

    /// Stop the timer and log the elapsed time at info level.
    pub fn finish(self) -> u128 {
        let duration = self.start.elapsed().as_millis();
        tracing::info!(
            operation = self.operation,
            duration_ms = duration,
            "Operation completed"
        );
        duration
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            let duration = self.start.elapsed().as_millis();
            tracing::debug!(
                operation = self.operation,
                duration_ms = duration,
                "Operation finished"
            );
        }
    }
}
