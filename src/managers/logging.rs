//! Logging manager
//!
//! Provides the dual-output run log:
//! - Console: INFO level, colored
//! - File: append-only, single fixed file (rotation is the host's concern)
//!
//! Both sinks share the `YYYY/MM/DD HH:MM:SS` timestamp format so the file
//! and the console tell the same linear story of a run.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Path of the persistent log file
    pub log_file: PathBuf,
    /// Log level for file output (console always uses INFO)
    pub log_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("/var/log/db-archiver.log"),
            log_level: Level::DEBUG,
        }
    }
}

impl LoggingConfig {
    /// Create from config values
    pub fn from_settings(settings: &crate::config::LoggingSettings) -> Self {
        let level = match settings.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" | "warning" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        Self {
            log_file: crate::config::expand_tilde(&settings.log_file),
            log_level: level,
        }
    }
}

/// Initialize logging with console and file outputs
///
/// Returns a guard that must be kept alive for the duration of the program.
/// When the guard is dropped, any remaining log lines are flushed to disk.
/// That holds on every exit path, success or fatal error; wrap the guard
/// with [`flush_on_signal`] to extend the same promise to SIGTERM/SIGINT.
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard> {
    let (log_dir, file_name) = split_log_path(&config.log_file)?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;

    // Append-only file appender, no rotation
    let file_appender = rolling::never(&log_dir, file_name);
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    // File layer: configured level, no colors
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(level_filter(config.log_level));

    // Console layer: INFO level, colored
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_ansi(true)
        .with_target(false)
        .with_level(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(level_filter(Level::INFO));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

/// Initialize simple console-only logging (for commands that never touch
/// the backup directory)
pub fn init_console_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_target(false)
        .with_level(true)
        .init();
}

/// Create a level filter for tracing layers
fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("db_archiver={}", level))
            .add_directive(format!("{}", level).parse().unwrap())
    })
}

/// Split a log file path into (directory, file name)
fn split_log_path(path: &Path) -> Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log path has no file name: {:?}", path))?
        .to_string_lossy()
        .to_string();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, file_name))
}

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any remaining logs to disk.
pub struct LogGuard {
    _file_guard: WorkerGuard,
}

/// Wrap the log guard so a termination signal still flushes the file sink
///
/// SIGTERM or SIGINT would otherwise kill the process with log lines
/// still sitting in the non-blocking writer's buffer. The watcher thread
/// takes the guard, records the interruption, and exits non-zero once
/// the flush has happened. Structured exits release the guard through
/// the wrapper's own drop, same as before.
pub fn flush_on_signal(guard: LogGuard) -> SignalGuard {
    let slot = Arc::new(Mutex::new(Some(guard)));

    #[cfg(unix)]
    {
        let watcher_slot = Arc::clone(&slot);
        std::thread::spawn(move || {
            if wait_for_termination().is_ok() {
                tracing::error!("Interrupted by signal, shutting down");
                if let Ok(mut slot) = watcher_slot.lock() {
                    slot.take();
                }
                std::process::exit(1);
            }
        });
    }

    SignalGuard { slot }
}

#[cfg(unix)]
fn wait_for_termination() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let mut term = signal(SignalKind::terminate())?;
        let mut int = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = term.recv() => {}
            _ = int.recv() => {}
        }
        Ok(())
    })
}

/// Releases the wrapped [`LogGuard`] on a structured exit
pub struct SignalGuard {
    slot: Arc<Mutex<Option<LogGuard>>>,
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.take();
        }
    }
}
