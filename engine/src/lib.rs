//! vidmark Core Library
//!
//! Numbered marker overlays for video annotation: a composite drawing that
//! keeps its labels uniquely numbered, fills holes left by deletions, and
//! plugs into a host's hit testing, rendering, undo/redo and persistence.

pub mod core;

use std::path::Path;
use std::sync::OnceLock;

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Log file name prefix inside the log directory
pub const LOG_FILE_NAME: &str = "vidmark.log";

/// Installs the global tracing subscriber.
///
/// Logs go to stdout, and to a daily rolling file when `log_dir` is given.
/// `RUST_LOG` refines the default `info` level. Later calls are no-ops.
pub fn init_logging(log_dir: Option<&Path>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(cfg!(debug_assertions))
        .boxed()];

    if let Some(writer) = log_dir.and_then(rolling_file_writer) {
        layers.push(fmt::layer().with_writer(writer).with_ansi(false).boxed());
    }

    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();
}

/// Non-blocking writer into `dir`, or `None` when the directory is unusable.
fn rolling_file_writer(dir: &Path) -> Option<tracing_appender::non_blocking::NonBlocking> {
    std::fs::create_dir_all(dir).ok()?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(writer)
}
