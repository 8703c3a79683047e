//! Tracing setup and archive-read instrumentation
//!
//! Every binary built on zipdelta installs its subscriber through
//! [`init_with_config`]; library code only emits events.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Install the stderr subscriber once per process
///
/// `RUST_LOG` takes precedence over `config.default_level`. Later calls are
/// ignored.
pub fn init_with_config(config: TracingConfig) {
    if TRACING_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
        .is_err()
    {
        return;
    }

    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_source)
        .with_line_number(config.show_source);

    // Tests and embedding applications may own the global subscriber already
    let _ = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init();
}

/// Subscriber options
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub default_level: String,
    /// Print the module path of each event
    pub show_target: bool,
    /// Print thread ids (useful with parallel reads)
    pub show_thread_ids: bool,
    /// Print file and line of each event
    pub show_source: bool,
}

impl TracingConfig {
    /// Map a `-v` count onto a filter and output detail
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        Self {
            default_level: level.to_string(),
            show_target: verbosity >= 2,
            show_thread_ids: verbosity >= 3,
            show_source: verbosity >= 3,
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: "warn,zipdelta=info".to_string(),
            show_target: true,
            show_thread_ids: false,
            show_source: false,
        }
    }
}

#[macro_export]
macro_rules! log_read_start {
    ($reader:expr, $path:expr) => {
        tracing::info!(reader = %$reader, path = %$path.display(), "Reading archive");
    };
}

#[macro_export]
macro_rules! log_read_complete {
    ($reader:expr, $path:expr, $duration:expr, $entries:expr) => {
        tracing::info!(
            reader = %$reader,
            path = %$path.display(),
            duration_ms = %$duration.as_millis(),
            entries = %$entries,
            "Archive listed"
        );
    };
}

#[macro_export]
macro_rules! log_read_error {
    ($reader:expr, $path:expr, $error:expr) => {
        tracing::error!(
            reader = %$reader,
            path = %$path.display(),
            error = %$error,
            "Archive unreadable"
        );
    };
}

/// Run `f` inside a `read_archive` span and log its duration at debug level
pub fn instrument_read<T, F>(reader: &str, path: &Path, f: F) -> T
where
    F: FnOnce() -> T,
{
    let span = tracing::info_span!("read_archive", reader = %reader, path = %path.display());
    let _guard = span.enter();

    let start = Instant::now();
    let result = f();
    tracing::debug!(duration_ms = %start.elapsed().as_millis(), "Central directory read");

    result
}
