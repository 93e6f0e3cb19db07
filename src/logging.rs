//! Log sink setup
//!
//! [`init`] builds a subscriber writing to a timestamped file under the log
//! directory, optionally mirrored to stderr, and returns it as a
//! [`LogHandle`]. Nothing is installed globally; callers run work under the
//! handle with [`LogHandle::in_scope`] or install it themselves.

use crate::error::{Result, SelectorError};
use chrono::Local;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{Dispatch, Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Where and what to log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Directory holding the log files
    pub directory: PathBuf,
    /// `EnvFilter` directive
    pub level: String,
    /// Mirror events to stderr
    pub console: bool,
    /// Prefer `RUST_LOG` over `level` when it parses
    pub use_env: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            level: "model_selector=info".to_string(),
            console: false,
            use_env: false,
        }
    }
}

impl LogConfig {
    /// Defaults, with the filter taken from `RUST_LOG` when set
    pub fn from_env() -> Self {
        Self {
            use_env: true,
            ..Self::default()
        }
    }

    fn filter(&self) -> Result<EnvFilter> {
        if self.use_env {
            if let Ok(filter) = EnvFilter::try_from_default_env() {
                return Ok(filter);
            }
        }
        EnvFilter::try_new(&self.level).map_err(|e| {
            SelectorError::ConfigError(format!("invalid log filter '{}': {}", self.level, e))
        })
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }
}

/// `[ timestamp ] line target - LEVEL - message`
struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "[ {} ] {} {} - {} - ",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            meta.line().unwrap_or(0),
            meta.target(),
            meta.level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// A built log sink
///
/// Dropping the handle, or calling [`LogHandle::teardown`], flushes
/// buffered lines to the file.
pub struct LogHandle {
    dispatch: Dispatch,
    path: PathBuf,
    _guard: WorkerGuard,
}

impl fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHandle").field("path", &self.path).finish()
    }
}

impl LogHandle {
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Log file of this run
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` with this sink as the current default
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Flush and close the sink
    pub fn teardown(self) {
        drop(self);
    }
}

/// Create the log directory and a file named after the current time
pub fn init(config: LogConfig) -> Result<LogHandle> {
    let filter = config.filter()?;

    std::fs::create_dir_all(&config.directory)?;
    let file_name = Local::now().format("%m_%d_%Y_%H_%M_%S.log").to_string();
    let path = config.directory.join(&file_name);

    let appender = tracing_appender::rolling::never(&config.directory, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(false)
        .with_writer(writer);
    let console_layer = config.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer);

    Ok(LogHandle {
        dispatch: Dispatch::new(subscriber),
        path,
        _guard: guard,
    })
}
