//! Logging capability handed to plugins and kernel services.
//!
//! The kernel never installs a subscriber. [`TracingLogger`] forwards to
//! `tracing`, and the host decides where those events end up.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Log levels for kernel and plugin messages.
///
/// # Examples
///
/// ```rust
/// use hearth_kernel::logging::{KernelLogger, LogLevel, TracingLogger};
///
/// let logger = TracingLogger::new("economy");
/// logger.log(LogLevel::Info, "Bank opened", None, &[("accounts", "12".to_string())]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Very detailed trace information
    Trace,
    /// Detailed information for debugging
    Debug,
    /// General informational messages
    Info,
    /// Warning conditions that should be investigated
    Warn,
    /// Errors that need attention
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// Named logger capability.
pub trait KernelLogger: Send + Sync {
    fn name(&self) -> &str;

    /// Emits one record. `context` carries structured key/value pairs.
    fn log(&self, level: LogLevel, message: &str, error: Option<&dyn Error>, context: &[(&str, String)]);

    fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message, None, &[]);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None, &[]);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None, &[]);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, None, &[]);
    }

    fn error(&self, message: &str, error: Option<&dyn Error>) {
        self.log(LogLevel::Error, message, error, &[]);
    }
}

/// Creates named loggers.
pub trait LoggerFactory: Send + Sync {
    fn logger(&self, name: &str) -> Arc<dyn KernelLogger>;
}

/// Logger that forwards to `tracing` with `logger`, `context` and `error` fields.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    name: String,
}

impl TracingLogger {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

fn render_context(context: &[(&str, String)]) -> String {
    context
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl KernelLogger for TracingLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&self, level: LogLevel, message: &str, err: Option<&dyn Error>, context: &[(&str, String)]) {
        let logger = self.name.as_str();
        let context = render_context(context);
        let err = err.map(ToString::to_string);
        match level {
            LogLevel::Error => error!(logger, context, error = ?err, "{}", message),
            LogLevel::Warn => warn!(logger, context, error = ?err, "{}", message),
            LogLevel::Info => info!(logger, context, error = ?err, "{}", message),
            LogLevel::Debug => debug!(logger, context, error = ?err, "{}", message),
            LogLevel::Trace => trace!(logger, context, error = ?err, "{}", message),
        }
    }
}

/// [`LoggerFactory`] producing [`TracingLogger`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLoggerFactory;

impl LoggerFactory for TracingLoggerFactory {
    fn logger(&self, name: &str) -> Arc<dyn KernelLogger> {
        Arc::new(TracingLogger::new(name))
    }
}
