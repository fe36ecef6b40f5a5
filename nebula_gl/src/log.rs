//! Logging pipeline for the NebulaGL object layer
//!
//! A small standalone pipeline, independent of the context singleton: every
//! record passes a process-wide severity floor, then reaches the installed
//! [`LogSink`]. The default sink prints one compact colored console line per
//! record; tests install capturing sinks and applications can route records
//! into their own logging stack. Error records carry the source position
//! they were produced at.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use colored::Colorize;

/// Severity of a log record, ordered from chattiest to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-object lifecycle chatter (handle created, handle freed)
    Trace,
    /// Subsystem state changes (snapshot populated, status-check outcomes)
    Debug,
    /// Process-level events (driver registered, driver destroyed)
    Info,
    /// Recoverable trouble (destroy failures during drop)
    Warn,
    /// Structured errors and high-severity driver debug output
    Error,
}

impl LogSeverity {
    /// Fixed-width lowercase label used by the console sink
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "trace",
            LogSeverity::Debug => "debug",
            LogSeverity::Info => "info ",
            LogSeverity::Warn => "warn ",
            LogSeverity::Error => "error",
        }
    }
}

/// Source position a record was produced at
///
/// Attached to error records by `nebula_error!` and available to any caller
/// of [`emit`]; chatter records normally go without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOrigin {
    pub file: &'static str,
    pub line: u32,
}

/// One record flowing through the pipeline
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Subsystem that produced the record (e.g. "nebulagl::Buffer")
    pub scope: String,
    pub message: String,
    /// Where the record was produced, when known
    pub origin: Option<CallOrigin>,
}

/// Destination for log records
///
/// Implement this to route records into a file, a test capture buffer, or
/// an application-wide logging stack.
///
/// # Example
///
/// ```no_run
/// use nebula_gl::nebulagl::log::{LogRecord, LogSink};
///
/// struct StderrSink;
///
/// impl LogSink for StderrSink {
///     fn write(&self, record: &LogRecord) {
///         eprintln!("{}: {}", record.scope, record.message);
///     }
/// }
///
/// nebula_gl::log::set_sink(StderrSink);
/// ```
pub trait LogSink: Send + Sync {
    /// Consume one record that already passed the severity floor
    fn write(&self, record: &LogRecord);
}

/// Default sink: one compact colored line per record
///
/// Shape: `HH:MM:SS.mmm level scope message`, with ` @ file:line` appended
/// when the record carries an origin.
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write(&self, record: &LogRecord) {
        let time: DateTime<Local> = record.timestamp.into();
        let clock = time.format("%H:%M:%S%.3f").to_string();

        let label = match record.severity {
            LogSeverity::Trace => record.severity.label().bright_black(),
            LogSeverity::Debug => record.severity.label().blue(),
            LogSeverity::Info => record.severity.label().green(),
            LogSeverity::Warn => record.severity.label().yellow().bold(),
            LogSeverity::Error => record.severity.label().red().bold(),
        };

        let line = format!(
            "{} {} {} {}",
            clock.bright_black(),
            label,
            record.scope.cyan(),
            record.message
        );

        match record.origin {
            Some(origin) => println!("{} @ {}:{}", line, origin.file, origin.line),
            None => println!("{}", line),
        }
    }
}

// ===== PIPELINE STATE =====

/// Process-wide pipeline: installed sink plus severity floor
struct Pipeline {
    sink: RwLock<Box<dyn LogSink>>,
    floor: RwLock<LogSeverity>,
}

static PIPELINE: OnceLock<Pipeline> = OnceLock::new();

fn pipeline() -> &'static Pipeline {
    PIPELINE.get_or_init(|| Pipeline {
        sink: RwLock::new(Box::new(ConsoleSink)),
        floor: RwLock::new(default_severity_floor()),
    })
}

/// Initial severity floor: everything in debug builds, `Info` and up
/// otherwise
pub fn default_severity_floor() -> LogSeverity {
    if cfg!(debug_assertions) {
        LogSeverity::Trace
    } else {
        LogSeverity::Info
    }
}

/// Replace the process-wide sink
pub fn set_sink<S: LogSink + 'static>(sink: S) {
    if let Ok(mut installed) = pipeline().sink.write() {
        *installed = Box::new(sink);
    }
}

/// Restore the default console sink
pub fn reset_sink() {
    if let Ok(mut installed) = pipeline().sink.write() {
        *installed = Box::new(ConsoleSink);
    }
}

/// Raise or lower the severity floor
///
/// Records below the floor are dropped before they reach the sink; the
/// logging macros skip even the message formatting for them.
pub fn set_severity_floor(floor: LogSeverity) {
    if let Ok(mut current) = pipeline().floor.write() {
        *current = floor;
    }
}

/// Current severity floor
pub fn severity_floor() -> LogSeverity {
    pipeline()
        .floor
        .read()
        .map(|floor| *floor)
        .unwrap_or(LogSeverity::Error)
}

/// Whether records at `severity` currently pass the floor
pub fn enabled(severity: LogSeverity) -> bool {
    severity >= severity_floor()
}

/// Build a record and hand it to the sink if it passes the floor
pub fn emit(severity: LogSeverity, scope: &str, message: String, origin: Option<CallOrigin>) {
    if !enabled(severity) {
        return;
    }
    let record = LogRecord {
        severity,
        timestamp: SystemTime::now(),
        scope: scope.to_string(),
        message,
        origin,
    };
    if let Ok(sink) = pipeline().sink.read() {
        sink.write(&record);
    }
}

// ===== LOGGING MACROS =====

/// Log at an explicit severity; the message is not formatted when the
/// severity is below the floor
///
/// # Example
///
/// ```no_run
/// # use nebula_gl::nebula_log;
/// nebula_log!(nebula_gl::log::LogSeverity::Info, "nebulagl::Context", "driver registered");
/// ```
#[macro_export]
macro_rules! nebula_log {
    ($severity:expr, $scope:expr, $($arg:tt)*) => {{
        let severity = $severity;
        if $crate::log::enabled(severity) {
            $crate::log::emit(severity, $scope, format!($($arg)*), None);
        }
    }};
}

/// Log per-object lifecycle chatter
///
/// # Example
///
/// ```no_run
/// # use nebula_gl::nebula_trace;
/// nebula_trace!("nebulagl::Buffer", "created buffer {}", 1);
/// ```
#[macro_export]
macro_rules! nebula_trace {
    ($scope:expr, $($arg:tt)*) => {
        $crate::nebula_log!($crate::log::LogSeverity::Trace, $scope, $($arg)*)
    };
}

/// Log subsystem state changes
#[macro_export]
macro_rules! nebula_debug {
    ($scope:expr, $($arg:tt)*) => {
        $crate::nebula_log!($crate::log::LogSeverity::Debug, $scope, $($arg)*)
    };
}

/// Log process-level events
#[macro_export]
macro_rules! nebula_info {
    ($scope:expr, $($arg:tt)*) => {
        $crate::nebula_log!($crate::log::LogSeverity::Info, $scope, $($arg)*)
    };
}

/// Log recoverable trouble
#[macro_export]
macro_rules! nebula_warn {
    ($scope:expr, $($arg:tt)*) => {
        $crate::nebula_log!($crate::log::LogSeverity::Warn, $scope, $($arg)*)
    };
}

/// Log an error record carrying the source position of the call site
///
/// # Example
///
/// ```no_run
/// # use nebula_gl::nebula_error;
/// nebula_error!("nebulagl::Context", "no driver registered");
/// ```
#[macro_export]
macro_rules! nebula_error {
    ($scope:expr, $($arg:tt)*) => {
        if $crate::log::enabled($crate::log::LogSeverity::Error) {
            $crate::log::emit(
                $crate::log::LogSeverity::Error,
                $scope,
                format!($($arg)*),
                Some($crate::log::CallOrigin {
                    file: file!(),
                    line: line!(),
                }),
            );
        }
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
