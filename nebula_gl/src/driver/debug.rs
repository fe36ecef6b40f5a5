//! Asynchronous driver debug-message plumbing
//!
//! Debug contexts deliver `{source, type, severity, id, message}` records
//! through a native callback. This module owns the known-noisy ID filter and
//! the routing of surviving messages to the logger. Diagnostic only - no
//! functional behavior depends on it.

use std::fmt;

use crate::log::LogSeverity;

/// Origin of a debug message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSource {
    Api,
    WindowSystem,
    ShaderCompiler,
    ThirdParty,
    Application,
    Other,
}

/// Classification of a debug message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugKind {
    Error,
    DeprecatedBehavior,
    UndefinedBehavior,
    Portability,
    Performance,
    Marker,
    PushGroup,
    PopGroup,
    Other,
}

/// Severity of a debug message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    High,
    Medium,
    Low,
    Notification,
}

/// One debug record delivered by the driver
#[derive(Debug, Clone)]
pub struct DebugMessage {
    pub source: DebugSource,
    pub kind: DebugKind,
    pub severity: DebugSeverity,
    pub id: u32,
    pub message: String,
}

impl fmt::Display for DebugMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}/{:?} ({:?}, id {}): {}",
            self.source, self.kind, self.severity, self.id, self.message
        )
    }
}

/// Sink a backend invokes for each debug record it receives
pub type DebugSink = Box<dyn Fn(DebugMessage) + Send + Sync>;

/// Driver message IDs that carry no signal (buffer placement notifications
/// and similar), dropped before logging
pub const IGNORED_MESSAGE_IDS: [u32; 4] = [131169, 131185, 131218, 131204];

/// Whether a message ID is on the known-noisy list
pub fn is_noisy(id: u32) -> bool {
    IGNORED_MESSAGE_IDS.contains(&id)
}

/// Default sink: drop known-noisy IDs, log everything else
///
/// Install with `Driver::install_debug_callback(Box::new(route))`.
pub fn route(message: DebugMessage) {
    if is_noisy(message.id) {
        return;
    }
    crate::log::emit(
        log_severity(message.severity),
        "nebulagl::driver::debug",
        message.to_string(),
        None,
    );
}

fn log_severity(severity: DebugSeverity) -> LogSeverity {
    match severity {
        DebugSeverity::High => LogSeverity::Error,
        DebugSeverity::Medium => LogSeverity::Warn,
        DebugSeverity::Low => LogSeverity::Info,
        DebugSeverity::Notification => LogSeverity::Debug,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
