//! Error types for the NebulaGL object layer
//!
//! Every failure is reported as a structured [`Error`] carrying the lifecycle
//! stage at which it was observed, the category of the object involved, the
//! call site, and the native or validation message. Errors enter the logging
//! pipeline at the point of construction, so no failure is silent.

use std::fmt;

use crate::object::ObjectCategory;

/// Result type for NebulaGL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lifecycle stage at which a failure was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Category/descriptor validation failed before any native call
    Type,
    /// Native handle allocation
    Create,
    /// Configuration (parameters, slots, sub-range bookkeeping)
    Setup,
    /// Source/data upload
    Source,
    /// Shader compilation call
    Compile,
    /// Program link call
    Link,
    /// Compile/link status query
    Check,
    /// Native handle release
    Destroy,
    /// Bind call
    Bind,
    /// Bind-to-zero call
    Unbind,
    /// Shader attachment
    Attach,
    /// Diagnostic log retrieval
    Info,
}

impl Stage {
    /// Short stage label used in log and display output
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Type => "Type",
            Stage::Create => "Create",
            Stage::Setup => "Setup",
            Stage::Source => "Source",
            Stage::Compile => "Compile",
            Stage::Link => "Link",
            Stage::Check => "Check",
            Stage::Destroy => "Destroy",
            Stage::Bind => "Bind",
            Stage::Unbind => "Unbind",
            Stage::Attach => "Attach",
            Stage::Info => "Info",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured NebulaGL error
///
/// Created at the point a native or validation failure is observed.
/// The stage/category pair classifies the failure; `call_site` names the
/// operation that observed it.
#[derive(Debug, Clone)]
pub struct Error {
    stage: Stage,
    category: Option<ObjectCategory>,
    call_site: &'static str,
    message: String,
}

impl Error {
    /// Create a new structured error
    ///
    /// # Arguments
    ///
    /// * `stage` - Lifecycle stage at which the failure was observed
    /// * `category` - Object category involved, if any
    /// * `call_site` - The operation reporting the failure
    ///   (e.g. `"nebulagl::Buffer::upload"`)
    /// * `message` - Native or validation message
    pub fn new(
        stage: Stage,
        category: impl Into<Option<ObjectCategory>>,
        call_site: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            category: category.into(),
            call_site,
            message: message.into(),
        }
    }

    /// Stage at which the failure was observed
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Object category involved, if any
    pub fn category(&self) -> Option<ObjectCategory> {
        self.category
    }

    /// Operation that reported the failure
    pub fn call_site(&self) -> &'static str {
        self.call_site
    }

    /// Native or validation message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Push this error through the logging pipeline and return it
    ///
    /// Used by the `nebula_err!`/`nebula_bail!` macros so every constructed
    /// error reaches the sink exactly once.
    pub fn logged(self) -> Self {
        crate::log::emit(
            crate::log::LogSeverity::Error,
            self.call_site,
            self.to_string(),
            None,
        );
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            Some(category) => write!(
                f,
                "[{}:{}] {}: {}",
                self.stage, category, self.call_site, self.message
            ),
            None => write!(f, "[{}] {}: {}", self.stage, self.call_site, self.message),
        }
    }
}

impl std::error::Error for Error {}

/// Build a structured, logged [`Error`] value
///
/// # Example
///
/// ```no_run
/// # use nebula_gl::{nebula_err, error::Stage, object::ObjectCategory};
/// let err = nebula_err!(Stage::Setup, ObjectCategory::Texture,
///     "nebulagl::Texture::setup", "empty parameter list");
/// ```
#[macro_export]
macro_rules! nebula_err {
    ($stage:expr, $category:expr, $site:expr, $($arg:tt)*) => {
        $crate::error::Error::new($stage, $category, $site, format!($($arg)*)).logged()
    };
}

/// Return early with a structured, logged [`Error`]
#[macro_export]
macro_rules! nebula_bail {
    ($stage:expr, $category:expr, $site:expr, $($arg:tt)*) => {
        return Err($crate::nebula_err!($stage, $category, $site, $($arg)*))
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
