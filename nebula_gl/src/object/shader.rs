//! Shader objects
//!
//! Compilation failure is an expected, recoverable outcome (bad source), so
//! it travels on the status channel: `compile()` succeeds as a call, and
//! `check_compile_status()` reports the outcome and captures the native
//! diagnostic log. Shaders are not bindable objects.

use crate::driver::{lock_driver, DriverHandle};
use crate::error::{Result, Stage};
use crate::{nebula_debug, nebula_trace, nebula_warn};

use super::handle::{ObjectCategory, RawHandle};

/// Pipeline stage a shader object compiles for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEvaluation,
    Compute,
}

/// Shader object with exclusive handle ownership
///
/// Lifecycle: created for a fixed stage, sourced (repeatedly, re-sourcing
/// replaces), compiled, status-checked. The last failure log is kept and
/// exposed via `error()`.
pub struct Shader {
    driver: DriverHandle,
    handle: RawHandle,
    stage: ShaderStage,
    error_log: String,
}

impl Shader {
    /// Create a shader object for `stage`
    pub fn new(driver: &DriverHandle, stage: ShaderStage) -> Result<Self> {
        let handle = lock_driver(
            driver,
            Stage::Create,
            ObjectCategory::Shader,
            "nebulagl::Shader::new",
        )?
        .create_shader(stage)?;
        nebula_trace!("nebulagl::Shader", "created {:?} shader {}", stage, handle);
        Ok(Self {
            driver: driver.clone(),
            handle,
            stage,
            error_log: String::new(),
        })
    }

    /// Stage this shader compiles for
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Raw native handle (0 after destruction)
    pub fn raw_handle(&self) -> RawHandle {
        self.handle
    }

    /// Whether the handle is live
    pub fn is_valid(&self) -> bool {
        self.handle != 0
    }

    /// Replace the shader source
    ///
    /// Re-sourcing is legal; the previous source is discarded.
    pub fn source(&mut self, text: &str) -> Result<()> {
        lock_driver(
            &self.driver,
            Stage::Source,
            ObjectCategory::Shader,
            "nebulagl::Shader::source",
        )?
        .shader_source(self.handle, text)
    }

    /// Issue the compile call
    ///
    /// `Ok` means the call was issued, not that compilation succeeded -
    /// query the outcome with [`check_compile_status`](Self::check_compile_status).
    pub fn compile(&mut self) -> Result<()> {
        lock_driver(
            &self.driver,
            Stage::Compile,
            ObjectCategory::Shader,
            "nebulagl::Shader::compile",
        )?
        .compile_shader(self.handle)
    }

    /// Query the compile outcome, capturing the diagnostic log on failure
    pub fn check_compile_status(&mut self) -> Result<bool> {
        let mut guard = lock_driver(
            &self.driver,
            Stage::Check,
            ObjectCategory::Shader,
            "nebulagl::Shader::check_compile_status",
        )?;
        let ok = guard.compile_status(self.handle)?;
        if !ok {
            self.error_log = guard.shader_info_log(self.handle)?;
            drop(guard);
            nebula_debug!(
                "nebulagl::Shader",
                "{:?} shader {} failed to compile: {}",
                self.stage,
                self.handle,
                self.error_log
            );
        }
        Ok(ok)
    }

    /// Diagnostic log captured by the last failed status check
    pub fn error(&self) -> &str {
        &self.error_log
    }

    /// Free the native handle now; idempotent
    pub fn destroy(&mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.handle == 0 {
            return Ok(());
        }
        let handle = std::mem::replace(&mut self.handle, 0);
        lock_driver(
            &self.driver,
            Stage::Destroy,
            ObjectCategory::Shader,
            "nebulagl::Shader::destroy",
        )?
        .delete_shader(handle)
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            nebula_warn!("nebulagl::Shader", "destroy failed during drop: {}", err);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
