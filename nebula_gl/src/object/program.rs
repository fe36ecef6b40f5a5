//! Program objects
//!
//! Attaching an uncompiled shader is not rejected here - link failure will
//! surface it, and the link outcome travels on the status channel like
//! compilation does for shaders.

use crate::driver::{lock_driver, DriverHandle};
use crate::error::{Result, Stage};
use crate::{nebula_debug, nebula_err, nebula_trace, nebula_warn};

use super::handle::{BindPoint, GlObject, ObjectCategory, RawHandle};
use super::shader::Shader;
use super::uniform::{Uniform, UniformKind};

/// Program object with exclusive handle ownership
///
/// Binding a program makes it the current pipeline (`use`-semantics); the
/// bind point is shared by all programs.
pub struct Program {
    driver: DriverHandle,
    handle: RawHandle,
    error_log: String,
}

impl Program {
    /// Create a program object
    pub fn new(driver: &DriverHandle) -> Result<Self> {
        let handle = lock_driver(
            driver,
            Stage::Create,
            ObjectCategory::ShaderProgram,
            "nebulagl::Program::new",
        )?
        .create_program()?;
        nebula_trace!("nebulagl::Program", "created program {}", handle);
        Ok(Self {
            driver: driver.clone(),
            handle,
            error_log: String::new(),
        })
    }

    /// Attach a shader
    ///
    /// Valid repeatedly for distinct shaders. The shader's compile state is
    /// not checked here.
    pub fn attach(&mut self, shader: &Shader) -> Result<()> {
        if !shader.is_valid() {
            return Err(nebula_err!(
                Stage::Attach,
                ObjectCategory::ShaderProgram,
                "nebulagl::Program::attach",
                "cannot attach a destroyed shader"
            ));
        }
        lock_driver(
            &self.driver,
            Stage::Attach,
            ObjectCategory::ShaderProgram,
            "nebulagl::Program::attach",
        )?
        .attach_shader(self.handle, shader.raw_handle())
    }

    /// Attach several shaders, stopping at the first failure
    pub fn attach_all(&mut self, shaders: &[&Shader]) -> Result<()> {
        for shader in shaders {
            self.attach(shader)?;
        }
        Ok(())
    }

    /// Issue the link call
    ///
    /// `Ok` means the call was issued; query the outcome with
    /// [`check_link_status`](Self::check_link_status).
    pub fn link(&mut self) -> Result<()> {
        lock_driver(
            &self.driver,
            Stage::Link,
            ObjectCategory::ShaderProgram,
            "nebulagl::Program::link",
        )?
        .link_program(self.handle)
    }

    /// Query the link outcome, capturing the diagnostic log on failure
    pub fn check_link_status(&mut self) -> Result<bool> {
        let mut guard = lock_driver(
            &self.driver,
            Stage::Check,
            ObjectCategory::ShaderProgram,
            "nebulagl::Program::check_link_status",
        )?;
        let ok = guard.link_status(self.handle)?;
        if !ok {
            self.error_log = guard.program_info_log(self.handle)?;
            drop(guard);
            nebula_debug!(
                "nebulagl::Program",
                "program {} failed to link: {}",
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

    /// Resolve `name` to a uniform handle declared as `kind`
    ///
    /// An unknown name yields the native unresolved sentinel; check
    /// `Uniform::is_resolved()` before relying on the location.
    pub fn get_uniform(&self, name: &str, kind: UniformKind) -> Result<Uniform> {
        let location = lock_driver(
            &self.driver,
            Stage::Info,
            ObjectCategory::ShaderUniform,
            "nebulagl::Program::get_uniform",
        )?
        .uniform_location(self.handle, name)?;
        Ok(Uniform::new(&self.driver, kind, location))
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
            ObjectCategory::ShaderProgram,
            "nebulagl::Program::destroy",
        )?
        .delete_program(handle)
    }
}

impl GlObject for Program {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }

    fn category(&self) -> ObjectCategory {
        ObjectCategory::ShaderProgram
    }

    fn driver_handle(&self) -> &DriverHandle {
        &self.driver
    }

    fn bind_point(&self) -> Result<BindPoint> {
        Ok(BindPoint::Program)
    }

    fn is_valid(&self) -> bool {
        self.handle != 0
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            nebula_warn!("nebulagl::Program", "destroy failed during drop: {}", err);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "program_tests.rs"]
mod tests;
