//! Handle primitives: categories, bind points, and the shared binding glue
//!
//! A handle is an opaque non-zero integer naming an object inside the
//! driver's own address space, meaningful only together with its category.
//! Handle value 0 means "not allocated" regardless of category; a handle is
//! never reinterpreted across categories.

use std::fmt;

use crate::driver::{lock_driver, Driver, DriverHandle};
use crate::error::{Result, Stage};
use crate::nebula_err;

use super::buffer::BufferTarget;
use super::texture::TextureKind;

/// Raw native handle value (0 = not allocated)
pub type RawHandle = u32;

/// Closed set of object categories
///
/// Each category has its own native allocate/free/bind entry points; the
/// lifecycle funnel below dispatches to them exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectCategory {
    Buffer,
    VertexArray,
    Texture,
    Shader,
    ShaderProgram,
    ShaderUniform,
}

impl ObjectCategory {
    /// Category label used in errors and logs
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectCategory::Buffer => "Buffer",
            ObjectCategory::VertexArray => "VertexArray",
            ObjectCategory::Texture => "Texture",
            ObjectCategory::Shader => "Shader",
            ObjectCategory::ShaderProgram => "ShaderProgram",
            ObjectCategory::ShaderUniform => "ShaderUniform",
        }
    }

    /// Whether handles of this category come from the bulk allocate calls
    ///
    /// Shaders carry a stage payload at creation and programs have their own
    /// single-object call; neither is batch-allocatable.
    pub fn batch_allocatable(self) -> bool {
        matches!(
            self,
            ObjectCategory::Buffer | ObjectCategory::VertexArray | ObjectCategory::Texture
        )
    }

    /// Allocate `count` handles of this category in one native call
    ///
    /// This and `delete_batch` are the only lifecycle paths to the driver
    /// for the batch-allocatable categories; owning objects allocate through
    /// them with `count == 1`.
    pub(crate) fn create_batch(
        self,
        driver: &mut dyn Driver,
        count: usize,
    ) -> Result<Vec<RawHandle>> {
        match self {
            ObjectCategory::Buffer => driver.create_buffers(count),
            ObjectCategory::VertexArray => driver.create_vertex_arrays(count),
            ObjectCategory::Texture => driver.create_textures(count),
            _ => Err(nebula_err!(
                Stage::Create,
                self,
                "nebulagl::ObjectCategory::create_batch",
                "{} objects are not batch-allocatable",
                self
            )),
        }
    }

    /// Release handles of this category in one native call
    pub(crate) fn delete_batch(self, driver: &mut dyn Driver, handles: &[RawHandle]) -> Result<()> {
        match self {
            ObjectCategory::Buffer => driver.delete_buffers(handles),
            ObjectCategory::VertexArray => driver.delete_vertex_arrays(handles),
            ObjectCategory::Texture => driver.delete_textures(handles),
            _ => Err(nebula_err!(
                Stage::Destroy,
                self,
                "nebulagl::ObjectCategory::delete_batch",
                "{} objects are not batch-deletable",
                self
            )),
        }
    }
}

impl fmt::Display for ObjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw handle tagged with its category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    raw: RawHandle,
    category: ObjectCategory,
}

impl Handle {
    /// Tag a raw handle with its category
    pub fn new(raw: RawHandle, category: ObjectCategory) -> Self {
        Self { raw, category }
    }

    /// Raw native handle value
    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    /// Category this handle belongs to
    pub fn category(&self) -> ObjectCategory {
        self.category
    }

    /// Whether the handle names a live native object
    pub fn is_allocated(&self) -> bool {
        self.raw != 0
    }
}

/// Closed set of native bind points
///
/// The underlying API holds one "currently bound handle" per bind point,
/// process-wide. Binding an object implicitly replaces whatever was bound at
/// the same point; nothing here tracks or restores previous bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindPoint {
    /// Buffer binding, per target
    Buffer(BufferTarget),
    /// Vertex array binding
    VertexArray,
    /// Program use
    Program,
    /// Texture binding, per texture kind
    Texture(TextureKind),
}

impl BindPoint {
    /// Category of the objects bound at this point
    pub fn category(self) -> ObjectCategory {
        match self {
            BindPoint::Buffer(_) => ObjectCategory::Buffer,
            BindPoint::VertexArray => ObjectCategory::VertexArray,
            BindPoint::Program => ObjectCategory::ShaderProgram,
            BindPoint::Texture(_) => ObjectCategory::Texture,
        }
    }
}

/// Shared behavior of bindable GL objects (owning or view)
///
/// `bind` validates first and issues exactly one native bind call;
/// an object that is not in a bindable state produces a `Stage::Type`
/// error with no native side effect.
pub trait GlObject {
    /// Raw native handle (0 after destruction)
    fn raw_handle(&self) -> RawHandle;

    /// Category of this object
    fn category(&self) -> ObjectCategory;

    /// Driver this object was created against
    fn driver_handle(&self) -> &DriverHandle;

    /// Bind point for this object
    ///
    /// Fails with `Stage::Type` when the descriptor needed to choose the
    /// point is not set (e.g. an array slot without a descriptor).
    fn bind_point(&self) -> Result<BindPoint>;

    /// Whether the object is usable: descriptor consistent and handle live
    fn is_valid(&self) -> bool;

    /// Category-tagged handle
    fn handle(&self) -> Handle {
        Handle::new(self.raw_handle(), self.category())
    }

    /// Make this object current at its bind point
    fn bind(&self) -> Result<()> {
        let point = self.bind_point()?;
        if !self.is_valid() {
            return Err(nebula_err!(
                Stage::Type,
                self.category(),
                "nebulagl::GlObject::bind",
                "object is not in a bindable state"
            ));
        }
        lock_driver(
            self.driver_handle(),
            Stage::Bind,
            self.category(),
            "nebulagl::GlObject::bind",
        )?
        .bind(point, self.raw_handle())
    }

    /// Clear the binding at this object's bind point
    fn unbind(&self) -> Result<()> {
        let point = self.bind_point()?;
        lock_driver(
            self.driver_handle(),
            Stage::Unbind,
            self.category(),
            "nebulagl::GlObject::unbind",
        )?
        .unbind(point)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
