//! Uniform handles and the typed upload dispatch
//!
//! The native API has no generic "set uniform" entry point - type and shape
//! select the call. [`UniformKind`] is the closed table of supported shapes;
//! `Uniform::set_data` validates the payload against the kind and forwards
//! to exactly one native upload variant.

use crate::driver::{lock_driver, DriverHandle};
use crate::error::{Result, Stage};
use crate::nebula_err;

use super::handle::ObjectCategory;

/// Uniform location inside a program
///
/// The native unresolved sentinel (-1) is representable: resolving an
/// unknown name does not fail, and uploads to an unresolved location are
/// ignored by the native API. Check [`is_resolved`](Self::is_resolved)
/// before relying on a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(i32);

impl UniformLocation {
    /// The native "name not found" sentinel
    pub const UNRESOLVED: UniformLocation = UniformLocation(-1);

    /// Wrap a native location value
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Native location value
    pub fn value(&self) -> i32 {
        self.0
    }

    /// Whether the location names a real uniform
    pub fn is_resolved(&self) -> bool {
        self.0 >= 0
    }
}

/// Scalar class of a uniform payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformScalar {
    I32,
    F32,
    F64,
}

/// Closed set of uniform shapes: scalar/vector/matrix crossed with
/// int/float/double
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    I32,
    F32,
    F64,
    IVec2,
    IVec3,
    IVec4,
    FVec2,
    FVec3,
    FVec4,
    DVec2,
    DVec3,
    DVec4,
    FMat2,
    FMat3,
    FMat4,
    DMat2,
    DMat3,
    DMat4,
}

impl UniformKind {
    /// Scalar class of this kind
    pub fn scalar(self) -> UniformScalar {
        match self {
            UniformKind::I32 | UniformKind::IVec2 | UniformKind::IVec3 | UniformKind::IVec4 => {
                UniformScalar::I32
            }
            UniformKind::F32
            | UniformKind::FVec2
            | UniformKind::FVec3
            | UniformKind::FVec4
            | UniformKind::FMat2
            | UniformKind::FMat3
            | UniformKind::FMat4 => UniformScalar::F32,
            UniformKind::F64
            | UniformKind::DVec2
            | UniformKind::DVec3
            | UniformKind::DVec4
            | UniformKind::DMat2
            | UniformKind::DMat3
            | UniformKind::DMat4 => UniformScalar::F64,
        }
    }

    /// Scalars per element (vector width or matrix cell count)
    pub fn components(self) -> usize {
        match self {
            UniformKind::I32 | UniformKind::F32 | UniformKind::F64 => 1,
            UniformKind::IVec2 | UniformKind::FVec2 | UniformKind::DVec2 => 2,
            UniformKind::IVec3 | UniformKind::FVec3 | UniformKind::DVec3 => 3,
            UniformKind::IVec4 | UniformKind::FVec4 | UniformKind::DVec4 => 4,
            UniformKind::FMat2 | UniformKind::DMat2 => 4,
            UniformKind::FMat3 | UniformKind::DMat3 => 9,
            UniformKind::FMat4 | UniformKind::DMat4 => 16,
        }
    }

    /// Whether this kind is a matrix shape (transpose applies)
    pub fn is_matrix(self) -> bool {
        matches!(
            self,
            UniformKind::FMat2
                | UniformKind::FMat3
                | UniformKind::FMat4
                | UniformKind::DMat2
                | UniformKind::DMat3
                | UniformKind::DMat4
        )
    }

    /// Name of the one native upload entry point for this kind
    pub fn native_call(self) -> &'static str {
        match self {
            UniformKind::I32 => "Uniform1iv",
            UniformKind::F32 => "Uniform1fv",
            UniformKind::F64 => "Uniform1dv",
            UniformKind::IVec2 => "Uniform2iv",
            UniformKind::IVec3 => "Uniform3iv",
            UniformKind::IVec4 => "Uniform4iv",
            UniformKind::FVec2 => "Uniform2fv",
            UniformKind::FVec3 => "Uniform3fv",
            UniformKind::FVec4 => "Uniform4fv",
            UniformKind::DVec2 => "Uniform2dv",
            UniformKind::DVec3 => "Uniform3dv",
            UniformKind::DVec4 => "Uniform4dv",
            UniformKind::FMat2 => "UniformMatrix2fv",
            UniformKind::FMat3 => "UniformMatrix3fv",
            UniformKind::FMat4 => "UniformMatrix4fv",
            UniformKind::DMat2 => "UniformMatrix2dv",
            UniformKind::DMat3 => "UniformMatrix3dv",
            UniformKind::DMat4 => "UniformMatrix4dv",
        }
    }
}

/// Borrowed uniform payload, typed by scalar class
#[derive(Debug, Clone, Copy)]
pub enum UniformData<'a> {
    I32(&'a [i32]),
    F32(&'a [f32]),
    F64(&'a [f64]),
}

impl UniformData<'_> {
    /// Scalar class of this payload
    pub fn scalar(&self) -> UniformScalar {
        match self {
            UniformData::I32(_) => UniformScalar::I32,
            UniformData::F32(_) => UniformScalar::F32,
            UniformData::F64(_) => UniformScalar::F64,
        }
    }

    /// Number of scalars in the payload
    pub fn scalar_len(&self) -> usize {
        match self {
            UniformData::I32(data) => data.len(),
            UniformData::F32(data) => data.len(),
            UniformData::F64(data) => data.len(),
        }
    }
}

/// One validated uniform upload handed to the driver
///
/// `count` is the element count forwarded unchanged to the native call
/// (array uniforms upload several elements at once); `transpose` only
/// reaches matrix variants.
#[derive(Debug, Clone, Copy)]
pub struct UniformUpload<'a> {
    pub kind: UniformKind,
    pub count: usize,
    pub transpose: bool,
    pub data: UniformData<'a>,
}

/// A resolved (or unresolved) uniform, tagged with its declared kind
pub struct Uniform {
    driver: DriverHandle,
    kind: UniformKind,
    location: UniformLocation,
}

impl Uniform {
    pub(crate) fn new(driver: &DriverHandle, kind: UniformKind, location: UniformLocation) -> Self {
        Self {
            driver: driver.clone(),
            kind,
            location,
        }
    }

    /// Declared kind of this uniform
    pub fn kind(&self) -> UniformKind {
        self.kind
    }

    /// Location inside the program
    pub fn location(&self) -> UniformLocation {
        self.location
    }

    /// Whether the name resolved to a real uniform
    pub fn is_resolved(&self) -> bool {
        self.location.is_resolved()
    }

    /// Upload `count` elements from `data`
    ///
    /// The payload's scalar class must match the declared kind and must hold
    /// at least `count` elements' worth of scalars; the upload then reaches
    /// exactly one native entry point selected by the kind. `transpose` is
    /// forwarded to matrix variants and ignored otherwise.
    pub fn set_data(&self, data: UniformData<'_>, count: usize, transpose: bool) -> Result<()> {
        if data.scalar() != self.kind.scalar() {
            return Err(nebula_err!(
                Stage::Type,
                ObjectCategory::ShaderUniform,
                "nebulagl::Uniform::set_data",
                "{:?} payload does not match uniform kind {:?}",
                data.scalar(),
                self.kind
            ));
        }
        if data.scalar_len() < count * self.kind.components() {
            return Err(nebula_err!(
                Stage::Type,
                ObjectCategory::ShaderUniform,
                "nebulagl::Uniform::set_data",
                "payload holds {} scalars, {} elements of {:?} need {}",
                data.scalar_len(),
                count,
                self.kind,
                count * self.kind.components()
            ));
        }
        lock_driver(
            &self.driver,
            Stage::Source,
            ObjectCategory::ShaderUniform,
            "nebulagl::Uniform::set_data",
        )?
        .set_uniform(
            self.location,
            UniformUpload {
                kind: self.kind,
                count,
                transpose,
                data,
            },
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "uniform_tests.rs"]
mod tests;
