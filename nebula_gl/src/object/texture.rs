//! Texture objects
//!
//! A texture's kind (dimensionality) selects the upload call: 1D; 2D for
//! 2D and 1D-array; 3D for 3D and 2D-array - array variants reuse the
//! next-higher-dimension call, which is the native convention. Pixel-format
//! words and parameter names are opaque pass-throughs of the native
//! vocabulary.

use crate::driver::capabilities::DriverCapabilities;
use crate::driver::{lock_driver, DriverHandle};
use crate::error::{Result, Stage};
use crate::{nebula_bail, nebula_err, nebula_trace, nebula_warn};

use super::handle::{BindPoint, GlObject, ObjectCategory, RawHandle};

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Tex1D,
    Tex2D,
    Tex3D,
    Tex1DArray,
    Tex2DArray,
    CubeMap,
    CubeMapArray,
}

/// Image upload parameters
///
/// `depth` doubles as the layer count for array textures. Format words
/// (`internal_format`, `format`, `datatype`) are native vocabulary passed
/// through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSpec {
    pub width: usize,
    pub height: usize,
    /// Depth for 3D textures, layer count for array textures
    pub depth: usize,
    /// Mipmap level the upload targets
    pub level: i32,
    pub border: i32,
    pub internal_format: u32,
    pub format: u32,
    pub datatype: u32,
    /// Generate the mipmap chain after a successful upload
    pub generate_mipmaps: bool,
}

/// Integer- and float-valued parameter settings applied by `setup`
///
/// Each entry pairs a native parameter name with its value list; an entry
/// with an empty value list is a configuration error, not a silent skip.
#[derive(Debug, Clone, Default)]
pub struct TextureConfig {
    pub iparams: Vec<(u32, Vec<i32>)>,
    pub fparams: Vec<(u32, Vec<f32>)>,
}

/// Texture object with exclusive handle ownership
///
/// A recorded slot (texture unit) is activated before every bind, in that
/// order - required native sequencing.
pub struct Texture {
    driver: DriverHandle,
    handle: RawHandle,
    kind: TextureKind,
    slot: Option<u32>,
}

impl Texture {
    /// Allocate a texture handle of the given kind
    pub fn new(driver: &DriverHandle, kind: TextureKind) -> Result<Self> {
        let handle = {
            let mut guard = lock_driver(
                driver,
                Stage::Create,
                ObjectCategory::Texture,
                "nebulagl::Texture::new",
            )?;
            ObjectCategory::Texture.create_batch(&mut *guard, 1)?[0]
        };
        nebula_trace!("nebulagl::Texture", "created {:?} texture {}", kind, handle);
        Ok(Self {
            driver: driver.clone(),
            handle,
            kind,
            slot: None,
        })
    }

    /// Texture kind (dimensionality)
    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    /// Recorded texture unit, if any
    pub fn slot(&self) -> Option<u32> {
        self.slot
    }

    /// Record the texture unit this texture binds to
    ///
    /// Checked against the process-wide capability snapshot; an index past
    /// the driver limit fails before touching the native API.
    pub fn set_slot(&mut self, slot: u32) -> Result<()> {
        let caps = DriverCapabilities::snapshot(&self.driver)?;
        if slot >= caps.max_texture_slots {
            nebula_bail!(
                Stage::Setup,
                ObjectCategory::Texture,
                "nebulagl::Texture::set_slot",
                "invalid slot index: {} exceeds the driver limit of {}",
                slot,
                caps.max_texture_slots
            );
        }
        self.slot = Some(slot);
        Ok(())
    }

    /// Upload pixel data, dispatched by dimensionality
    ///
    /// Binds, issues the one upload call matching the kind, then generates
    /// mipmaps if the spec asks for them. Cube-map kinds are not supported
    /// by this upload path and fail before any native call.
    pub fn source(&mut self, spec: &TextureSpec, pixels: Option<&[u8]>) -> Result<()> {
        if matches!(self.kind, TextureKind::CubeMap | TextureKind::CubeMapArray) {
            nebula_bail!(
                Stage::Source,
                ObjectCategory::Texture,
                "nebulagl::Texture::source",
                "{:?} uploads are per-face and not supported by this path",
                self.kind
            );
        }
        self.bind()?;
        let mut guard = lock_driver(
            &self.driver,
            Stage::Source,
            ObjectCategory::Texture,
            "nebulagl::Texture::source",
        )?;
        match self.kind {
            TextureKind::Tex1D => guard.tex_image_1d(self.kind, spec, pixels)?,
            TextureKind::Tex1DArray | TextureKind::Tex2D => {
                guard.tex_image_2d(self.kind, spec, pixels)?
            }
            TextureKind::Tex2DArray | TextureKind::Tex3D => {
                guard.tex_image_3d(self.kind, spec, pixels)?
            }
            TextureKind::CubeMap | TextureKind::CubeMapArray => unreachable!(),
        }
        if spec.generate_mipmaps {
            guard.generate_mipmaps(self.kind)?;
        }
        Ok(())
    }

    /// Apply integer- and float-valued parameter settings
    ///
    /// All entries are validated first: any empty value list fails the whole
    /// operation with no native call issued.
    pub fn setup(&mut self, config: &TextureConfig) -> Result<()> {
        for (pname, values) in &config.iparams {
            if values.is_empty() {
                nebula_bail!(
                    Stage::Setup,
                    ObjectCategory::Texture,
                    "nebulagl::Texture::setup",
                    "invalid integer parameter {:#06x}: empty value list",
                    pname
                );
            }
        }
        for (pname, values) in &config.fparams {
            if values.is_empty() {
                nebula_bail!(
                    Stage::Setup,
                    ObjectCategory::Texture,
                    "nebulagl::Texture::setup",
                    "invalid float parameter {:#06x}: empty value list",
                    pname
                );
            }
        }
        self.bind()?;
        let mut guard = lock_driver(
            &self.driver,
            Stage::Setup,
            ObjectCategory::Texture,
            "nebulagl::Texture::setup",
        )?;
        for (pname, values) in &config.iparams {
            guard.tex_parameter_i(self.kind, *pname, values)?;
        }
        for (pname, values) in &config.fparams {
            guard.tex_parameter_f(self.kind, *pname, values)?;
        }
        Ok(())
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
        let mut guard = lock_driver(
            &self.driver,
            Stage::Destroy,
            ObjectCategory::Texture,
            "nebulagl::Texture::destroy",
        )?;
        ObjectCategory::Texture.delete_batch(&mut *guard, &[handle])
    }
}

impl GlObject for Texture {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }

    fn category(&self) -> ObjectCategory {
        ObjectCategory::Texture
    }

    fn driver_handle(&self) -> &DriverHandle {
        &self.driver
    }

    fn bind_point(&self) -> Result<BindPoint> {
        Ok(BindPoint::Texture(self.kind))
    }

    /// Activate the recorded slot, then bind - required native ordering
    fn bind(&self) -> Result<()> {
        let point = self.bind_point()?;
        if !self.is_valid() {
            return Err(nebula_err!(
                Stage::Type,
                ObjectCategory::Texture,
                "nebulagl::Texture::bind",
                "texture is not in a bindable state"
            ));
        }
        let mut guard = lock_driver(
            &self.driver,
            Stage::Bind,
            ObjectCategory::Texture,
            "nebulagl::Texture::bind",
        )?;
        if let Some(slot) = self.slot {
            guard.activate_texture_slot(slot)?;
        }
        guard.bind(point, self.handle)
    }

    fn unbind(&self) -> Result<()> {
        let point = self.bind_point()?;
        let mut guard = lock_driver(
            &self.driver,
            Stage::Unbind,
            ObjectCategory::Texture,
            "nebulagl::Texture::unbind",
        )?;
        if let Some(slot) = self.slot {
            guard.activate_texture_slot(slot)?;
        }
        guard.unbind(point)
    }

    fn is_valid(&self) -> bool {
        self.handle != 0
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            nebula_warn!("nebulagl::Texture", "destroy failed during drop: {}", err);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
