//! Driver module - the single seam between the object layer and a native API
//!
//! The [`Driver`] trait is the only point that touches the underlying
//! graphics API. Backend crates implement it against real bindings
//! (e.g. `nebula_gl_driver_gl46`); the [`recording::RecordingDriver`]
//! implements it in host memory for tests and diagnostics.

pub mod capabilities;
pub mod debug;
pub mod recording;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, Stage};
use crate::nebula_err;
use crate::object::{
    BindPoint, BufferAccess, BufferTarget, BufferUsage, ObjectCategory, RawHandle, ShaderStage,
    TextureKind, TextureSpec, UniformLocation, UniformUpload,
};

use self::capabilities::DriverCapabilities;
use self::debug::DebugSink;

/// Shared handle to a driver
///
/// Objects keep a clone of this handle; the mutex serializes access to the
/// thread-affine native context.
pub type DriverHandle = Arc<Mutex<dyn Driver>>;

/// Driver configuration
///
/// `check_errors` selects the diagnostic path: when set, the driver issues a
/// native error query after each call and fails the operation on error; when
/// unset, calls are issued without a post-check, trading diagnostics for
/// call overhead.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Enable post-call native error checks
    pub check_errors: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            check_errors: cfg!(debug_assertions),
        }
    }
}

/// Native driver trait
///
/// Every entry point issues exactly one native call (plus the optional
/// post-call error query, see [`DriverConfig`]). The object layer composes
/// these; it never reaches past this trait.
///
/// Handle values are opaque non-zero integers in the driver's own address
/// space; `0` never names a live object.
pub trait Driver: Send + Sync + std::fmt::Debug {
    // ===== HANDLE LIFECYCLE =====

    /// Allocate `count` buffer handles in one native call
    fn create_buffers(&mut self, count: usize) -> Result<Vec<RawHandle>>;

    /// Release buffer handles in one native call
    fn delete_buffers(&mut self, handles: &[RawHandle]) -> Result<()>;

    /// Allocate `count` vertex array handles in one native call
    fn create_vertex_arrays(&mut self, count: usize) -> Result<Vec<RawHandle>>;

    /// Release vertex array handles in one native call
    fn delete_vertex_arrays(&mut self, handles: &[RawHandle]) -> Result<()>;

    /// Allocate `count` texture handles in one native call
    fn create_textures(&mut self, count: usize) -> Result<Vec<RawHandle>>;

    /// Release texture handles in one native call
    fn delete_textures(&mut self, handles: &[RawHandle]) -> Result<()>;

    /// Create a shader object for the given stage
    fn create_shader(&mut self, stage: ShaderStage) -> Result<RawHandle>;

    /// Release a shader object
    fn delete_shader(&mut self, handle: RawHandle) -> Result<()>;

    /// Create a program object
    fn create_program(&mut self) -> Result<RawHandle>;

    /// Release a program object
    fn delete_program(&mut self, handle: RawHandle) -> Result<()>;

    // ===== BINDING =====

    /// Make `handle` current at `point` (one native bind call)
    fn bind(&mut self, point: BindPoint, handle: RawHandle) -> Result<()>;

    /// Clear the current object at `point` (one native bind-to-zero call)
    fn unbind(&mut self, point: BindPoint) -> Result<()>;

    /// Activate a texture unit; subsequent texture binds target it
    fn activate_texture_slot(&mut self, slot: u32) -> Result<()>;

    // ===== BUFFER DATA =====

    /// Upload `data` to the buffer currently bound at `target`
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage)
        -> Result<()>;

    /// Allocate `size` bytes of uninitialized storage at `target`
    fn buffer_storage(
        &mut self,
        target: BufferTarget,
        size: usize,
        usage: BufferUsage,
    ) -> Result<()>;

    /// Overwrite a sub-range of the buffer currently bound at `target`
    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) -> Result<()>;

    /// Map the buffer currently bound at `target` into client memory
    fn map_buffer(&mut self, target: BufferTarget, access: BufferAccess) -> Result<*mut u8>;

    /// Unmap the buffer currently bound at `target`
    fn unmap_buffer(&mut self, target: BufferTarget) -> Result<()>;

    // ===== SHADERS AND PROGRAMS =====

    /// Replace the source of a shader object
    fn shader_source(&mut self, handle: RawHandle, source: &str) -> Result<()>;

    /// Compile a shader object (outcome queried via `compile_status`)
    fn compile_shader(&mut self, handle: RawHandle) -> Result<()>;

    /// Query the native compile flag
    fn compile_status(&mut self, handle: RawHandle) -> Result<bool>;

    /// Fetch the full compile diagnostic log (length-query then fetch)
    fn shader_info_log(&mut self, handle: RawHandle) -> Result<String>;

    /// Attach a shader to a program
    fn attach_shader(&mut self, program: RawHandle, shader: RawHandle) -> Result<()>;

    /// Link a program (outcome queried via `link_status`)
    fn link_program(&mut self, program: RawHandle) -> Result<()>;

    /// Query the native link flag
    fn link_status(&mut self, program: RawHandle) -> Result<bool>;

    /// Fetch the full link diagnostic log (length-query then fetch)
    fn program_info_log(&mut self, program: RawHandle) -> Result<String>;

    /// Resolve a uniform name to a location
    ///
    /// An unknown name yields the native unresolved sentinel, not an error.
    fn uniform_location(&mut self, program: RawHandle, name: &str) -> Result<UniformLocation>;

    /// Issue exactly one native uniform upload selected by the upload's kind
    fn set_uniform(&mut self, location: UniformLocation, upload: UniformUpload<'_>) -> Result<()>;

    // ===== TEXTURES =====

    /// 1D image upload to the texture currently bound as `kind`
    fn tex_image_1d(
        &mut self,
        kind: TextureKind,
        spec: &TextureSpec,
        pixels: Option<&[u8]>,
    ) -> Result<()>;

    /// 2D image upload (also used by 1D-array textures)
    fn tex_image_2d(
        &mut self,
        kind: TextureKind,
        spec: &TextureSpec,
        pixels: Option<&[u8]>,
    ) -> Result<()>;

    /// 3D image upload (also used by 2D-array textures)
    fn tex_image_3d(
        &mut self,
        kind: TextureKind,
        spec: &TextureSpec,
        pixels: Option<&[u8]>,
    ) -> Result<()>;

    /// Generate the mipmap chain for the texture currently bound as `kind`
    fn generate_mipmaps(&mut self, kind: TextureKind) -> Result<()>;

    /// Set an integer-valued texture parameter
    fn tex_parameter_i(&mut self, kind: TextureKind, pname: u32, values: &[i32]) -> Result<()>;

    /// Set a float-valued texture parameter
    fn tex_parameter_f(&mut self, kind: TextureKind, pname: u32, values: &[f32]) -> Result<()>;

    // ===== CAPABILITIES AND DIAGNOSTICS =====

    /// Query driver limits and context flags
    fn query_capabilities(&mut self) -> Result<DriverCapabilities>;

    /// Install the asynchronous debug-message callback
    fn install_debug_callback(&mut self, sink: DebugSink) -> Result<()>;
}

/// Lock a shared driver handle, mapping poisoning to a structured error
pub(crate) fn lock_driver<'a>(
    driver: &'a DriverHandle,
    stage: Stage,
    category: impl Into<Option<ObjectCategory>>,
    call_site: &'static str,
) -> Result<MutexGuard<'a, dyn Driver + 'static>> {
    let category = category.into();
    driver
        .lock()
        .map_err(|_| nebula_err!(stage, category, call_site, "driver lock poisoned"))
}
