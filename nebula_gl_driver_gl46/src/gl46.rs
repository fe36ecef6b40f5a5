//! Gl46Driver - OpenGL 4.6 implementation of the Driver trait

use std::ffi::{c_void, CString};

use gl::types::{GLchar, GLenum, GLint, GLintptr, GLsizei, GLsizeiptr};

use nebula_gl::nebula_err;
use nebula_gl::nebulagl::driver::{
    ContextFlags, DebugSink, Driver, DriverCapabilities, DriverConfig,
};
use nebula_gl::nebulagl::object::{
    BindPoint, BufferAccess, BufferTarget, BufferUsage, ObjectCategory, RawHandle, ShaderStage,
    TextureKind, TextureSpec, UniformData, UniformKind, UniformLocation, UniformUpload,
};
use nebula_gl::nebulagl::{Result, Stage};

use crate::gl46_debug;

// ===== ENUM MAPPING =====

pub(crate) fn buffer_target_to_gl(target: BufferTarget) -> GLenum {
    match target {
        BufferTarget::Array => gl::ARRAY_BUFFER,
        BufferTarget::Element => gl::ELEMENT_ARRAY_BUFFER,
        BufferTarget::Uniform => gl::UNIFORM_BUFFER,
        BufferTarget::ShaderStorage => gl::SHADER_STORAGE_BUFFER,
    }
}

pub(crate) fn buffer_usage_to_gl(usage: BufferUsage) -> GLenum {
    match usage {
        BufferUsage::StreamDraw => gl::STREAM_DRAW,
        BufferUsage::StreamRead => gl::STREAM_READ,
        BufferUsage::StreamCopy => gl::STREAM_COPY,
        BufferUsage::StaticDraw => gl::STATIC_DRAW,
        BufferUsage::StaticRead => gl::STATIC_READ,
        BufferUsage::StaticCopy => gl::STATIC_COPY,
        BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
        BufferUsage::DynamicRead => gl::DYNAMIC_READ,
        BufferUsage::DynamicCopy => gl::DYNAMIC_COPY,
    }
}

pub(crate) fn buffer_access_to_gl(access: BufferAccess) -> GLenum {
    match access {
        BufferAccess::ReadOnly => gl::READ_ONLY,
        BufferAccess::WriteOnly => gl::WRITE_ONLY,
        BufferAccess::ReadWrite => gl::READ_WRITE,
    }
}

pub(crate) fn shader_stage_to_gl(stage: ShaderStage) -> GLenum {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        ShaderStage::Geometry => gl::GEOMETRY_SHADER,
        ShaderStage::TessControl => gl::TESS_CONTROL_SHADER,
        ShaderStage::TessEvaluation => gl::TESS_EVALUATION_SHADER,
        ShaderStage::Compute => gl::COMPUTE_SHADER,
    }
}

pub(crate) fn texture_kind_to_gl(kind: TextureKind) -> GLenum {
    match kind {
        TextureKind::Tex1D => gl::TEXTURE_1D,
        TextureKind::Tex2D => gl::TEXTURE_2D,
        TextureKind::Tex3D => gl::TEXTURE_3D,
        TextureKind::Tex1DArray => gl::TEXTURE_1D_ARRAY,
        TextureKind::Tex2DArray => gl::TEXTURE_2D_ARRAY,
        TextureKind::CubeMap => gl::TEXTURE_CUBE_MAP,
        TextureKind::CubeMapArray => gl::TEXTURE_CUBE_MAP_ARRAY,
    }
}

fn pixel_ptr(pixels: Option<&[u8]>) -> *const c_void {
    pixels.map_or(std::ptr::null(), |p| p.as_ptr() as *const c_void)
}

// ===== DRIVER =====

/// OpenGL 4.6 driver
///
/// Construction loads the GL entry points through the given loader; a
/// context must already be current on this thread.
#[derive(Debug)]
pub struct Gl46Driver {
    config: DriverConfig,
}

impl Gl46Driver {
    /// Load GL entry points and build the driver
    ///
    /// # Arguments
    ///
    /// * `loader` - Symbol loader from the windowing layer
    ///   (e.g. `|s| window.get_proc_address(s)`)
    /// * `config` - Driver configuration
    pub fn new<F>(loader: F, config: DriverConfig) -> Result<Self>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        Ok(Self { config })
    }

    /// Post-call native error query, active when `check_errors` is set
    fn check(
        &self,
        stage: Stage,
        category: impl Into<Option<ObjectCategory>>,
        call_site: &'static str,
    ) -> Result<()> {
        if !self.config.check_errors {
            return Ok(());
        }
        let category = category.into();
        let code = unsafe { gl::GetError() };
        if code != gl::NO_ERROR {
            return Err(nebula_err!(
                stage,
                category,
                call_site,
                "native error {:#06x}",
                code
            ));
        }
        Ok(())
    }
}

impl Driver for Gl46Driver {
    // ===== HANDLE LIFECYCLE =====

    fn create_buffers(&mut self, count: usize) -> Result<Vec<RawHandle>> {
        let mut handles = vec![0u32; count];
        unsafe {
            gl::GenBuffers(count as GLsizei, handles.as_mut_ptr());
        }
        self.check(Stage::Create, ObjectCategory::Buffer, "gl46::create_buffers")?;
        Ok(handles)
    }

    fn delete_buffers(&mut self, handles: &[RawHandle]) -> Result<()> {
        unsafe {
            gl::DeleteBuffers(handles.len() as GLsizei, handles.as_ptr());
        }
        self.check(Stage::Destroy, ObjectCategory::Buffer, "gl46::delete_buffers")
    }

    fn create_vertex_arrays(&mut self, count: usize) -> Result<Vec<RawHandle>> {
        let mut handles = vec![0u32; count];
        unsafe {
            gl::GenVertexArrays(count as GLsizei, handles.as_mut_ptr());
        }
        self.check(
            Stage::Create,
            ObjectCategory::VertexArray,
            "gl46::create_vertex_arrays",
        )?;
        Ok(handles)
    }

    fn delete_vertex_arrays(&mut self, handles: &[RawHandle]) -> Result<()> {
        unsafe {
            gl::DeleteVertexArrays(handles.len() as GLsizei, handles.as_ptr());
        }
        self.check(
            Stage::Destroy,
            ObjectCategory::VertexArray,
            "gl46::delete_vertex_arrays",
        )
    }

    fn create_textures(&mut self, count: usize) -> Result<Vec<RawHandle>> {
        let mut handles = vec![0u32; count];
        unsafe {
            gl::GenTextures(count as GLsizei, handles.as_mut_ptr());
        }
        self.check(Stage::Create, ObjectCategory::Texture, "gl46::create_textures")?;
        Ok(handles)
    }

    fn delete_textures(&mut self, handles: &[RawHandle]) -> Result<()> {
        unsafe {
            gl::DeleteTextures(handles.len() as GLsizei, handles.as_ptr());
        }
        self.check(Stage::Destroy, ObjectCategory::Texture, "gl46::delete_textures")
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<RawHandle> {
        let handle = unsafe { gl::CreateShader(shader_stage_to_gl(stage)) };
        self.check(Stage::Create, ObjectCategory::Shader, "gl46::create_shader")?;
        if handle == 0 {
            return Err(nebula_err!(
                Stage::Create,
                ObjectCategory::Shader,
                "gl46::create_shader",
                "driver returned a null shader handle"
            ));
        }
        Ok(handle)
    }

    fn delete_shader(&mut self, handle: RawHandle) -> Result<()> {
        unsafe {
            gl::DeleteShader(handle);
        }
        self.check(Stage::Destroy, ObjectCategory::Shader, "gl46::delete_shader")
    }

    fn create_program(&mut self) -> Result<RawHandle> {
        let handle = unsafe { gl::CreateProgram() };
        self.check(
            Stage::Create,
            ObjectCategory::ShaderProgram,
            "gl46::create_program",
        )?;
        if handle == 0 {
            return Err(nebula_err!(
                Stage::Create,
                ObjectCategory::ShaderProgram,
                "gl46::create_program",
                "driver returned a null program handle"
            ));
        }
        Ok(handle)
    }

    fn delete_program(&mut self, handle: RawHandle) -> Result<()> {
        unsafe {
            gl::DeleteProgram(handle);
        }
        self.check(
            Stage::Destroy,
            ObjectCategory::ShaderProgram,
            "gl46::delete_program",
        )
    }

    // ===== BINDING =====

    fn bind(&mut self, point: BindPoint, handle: RawHandle) -> Result<()> {
        unsafe {
            match point {
                BindPoint::Buffer(target) => gl::BindBuffer(buffer_target_to_gl(target), handle),
                BindPoint::VertexArray => gl::BindVertexArray(handle),
                BindPoint::Program => gl::UseProgram(handle),
                BindPoint::Texture(kind) => gl::BindTexture(texture_kind_to_gl(kind), handle),
            }
        }
        self.check(Stage::Bind, point.category(), "gl46::bind")
    }

    fn unbind(&mut self, point: BindPoint) -> Result<()> {
        unsafe {
            match point {
                BindPoint::Buffer(target) => gl::BindBuffer(buffer_target_to_gl(target), 0),
                BindPoint::VertexArray => gl::BindVertexArray(0),
                BindPoint::Program => gl::UseProgram(0),
                BindPoint::Texture(kind) => gl::BindTexture(texture_kind_to_gl(kind), 0),
            }
        }
        self.check(Stage::Unbind, point.category(), "gl46::unbind")
    }

    fn activate_texture_slot(&mut self, slot: u32) -> Result<()> {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + slot);
        }
        self.check(Stage::Bind, ObjectCategory::Texture, "gl46::activate_texture_slot")
    }

    // ===== BUFFER DATA =====

    fn buffer_data(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<()> {
        unsafe {
            gl::BufferData(
                buffer_target_to_gl(target),
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
                buffer_usage_to_gl(usage),
            );
        }
        self.check(Stage::Source, ObjectCategory::Buffer, "gl46::buffer_data")
    }

    fn buffer_storage(
        &mut self,
        target: BufferTarget,
        size: usize,
        usage: BufferUsage,
    ) -> Result<()> {
        unsafe {
            gl::BufferData(
                buffer_target_to_gl(target),
                size as GLsizeiptr,
                std::ptr::null(),
                buffer_usage_to_gl(usage),
            );
        }
        self.check(Stage::Source, ObjectCategory::Buffer, "gl46::buffer_storage")
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) -> Result<()> {
        unsafe {
            gl::BufferSubData(
                buffer_target_to_gl(target),
                offset as GLintptr,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
            );
        }
        self.check(Stage::Setup, ObjectCategory::Buffer, "gl46::buffer_sub_data")
    }

    fn map_buffer(&mut self, target: BufferTarget, access: BufferAccess) -> Result<*mut u8> {
        let ptr = unsafe {
            gl::MapBuffer(buffer_target_to_gl(target), buffer_access_to_gl(access)) as *mut u8
        };
        self.check(Stage::Setup, ObjectCategory::Buffer, "gl46::map_buffer")?;
        if ptr.is_null() {
            return Err(nebula_err!(
                Stage::Setup,
                ObjectCategory::Buffer,
                "gl46::map_buffer",
                "native map returned null"
            ));
        }
        Ok(ptr)
    }

    fn unmap_buffer(&mut self, target: BufferTarget) -> Result<()> {
        let ok = unsafe { gl::UnmapBuffer(buffer_target_to_gl(target)) };
        self.check(Stage::Setup, ObjectCategory::Buffer, "gl46::unmap_buffer")?;
        if ok == gl::FALSE {
            return Err(nebula_err!(
                Stage::Setup,
                ObjectCategory::Buffer,
                "gl46::unmap_buffer",
                "buffer storage was corrupted while mapped"
            ));
        }
        Ok(())
    }

    // ===== SHADERS AND PROGRAMS =====

    fn shader_source(&mut self, handle: RawHandle, source: &str) -> Result<()> {
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;
        unsafe {
            gl::ShaderSource(handle, 1, &ptr, &len);
        }
        self.check(Stage::Source, ObjectCategory::Shader, "gl46::shader_source")
    }

    fn compile_shader(&mut self, handle: RawHandle) -> Result<()> {
        unsafe {
            gl::CompileShader(handle);
        }
        self.check(Stage::Compile, ObjectCategory::Shader, "gl46::compile_shader")
    }

    fn compile_status(&mut self, handle: RawHandle) -> Result<bool> {
        let mut status: GLint = 0;
        unsafe {
            gl::GetShaderiv(handle, gl::COMPILE_STATUS, &mut status);
        }
        self.check(Stage::Check, ObjectCategory::Shader, "gl46::compile_status")?;
        Ok(status != 0)
    }

    fn shader_info_log(&mut self, handle: RawHandle) -> Result<String> {
        // Length query first, then fetch - no fixed-size truncation
        let mut length: GLint = 0;
        unsafe {
            gl::GetShaderiv(handle, gl::INFO_LOG_LENGTH, &mut length);
        }
        self.check(Stage::Info, ObjectCategory::Shader, "gl46::shader_info_log")?;
        if length <= 0 {
            return Ok(String::new());
        }
        let mut log = vec![0u8; length as usize];
        let mut written: GLsizei = 0;
        unsafe {
            gl::GetShaderInfoLog(handle, length, &mut written, log.as_mut_ptr() as *mut GLchar);
        }
        self.check(Stage::Info, ObjectCategory::Shader, "gl46::shader_info_log")?;
        log.truncate(written.max(0) as usize);
        Ok(String::from_utf8_lossy(&log).into_owned())
    }

    fn attach_shader(&mut self, program: RawHandle, shader: RawHandle) -> Result<()> {
        unsafe {
            gl::AttachShader(program, shader);
        }
        self.check(
            Stage::Attach,
            ObjectCategory::ShaderProgram,
            "gl46::attach_shader",
        )
    }

    fn link_program(&mut self, program: RawHandle) -> Result<()> {
        unsafe {
            gl::LinkProgram(program);
        }
        self.check(Stage::Link, ObjectCategory::ShaderProgram, "gl46::link_program")
    }

    fn link_status(&mut self, program: RawHandle) -> Result<bool> {
        let mut status: GLint = 0;
        unsafe {
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);
        }
        self.check(Stage::Check, ObjectCategory::ShaderProgram, "gl46::link_status")?;
        Ok(status != 0)
    }

    fn program_info_log(&mut self, program: RawHandle) -> Result<String> {
        let mut length: GLint = 0;
        unsafe {
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut length);
        }
        self.check(
            Stage::Info,
            ObjectCategory::ShaderProgram,
            "gl46::program_info_log",
        )?;
        if length <= 0 {
            return Ok(String::new());
        }
        let mut log = vec![0u8; length as usize];
        let mut written: GLsizei = 0;
        unsafe {
            gl::GetProgramInfoLog(program, length, &mut written, log.as_mut_ptr() as *mut GLchar);
        }
        self.check(
            Stage::Info,
            ObjectCategory::ShaderProgram,
            "gl46::program_info_log",
        )?;
        log.truncate(written.max(0) as usize);
        Ok(String::from_utf8_lossy(&log).into_owned())
    }

    fn uniform_location(&mut self, program: RawHandle, name: &str) -> Result<UniformLocation> {
        let name = CString::new(name).map_err(|_| {
            nebula_err!(
                Stage::Info,
                ObjectCategory::ShaderUniform,
                "gl46::uniform_location",
                "uniform name contains an interior NUL"
            )
        })?;
        let location = unsafe { gl::GetUniformLocation(program, name.as_ptr()) };
        self.check(
            Stage::Info,
            ObjectCategory::ShaderUniform,
            "gl46::uniform_location",
        )?;
        Ok(UniformLocation::new(location))
    }

    fn set_uniform(&mut self, location: UniformLocation, upload: UniformUpload<'_>) -> Result<()> {
        let loc = location.value();
        let count = upload.count as GLsizei;
        let transpose = if upload.transpose { gl::TRUE } else { gl::FALSE };
        unsafe {
            match (upload.kind, upload.data) {
                (UniformKind::I32, UniformData::I32(v)) => gl::Uniform1iv(loc, count, v.as_ptr()),
                (UniformKind::IVec2, UniformData::I32(v)) => gl::Uniform2iv(loc, count, v.as_ptr()),
                (UniformKind::IVec3, UniformData::I32(v)) => gl::Uniform3iv(loc, count, v.as_ptr()),
                (UniformKind::IVec4, UniformData::I32(v)) => gl::Uniform4iv(loc, count, v.as_ptr()),
                (UniformKind::F32, UniformData::F32(v)) => gl::Uniform1fv(loc, count, v.as_ptr()),
                (UniformKind::FVec2, UniformData::F32(v)) => gl::Uniform2fv(loc, count, v.as_ptr()),
                (UniformKind::FVec3, UniformData::F32(v)) => gl::Uniform3fv(loc, count, v.as_ptr()),
                (UniformKind::FVec4, UniformData::F32(v)) => gl::Uniform4fv(loc, count, v.as_ptr()),
                (UniformKind::F64, UniformData::F64(v)) => gl::Uniform1dv(loc, count, v.as_ptr()),
                (UniformKind::DVec2, UniformData::F64(v)) => gl::Uniform2dv(loc, count, v.as_ptr()),
                (UniformKind::DVec3, UniformData::F64(v)) => gl::Uniform3dv(loc, count, v.as_ptr()),
                (UniformKind::DVec4, UniformData::F64(v)) => gl::Uniform4dv(loc, count, v.as_ptr()),
                (UniformKind::FMat2, UniformData::F32(v)) => {
                    gl::UniformMatrix2fv(loc, count, transpose, v.as_ptr())
                }
                (UniformKind::FMat3, UniformData::F32(v)) => {
                    gl::UniformMatrix3fv(loc, count, transpose, v.as_ptr())
                }
                (UniformKind::FMat4, UniformData::F32(v)) => {
                    gl::UniformMatrix4fv(loc, count, transpose, v.as_ptr())
                }
                (UniformKind::DMat2, UniformData::F64(v)) => {
                    gl::UniformMatrix2dv(loc, count, transpose, v.as_ptr())
                }
                (UniformKind::DMat3, UniformData::F64(v)) => {
                    gl::UniformMatrix3dv(loc, count, transpose, v.as_ptr())
                }
                (UniformKind::DMat4, UniformData::F64(v)) => {
                    gl::UniformMatrix4dv(loc, count, transpose, v.as_ptr())
                }
                (kind, data) => {
                    return Err(nebula_err!(
                        Stage::Type,
                        ObjectCategory::ShaderUniform,
                        "gl46::set_uniform",
                        "{:?} payload does not match uniform kind {:?}",
                        data.scalar(),
                        kind
                    ))
                }
            }
        }
        self.check(Stage::Source, ObjectCategory::ShaderUniform, "gl46::set_uniform")
    }

    // ===== TEXTURES =====

    fn tex_image_1d(
        &mut self,
        kind: TextureKind,
        spec: &TextureSpec,
        pixels: Option<&[u8]>,
    ) -> Result<()> {
        unsafe {
            gl::TexImage1D(
                texture_kind_to_gl(kind),
                spec.level,
                spec.internal_format as GLint,
                spec.width as GLsizei,
                spec.border,
                spec.format,
                spec.datatype,
                pixel_ptr(pixels),
            );
        }
        self.check(Stage::Source, ObjectCategory::Texture, "gl46::tex_image_1d")
    }

    fn tex_image_2d(
        &mut self,
        kind: TextureKind,
        spec: &TextureSpec,
        pixels: Option<&[u8]>,
    ) -> Result<()> {
        unsafe {
            gl::TexImage2D(
                texture_kind_to_gl(kind),
                spec.level,
                spec.internal_format as GLint,
                spec.width as GLsizei,
                spec.height as GLsizei,
                spec.border,
                spec.format,
                spec.datatype,
                pixel_ptr(pixels),
            );
        }
        self.check(Stage::Source, ObjectCategory::Texture, "gl46::tex_image_2d")
    }

    fn tex_image_3d(
        &mut self,
        kind: TextureKind,
        spec: &TextureSpec,
        pixels: Option<&[u8]>,
    ) -> Result<()> {
        unsafe {
            gl::TexImage3D(
                texture_kind_to_gl(kind),
                spec.level,
                spec.internal_format as GLint,
                spec.width as GLsizei,
                spec.height as GLsizei,
                spec.depth as GLsizei,
                spec.border,
                spec.format,
                spec.datatype,
                pixel_ptr(pixels),
            );
        }
        self.check(Stage::Source, ObjectCategory::Texture, "gl46::tex_image_3d")
    }

    fn generate_mipmaps(&mut self, kind: TextureKind) -> Result<()> {
        unsafe {
            gl::GenerateMipmap(texture_kind_to_gl(kind));
        }
        self.check(Stage::Source, ObjectCategory::Texture, "gl46::generate_mipmaps")
    }

    fn tex_parameter_i(&mut self, kind: TextureKind, pname: u32, values: &[i32]) -> Result<()> {
        unsafe {
            gl::TexParameteriv(texture_kind_to_gl(kind), pname, values.as_ptr());
        }
        self.check(Stage::Setup, ObjectCategory::Texture, "gl46::tex_parameter_i")
    }

    fn tex_parameter_f(&mut self, kind: TextureKind, pname: u32, values: &[f32]) -> Result<()> {
        unsafe {
            gl::TexParameterfv(texture_kind_to_gl(kind), pname, values.as_ptr());
        }
        self.check(Stage::Setup, ObjectCategory::Texture, "gl46::tex_parameter_f")
    }

    // ===== CAPABILITIES AND DIAGNOSTICS =====

    fn query_capabilities(&mut self) -> Result<DriverCapabilities> {
        let mut max_slots: GLint = 0;
        unsafe {
            gl::GetIntegerv(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, &mut max_slots);
        }
        self.check(Stage::Setup, None, "gl46::query_capabilities")?;

        let mut flags: GLint = 0;
        unsafe {
            gl::GetIntegerv(gl::CONTEXT_FLAGS, &mut flags);
        }
        self.check(Stage::Setup, None, "gl46::query_capabilities")?;

        Ok(DriverCapabilities {
            max_texture_slots: max_slots.max(0) as u32,
            context_flags: ContextFlags::from_bits_truncate(flags as u32),
        })
    }

    fn install_debug_callback(&mut self, sink: DebugSink) -> Result<()> {
        gl46_debug::install(sink);
        self.check(Stage::Setup, None, "gl46::install_debug_callback")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "gl46_tests.rs"]
mod tests;
