//! Recording driver - in-memory Driver implementation (no GPU required)
//!
//! Hands out sequential handles per category, records every native call as a
//! readable string, tracks current bindings, and backs buffer storage in host
//! memory. Used by the test suites to verify native-call accounting ("no
//! native call occurred", "exactly one bulk free") and usable as a dry-run
//! diagnostic driver.

use rustc_hash::FxHashMap;

use crate::error::{Result, Stage};
use crate::nebula_err;
use crate::object::{
    BindPoint, BufferAccess, BufferTarget, BufferUsage, ObjectCategory, RawHandle, ShaderStage,
    TextureKind, TextureSpec, UniformLocation, UniformUpload,
};

use super::capabilities::{ContextFlags, DriverCapabilities};
use super::debug::{DebugMessage, DebugSink};
use super::Driver;

/// In-memory driver that records every native call
pub struct RecordingDriver {
    calls: Vec<String>,
    next_handle: FxHashMap<ObjectCategory, RawHandle>,
    live: FxHashMap<ObjectCategory, Vec<RawHandle>>,
    bound: FxHashMap<BindPoint, RawHandle>,
    buffer_store: FxHashMap<RawHandle, Vec<u8>>,
    mapped_targets: Vec<BufferTarget>,
    shader_sources: FxHashMap<RawHandle, String>,
    attachments: FxHashMap<RawHandle, Vec<RawHandle>>,
    uniform_locations: FxHashMap<(RawHandle, String), UniformLocation>,
    next_uniform_location: i32,
    unresolved_uniforms: Vec<String>,
    force_compile_failure: bool,
    force_link_failure: bool,
    forced_info_log: Option<String>,
    fail_create: Option<ObjectCategory>,
    max_texture_slots: u32,
    context_flags: ContextFlags,
    debug_sink: Option<DebugSink>,
}

impl RecordingDriver {
    /// Create a recording driver with default limits (32 texture slots,
    /// debug context)
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            next_handle: FxHashMap::default(),
            live: FxHashMap::default(),
            bound: FxHashMap::default(),
            buffer_store: FxHashMap::default(),
            mapped_targets: Vec::new(),
            shader_sources: FxHashMap::default(),
            attachments: FxHashMap::default(),
            uniform_locations: FxHashMap::default(),
            next_uniform_location: 0,
            unresolved_uniforms: Vec::new(),
            force_compile_failure: false,
            force_link_failure: false,
            forced_info_log: None,
            fail_create: None,
            max_texture_slots: 32,
            context_flags: ContextFlags::DEBUG,
            debug_sink: None,
        }
    }
}

impl std::fmt::Debug for RecordingDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingDriver")
            .field("calls", &self.calls)
            .field("next_handle", &self.next_handle)
            .field("live", &self.live)
            .field("bound", &self.bound)
            .field("buffer_store", &self.buffer_store)
            .field("mapped_targets", &self.mapped_targets)
            .field("shader_sources", &self.shader_sources)
            .field("attachments", &self.attachments)
            .field("uniform_locations", &self.uniform_locations)
            .field("next_uniform_location", &self.next_uniform_location)
            .field("unresolved_uniforms", &self.unresolved_uniforms)
            .field("force_compile_failure", &self.force_compile_failure)
            .field("force_link_failure", &self.force_link_failure)
            .field("forced_info_log", &self.forced_info_log)
            .field("fail_create", &self.fail_create)
            .field("max_texture_slots", &self.max_texture_slots)
            .field("context_flags", &self.context_flags)
            .field("debug_sink", &self.debug_sink.is_some())
            .finish()
    }
}

impl RecordingDriver {
    // ===== INSPECTION =====

    /// All recorded native calls, in issue order
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Number of recorded calls whose name starts with `prefix`
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Forget recorded calls (live objects and bindings are kept)
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of live handles in a category
    pub fn live_count(&self, category: ObjectCategory) -> usize {
        self.live.get(&category).map(Vec::len).unwrap_or(0)
    }

    /// Handle currently bound at a bind point, if any
    pub fn bound_at(&self, point: BindPoint) -> Option<RawHandle> {
        self.bound.get(&point).copied()
    }

    /// Host-memory contents of a buffer object
    pub fn buffer_contents(&self, handle: RawHandle) -> Option<&[u8]> {
        self.buffer_store.get(&handle).map(Vec::as_slice)
    }

    // ===== INJECTION =====

    /// Fail the next handle allocation in `category`
    pub fn fail_next_create(&mut self, category: ObjectCategory) {
        self.fail_create = Some(category);
    }

    /// Force compile status to failure regardless of source
    pub fn set_compile_failure(&mut self, fail: bool) {
        self.force_compile_failure = fail;
    }

    /// Force link status to failure regardless of attachments
    pub fn set_link_failure(&mut self, fail: bool) {
        self.force_link_failure = fail;
    }

    /// Override the diagnostic log returned by the info-log queries
    pub fn set_info_log(&mut self, log: impl Into<String>) {
        self.forced_info_log = Some(log.into());
    }

    /// Set the texture-unit limit reported by capability queries
    pub fn set_max_texture_slots(&mut self, slots: u32) {
        self.max_texture_slots = slots;
    }

    /// Set the context flag word reported by capability queries
    pub fn set_context_flags(&mut self, flags: ContextFlags) {
        self.context_flags = flags;
    }

    /// Make a uniform name resolve to the unresolved sentinel
    pub fn mark_uniform_unresolved(&mut self, name: impl Into<String>) {
        self.unresolved_uniforms.push(name.into());
    }

    /// Deliver a debug message through the installed sink
    ///
    /// Returns false when no sink is installed.
    pub fn emit_debug(&self, message: DebugMessage) -> bool {
        match &self.debug_sink {
            Some(sink) => {
                sink(message);
                true
            }
            None => false,
        }
    }

    // ===== INTERNALS =====

    fn record(&mut self, call: String) {
        self.calls.push(call);
    }

    fn alloc(&mut self, category: ObjectCategory, count: usize) -> Vec<RawHandle> {
        let next = self.next_handle.entry(category).or_insert(1);
        let start = *next;
        *next += count as RawHandle;
        let handles: Vec<RawHandle> = (start..start + count as RawHandle).collect();
        self.live.entry(category).or_default().extend(&handles);
        handles
    }

    fn checked_create(&mut self, category: ObjectCategory, count: usize) -> Result<Vec<RawHandle>> {
        if self.fail_create == Some(category) {
            self.fail_create = None;
            return Err(nebula_err!(
                Stage::Create,
                category,
                "nebulagl::RecordingDriver",
                "injected allocation failure"
            ));
        }
        Ok(self.alloc(category, count))
    }

    fn forget(&mut self, category: ObjectCategory, handles: &[RawHandle]) {
        if let Some(list) = self.live.get_mut(&category) {
            list.retain(|h| !handles.contains(h));
        }
        // Handle spaces are per-category; only drop the matching side tables
        for handle in handles {
            match category {
                ObjectCategory::Buffer => {
                    self.buffer_store.remove(handle);
                }
                ObjectCategory::Shader => {
                    self.shader_sources.remove(handle);
                }
                ObjectCategory::ShaderProgram => {
                    self.attachments.remove(handle);
                }
                _ => {}
            }
        }
    }

    fn expect_live(
        &self,
        category: ObjectCategory,
        handle: RawHandle,
        stage: Stage,
    ) -> Result<()> {
        let alive = self
            .live
            .get(&category)
            .map(|l| l.contains(&handle))
            .unwrap_or(false);
        if !alive {
            return Err(nebula_err!(
                stage,
                category,
                "nebulagl::RecordingDriver",
                "handle {} does not name a live {} object",
                handle,
                category
            ));
        }
        Ok(())
    }

    fn require_bound(&self, point: BindPoint, stage: Stage) -> Result<RawHandle> {
        self.bound.get(&point).copied().ok_or_else(|| {
            nebula_err!(
                stage,
                point.category(),
                "nebulagl::RecordingDriver",
                "no object bound at {:?}",
                point
            )
        })
    }

    fn shader_compiles(&self, shader: RawHandle) -> bool {
        !self.force_compile_failure
            && self
                .shader_sources
                .get(&shader)
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false)
    }

    fn program_links(&self, program: RawHandle) -> bool {
        if self.force_link_failure {
            return false;
        }
        match self.attachments.get(&program) {
            Some(attached) if !attached.is_empty() => {
                attached.iter().all(|s| self.shader_compiles(*s))
            }
            _ => false,
        }
    }
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for RecordingDriver {
    // ===== HANDLE LIFECYCLE =====

    fn create_buffers(&mut self, count: usize) -> Result<Vec<RawHandle>> {
        self.record(format!("GenBuffers({})", count));
        self.checked_create(ObjectCategory::Buffer, count)
    }

    fn delete_buffers(&mut self, handles: &[RawHandle]) -> Result<()> {
        self.record(format!("DeleteBuffers({:?})", handles));
        self.forget(ObjectCategory::Buffer, handles);
        Ok(())
    }

    fn create_vertex_arrays(&mut self, count: usize) -> Result<Vec<RawHandle>> {
        self.record(format!("GenVertexArrays({})", count));
        self.checked_create(ObjectCategory::VertexArray, count)
    }

    fn delete_vertex_arrays(&mut self, handles: &[RawHandle]) -> Result<()> {
        self.record(format!("DeleteVertexArrays({:?})", handles));
        self.forget(ObjectCategory::VertexArray, handles);
        Ok(())
    }

    fn create_textures(&mut self, count: usize) -> Result<Vec<RawHandle>> {
        self.record(format!("GenTextures({})", count));
        self.checked_create(ObjectCategory::Texture, count)
    }

    fn delete_textures(&mut self, handles: &[RawHandle]) -> Result<()> {
        self.record(format!("DeleteTextures({:?})", handles));
        self.forget(ObjectCategory::Texture, handles);
        Ok(())
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<RawHandle> {
        self.record(format!("CreateShader({:?})", stage));
        let handle = self.checked_create(ObjectCategory::Shader, 1)?[0];
        self.shader_sources.insert(handle, String::new());
        Ok(handle)
    }

    fn delete_shader(&mut self, handle: RawHandle) -> Result<()> {
        self.record(format!("DeleteShader({})", handle));
        self.forget(ObjectCategory::Shader, &[handle]);
        Ok(())
    }

    fn create_program(&mut self) -> Result<RawHandle> {
        self.record("CreateProgram".to_string());
        let handle = self.checked_create(ObjectCategory::ShaderProgram, 1)?[0];
        self.attachments.insert(handle, Vec::new());
        Ok(handle)
    }

    fn delete_program(&mut self, handle: RawHandle) -> Result<()> {
        self.record(format!("DeleteProgram({})", handle));
        self.forget(ObjectCategory::ShaderProgram, &[handle]);
        Ok(())
    }

    // ===== BINDING =====

    fn bind(&mut self, point: BindPoint, handle: RawHandle) -> Result<()> {
        self.expect_live(point.category(), handle, Stage::Bind)?;
        self.record(bind_call(point, handle));
        self.bound.insert(point, handle);
        Ok(())
    }

    fn unbind(&mut self, point: BindPoint) -> Result<()> {
        self.record(bind_call(point, 0));
        self.bound.remove(&point);
        Ok(())
    }

    fn activate_texture_slot(&mut self, slot: u32) -> Result<()> {
        self.record(format!("ActiveTexture({})", slot));
        Ok(())
    }

    // ===== BUFFER DATA =====

    fn buffer_data(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<()> {
        let handle = self.require_bound(BindPoint::Buffer(target), Stage::Source)?;
        self.record(format!(
            "BufferData({:?}, {} bytes, {:?})",
            target,
            data.len(),
            usage
        ));
        self.buffer_store.insert(handle, data.to_vec());
        Ok(())
    }

    fn buffer_storage(
        &mut self,
        target: BufferTarget,
        size: usize,
        usage: BufferUsage,
    ) -> Result<()> {
        let handle = self.require_bound(BindPoint::Buffer(target), Stage::Source)?;
        self.record(format!(
            "BufferData({:?}, {} bytes uninitialized, {:?})",
            target, size, usage
        ));
        self.buffer_store.insert(handle, vec![0; size]);
        Ok(())
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) -> Result<()> {
        let handle = self.require_bound(BindPoint::Buffer(target), Stage::Setup)?;
        self.record(format!(
            "BufferSubData({:?}, offset {}, {} bytes)",
            target,
            offset,
            data.len()
        ));
        let store = self.buffer_store.get_mut(&handle).ok_or_else(|| {
            nebula_err!(
                Stage::Setup,
                ObjectCategory::Buffer,
                "nebulagl::RecordingDriver",
                "sub-data on buffer {} with no storage",
                handle
            )
        })?;
        if offset + data.len() > store.len() {
            return Err(nebula_err!(
                Stage::Setup,
                ObjectCategory::Buffer,
                "nebulagl::RecordingDriver",
                "sub-data range {}..{} exceeds storage size {}",
                offset,
                offset + data.len(),
                store.len()
            ));
        }
        store[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn map_buffer(&mut self, target: BufferTarget, access: BufferAccess) -> Result<*mut u8> {
        let handle = self.require_bound(BindPoint::Buffer(target), Stage::Setup)?;
        if self.mapped_targets.contains(&target) {
            return Err(nebula_err!(
                Stage::Setup,
                ObjectCategory::Buffer,
                "nebulagl::RecordingDriver",
                "buffer at {:?} is already mapped",
                target
            ));
        }
        self.record(format!("MapBuffer({:?}, {:?})", target, access));
        let store = self.buffer_store.get_mut(&handle).ok_or_else(|| {
            nebula_err!(
                Stage::Setup,
                ObjectCategory::Buffer,
                "nebulagl::RecordingDriver",
                "mapping buffer {} with no storage",
                handle
            )
        })?;
        self.mapped_targets.push(target);
        Ok(store.as_mut_ptr())
    }

    fn unmap_buffer(&mut self, target: BufferTarget) -> Result<()> {
        self.record(format!("UnmapBuffer({:?})", target));
        match self.mapped_targets.iter().position(|t| *t == target) {
            Some(index) => {
                self.mapped_targets.remove(index);
                Ok(())
            }
            None => Err(nebula_err!(
                Stage::Setup,
                ObjectCategory::Buffer,
                "nebulagl::RecordingDriver",
                "unmap without active mapping at {:?}",
                target
            )),
        }
    }

    // ===== SHADERS AND PROGRAMS =====

    fn shader_source(&mut self, handle: RawHandle, source: &str) -> Result<()> {
        self.expect_live(ObjectCategory::Shader, handle, Stage::Source)?;
        self.record(format!("ShaderSource({}, {} bytes)", handle, source.len()));
        self.shader_sources.insert(handle, source.to_string());
        Ok(())
    }

    fn compile_shader(&mut self, handle: RawHandle) -> Result<()> {
        self.expect_live(ObjectCategory::Shader, handle, Stage::Compile)?;
        self.record(format!("CompileShader({})", handle));
        Ok(())
    }

    fn compile_status(&mut self, handle: RawHandle) -> Result<bool> {
        self.expect_live(ObjectCategory::Shader, handle, Stage::Check)?;
        self.record(format!("GetShaderiv({}, COMPILE_STATUS)", handle));
        Ok(self.shader_compiles(handle))
    }

    fn shader_info_log(&mut self, handle: RawHandle) -> Result<String> {
        self.expect_live(ObjectCategory::Shader, handle, Stage::Info)?;
        self.record(format!("GetShaderInfoLog({})", handle));
        if let Some(log) = &self.forced_info_log {
            return Ok(log.clone());
        }
        if self.shader_compiles(handle) {
            Ok(String::new())
        } else {
            Ok("error: shader compilation failed".to_string())
        }
    }

    fn attach_shader(&mut self, program: RawHandle, shader: RawHandle) -> Result<()> {
        self.expect_live(ObjectCategory::ShaderProgram, program, Stage::Attach)?;
        self.expect_live(ObjectCategory::Shader, shader, Stage::Attach)?;
        self.record(format!("AttachShader({}, {})", program, shader));
        self.attachments.entry(program).or_default().push(shader);
        Ok(())
    }

    fn link_program(&mut self, program: RawHandle) -> Result<()> {
        self.expect_live(ObjectCategory::ShaderProgram, program, Stage::Link)?;
        self.record(format!("LinkProgram({})", program));
        Ok(())
    }

    fn link_status(&mut self, program: RawHandle) -> Result<bool> {
        self.expect_live(ObjectCategory::ShaderProgram, program, Stage::Check)?;
        self.record(format!("GetProgramiv({}, LINK_STATUS)", program));
        Ok(self.program_links(program))
    }

    fn program_info_log(&mut self, program: RawHandle) -> Result<String> {
        self.expect_live(ObjectCategory::ShaderProgram, program, Stage::Info)?;
        self.record(format!("GetProgramInfoLog({})", program));
        if let Some(log) = &self.forced_info_log {
            return Ok(log.clone());
        }
        if self.program_links(program) {
            Ok(String::new())
        } else {
            Ok("error: program link failed".to_string())
        }
    }

    fn uniform_location(&mut self, program: RawHandle, name: &str) -> Result<UniformLocation> {
        self.expect_live(ObjectCategory::ShaderProgram, program, Stage::Info)?;
        self.record(format!("GetUniformLocation({}, {:?})", program, name));
        if self.unresolved_uniforms.iter().any(|n| n == name) {
            return Ok(UniformLocation::UNRESOLVED);
        }
        let key = (program, name.to_string());
        if let Some(location) = self.uniform_locations.get(&key) {
            return Ok(*location);
        }
        let location = UniformLocation::new(self.next_uniform_location);
        self.next_uniform_location += 1;
        self.uniform_locations.insert(key, location);
        Ok(location)
    }

    fn set_uniform(&mut self, location: UniformLocation, upload: UniformUpload<'_>) -> Result<()> {
        self.record(format!(
            "{}(location {}, count {}, transpose {})",
            upload.kind.native_call(),
            location.value(),
            upload.count,
            upload.transpose
        ));
        Ok(())
    }

    // ===== TEXTURES =====

    fn tex_image_1d(
        &mut self,
        kind: TextureKind,
        spec: &TextureSpec,
        _pixels: Option<&[u8]>,
    ) -> Result<()> {
        self.require_bound(BindPoint::Texture(kind), Stage::Source)?;
        self.record(format!("TexImage1D({:?}, {})", kind, spec.width));
        Ok(())
    }

    fn tex_image_2d(
        &mut self,
        kind: TextureKind,
        spec: &TextureSpec,
        _pixels: Option<&[u8]>,
    ) -> Result<()> {
        self.require_bound(BindPoint::Texture(kind), Stage::Source)?;
        self.record(format!("TexImage2D({:?}, {}x{})", kind, spec.width, spec.height));
        Ok(())
    }

    fn tex_image_3d(
        &mut self,
        kind: TextureKind,
        spec: &TextureSpec,
        _pixels: Option<&[u8]>,
    ) -> Result<()> {
        self.require_bound(BindPoint::Texture(kind), Stage::Source)?;
        self.record(format!(
            "TexImage3D({:?}, {}x{}x{})",
            kind, spec.width, spec.height, spec.depth
        ));
        Ok(())
    }

    fn generate_mipmaps(&mut self, kind: TextureKind) -> Result<()> {
        self.require_bound(BindPoint::Texture(kind), Stage::Source)?;
        self.record(format!("GenerateMipmap({:?})", kind));
        Ok(())
    }

    fn tex_parameter_i(&mut self, kind: TextureKind, pname: u32, values: &[i32]) -> Result<()> {
        self.require_bound(BindPoint::Texture(kind), Stage::Setup)?;
        self.record(format!(
            "TexParameteriv({:?}, {:#06x}, {} values)",
            kind,
            pname,
            values.len()
        ));
        Ok(())
    }

    fn tex_parameter_f(&mut self, kind: TextureKind, pname: u32, values: &[f32]) -> Result<()> {
        self.require_bound(BindPoint::Texture(kind), Stage::Setup)?;
        self.record(format!(
            "TexParameterfv({:?}, {:#06x}, {} values)",
            kind,
            pname,
            values.len()
        ));
        Ok(())
    }

    // ===== CAPABILITIES AND DIAGNOSTICS =====

    fn query_capabilities(&mut self) -> Result<DriverCapabilities> {
        self.record("QueryCapabilities".to_string());
        Ok(DriverCapabilities {
            max_texture_slots: self.max_texture_slots,
            context_flags: self.context_flags,
        })
    }

    fn install_debug_callback(&mut self, sink: DebugSink) -> Result<()> {
        self.record("DebugMessageCallback".to_string());
        self.debug_sink = Some(sink);
        Ok(())
    }
}

/// Native bind-call name for a bind point (unbind records handle 0)
fn bind_call(point: BindPoint, handle: RawHandle) -> String {
    match point {
        BindPoint::Buffer(target) => format!("BindBuffer({:?}, {})", target, handle),
        BindPoint::VertexArray => format!("BindVertexArray({})", handle),
        BindPoint::Program => format!("UseProgram({})", handle),
        BindPoint::Texture(kind) => format!("BindTexture({:?}, {})", kind, handle),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "recording_tests.rs"]
mod tests;
