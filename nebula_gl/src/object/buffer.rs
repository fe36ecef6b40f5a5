//! Buffer objects: descriptors, owning buffers, batch arrays, and views
//!
//! A buffer's descriptor (target, usage, access) is fixed at creation for
//! owning buffers and per-slot for arrays. Every data operation binds first,
//! then issues exactly one native upload call.

use crate::driver::{lock_driver, DriverHandle};
use crate::error::{Result, Stage};
use crate::{nebula_bail, nebula_err, nebula_trace, nebula_warn};

use super::array::HandleBlock;
use super::handle::{BindPoint, GlObject, ObjectCategory, RawHandle};

// ===== DESCRIPTOR =====

/// Buffer bind target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data
    Array,
    /// Vertex index data
    Element,
    /// Uniform block storage
    Uniform,
    /// Shader storage block
    ShaderStorage,
}

/// Buffer usage hint: update frequency crossed with transfer direction
///
/// Stored in the descriptor and forwarded to every allocation call; the
/// driver has no generic "upload" entry point without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    StreamDraw,
    StreamRead,
    StreamCopy,
    StaticDraw,
    StaticRead,
    StaticCopy,
    DynamicDraw,
    DynamicRead,
    DynamicCopy,
}

/// Client access mode for buffer mappings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Caller-declared buffer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    pub target: BufferTarget,
    pub usage: BufferUsage,
    pub access: BufferAccess,
}

// ===== OWNING BUFFER =====

/// Buffer object with exclusive handle ownership
///
/// The native handle is freed exactly once: on `destroy()` or at drop,
/// whichever comes first. Move-only; a buffer cannot be cloned because its
/// handle names a unique native object.
pub struct Buffer {
    driver: DriverHandle,
    handle: RawHandle,
    descriptor: BufferDescriptor,
    allocated: Option<usize>,
}

impl Buffer {
    /// Allocate a buffer handle with the given descriptor
    ///
    /// # Errors
    ///
    /// Returns a `Stage::Create` error if the driver refuses the allocation.
    pub fn new(driver: &DriverHandle, descriptor: BufferDescriptor) -> Result<Self> {
        let handle = {
            let mut guard = lock_driver(
                driver,
                Stage::Create,
                ObjectCategory::Buffer,
                "nebulagl::Buffer::new",
            )?;
            ObjectCategory::Buffer.create_batch(&mut *guard, 1)?[0]
        };
        nebula_trace!("nebulagl::Buffer", "created buffer {}", handle);
        Ok(Self {
            driver: driver.clone(),
            handle,
            descriptor,
            allocated: None,
        })
    }

    /// Descriptor this buffer was created with
    pub fn descriptor(&self) -> BufferDescriptor {
        self.descriptor
    }

    /// Size in bytes of the last allocation, if any
    pub fn allocated_size(&self) -> Option<usize> {
        self.allocated
    }

    /// Upload `data`, replacing any previous storage
    ///
    /// Binds, then issues one data-upload call with the descriptor's usage
    /// hint.
    pub fn upload(&mut self, data: &[u8]) -> Result<()> {
        self.bind()?;
        lock_driver(
            &self.driver,
            Stage::Source,
            ObjectCategory::Buffer,
            "nebulagl::Buffer::upload",
        )?
        .buffer_data(self.descriptor.target, data, self.descriptor.usage)?;
        self.allocated = Some(data.len());
        Ok(())
    }

    /// Upload a typed slice (byte-cast via bytemuck)
    pub fn upload_slice<T: bytemuck::NoUninit>(&mut self, data: &[T]) -> Result<()> {
        self.upload(bytemuck::cast_slice(data))
    }

    /// Allocate `size` bytes of uninitialized storage
    pub fn allocate_storage(&mut self, size: usize) -> Result<()> {
        self.bind()?;
        lock_driver(
            &self.driver,
            Stage::Source,
            ObjectCategory::Buffer,
            "nebulagl::Buffer::allocate_storage",
        )?
        .buffer_storage(self.descriptor.target, size, self.descriptor.usage)?;
        self.allocated = Some(size);
        Ok(())
    }

    /// Overwrite a sub-range without reallocating
    ///
    /// The range must lie inside the last allocated storage; a range past
    /// the end fails with `Stage::Setup` before any native call.
    pub fn update_range(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let allocated = match self.allocated {
            Some(size) => size,
            None => nebula_bail!(
                Stage::Setup,
                ObjectCategory::Buffer,
                "nebulagl::Buffer::update_range",
                "sub-range update before any storage allocation"
            ),
        };
        if offset + data.len() > allocated {
            nebula_bail!(
                Stage::Setup,
                ObjectCategory::Buffer,
                "nebulagl::Buffer::update_range",
                "range {}..{} exceeds allocated size {}",
                offset,
                offset + data.len(),
                allocated
            );
        }
        self.bind()?;
        lock_driver(
            &self.driver,
            Stage::Setup,
            ObjectCategory::Buffer,
            "nebulagl::Buffer::update_range",
        )?
        .buffer_sub_data(self.descriptor.target, offset, data)
    }

    /// Overwrite a sub-range with a typed slice
    pub fn update_range_slice<T: bytemuck::NoUninit>(
        &mut self,
        offset: usize,
        data: &[T],
    ) -> Result<()> {
        self.update_range(offset, bytemuck::cast_slice(data))
    }

    /// Map the buffer into client memory
    ///
    /// The returned guard unmaps at drop; the pointer cannot outlive it.
    /// The native API allows one active mapping per buffer - that constraint
    /// is the caller's to respect, it is not tracked here.
    pub fn map(&mut self, access: BufferAccess) -> Result<BufferMapping<'_>> {
        self.bind()?;
        let ptr = lock_driver(
            &self.driver,
            Stage::Setup,
            ObjectCategory::Buffer,
            "nebulagl::Buffer::map",
        )?
        .map_buffer(self.descriptor.target, access)?;
        Ok(BufferMapping { buffer: self, ptr })
    }

    /// Free the native handle now
    ///
    /// Idempotent: a second call (or the later drop) performs no native call.
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
            ObjectCategory::Buffer,
            "nebulagl::Buffer::destroy",
        )?;
        ObjectCategory::Buffer.delete_batch(&mut *guard, &[handle])
    }
}

impl GlObject for Buffer {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }

    fn category(&self) -> ObjectCategory {
        ObjectCategory::Buffer
    }

    fn driver_handle(&self) -> &DriverHandle {
        &self.driver
    }

    fn bind_point(&self) -> Result<BindPoint> {
        Ok(BindPoint::Buffer(self.descriptor.target))
    }

    fn is_valid(&self) -> bool {
        self.handle != 0
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            nebula_warn!("nebulagl::Buffer", "destroy failed during drop: {}", err);
        }
    }
}

// ===== MAPPING GUARD =====

/// Scoped exclusive access to a buffer's native-side memory
///
/// Unmaps at drop; use `unmap()` to observe the unmap result instead.
pub struct BufferMapping<'a> {
    buffer: &'a mut Buffer,
    ptr: *mut u8,
}

impl BufferMapping<'_> {
    /// Mapped base pointer (read access)
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Mapped base pointer (write access)
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr
    }

    /// Length of the mapped storage in bytes
    pub fn len(&self) -> usize {
        self.buffer.allocated.unwrap_or(0)
    }

    /// Whether the mapped storage is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View the mapped storage as a byte slice
    ///
    /// # Safety
    ///
    /// The caller must ensure the mapping was created with read access and
    /// that the native side is not writing the storage concurrently.
    pub unsafe fn as_slice(&self) -> &[u8] {
        std::slice::from_raw_parts(self.ptr, self.len())
    }

    /// View the mapped storage as a mutable byte slice
    ///
    /// # Safety
    ///
    /// The caller must ensure the mapping was created with write access and
    /// that the native side is not reading the storage concurrently.
    pub unsafe fn as_mut_slice(&mut self) -> &mut [u8] {
        std::slice::from_raw_parts_mut(self.ptr, self.len())
    }

    /// Unmap now, reporting the native result
    pub fn unmap(mut self) -> Result<()> {
        let result = self.release();
        std::mem::forget(self);
        result
    }

    fn release(&mut self) -> Result<()> {
        lock_driver(
            &self.buffer.driver,
            Stage::Setup,
            ObjectCategory::Buffer,
            "nebulagl::BufferMapping::unmap",
        )?
        .unmap_buffer(self.buffer.descriptor.target)
    }
}

impl Drop for BufferMapping<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            nebula_warn!("nebulagl::BufferMapping", "unmap failed during drop: {}", err);
        }
    }
}

// ===== BATCH ARRAY =====

/// Batch of buffer handles with per-slot descriptors
///
/// One bulk allocation at construction, one bulk free at drop. Slots must be
/// given a descriptor before they are bound or written. Data operations live
/// on the array (which owns the per-slot size bookkeeping); `at(index)`
/// produces non-owning views for binding.
#[derive(Debug)]
pub struct BufferArray {
    block: HandleBlock,
    descriptors: Vec<Option<BufferDescriptor>>,
    allocated: Vec<Option<usize>>,
}

impl BufferArray {
    /// Allocate `len` buffer handles in one native call
    pub fn new(driver: &DriverHandle, len: usize) -> Result<Self> {
        let block = HandleBlock::allocate(driver, ObjectCategory::Buffer, len)?;
        Ok(Self {
            descriptors: vec![None; len],
            allocated: vec![None; len],
            block,
        })
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.block.len()
    }

    /// Whether the array has no slots (never true for a live array)
    pub fn is_empty(&self) -> bool {
        self.block.len() == 0
    }

    /// Store the descriptor for slot `index`
    pub fn set_descriptor(&mut self, index: usize, descriptor: BufferDescriptor) -> Result<()> {
        self.block
            .check_index(index, "nebulagl::BufferArray::set_descriptor")?;
        self.descriptors[index] = Some(descriptor);
        Ok(())
    }

    /// Descriptor stored for slot `index`, if any
    pub fn descriptor(&self, index: usize) -> Result<Option<BufferDescriptor>> {
        self.block
            .check_index(index, "nebulagl::BufferArray::descriptor")?;
        Ok(self.descriptors[index])
    }

    /// Non-owning view of slot `index`
    ///
    /// Fails for `index >= len()`; the view never frees the handle.
    pub fn at(&self, index: usize) -> Result<BufferView<'_>> {
        self.block.check_index(index, "nebulagl::BufferArray::at")?;
        Ok(BufferView { array: self, index })
    }

    /// Upload `data` to slot `index`, replacing any previous storage
    pub fn upload(&mut self, index: usize, data: &[u8]) -> Result<()> {
        let descriptor = self.configured(index, "nebulagl::BufferArray::upload")?;
        self.bind_slot(index, descriptor)?;
        lock_driver(
            self.block.driver(),
            Stage::Source,
            ObjectCategory::Buffer,
            "nebulagl::BufferArray::upload",
        )?
        .buffer_data(descriptor.target, data, descriptor.usage)?;
        self.allocated[index] = Some(data.len());
        Ok(())
    }

    /// Upload a typed slice to slot `index`
    pub fn upload_slice<T: bytemuck::NoUninit>(&mut self, index: usize, data: &[T]) -> Result<()> {
        self.upload(index, bytemuck::cast_slice(data))
    }

    /// Allocate uninitialized storage for slot `index`
    pub fn allocate_storage(&mut self, index: usize, size: usize) -> Result<()> {
        let descriptor = self.configured(index, "nebulagl::BufferArray::allocate_storage")?;
        self.bind_slot(index, descriptor)?;
        lock_driver(
            self.block.driver(),
            Stage::Source,
            ObjectCategory::Buffer,
            "nebulagl::BufferArray::allocate_storage",
        )?
        .buffer_storage(descriptor.target, size, descriptor.usage)?;
        self.allocated[index] = Some(size);
        Ok(())
    }

    /// Overwrite a sub-range of slot `index` without reallocating
    pub fn update_range(&mut self, index: usize, offset: usize, data: &[u8]) -> Result<()> {
        let descriptor = self.configured(index, "nebulagl::BufferArray::update_range")?;
        let allocated = match self.allocated[index] {
            Some(size) => size,
            None => nebula_bail!(
                Stage::Setup,
                ObjectCategory::Buffer,
                "nebulagl::BufferArray::update_range",
                "slot {}: sub-range update before any storage allocation",
                index
            ),
        };
        if offset + data.len() > allocated {
            nebula_bail!(
                Stage::Setup,
                ObjectCategory::Buffer,
                "nebulagl::BufferArray::update_range",
                "slot {}: range {}..{} exceeds allocated size {}",
                index,
                offset,
                offset + data.len(),
                allocated
            );
        }
        self.bind_slot(index, descriptor)?;
        lock_driver(
            self.block.driver(),
            Stage::Setup,
            ObjectCategory::Buffer,
            "nebulagl::BufferArray::update_range",
        )?
        .buffer_sub_data(descriptor.target, offset, data)
    }

    fn configured(&self, index: usize, call_site: &'static str) -> Result<BufferDescriptor> {
        self.block.check_index(index, call_site)?;
        self.descriptors[index].ok_or_else(|| {
            nebula_err!(
                Stage::Type,
                ObjectCategory::Buffer,
                call_site,
                "slot {} has no descriptor",
                index
            )
        })
    }

    fn bind_slot(&self, index: usize, descriptor: BufferDescriptor) -> Result<()> {
        lock_driver(
            self.block.driver(),
            Stage::Bind,
            ObjectCategory::Buffer,
            "nebulagl::BufferArray::bind_slot",
        )?
        .bind(
            BindPoint::Buffer(descriptor.target),
            self.block.handle(index),
        )
    }
}

// ===== VIEW =====

/// Non-owning view of one `BufferArray` slot
///
/// Binds and unbinds like an owning buffer, using the array's stored
/// descriptor; never frees the handle (the array does, in bulk).
#[derive(Debug)]
pub struct BufferView<'a> {
    array: &'a BufferArray,
    index: usize,
}

impl BufferView<'_> {
    /// Slot index inside the array
    pub fn index(&self) -> usize {
        self.index
    }

    /// Descriptor stored for this slot, if any
    pub fn descriptor(&self) -> Option<BufferDescriptor> {
        self.array.descriptors[self.index]
    }
}

impl GlObject for BufferView<'_> {
    fn raw_handle(&self) -> RawHandle {
        self.array.block.handle(self.index)
    }

    fn category(&self) -> ObjectCategory {
        ObjectCategory::Buffer
    }

    fn driver_handle(&self) -> &DriverHandle {
        self.array.block.driver()
    }

    fn bind_point(&self) -> Result<BindPoint> {
        match self.array.descriptors[self.index] {
            Some(descriptor) => Ok(BindPoint::Buffer(descriptor.target)),
            None => Err(nebula_err!(
                Stage::Type,
                ObjectCategory::Buffer,
                "nebulagl::BufferView::bind_point",
                "slot {} has no descriptor",
                self.index
            )),
        }
    }

    fn is_valid(&self) -> bool {
        self.array.descriptors[self.index].is_some() && self.raw_handle() != 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
