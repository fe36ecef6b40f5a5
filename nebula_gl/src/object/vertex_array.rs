//! Vertex array objects
//!
//! Vertex arrays carry no descriptor - a live handle is all there is to
//! validate. Provided in owning and batch forms like buffers.

use crate::driver::{lock_driver, DriverHandle};
use crate::error::{Result, Stage};
use crate::{nebula_trace, nebula_warn};

use super::array::HandleBlock;
use super::handle::{BindPoint, GlObject, ObjectCategory, RawHandle};

/// Vertex array object with exclusive handle ownership
pub struct VertexArray {
    driver: DriverHandle,
    handle: RawHandle,
}

impl VertexArray {
    /// Allocate a vertex array handle
    pub fn new(driver: &DriverHandle) -> Result<Self> {
        let handle = {
            let mut guard = lock_driver(
                driver,
                Stage::Create,
                ObjectCategory::VertexArray,
                "nebulagl::VertexArray::new",
            )?;
            ObjectCategory::VertexArray.create_batch(&mut *guard, 1)?[0]
        };
        nebula_trace!("nebulagl::VertexArray", "created vertex array {}", handle);
        Ok(Self {
            driver: driver.clone(),
            handle,
        })
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
            ObjectCategory::VertexArray,
            "nebulagl::VertexArray::destroy",
        )?;
        ObjectCategory::VertexArray.delete_batch(&mut *guard, &[handle])
    }
}

impl GlObject for VertexArray {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }

    fn category(&self) -> ObjectCategory {
        ObjectCategory::VertexArray
    }

    fn driver_handle(&self) -> &DriverHandle {
        &self.driver
    }

    fn bind_point(&self) -> Result<BindPoint> {
        Ok(BindPoint::VertexArray)
    }

    fn is_valid(&self) -> bool {
        self.handle != 0
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            nebula_warn!("nebulagl::VertexArray", "destroy failed during drop: {}", err);
        }
    }
}

/// Batch of vertex array handles
///
/// One bulk allocation, one bulk free at drop; `at(index)` views never free.
pub struct VertexArrayArray {
    block: HandleBlock,
}

impl VertexArrayArray {
    /// Allocate `len` vertex array handles in one native call
    pub fn new(driver: &DriverHandle, len: usize) -> Result<Self> {
        let block = HandleBlock::allocate(driver, ObjectCategory::VertexArray, len)?;
        Ok(Self { block })
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.block.len()
    }

    /// Whether the array has no slots (never true for a live array)
    pub fn is_empty(&self) -> bool {
        self.block.len() == 0
    }

    /// Non-owning view of slot `index`; fails for `index >= len()`
    pub fn at(&self, index: usize) -> Result<VertexArrayView<'_>> {
        self.block
            .check_index(index, "nebulagl::VertexArrayArray::at")?;
        Ok(VertexArrayView { array: self, index })
    }
}

/// Non-owning view of one `VertexArrayArray` slot
pub struct VertexArrayView<'a> {
    array: &'a VertexArrayArray,
    index: usize,
}

impl VertexArrayView<'_> {
    /// Slot index inside the array
    pub fn index(&self) -> usize {
        self.index
    }
}

impl GlObject for VertexArrayView<'_> {
    fn raw_handle(&self) -> RawHandle {
        self.array.block.handle(self.index)
    }

    fn category(&self) -> ObjectCategory {
        ObjectCategory::VertexArray
    }

    fn driver_handle(&self) -> &DriverHandle {
        self.array.block.driver()
    }

    fn bind_point(&self) -> Result<BindPoint> {
        Ok(BindPoint::VertexArray)
    }

    fn is_valid(&self) -> bool {
        self.raw_handle() != 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "vertex_array_tests.rs"]
mod tests;
