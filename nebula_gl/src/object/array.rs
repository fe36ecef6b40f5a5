//! Batch handle storage shared by the typed object arrays
//!
//! A block owns a contiguous run of handles of one category: one bulk
//! allocation at construction, one bulk release at drop, regardless of how
//! many views into it were produced. Index validation is strict - `index`
//! must be strictly less than the block length.

use crate::driver::{lock_driver, DriverHandle};
use crate::error::{Result, Stage};
use crate::{nebula_err, nebula_warn};

use super::handle::{ObjectCategory, RawHandle};

/// Contiguous run of same-category handles, owned as one batch
#[derive(Debug)]
pub(crate) struct HandleBlock {
    driver: DriverHandle,
    category: ObjectCategory,
    handles: Vec<RawHandle>,
}

impl HandleBlock {
    /// Allocate `len` handles of `category` in one native call
    pub(crate) fn allocate(
        driver: &DriverHandle,
        category: ObjectCategory,
        len: usize,
    ) -> Result<Self> {
        if len == 0 {
            return Err(nebula_err!(
                Stage::Create,
                category,
                "nebulagl::HandleBlock::allocate",
                "batch size must be non-zero"
            ));
        }
        let handles = {
            let mut guard = lock_driver(
                driver,
                Stage::Create,
                category,
                "nebulagl::HandleBlock::allocate",
            )?;
            category.create_batch(&mut *guard, len)?
        };
        Ok(Self {
            driver: driver.clone(),
            category,
            handles,
        })
    }

    pub(crate) fn driver(&self) -> &DriverHandle {
        &self.driver
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    /// Strict bounds check: fails for `index >= len`, no native side effect
    pub(crate) fn check_index(&self, index: usize, call_site: &'static str) -> Result<()> {
        if index >= self.handles.len() {
            return Err(nebula_err!(
                Stage::Type,
                self.category,
                call_site,
                "index {} out of range for array of {}",
                index,
                self.handles.len()
            ));
        }
        Ok(())
    }

    /// Handle at `index` (callers bounds-check first)
    pub(crate) fn handle(&self, index: usize) -> RawHandle {
        self.handles[index]
    }

    /// One bulk release over all handles; idempotent
    fn release(&mut self) -> Result<()> {
        if self.handles.is_empty() {
            return Ok(());
        }
        let handles = std::mem::take(&mut self.handles);
        let mut guard = lock_driver(
            &self.driver,
            Stage::Destroy,
            self.category,
            "nebulagl::HandleBlock::release",
        )?;
        self.category.delete_batch(&mut *guard, &handles)
    }
}

impl Drop for HandleBlock {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            nebula_warn!(
                "nebulagl::HandleBlock",
                "bulk release failed during drop: {}",
                err
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "array_tests.rs"]
mod tests;
