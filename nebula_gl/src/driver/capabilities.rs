//! Process-wide driver capability snapshot
//!
//! Driver limits are immutable for the lifetime of a native context, so they
//! are queried once and cached process-wide. The snapshot is torn down with
//! the context (see `Context::destroy_driver`/`Context::shutdown`).

use std::sync::{OnceLock, RwLock};

use crate::driver::{lock_driver, DriverHandle};
use crate::error::{Result, Stage};
use crate::{nebula_debug, nebula_err};

bitflags::bitflags! {
    /// Native context flag word reported by the driver
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ContextFlags: u32 {
        /// Forward-compatible context (deprecated features removed)
        const FORWARD_COMPATIBLE = 0x0001;
        /// Debug context (asynchronous debug output available)
        const DEBUG = 0x0002;
        /// Robust buffer access bounds checks
        const ROBUST_ACCESS = 0x0004;
        /// Context created with error reporting disabled
        const NO_ERROR = 0x0008;
    }
}

/// Read-only snapshot of driver limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverCapabilities {
    /// Number of texture units the driver exposes
    pub max_texture_slots: u32,
    /// Context flag word (see [`ContextFlags`])
    pub context_flags: ContextFlags,
}

impl DriverCapabilities {
    /// Whether the native context was created with debug output support
    pub fn debug_context(&self) -> bool {
        self.context_flags.contains(ContextFlags::DEBUG)
    }

    /// Get the process-wide snapshot, querying `driver` on first use
    ///
    /// Subsequent calls return the cached value without touching the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the first-use native query fails.
    pub fn snapshot(driver: &DriverHandle) -> Result<DriverCapabilities> {
        let cell = snapshot_cell();

        {
            let read = cell.read().map_err(|_| {
                nebula_err!(
                    Stage::Setup,
                    None,
                    "nebulagl::DriverCapabilities::snapshot",
                    "capability lock poisoned"
                )
            })?;
            if let Some(caps) = *read {
                return Ok(caps);
            }
        }

        let caps = lock_driver(
            driver,
            Stage::Setup,
            None,
            "nebulagl::DriverCapabilities::snapshot",
        )?
        .query_capabilities()?;

        let mut write = cell.write().map_err(|_| {
            nebula_err!(
                Stage::Setup,
                None,
                "nebulagl::DriverCapabilities::snapshot",
                "capability lock poisoned"
            )
        })?;

        // Another thread may have populated the snapshot meanwhile
        if let Some(existing) = *write {
            return Ok(existing);
        }

        *write = Some(caps);
        nebula_debug!(
            "nebulagl::DriverCapabilities",
            "snapshot populated: {} texture slots, flags {:?}",
            caps.max_texture_slots,
            caps.context_flags
        );
        Ok(caps)
    }
}

/// Global snapshot storage
static SNAPSHOT: OnceLock<RwLock<Option<DriverCapabilities>>> = OnceLock::new();

fn snapshot_cell() -> &'static RwLock<Option<DriverCapabilities>> {
    SNAPSHOT.get_or_init(|| RwLock::new(None))
}

/// Tear down the snapshot (the context is going away)
pub(crate) fn clear_snapshot() {
    if let Some(cell) = SNAPSHOT.get() {
        if let Ok(mut write) = cell.write() {
            *write = None;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;
