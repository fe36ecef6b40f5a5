//! NebulaGL context - singleton manager for the native driver
//!
//! The underlying API keeps one "currently bound object" per bind point,
//! process-wide. This module makes that global state explicit: one context,
//! one registered driver, one capability snapshot with a documented
//! lifecycle (populated once after driver registration, torn down with the
//! driver). It uses thread-safe static storage with RwLock for safe
//! concurrent access.

use std::sync::{Arc, Mutex, OnceLock, RwLock};

use crate::driver::capabilities::{self, DriverCapabilities};
use crate::driver::{Driver, DriverHandle};
use crate::error::{Result, Stage};
use crate::{nebula_err, nebula_info};

// ===== INTERNAL STATE =====

/// Global context state storage
static CONTEXT_STATE: OnceLock<ContextState> = OnceLock::new();

/// Internal state structure holding the context singletons
struct ContextState {
    /// Driver singleton (wrapped in Mutex for thread-safe mutable access)
    driver: RwLock<Option<DriverHandle>>,
}

impl ContextState {
    /// Create a new empty context state
    fn new() -> Self {
        Self {
            driver: RwLock::new(None),
        }
    }
}

// ===== PUBLIC API =====

/// Process-wide context singleton
///
/// Manages the lifecycle of the native driver and the capability snapshot.
/// There is exactly one native binding state per process; this type is the
/// visible owner of it.
///
/// # Example
///
/// ```no_run
/// use nebula_gl::nebulagl::Context;
/// use nebula_gl::driver::recording::RecordingDriver;
///
/// Context::initialize()?;
/// Context::create_driver(RecordingDriver::new())?;
///
/// let driver = Context::driver()?;
/// // Create objects against `driver`...
///
/// Context::shutdown();
/// # Ok::<(), nebula_gl::nebulagl::Error>(())
/// ```
pub struct Context;

impl Context {
    /// Initialize the context
    ///
    /// This must be called once at application startup before registering
    /// a driver.
    ///
    /// # Errors
    ///
    /// Currently always succeeds, but returns Result for future extensibility.
    pub fn initialize() -> Result<()> {
        CONTEXT_STATE.get_or_init(ContextState::new);
        Ok(())
    }

    /// Shutdown the context and drop the registered driver
    ///
    /// Tears down the capability snapshot with the driver. After calling
    /// this, `initialize()` must be called again before registering a new
    /// driver.
    pub fn shutdown() {
        capabilities::clear_snapshot();
        if let Some(state) = CONTEXT_STATE.get() {
            if let Ok(mut driver) = state.driver.write() {
                *driver = None;
            }
        }
    }

    /// Create and register the driver singleton
    ///
    /// Wraps the driver in `Arc<Mutex<..>>` and registers it as the
    /// process-wide driver.
    ///
    /// # Arguments
    ///
    /// * `driver` - Any type implementing the Driver trait
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The context is not initialized
    /// - A driver already exists
    /// - The driver lock is poisoned
    pub fn create_driver<D: Driver + 'static>(driver: D) -> Result<()> {
        let handle: DriverHandle = Arc::new(Mutex::new(driver));
        Self::register_driver(handle)?;
        nebula_info!("nebulagl::Context", "driver singleton registered");
        Ok(())
    }

    /// Register a driver singleton (internal use)
    pub(crate) fn register_driver(driver: DriverHandle) -> Result<()> {
        let state = CONTEXT_STATE.get().ok_or_else(|| {
            nebula_err!(
                Stage::Create,
                None,
                "nebulagl::Context::create_driver",
                "context not initialized. Call Context::initialize() first"
            )
        })?;

        let mut lock = state.driver.write().map_err(|_| {
            nebula_err!(
                Stage::Create,
                None,
                "nebulagl::Context::create_driver",
                "driver lock poisoned"
            )
        })?;

        if lock.is_some() {
            return Err(nebula_err!(
                Stage::Create,
                None,
                "nebulagl::Context::create_driver",
                "a driver is already registered. Call Context::destroy_driver() first"
            ));
        }

        *lock = Some(driver);
        Ok(())
    }

    /// Get the registered driver
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The context is not initialized
    /// - No driver has been registered
    pub fn driver() -> Result<DriverHandle> {
        let state = CONTEXT_STATE.get().ok_or_else(|| {
            nebula_err!(
                Stage::Create,
                None,
                "nebulagl::Context::driver",
                "context not initialized. Call Context::initialize() first"
            )
        })?;

        let lock = state.driver.read().map_err(|_| {
            nebula_err!(
                Stage::Create,
                None,
                "nebulagl::Context::driver",
                "driver lock poisoned"
            )
        })?;

        lock.clone().ok_or_else(|| {
            nebula_err!(
                Stage::Create,
                None,
                "nebulagl::Context::driver",
                "no driver registered. Call Context::create_driver() first"
            )
        })
    }

    /// Destroy the registered driver
    ///
    /// Removes the driver singleton and tears down the capability snapshot,
    /// allowing a new driver to be registered. Existing driver references
    /// remain valid until dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is not initialized
    pub fn destroy_driver() -> Result<()> {
        let state = CONTEXT_STATE.get().ok_or_else(|| {
            nebula_err!(
                Stage::Destroy,
                None,
                "nebulagl::Context::destroy_driver",
                "context not initialized"
            )
        })?;

        let mut lock = state.driver.write().map_err(|_| {
            nebula_err!(
                Stage::Destroy,
                None,
                "nebulagl::Context::destroy_driver",
                "driver lock poisoned"
            )
        })?;

        *lock = None;
        capabilities::clear_snapshot();

        nebula_info!("nebulagl::Context", "driver singleton destroyed");

        Ok(())
    }

    /// Get the process-wide capability snapshot
    ///
    /// Queried from the registered driver once and cached; read-only
    /// thereafter until the driver is destroyed.
    ///
    /// # Errors
    ///
    /// Returns an error if no driver is registered or the query fails.
    pub fn capabilities() -> Result<DriverCapabilities> {
        let driver = Self::driver()?;
        DriverCapabilities::snapshot(&driver)
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub(crate) fn reset_for_testing() {
        capabilities::clear_snapshot();
        if let Some(state) = CONTEXT_STATE.get() {
            if let Ok(mut driver) = state.driver.write() {
                *driver = None;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
