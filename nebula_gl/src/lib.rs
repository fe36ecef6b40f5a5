/*!
# NebulaGL

Object-lifecycle and binding layer for a handle-based graphics API.

This crate provides the platform-agnostic core: opaque handles with closed
categories, owning objects and batch arrays with borrowing views, a global
one-binding-per-point model made explicit through the [`nebulagl::Context`]
singleton, and structured diagnostics. The native API is consumed through
the [`driver::Driver`] trait; backend implementations (e.g. the OpenGL 4.6
driver crate) are separate plugins, and the in-memory
[`driver::recording::RecordingDriver`] serves tests and dry runs.

## Architecture

- **Driver**: trait boundary to the native API (allocate/free/bind/upload)
- **Context**: process-wide driver, logger, and capability snapshot
- **Object layer**: `Buffer`, `VertexArray`, `Shader`, `Program`, `Texture`
  plus `BufferArray`/`VertexArrayArray` batches and their views
- **Error taxonomy**: lifecycle stage crossed with object category
*/

// Internal modules
pub mod context;
pub mod driver;
pub mod error;
pub mod log;
pub mod object;

// Main nebulagl namespace module
pub mod nebulagl {
    // Error types
    pub use crate::error::{Error, Result, Stage};

    // Context singleton
    pub use crate::context::Context;

    // Logging sub-module: the pipeline surface (macros stay at the root)
    pub mod log {
        pub use crate::log::{
            default_severity_floor, emit, enabled, reset_sink, set_severity_floor, set_sink,
            severity_floor, CallOrigin, ConsoleSink, LogRecord, LogSeverity, LogSink,
        };
    }

    // Driver sub-module: the native-API seam and its support types
    pub mod driver {
        pub use crate::driver::capabilities::{ContextFlags, DriverCapabilities};
        pub use crate::driver::debug::{
            DebugKind, DebugMessage, DebugSeverity, DebugSink, DebugSource,
        };
        pub use crate::driver::recording::RecordingDriver;
        pub use crate::driver::{Driver, DriverConfig, DriverHandle};
    }

    // Object sub-module with all object types
    pub mod object {
        pub use crate::object::*;
    }
}
