/*!
# NebulaGL - OpenGL 4.6 Driver Backend

OpenGL 4.6 core implementation of the NebulaGL driver trait, built on raw
`gl` bindings.

The backend converts the core's closed enums to native GL words in pure
mapping functions and issues exactly one GL call per driver entry point.
When `DriverConfig::check_errors` is set, every call is followed by a
`glGetError` query and failures surface as structured errors; otherwise
calls are issued unchecked.

A current GL context must be made current on the calling thread before the
driver is constructed - context and window creation belong to the
application (e.g. glfw/winit + their GL loaders).
*/

// OpenGL implementation modules
mod gl46;
mod gl46_debug;

pub use gl46::Gl46Driver;
