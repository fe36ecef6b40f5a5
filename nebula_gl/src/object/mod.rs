//! Object module - handle primitives and typed GL objects
//!
//! Ownership comes in three shapes: an owning object (frees its handle
//! exactly once), a batch array (one bulk allocation, one bulk free), and a
//! borrowing view into an array slot (never frees). Binding goes through the
//! closed [`BindPoint`] set; one native call per bind or unbind.

// Module declarations
pub(crate) mod array;
pub mod buffer;
pub mod handle;
pub mod program;
pub mod shader;
pub mod texture;
pub mod uniform;
pub mod vertex_array;

// Re-export the object API
pub use buffer::{
    Buffer, BufferAccess, BufferArray, BufferDescriptor, BufferMapping, BufferTarget, BufferUsage,
    BufferView,
};
pub use handle::{BindPoint, GlObject, Handle, ObjectCategory, RawHandle};
pub use program::Program;
pub use shader::{Shader, ShaderStage};
pub use texture::{Texture, TextureConfig, TextureKind, TextureSpec};
pub use uniform::{Uniform, UniformData, UniformKind, UniformLocation, UniformUpload};
pub use vertex_array::{VertexArray, VertexArrayArray, VertexArrayView};
