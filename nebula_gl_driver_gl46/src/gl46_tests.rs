use super::*;
use crate::gl46_debug::{map_kind, map_severity, map_source};
use nebula_gl::nebulagl::driver::{DebugKind, DebugSeverity, DebugSource};

// ============================================================================
// Enum mapping tests (pure functions, no GL context required)
// ============================================================================

#[test]
fn test_buffer_target_words() {
    assert_eq!(buffer_target_to_gl(BufferTarget::Array), gl::ARRAY_BUFFER);
    assert_eq!(
        buffer_target_to_gl(BufferTarget::Element),
        gl::ELEMENT_ARRAY_BUFFER
    );
    assert_eq!(buffer_target_to_gl(BufferTarget::Uniform), gl::UNIFORM_BUFFER);
    assert_eq!(
        buffer_target_to_gl(BufferTarget::ShaderStorage),
        gl::SHADER_STORAGE_BUFFER
    );
}

#[test]
fn test_buffer_usage_words_are_distinct() {
    let usages = [
        BufferUsage::StreamDraw,
        BufferUsage::StreamRead,
        BufferUsage::StreamCopy,
        BufferUsage::StaticDraw,
        BufferUsage::StaticRead,
        BufferUsage::StaticCopy,
        BufferUsage::DynamicDraw,
        BufferUsage::DynamicRead,
        BufferUsage::DynamicCopy,
    ];
    for (i, a) in usages.iter().enumerate() {
        for b in usages.iter().skip(i + 1) {
            assert_ne!(buffer_usage_to_gl(*a), buffer_usage_to_gl(*b));
        }
    }
    assert_eq!(buffer_usage_to_gl(BufferUsage::StaticDraw), gl::STATIC_DRAW);
}

#[test]
fn test_buffer_access_words() {
    assert_eq!(buffer_access_to_gl(BufferAccess::ReadOnly), gl::READ_ONLY);
    assert_eq!(buffer_access_to_gl(BufferAccess::WriteOnly), gl::WRITE_ONLY);
    assert_eq!(buffer_access_to_gl(BufferAccess::ReadWrite), gl::READ_WRITE);
}

#[test]
fn test_shader_stage_words() {
    assert_eq!(shader_stage_to_gl(ShaderStage::Vertex), gl::VERTEX_SHADER);
    assert_eq!(shader_stage_to_gl(ShaderStage::Fragment), gl::FRAGMENT_SHADER);
    assert_eq!(shader_stage_to_gl(ShaderStage::Geometry), gl::GEOMETRY_SHADER);
    assert_eq!(
        shader_stage_to_gl(ShaderStage::TessControl),
        gl::TESS_CONTROL_SHADER
    );
    assert_eq!(
        shader_stage_to_gl(ShaderStage::TessEvaluation),
        gl::TESS_EVALUATION_SHADER
    );
    assert_eq!(shader_stage_to_gl(ShaderStage::Compute), gl::COMPUTE_SHADER);
}

#[test]
fn test_texture_kind_words() {
    assert_eq!(texture_kind_to_gl(TextureKind::Tex1D), gl::TEXTURE_1D);
    assert_eq!(texture_kind_to_gl(TextureKind::Tex2D), gl::TEXTURE_2D);
    assert_eq!(texture_kind_to_gl(TextureKind::Tex3D), gl::TEXTURE_3D);
    assert_eq!(
        texture_kind_to_gl(TextureKind::Tex1DArray),
        gl::TEXTURE_1D_ARRAY
    );
    assert_eq!(
        texture_kind_to_gl(TextureKind::Tex2DArray),
        gl::TEXTURE_2D_ARRAY
    );
    assert_eq!(texture_kind_to_gl(TextureKind::CubeMap), gl::TEXTURE_CUBE_MAP);
    assert_eq!(
        texture_kind_to_gl(TextureKind::CubeMapArray),
        gl::TEXTURE_CUBE_MAP_ARRAY
    );
}

// ============================================================================
// Debug word decoding tests
// ============================================================================

#[test]
fn test_debug_source_decoding() {
    assert_eq!(map_source(gl::DEBUG_SOURCE_API), DebugSource::Api);
    assert_eq!(
        map_source(gl::DEBUG_SOURCE_SHADER_COMPILER),
        DebugSource::ShaderCompiler
    );
    assert_eq!(map_source(0xFFFF_FFFF), DebugSource::Other);
}

#[test]
fn test_debug_kind_decoding() {
    assert_eq!(map_kind(gl::DEBUG_TYPE_ERROR), DebugKind::Error);
    assert_eq!(map_kind(gl::DEBUG_TYPE_PERFORMANCE), DebugKind::Performance);
    assert_eq!(map_kind(0xFFFF_FFFF), DebugKind::Other);
}

#[test]
fn test_debug_severity_decoding() {
    assert_eq!(map_severity(gl::DEBUG_SEVERITY_HIGH), DebugSeverity::High);
    assert_eq!(map_severity(gl::DEBUG_SEVERITY_MEDIUM), DebugSeverity::Medium);
    assert_eq!(map_severity(gl::DEBUG_SEVERITY_LOW), DebugSeverity::Low);
    assert_eq!(
        map_severity(gl::DEBUG_SEVERITY_NOTIFICATION),
        DebugSeverity::Notification
    );
}

// ============================================================================
// Pixel pointer tests
// ============================================================================

#[test]
fn test_pixel_ptr_null_for_uninitialized_upload() {
    assert!(pixel_ptr(None).is_null());
    let data = [1u8, 2, 3];
    assert!(!pixel_ptr(Some(&data)).is_null());
}
