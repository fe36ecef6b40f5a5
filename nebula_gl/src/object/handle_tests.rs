use super::*;
use crate::driver::recording::RecordingDriver;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helpers
// ============================================================================

fn recording_driver() -> (Arc<Mutex<RecordingDriver>>, DriverHandle) {
    let recording = Arc::new(Mutex::new(RecordingDriver::new()));
    let handle: DriverHandle = recording.clone();
    (recording, handle)
}

// ============================================================================
// ObjectCategory tests
// ============================================================================

#[test]
fn test_category_labels_are_distinct() {
    let categories = [
        ObjectCategory::Buffer,
        ObjectCategory::VertexArray,
        ObjectCategory::Texture,
        ObjectCategory::Shader,
        ObjectCategory::ShaderProgram,
        ObjectCategory::ShaderUniform,
    ];
    for (i, a) in categories.iter().enumerate() {
        for b in categories.iter().skip(i + 1) {
            assert_ne!(a.as_str(), b.as_str());
        }
    }
}

#[test]
fn test_batch_allocatable_categories() {
    assert!(ObjectCategory::Buffer.batch_allocatable());
    assert!(ObjectCategory::VertexArray.batch_allocatable());
    assert!(ObjectCategory::Texture.batch_allocatable());
    assert!(!ObjectCategory::Shader.batch_allocatable());
    assert!(!ObjectCategory::ShaderProgram.batch_allocatable());
    assert!(!ObjectCategory::ShaderUniform.batch_allocatable());
}

#[test]
fn test_create_batch_dispatches_per_category() {
    let (recording, _handle) = recording_driver();
    let mut driver = recording.lock().unwrap();

    ObjectCategory::Buffer.create_batch(&mut *driver, 2).unwrap();
    ObjectCategory::VertexArray
        .create_batch(&mut *driver, 1)
        .unwrap();
    ObjectCategory::Texture.create_batch(&mut *driver, 3).unwrap();

    assert_eq!(driver.count_calls("GenBuffers(2)"), 1);
    assert_eq!(driver.count_calls("GenVertexArrays(1)"), 1);
    assert_eq!(driver.count_calls("GenTextures(3)"), 1);
}

#[test]
fn test_create_batch_rejects_staged_categories() {
    let (recording, _handle) = recording_driver();
    let mut driver = recording.lock().unwrap();

    let err = ObjectCategory::Shader
        .create_batch(&mut *driver, 2)
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Create);
    assert_eq!(err.category(), Some(ObjectCategory::Shader));
    // The rejection happens before any native call
    assert!(driver.calls().is_empty());
}

#[test]
fn test_delete_batch_mirrors_create() {
    let (recording, _handle) = recording_driver();
    let mut driver = recording.lock().unwrap();

    let handles = ObjectCategory::Texture.create_batch(&mut *driver, 2).unwrap();
    ObjectCategory::Texture
        .delete_batch(&mut *driver, &handles)
        .unwrap();

    assert_eq!(driver.count_calls("DeleteTextures"), 1);
    assert_eq!(driver.live_count(ObjectCategory::Texture), 0);
}

// ============================================================================
// Handle tests
// ============================================================================

#[test]
fn test_handle_tagging() {
    let handle = Handle::new(5, ObjectCategory::Buffer);
    assert_eq!(handle.raw(), 5);
    assert_eq!(handle.category(), ObjectCategory::Buffer);
    assert!(handle.is_allocated());
}

#[test]
fn test_zero_handle_is_not_allocated() {
    let handle = Handle::new(0, ObjectCategory::Texture);
    assert!(!handle.is_allocated());
}

#[test]
fn test_same_value_different_category_are_distinct() {
    let buffer = Handle::new(1, ObjectCategory::Buffer);
    let texture = Handle::new(1, ObjectCategory::Texture);
    assert_ne!(buffer, texture);
}

// ============================================================================
// BindPoint tests
// ============================================================================

#[test]
fn test_bind_point_categories() {
    assert_eq!(
        BindPoint::Buffer(BufferTarget::Array).category(),
        ObjectCategory::Buffer
    );
    assert_eq!(BindPoint::VertexArray.category(), ObjectCategory::VertexArray);
    assert_eq!(BindPoint::Program.category(), ObjectCategory::ShaderProgram);
    assert_eq!(
        BindPoint::Texture(TextureKind::Tex2D).category(),
        ObjectCategory::Texture
    );
}

#[test]
fn test_buffer_targets_are_distinct_bind_points() {
    assert_ne!(
        BindPoint::Buffer(BufferTarget::Array),
        BindPoint::Buffer(BufferTarget::Element)
    );
}
