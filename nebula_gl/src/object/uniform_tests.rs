use super::*;
use crate::driver::recording::RecordingDriver;
use crate::object::program::Program;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helpers
// ============================================================================

const ALL_KINDS: [UniformKind; 18] = [
    UniformKind::I32,
    UniformKind::F32,
    UniformKind::F64,
    UniformKind::IVec2,
    UniformKind::IVec3,
    UniformKind::IVec4,
    UniformKind::FVec2,
    UniformKind::FVec3,
    UniformKind::FVec4,
    UniformKind::DVec2,
    UniformKind::DVec3,
    UniformKind::DVec4,
    UniformKind::FMat2,
    UniformKind::FMat3,
    UniformKind::FMat4,
    UniformKind::DMat2,
    UniformKind::DMat3,
    UniformKind::DMat4,
];

fn recording_driver() -> (Arc<Mutex<RecordingDriver>>, DriverHandle) {
    let recording = Arc::new(Mutex::new(RecordingDriver::new()));
    let handle: DriverHandle = recording.clone();
    (recording, handle)
}

fn uniform_of(driver: &DriverHandle, kind: UniformKind) -> Uniform {
    let program = Program::new(driver).unwrap();
    program.get_uniform("u", kind).unwrap()
}

/// Payload of `scalars` zeros in the kind's scalar class
fn zero_payload(kind: UniformKind, scalars: usize) -> (Vec<i32>, Vec<f32>, Vec<f64>) {
    match kind.scalar() {
        UniformScalar::I32 => (vec![0; scalars], Vec::new(), Vec::new()),
        UniformScalar::F32 => (Vec::new(), vec![0.0; scalars], Vec::new()),
        UniformScalar::F64 => (Vec::new(), Vec::new(), vec![0.0; scalars]),
    }
}

// ============================================================================
// Kind table tests
// ============================================================================

#[test]
fn test_components_per_kind() {
    assert_eq!(UniformKind::I32.components(), 1);
    assert_eq!(UniformKind::FVec2.components(), 2);
    assert_eq!(UniformKind::DVec3.components(), 3);
    assert_eq!(UniformKind::IVec4.components(), 4);
    assert_eq!(UniformKind::FMat2.components(), 4);
    assert_eq!(UniformKind::FMat3.components(), 9);
    assert_eq!(UniformKind::DMat4.components(), 16);
}

#[test]
fn test_matrix_kinds() {
    for kind in ALL_KINDS {
        let expected = matches!(
            kind,
            UniformKind::FMat2
                | UniformKind::FMat3
                | UniformKind::FMat4
                | UniformKind::DMat2
                | UniformKind::DMat3
                | UniformKind::DMat4
        );
        assert_eq!(kind.is_matrix(), expected);
    }
}

#[test]
fn test_native_calls_are_distinct() {
    for (i, a) in ALL_KINDS.iter().enumerate() {
        for b in ALL_KINDS.iter().skip(i + 1) {
            assert_ne!(a.native_call(), b.native_call());
        }
    }
}

// ============================================================================
// Location tests
// ============================================================================

#[test]
fn test_unresolved_sentinel() {
    assert!(!UniformLocation::UNRESOLVED.is_resolved());
    assert_eq!(UniformLocation::UNRESOLVED.value(), -1);
    assert!(UniformLocation::new(0).is_resolved());
    assert!(UniformLocation::new(7).is_resolved());
}

// ============================================================================
// Dispatch tests
// ============================================================================

#[test]
fn test_each_kind_hits_exactly_its_native_entry_point() {
    for kind in ALL_KINDS {
        let (recording, driver) = recording_driver();
        let uniform = uniform_of(&driver, kind);
        let (ints, floats, doubles) = zero_payload(kind, kind.components());

        let data = match kind.scalar() {
            UniformScalar::I32 => UniformData::I32(&ints),
            UniformScalar::F32 => UniformData::F32(&floats),
            UniformScalar::F64 => UniformData::F64(&doubles),
        };
        uniform.set_data(data, 1, false).unwrap();

        let rec = recording.lock().unwrap();
        assert_eq!(
            rec.count_calls(kind.native_call()),
            1,
            "kind {:?} must dispatch to {}",
            kind,
            kind.native_call()
        );
        // No other uniform upload was issued
        assert_eq!(rec.count_calls("Uniform"), 1);
    }
}

#[test]
fn test_count_is_forwarded_unchanged() {
    let (recording, driver) = recording_driver();
    let uniform = uniform_of(&driver, UniformKind::FVec3);
    let data = vec![0.0f32; 3 * 5];

    uniform.set_data(UniformData::F32(&data), 5, false).unwrap();

    let rec = recording.lock().unwrap();
    assert!(rec.calls().last().unwrap().contains("count 5"));
}

#[test]
fn test_transpose_reaches_matrix_upload() {
    let (recording, driver) = recording_driver();
    let uniform = uniform_of(&driver, UniformKind::FMat4);
    let matrix = glam::Mat4::IDENTITY;
    let data: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&matrix));

    uniform.set_data(UniformData::F32(data), 1, true).unwrap();

    let rec = recording.lock().unwrap();
    let call = rec.calls().last().unwrap();
    assert!(call.starts_with("UniformMatrix4fv"));
    assert!(call.contains("transpose true"));
}

#[test]
fn test_payload_class_mismatch_fails_without_native_call() {
    let (recording, driver) = recording_driver();
    let uniform = uniform_of(&driver, UniformKind::FMat4);
    recording.lock().unwrap().clear_calls();

    let ints = [0i32; 16];
    let err = uniform
        .set_data(UniformData::I32(&ints), 1, false)
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Type);
    assert_eq!(err.category(), Some(ObjectCategory::ShaderUniform));
    assert!(recording.lock().unwrap().calls().is_empty());
}

#[test]
fn test_short_payload_fails() {
    let (_recording, driver) = recording_driver();
    let uniform = uniform_of(&driver, UniformKind::FVec4);

    let floats = [0.0f32; 7];
    let err = uniform
        .set_data(UniformData::F32(&floats), 2, false)
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Type);
}

#[test]
fn test_upload_to_unresolved_location_is_forwarded() {
    // The native API ignores uploads to location -1; the layer forwards them
    let (recording, driver) = recording_driver();
    recording.lock().unwrap().mark_uniform_unresolved("gone");
    let program = Program::new(&driver).unwrap();
    let uniform = program.get_uniform("gone", UniformKind::F32).unwrap();

    let value = [1.0f32];
    uniform.set_data(UniformData::F32(&value), 1, false).unwrap();

    let rec = recording.lock().unwrap();
    assert!(rec.calls().last().unwrap().contains("location -1"));
}
