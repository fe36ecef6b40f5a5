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

fn static_array_descriptor() -> BufferDescriptor {
    BufferDescriptor {
        target: BufferTarget::Array,
        usage: BufferUsage::StaticDraw,
        access: BufferAccess::ReadWrite,
    }
}

fn call_index(calls: &[String], prefix: &str) -> usize {
    calls
        .iter()
        .position(|c| c.starts_with(prefix))
        .unwrap_or_else(|| panic!("no call starting with {:?} in {:?}", prefix, calls))
}

// ============================================================================
// Owning buffer tests
// ============================================================================

#[test]
fn test_new_buffer_is_valid_and_unallocated() {
    let (_recording, driver) = recording_driver();
    let buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    assert!(buffer.is_valid());
    assert_ne!(buffer.raw_handle(), 0);
    assert_eq!(buffer.allocated_size(), None);
    assert_eq!(buffer.descriptor(), static_array_descriptor());
}

#[test]
fn test_upload_binds_then_uploads() {
    let (recording, driver) = recording_driver();
    let mut buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    buffer.upload(&[1, 2, 3, 4]).unwrap();

    let rec = recording.lock().unwrap();
    let bind = call_index(rec.calls(), "BindBuffer(Array");
    let data = call_index(rec.calls(), "BufferData(Array");
    assert!(bind < data);
    assert_eq!(rec.count_calls("BufferData"), 1);
    drop(rec);
    assert_eq!(buffer.allocated_size(), Some(4));
}

#[test]
fn test_upload_slice_marshals_bytes() {
    let (recording, driver) = recording_driver();
    let mut buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    let values: [f32; 4] = [1.0, 2.0, 3.0, 4.0];
    buffer.upload_slice(&values).unwrap();

    assert_eq!(buffer.allocated_size(), Some(16));
    let rec = recording.lock().unwrap();
    let stored = rec.buffer_contents(buffer.raw_handle()).unwrap();
    assert_eq!(stored, bytemuck::cast_slice::<f32, u8>(&values));
}

#[test]
fn test_allocate_storage_sets_size() {
    let (recording, driver) = recording_driver();
    let mut buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    buffer.allocate_storage(64).unwrap();

    assert_eq!(buffer.allocated_size(), Some(64));
    assert_eq!(recording.lock().unwrap().count_calls("BufferData"), 1);
}

#[test]
fn test_update_range_inside_allocation() {
    let (recording, driver) = recording_driver();
    let mut buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    buffer.allocate_storage(8).unwrap();
    buffer.update_range(4, &[1, 2, 3, 4]).unwrap();

    let rec = recording.lock().unwrap();
    assert_eq!(rec.count_calls("BufferSubData"), 1);
    assert_eq!(
        rec.buffer_contents(buffer.raw_handle()),
        Some(&[0u8, 0, 0, 0, 1, 2, 3, 4][..])
    );
}

#[test]
fn test_update_range_before_allocation_fails() {
    let (recording, driver) = recording_driver();
    let mut buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    let err = buffer.update_range(0, &[1]).unwrap_err();
    assert_eq!(err.stage(), Stage::Setup);
    assert_eq!(recording.lock().unwrap().count_calls("BufferSubData"), 0);
}

#[test]
fn test_update_range_past_end_fails_without_native_call() {
    let (recording, driver) = recording_driver();
    let mut buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    buffer.allocate_storage(8).unwrap();
    recording.lock().unwrap().clear_calls();

    let err = buffer.update_range(6, &[1, 2, 3]).unwrap_err();
    assert_eq!(err.stage(), Stage::Setup);
    assert!(recording.lock().unwrap().calls().is_empty());
}

#[test]
fn test_update_range_at_exact_end_is_legal() {
    let (_recording, driver) = recording_driver();
    let mut buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    buffer.allocate_storage(8).unwrap();
    assert!(buffer.update_range(4, &[1, 2, 3, 4]).is_ok());
}

#[test]
fn test_bind_and_unbind_issue_one_call_each() {
    let (recording, driver) = recording_driver();
    let buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    buffer.bind().unwrap();
    buffer.unbind().unwrap();

    let rec = recording.lock().unwrap();
    assert_eq!(rec.count_calls("BindBuffer(Array"), 2);
    assert_eq!(rec.calls().last().unwrap(), "BindBuffer(Array, 0)");
}

#[test]
fn test_destroy_is_idempotent() {
    let (recording, driver) = recording_driver();
    let mut buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    buffer.destroy().unwrap();
    assert!(!buffer.is_valid());

    // Second destroy and the eventual drop are no-ops
    buffer.destroy().unwrap();
    drop(buffer);

    assert_eq!(recording.lock().unwrap().count_calls("DeleteBuffers"), 1);
}

#[test]
fn test_bind_after_destroy_fails_without_native_call() {
    let (recording, driver) = recording_driver();
    let mut buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    buffer.destroy().unwrap();
    recording.lock().unwrap().clear_calls();

    let err = buffer.bind().unwrap_err();
    assert_eq!(err.stage(), Stage::Type);
    assert!(recording.lock().unwrap().calls().is_empty());
}

#[test]
fn test_drop_frees_exactly_once() {
    let (recording, driver) = recording_driver();
    {
        let _buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();
    }
    assert_eq!(recording.lock().unwrap().count_calls("DeleteBuffers"), 1);
}

#[test]
fn test_moved_buffer_frees_exactly_once() {
    let (recording, driver) = recording_driver();
    let buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();

    // Move into a container and back out; ownership transfers, the handle
    // is still freed exactly once
    let mut holder = vec![buffer];
    let buffer = holder.pop().unwrap();
    drop(holder);
    drop(buffer);

    assert_eq!(recording.lock().unwrap().count_calls("DeleteBuffers"), 1);
}

// ============================================================================
// Mapping tests
// ============================================================================

#[test]
fn test_mapping_guard_unmaps_on_drop() {
    let (recording, driver) = recording_driver();
    let mut buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();
    buffer.allocate_storage(4).unwrap();

    {
        let mapping = buffer.map(BufferAccess::WriteOnly).unwrap();
        assert_eq!(mapping.len(), 4);
    }

    let rec = recording.lock().unwrap();
    assert_eq!(rec.count_calls("MapBuffer"), 1);
    assert_eq!(rec.count_calls("UnmapBuffer"), 1);
}

#[test]
fn test_mapping_writes_reach_storage() {
    let (recording, driver) = recording_driver();
    let mut buffer = Buffer::new(&driver, static_array_descriptor()).unwrap();
    buffer.upload(&[0, 0, 0, 0]).unwrap();

    {
        let mut mapping = buffer.map(BufferAccess::ReadWrite).unwrap();
        let bytes = unsafe { mapping.as_mut_slice() };
        bytes.copy_from_slice(&[7, 7, 7, 7]);
        mapping.unmap().unwrap();
    }

    let rec = recording.lock().unwrap();
    assert_eq!(rec.buffer_contents(buffer.raw_handle()), Some(&[7u8; 4][..]));
    // Explicit unmap consumed the guard; drop must not unmap again
    assert_eq!(rec.count_calls("UnmapBuffer"), 1);
}

// ============================================================================
// Batch array tests
// ============================================================================

#[test]
fn test_array_allocates_in_one_call() {
    let (recording, driver) = recording_driver();
    let array = BufferArray::new(&driver, 3).unwrap();

    assert_eq!(array.len(), 3);
    assert_eq!(recording.lock().unwrap().count_calls("GenBuffers(3)"), 1);
}

#[test]
fn test_set_descriptor_bounds() {
    let (_recording, driver) = recording_driver();
    let mut array = BufferArray::new(&driver, 2).unwrap();

    assert!(array.set_descriptor(1, static_array_descriptor()).is_ok());
    let err = array.set_descriptor(2, static_array_descriptor()).unwrap_err();
    assert_eq!(err.stage(), Stage::Type);
}

#[test]
fn test_at_len_is_rejected_at_len_minus_one_succeeds() {
    let (recording, driver) = recording_driver();
    let array = BufferArray::new(&driver, 4).unwrap();
    recording.lock().unwrap().clear_calls();

    assert!(array.at(3).is_ok());
    let err = array.at(4).unwrap_err();
    assert_eq!(err.stage(), Stage::Type);
    // Out-of-range access issues no native call
    assert!(recording.lock().unwrap().calls().is_empty());
}

#[test]
fn test_view_binds_with_stored_descriptor() {
    let (recording, driver) = recording_driver();
    let mut array = BufferArray::new(&driver, 2).unwrap();
    array
        .set_descriptor(
            1,
            BufferDescriptor {
                target: BufferTarget::Element,
                usage: BufferUsage::StaticDraw,
                access: BufferAccess::ReadOnly,
            },
        )
        .unwrap();

    let view = array.at(1).unwrap();
    assert!(view.is_valid());
    view.bind().unwrap();
    view.unbind().unwrap();

    let rec = recording.lock().unwrap();
    assert_eq!(rec.count_calls("BindBuffer(Element"), 2);
}

#[test]
fn test_view_without_descriptor_is_not_bindable() {
    let (recording, driver) = recording_driver();
    let array = BufferArray::new(&driver, 2).unwrap();
    recording.lock().unwrap().clear_calls();

    let view = array.at(0).unwrap();
    assert!(!view.is_valid());
    let err = view.bind().unwrap_err();
    assert_eq!(err.stage(), Stage::Type);
    assert!(recording.lock().unwrap().calls().is_empty());
}

#[test]
fn test_array_upload_tracks_per_slot_sizes() {
    let (_recording, driver) = recording_driver();
    let mut array = BufferArray::new(&driver, 2).unwrap();
    array.set_descriptor(0, static_array_descriptor()).unwrap();
    array.set_descriptor(1, static_array_descriptor()).unwrap();

    array.upload(0, &[1, 2, 3, 4]).unwrap();
    array.allocate_storage(1, 16).unwrap();

    array.update_range(0, 2, &[9, 9]).unwrap();
    array.update_range(1, 12, &[1, 2, 3, 4]).unwrap();

    // Slot bookkeeping is independent
    let err = array.update_range(0, 3, &[1, 2]).unwrap_err();
    assert_eq!(err.stage(), Stage::Setup);
}

#[test]
fn test_array_upload_requires_descriptor() {
    let (recording, driver) = recording_driver();
    let mut array = BufferArray::new(&driver, 1).unwrap();
    recording.lock().unwrap().clear_calls();

    let err = array.upload(0, &[1]).unwrap_err();
    assert_eq!(err.stage(), Stage::Type);
    assert!(recording.lock().unwrap().calls().is_empty());
}

#[test]
fn test_array_drop_is_one_bulk_free_despite_views() {
    let (recording, driver) = recording_driver();
    {
        let mut array = BufferArray::new(&driver, 3).unwrap();
        array.set_descriptor(0, static_array_descriptor()).unwrap();
        {
            let view = array.at(0).unwrap();
            view.bind().unwrap();
        }
        let _another = array.at(2).unwrap();
    }

    let rec = recording.lock().unwrap();
    assert_eq!(rec.count_calls("DeleteBuffers"), 1);
    assert_eq!(rec.live_count(ObjectCategory::Buffer), 0);
}
