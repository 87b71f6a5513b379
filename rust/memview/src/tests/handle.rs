use std::sync::Arc;

use crate::{ByteOrder, Lifecycle, Resource, ResourceKind, WritableMemory};

#[test]
fn test_direct_allocation() {
    let handle = WritableMemory::allocate_direct(64).unwrap();
    assert!(handle.is_open());
    let mem = handle.get().unwrap();
    assert_eq!(mem.capacity(), 64);
    assert_eq!(mem.kind(), ResourceKind::Direct);
    assert!(mem.is_direct());
    assert!(!mem.is_read_only());

    mem.clear().unwrap();
    mem.put_u64(56, u64::MAX).unwrap();
    assert_eq!(mem.get_u64(56).unwrap(), u64::MAX);
    assert_eq!(mem.get_u64(0).unwrap(), 0);
    assert!(mem.get_u64(57).unwrap_err().is_out_of_bounds());

    handle.close().unwrap();
}

#[test]
fn test_direct_big_endian() {
    let handle = WritableMemory::allocate_direct_with_order(8, ByteOrder::BigEndian).unwrap();
    let mem = handle.get().unwrap();
    mem.put_i32(0, 0x01020304).unwrap();
    assert_eq!(mem.to_byte_vec(0, 4).unwrap(), [1, 2, 3, 4]);
    assert_eq!(mem.resource_order(), ByteOrder::BigEndian);
}

#[test]
fn test_double_close() {
    let handle = WritableMemory::allocate_direct(128).unwrap();
    handle.close().unwrap();
    assert_eq!(handle.lifecycle(), Lifecycle::Closed);
    assert!(handle.resource().is_released());
    handle.close().unwrap();
    handle.close().unwrap();
    assert_eq!(handle.lifecycle(), Lifecycle::Closed);
}

#[test]
fn test_get_after_close_fails() {
    let handle = WritableMemory::allocate_direct(32).unwrap();
    let view = handle.get().unwrap().clone();
    let region = view.writable_region(8, 8).unwrap();
    let mut buf = view.as_writable_buffer().unwrap();
    view.put_u32(0, 17).unwrap();

    handle.close().unwrap();

    assert!(handle.get().unwrap_err().is_use_after_release());
    assert!(!view.is_valid());
    assert!(view.get_u32(0).unwrap_err().is_use_after_release());
    assert!(view.put_u32(0, 1).unwrap_err().is_use_after_release());
    assert!(region.get_u8(0).unwrap_err().is_use_after_release());
    assert!(view.region(0, 4).unwrap_err().is_use_after_release());
    assert!(view.duplicate().unwrap_err().is_use_after_release());
    assert!(buf.get_u32().unwrap_err().is_use_after_release());
    assert_eq!(buf.position(), 0);
    assert!(view.to_byte_vec(0, 4).unwrap_err().is_use_after_release());
}

#[test]
fn test_validity_is_checked_before_bounds() {
    let handle = WritableMemory::allocate_direct(8).unwrap();
    let view = handle.get().unwrap().clone();
    drop(handle);
    assert!(view.get_u64(100).unwrap_err().is_use_after_release());
}

#[test]
fn test_drop_releases() {
    let view = {
        let handle = WritableMemory::allocate_direct(16).unwrap();
        handle.get().unwrap().clone()
    };
    assert!(!view.is_valid());
    assert!(view.get_u8(0).unwrap_err().is_use_after_release());
}

#[test]
fn test_zero_size_direct() {
    let handle = WritableMemory::allocate_direct_with_order(0, ByteOrder::BigEndian).unwrap();
    let mem = handle.get().unwrap();
    assert_eq!(mem.capacity(), 0);
    assert_eq!(mem.order(), ByteOrder::LittleEndian);
    assert!(mem.get_u8(0).unwrap_err().is_out_of_bounds());
}

#[test]
fn test_concurrent_close() {
    let handle = Arc::new(WritableMemory::allocate_direct(4096).unwrap());
    std::thread::scope(|s| {
        for _ in 0..8 {
            let handle = handle.clone();
            s.spawn(move || handle.close().unwrap());
        }
    });
    assert_eq!(handle.lifecycle(), Lifecycle::Closed);
    assert!(handle.get().is_err());
}

#[test]
fn test_oversized_direct_allocation_fails() {
    let err = WritableMemory::allocate_direct(u64::MAX).unwrap_err();
    assert!(matches!(
        err.kind(),
        crate::ErrorKind::AllocationFailure { .. }
    ));
}
