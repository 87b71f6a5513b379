use std::cmp::Ordering;

use crate::{ByteOrder, ErrorKind, Memory, Primitive, ResourceKind, WritableMemory};

use super::random_bytes;

const ORDERS: [ByteOrder; 2] = [ByteOrder::LittleEndian, ByteOrder::BigEndian];

fn round_trip_every_offset<T: Primitive>(value: T) {
    const CAPACITY: u64 = 32;
    let width = T::LAYOUT.size as u64;
    for order in ORDERS {
        let mem = WritableMemory::allocate_with_order(CAPACITY as usize, order).unwrap();
        for offset in 0..=(CAPACITY - width) {
            mem.clear().unwrap();
            mem.put(offset, value).unwrap();
            assert_eq!(mem.get::<T>(offset).unwrap(), value, "offset {offset}, {order}");
        }
        let err = mem.get::<T>(CAPACITY - width + 1).unwrap_err();
        assert!(err.is_out_of_bounds());
        assert!(mem.put(CAPACITY, value).unwrap_err().is_out_of_bounds());
    }
}

#[test]
fn test_round_trip_all_widths() {
    round_trip_every_offset(-5i8);
    round_trip_every_offset(0xA5u8);
    round_trip_every_offset(-12345i16);
    round_trip_every_offset(0xBEEFu16);
    round_trip_every_offset(-19088744i32);
    round_trip_every_offset(0xDEADBEEFu32);
    round_trip_every_offset(i64::MIN + 3);
    round_trip_every_offset(0x0102030405060708u64);
    round_trip_every_offset(-1.25f32);
    round_trip_every_offset(std::f64::consts::PI);
}

#[test]
fn test_big_endian_example() {
    let mem = WritableMemory::allocate_with_order(8, ByteOrder::BigEndian).unwrap();
    mem.put_i32(0, 0x01020304).unwrap();
    assert_eq!(mem.get_i32(0).unwrap(), 0x01020304);

    let raw = mem.to_byte_vec(0, 4).unwrap();
    assert_eq!(raw, [0x01, 0x02, 0x03, 0x04]);

    let le = Memory::wrap_with_order(raw, ByteOrder::LittleEndian).unwrap();
    assert_eq!(le.get_i32(0).unwrap(), 0x04030201);
}

#[test]
fn test_opposite_orders_reverse_values() {
    let be = Memory::wrap_with_order(random_bytes(11, 24), ByteOrder::BigEndian).unwrap();
    let le = be.duplicate_with_order(ByteOrder::LittleEndian).unwrap();
    assert!(be.is_same_resource(&le));
    for offset in 0..16 {
        assert_eq!(be.get_u8(offset).unwrap(), le.get_u8(offset).unwrap());
        assert_eq!(be.get_i8(offset).unwrap(), le.get_i8(offset).unwrap());
        assert_eq!(
            be.get_u16(offset).unwrap(),
            le.get_u16(offset).unwrap().swap_bytes()
        );
        assert_eq!(
            be.get_u32(offset).unwrap(),
            le.get_u32(offset).unwrap().swap_bytes()
        );
        assert_eq!(
            be.get_u64(offset).unwrap(),
            le.get_u64(offset).unwrap().swap_bytes()
        );
        assert_eq!(
            be.get_f64(offset).unwrap().to_bits(),
            le.get_f64(offset).unwrap().to_bits().swap_bytes()
        );
    }
}

#[test]
fn test_swap_bytes_query() {
    let native = WritableMemory::allocate(8).unwrap();
    assert!(!native.swap_bytes());
    assert_eq!(native.order(), ByteOrder::native());

    let foreign = native
        .writable_duplicate_with_order(ByteOrder::native().opposite())
        .unwrap();
    assert!(foreign.swap_bytes());
    assert_eq!(foreign.resource_order(), ByteOrder::native());
}

#[test]
fn test_region_aliases_parent() {
    let parent = WritableMemory::allocate_with_order(64, ByteOrder::BigEndian).unwrap();
    let region = parent.writable_region(8, 16).unwrap();
    assert_eq!(region.capacity(), 16);
    assert_eq!(region.order(), ByteOrder::BigEndian);

    region.put_i64(0, 0x1122334455667788).unwrap();
    assert_eq!(parent.get_i64(8).unwrap(), 0x1122334455667788);

    parent.put_i32(20, -7).unwrap();
    assert_eq!(region.get_i32(12).unwrap(), -7);

    assert!(region.get_i64(9).unwrap_err().is_out_of_bounds());
    assert!(parent.region(60, 5).unwrap_err().is_out_of_bounds());

    let nested = region.writable_region(4, 8).unwrap();
    nested.put_u8(0, 0xAB).unwrap();
    assert_eq!(parent.get_u8(12).unwrap(), 0xAB);
}

#[test]
fn test_duplicate_aliases_parent() {
    let mem = WritableMemory::allocate(16).unwrap();
    let dup = mem.writable_duplicate().unwrap();
    assert!(dup.is_same_resource(&mem));
    dup.put_u64(8, 42).unwrap();
    assert_eq!(mem.get_u64(8).unwrap(), 42);

    let read_only = mem.as_memory();
    mem.put_u64(8, 43).unwrap();
    assert_eq!(read_only.get_u64(8).unwrap(), 43);
}

#[test]
fn test_zero_length_views_report_little_endian() {
    let empty = Memory::wrap_with_order(Vec::<u8>::new(), ByteOrder::BigEndian).unwrap();
    assert_eq!(empty.capacity(), 0);
    assert_eq!(empty.order(), ByteOrder::LittleEndian);
    assert_eq!(
        empty.duplicate().unwrap().order(),
        ByteOrder::LittleEndian
    );
    assert_eq!(
        empty
            .duplicate_with_order(ByteOrder::BigEndian)
            .unwrap()
            .order(),
        ByteOrder::LittleEndian
    );
    assert_eq!(empty.region(0, 0).unwrap().order(), ByteOrder::LittleEndian);

    let mem = WritableMemory::allocate_with_order(16, ByteOrder::BigEndian).unwrap();
    let region = mem.region(16, 0).unwrap();
    assert_eq!(region.order(), ByteOrder::LittleEndian);
    assert_eq!(region.capacity(), 0);
    assert!(region.get_u8(0).unwrap_err().is_out_of_bounds());
}

#[test]
fn test_equal_to() {
    let bytes = random_bytes(3, 128);
    let a = WritableMemory::wrap(bytes.clone()).unwrap();
    let b = WritableMemory::wrap(bytes).unwrap();
    assert!(a.equal_to(&a).unwrap());
    assert!(a.equal_to(&b).unwrap());
    assert!(b.equal_to(&a).unwrap());

    for i in [0u64, 1, 63, 127] {
        let original = b.get_u8(i).unwrap();
        b.put_u8(i, !original).unwrap();
        assert!(!a.equal_to(&b).unwrap(), "byte {i}");
        assert!(a.equal_to_range(0, &b, 0, i).unwrap());
        assert!(a.equal_to_range(i + 1, &b, i + 1, 127 - i).unwrap());
        b.put_u8(i, original).unwrap();
    }

    let shorter = a.region(0, 127).unwrap();
    assert!(!a.equal_to(&shorter).unwrap());

    // Byte order does not take part in the comparison.
    let swapped = b.duplicate_with_order(b.order().opposite()).unwrap();
    assert!(a.equal_to(&swapped).unwrap());

    assert!(a.equal_to_range(100, &b, 100, 29).unwrap_err().is_out_of_bounds());
}

#[test]
fn test_equal_to_shifted_ranges() {
    let mem = WritableMemory::allocate(64).unwrap();
    for i in 0..32u64 {
        mem.put_u8(i, i as u8).unwrap();
        mem.put_u8(i + 32, i as u8).unwrap();
    }
    assert!(mem.equal_to_range(0, &mem, 32, 32).unwrap());
    assert!(!mem.equal_to_range(0, &mem, 31, 32).unwrap());
    assert!(mem.equal_to_range(5, &mem, 5, 0).unwrap());
}

#[test]
fn test_compare_to() {
    let a = Memory::wrap(vec![1u8, 2, 3, 4]).unwrap();
    let b = Memory::wrap(vec![1u8, 2, 0xFF]).unwrap();
    assert_eq!(a.compare_to(0, 4, &a, 0, 4).unwrap(), Ordering::Equal);
    assert_eq!(a.compare_to(0, 3, &b, 0, 3).unwrap(), Ordering::Less);
    assert_eq!(b.compare_to(0, 3, &a, 0, 3).unwrap(), Ordering::Greater);
    assert_eq!(a.compare_to(0, 2, &b, 0, 3).unwrap(), Ordering::Less);
    assert_eq!(a.compare_to(1, 1, &a, 0, 1).unwrap(), Ordering::Greater);
    assert!(a.compare_to(0, 5, &b, 0, 1).unwrap_err().is_out_of_bounds());
}

#[test]
fn test_copy_to_rejects_overlap() {
    let mem = WritableMemory::allocate(64).unwrap();
    for i in 0..64u64 {
        mem.put_u8(i, i as u8).unwrap();
    }

    let err = mem.copy_to(0, &mem, 8, 16).unwrap_err();
    assert!(err.is_illegal_overlap());
    let err = mem.copy_to(8, &mem, 0, 16).unwrap_err();
    assert!(err.is_illegal_overlap());
    assert!(mem.copy_to(4, &mem, 4, 1).unwrap_err().is_illegal_overlap());

    // The check sees through aliases of the same bytes.
    let alias = mem.writable_region(8, 32).unwrap();
    assert!(mem.copy_to(0, &alias, 0, 16).unwrap_err().is_illegal_overlap());

    mem.copy_to(0, &mem, 32, 16).unwrap();
    mem.copy_to(0, &mem, 16, 16).unwrap();
    assert_eq!(mem.to_byte_vec(32, 16).unwrap(), (0..16u8).collect::<Vec<_>>());
    assert_eq!(mem.to_byte_vec(16, 16).unwrap(), (0..16u8).collect::<Vec<_>>());
    mem.copy_to(10, &mem, 10, 0).unwrap();
}

#[test]
fn test_copy_to_other_resource_is_raw() {
    let src = WritableMemory::allocate_with_order(8, ByteOrder::BigEndian).unwrap();
    src.put_u32(0, 0xCAFEBABE).unwrap();
    let dst = WritableMemory::allocate_with_order(8, ByteOrder::LittleEndian).unwrap();
    src.copy_to(0, &dst, 4, 4).unwrap();
    assert_eq!(dst.to_byte_vec(4, 4).unwrap(), [0xCA, 0xFE, 0xBA, 0xBE]);
    assert_eq!(dst.get_u32(4).unwrap(), 0xBEBAFECA);
    assert!(src.copy_to(6, &dst, 0, 4).unwrap_err().is_out_of_bounds());
}

#[test]
fn test_array_transfers_swap_per_element() {
    let src = [0x0102i16, 0x0304, -2, 0x7F00];
    let mem = WritableMemory::allocate_with_order(16, ByteOrder::BigEndian).unwrap();
    mem.put_i16_array(2, &src, 0, 4).unwrap();
    assert_eq!(
        mem.to_byte_vec(2, 8).unwrap(),
        [0x01, 0x02, 0x03, 0x04, 0xFF, 0xFE, 0x7F, 0x00]
    );

    let mut dst = [0i16; 6];
    mem.get_i16_array(2, &mut dst, 1, 4).unwrap();
    assert_eq!(dst, [0, 0x0102, 0x0304, -2, 0x7F00, 0]);

    mem.put_i16_array(0, &src, 2, 2).unwrap();
    assert_eq!(mem.get_i16(0).unwrap(), -2);
    assert_eq!(mem.get_i16(2).unwrap(), 0x7F00);
}

#[test]
fn test_array_bounds() {
    let mem = WritableMemory::allocate(16).unwrap();
    let src = [1u32, 2, 3, 4];
    assert!(mem.put_u32_array(0, &src, 3, 2).unwrap_err().is_out_of_bounds());
    assert!(mem.put_u32_array(4, &src, 0, 4).unwrap_err().is_out_of_bounds());
    mem.put_u32_array(0, &src, 0, 4).unwrap();

    let mut dst = [0u32; 4];
    assert!(mem.get_u32_array(0, &mut dst, 1, 4).unwrap_err().is_out_of_bounds());
    assert!(mem.get_u32_array(8, &mut dst, 0, 3).unwrap_err().is_out_of_bounds());
    mem.get_u32_array(0, &mut dst, 0, 0).unwrap();
    assert_eq!(dst, [0; 4]);
    mem.get_u32_array(0, &mut dst, 0, 4).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn test_float_arrays() {
    let src = [1.0f64, -0.5, f64::MAX, f64::MIN_POSITIVE];
    for order in ORDERS {
        let mem = WritableMemory::allocate_with_order(32, order).unwrap();
        mem.put_f64_array(0, &src, 0, 4).unwrap();
        let mut dst = [0f64; 4];
        mem.get_f64_array(0, &mut dst, 0, 4).unwrap();
        assert_eq!(dst, src);
        for (i, v) in src.iter().enumerate() {
            assert_eq!(mem.get_f64(i as u64 * 8).unwrap(), *v);
        }
    }
}

#[test]
fn test_chars() {
    let mem = WritableMemory::allocate_with_order(16, ByteOrder::BigEndian).unwrap();
    mem.put_char(0, 'é').unwrap();
    assert_eq!(mem.get_char(0).unwrap(), 'é');
    assert_eq!(mem.to_byte_vec(0, 2).unwrap(), [0x00, 0xE9]);

    let err = mem.put_char(2, '\u{1F600}').unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));

    mem.put_u16(2, 0xD800).unwrap();
    let err = mem.get_char(2).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));

    let text = ['a', 'b', '€', 'z'];
    mem.put_char_array(4, &text, 0, 4).unwrap();
    let mut back = ['\0'; 4];
    mem.get_char_array(4, &mut back, 0, 4).unwrap();
    assert_eq!(back, text);
    assert!(mem.get_char_array(0, &mut back, 0, 4).is_err());
}

#[test]
fn test_bools() {
    let mem = WritableMemory::allocate(4).unwrap();
    mem.put_bool(0, true).unwrap();
    mem.put_bool(1, false).unwrap();
    mem.put_u8(2, 0x80).unwrap();
    assert!(mem.get_bool(0).unwrap());
    assert!(!mem.get_bool(1).unwrap());
    assert!(mem.get_bool(2).unwrap());
    assert_eq!(mem.get_u8(0).unwrap(), 1);
}

#[test]
fn test_fill_and_clear() {
    let mem = WritableMemory::wrap(vec![0xFFu8; 16]).unwrap();
    mem.clear_range(4, 4).unwrap();
    assert_eq!(mem.get_u32(4).unwrap(), 0);
    assert_eq!(mem.get_u8(3).unwrap(), 0xFF);
    mem.fill(8, 8, 0x5A).unwrap();
    assert_eq!(mem.get_u64(8).unwrap(), 0x5A5A5A5A5A5A5A5A);
    assert!(mem.fill(12, 5, 0).unwrap_err().is_out_of_bounds());
    mem.clear().unwrap();
    assert!(mem.equal_to(&Memory::wrap(vec![0u8; 16]).unwrap()).unwrap());
}

#[test]
fn test_resource_queries() {
    let wrapped = Memory::wrap(vec![1u8, 2, 3]).unwrap();
    assert!(wrapped.is_read_only());
    assert!(wrapped.is_heap());
    assert!(!wrapped.is_direct());
    assert!(!wrapped.is_mapped());
    assert!(wrapped.is_valid());
    assert_eq!(wrapped.kind(), ResourceKind::Heap);
    assert_eq!(wrapped.resource().capacity(), 3);

    let mem = WritableMemory::allocate(32).unwrap();
    assert!(!mem.is_read_only());
    let region = mem.region(0, 16).unwrap();
    assert!(!region.is_same_resource(&mem));
    assert!(region.is_same_resource(&mem.region(0, 16).unwrap()));
    let other = WritableMemory::allocate(32).unwrap();
    assert!(!other.is_same_resource(&mem));
}

#[test]
fn test_wrap_copies_borrowed_bytes() {
    let caller = vec![0u8; 8];
    let mem = WritableMemory::wrap(&caller[..]).unwrap();
    mem.put_u8(0, 7).unwrap();
    assert_eq!(caller[0], 0);

    let mem = Memory::wrap(&b"memview"[..]).unwrap();
    assert_eq!(mem.capacity(), 7);
    assert_eq!(mem.get_u8(0).unwrap(), b'm');
    assert_eq!(mem.to_byte_vec(3, 4).unwrap(), b"view");
}

#[test]
fn test_into_vec_returns_wrapped_bytes() {
    let mem = WritableMemory::wrap_with_order(vec![0u8; 8], ByteOrder::BigEndian).unwrap();
    mem.put_u32(0, 0x01020304).unwrap();
    let alias = mem.as_memory();
    let mem = mem.into_vec().unwrap_err();
    drop(alias);
    let bytes = mem.into_vec().unwrap();
    assert_eq!(bytes, [1, 2, 3, 4, 0, 0, 0, 0]);

    let whole = Memory::wrap(bytes).unwrap();
    let region = whole.region(0, 4).unwrap();
    let region = region.into_vec().unwrap_err();
    assert_eq!(region.capacity(), 4);
    drop(region);
    assert_eq!(whole.into_vec().unwrap().len(), 8);

    let handle = WritableMemory::allocate_direct(16).unwrap();
    let direct = handle.get().unwrap().clone();
    assert!(direct.into_vec().unwrap_err().is_direct());
}

#[test]
fn test_empty_resource_order() {
    for order in ORDERS {
        let mem = Memory::wrap_with_order(Vec::<u8>::new(), order).unwrap();
        assert_eq!(mem.resource_order(), ByteOrder::LittleEndian);
        assert_eq!(mem.resource().order(), ByteOrder::LittleEndian);
    }
    let handle = WritableMemory::allocate_direct_with_order(0, ByteOrder::BigEndian).unwrap();
    assert_eq!(handle.get().unwrap().resource_order(), ByteOrder::LittleEndian);

    let mem = WritableMemory::allocate_with_order(8, ByteOrder::BigEndian).unwrap();
    assert_eq!(mem.region(8, 0).unwrap().resource_order(), ByteOrder::BigEndian);
}

#[test]
fn test_oversized_heap_allocation_fails() {
    let err = WritableMemory::allocate(usize::MAX).unwrap_err();
    match err.kind() {
        ErrorKind::AllocationFailure { size, .. } => assert_eq!(*size, usize::MAX as u64),
        other => panic!("unexpected error {other:?}"),
    }
}
