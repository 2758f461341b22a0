//! Non-host layouts: 32-bit pointers and big-endian byte order.

use memref::prelude::*;
use memref_test_utils::{be32_heap, heap_for};

#[test]
fn int32_is_stored_big_endian() {
    let mut scope = Scope::new(be32_heap()).unwrap();
    let int32 = scope.types().int32.clone();
    let r = scope.alloc_value(&int32, 0x0102_0304i32).unwrap();
    assert_eq!(scope.memory().read_bytes(&r, 0, 4).unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(scope.load(&r, 0).unwrap(), Value::Int(0x0102_0304));
}

#[test]
fn int32_is_stored_little_endian() {
    let mut scope = Scope::new(heap_for(4, Endianness::Little)).unwrap();
    let int32 = scope.types().int32.clone();
    let r = scope.alloc_value(&int32, 0x0102_0304i32).unwrap();
    assert_eq!(scope.memory().read_bytes(&r, 0, 4).unwrap(), vec![4, 3, 2, 1]);
}

#[test]
fn pointers_are_four_bytes_in_platform_order() {
    let mut scope = Scope::new(be32_heap()).unwrap();
    let char_ty = scope.types().char.clone();
    let r = scope.alloc_value(&char_ty, 9u8).unwrap();
    let p = scope.reference(&r).unwrap();
    assert_eq!(p.len(), 4);

    let expected = u32::try_from(r.address().0).unwrap().to_be_bytes().to_vec();
    assert_eq!(scope.memory().read_bytes(&p, 0, 4).unwrap(), expected);

    let pp = scope.reference(&p).unwrap();
    let p2 = scope.deref(&pp).unwrap().into_region().unwrap();
    assert_eq!(p2.len(), 4);
    assert_eq!(p2.address(), p.address());
}

#[test]
fn size_t_and_object_follow_pointer_size() {
    let scope = Scope::new(be32_heap()).unwrap();
    assert_eq!(scope.types().size_t.size, 4);
    assert_eq!(scope.types().object.size, 4);
    assert_eq!(scope.platform().sizeof("pointer"), Some(4));
}

#[test]
fn invalid_layout_is_rejected() {
    let config = HeapConfig::new(Platform::new(3, Endianness::Little));
    assert!(matches!(
        Heap::new(config).err(),
        Some(MemoryError::InvalidConfig { .. })
    ));
}
