//! Native-layer failures surface unchanged and leave no partial bookkeeping.

use memref::prelude::*;
use memref_test_utils::{faulty_heap, Fault, FaultyMemory};

fn injected(operation: &'static str) -> RefError {
    RefError::Memory(MemoryError::Injected { operation })
}

fn scope() -> Scope<FaultyMemory<Heap>> {
    Scope::new(faulty_heap()).unwrap()
}

#[test]
fn scope_construction_fails_when_null_pointer_cannot_be_allocated() {
    let mut memory = faulty_heap();
    memory.arm(Fault::Alloc);
    assert_eq!(Scope::new(memory).err(), Some(injected("alloc")));
}

#[test]
fn failed_reference_binds_nothing_and_retains_nothing() {
    let mut scope = scope();
    let r = scope.alloc(4).unwrap();
    let bound = scope.bindings().len();
    let retained = scope.ledger().total();

    scope.memory_mut().arm(Fault::WritePointer);
    assert_eq!(scope.reference(&r).unwrap_err(), injected("write_pointer"));
    assert!(scope.try_get_type(&r).is_none());
    assert_eq!(scope.bindings().len(), bound);
    assert_eq!(scope.ledger().total(), retained);
}

#[test]
fn failed_deref_binds_no_target() {
    let mut scope = scope();
    let char_ty = scope.types().char.clone();
    let r = scope.alloc_value(&char_ty, 1u8).unwrap();
    let p = scope.reference(&r).unwrap();
    let bound = scope.bindings().len();

    scope.memory_mut().arm(Fault::ReadPointer);
    assert_eq!(scope.deref(&p).unwrap_err(), injected("read_pointer"));
    assert_eq!(scope.bindings().len(), bound);

    scope.memory_mut().disarm();
    assert!(scope.deref(&p).unwrap().is_region());
}

#[test]
fn failed_object_write_is_not_retained() {
    let mut scope = scope();
    let object_ty = scope.types().object.clone();
    let slot = scope.alloc_type(&object_ty).unwrap();

    scope.memory_mut().arm(Fault::WriteObject);
    let err = scope.store(&slot, 0, host_object(3u64)).unwrap_err();
    assert_eq!(err, injected("write_object"));
    assert!(scope.retained(&slot).is_empty());
    assert_eq!(scope.memory().injected(), 1);
}

#[test]
fn byte_level_failures_reach_value_access() {
    let mut scope = scope();
    let int32 = scope.types().int32.clone();
    let r = scope.alloc_value(&int32, 10i32).unwrap();

    scope.memory_mut().arm(Fault::ReadBytes);
    assert_eq!(scope.load(&r, 0).unwrap_err(), injected("read_bytes"));

    scope.memory_mut().arm(Fault::WriteBytes);
    assert_eq!(scope.store(&r, 0, 11i32).unwrap_err(), injected("write_bytes"));

    scope.memory_mut().disarm();
    assert_eq!(scope.load(&r, 0).unwrap(), Value::Int(10));
}

#[test]
fn object_read_failure_propagates() {
    let mut scope = scope();
    let object_ty = scope.types().object.clone();
    let slot = scope.alloc_value(&object_ty, host_object(0i8)).unwrap();
    scope.memory_mut().arm(Fault::ReadObject);
    assert_eq!(scope.read_object(&slot, 0).unwrap_err(), injected("read_object"));
}
