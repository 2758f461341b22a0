//! Property tests for the indirection engine.

#![cfg(not(miri))]

use memref::prelude::*;
use memref_test_utils::heap_for;
use proptest::prelude::*;

fn arb_platform() -> impl Strategy<Value = (usize, Endianness)> {
    (
        prop_oneof![Just(4usize), Just(8usize)],
        prop_oneof![Just(Endianness::Little), Just(Endianness::Big)],
    )
}

/// A `char` region holding `value`, referenced until it has `depth` levels.
fn region_at_depth(scope: &mut Scope<Heap>, value: u8, depth: u32) -> HeapRegion {
    let char_ty = scope.types().char.clone();
    let mut region = scope.alloc_value(&char_ty, value).unwrap();
    for _ in 1..depth {
        region = scope.reference(&region).unwrap();
    }
    region
}

/// A write through a scope's retaining primitives.
#[derive(Clone, Debug)]
enum Write {
    Pointer,
    Object(u32),
    Attach,
}

fn arb_write() -> impl Strategy<Value = Write> {
    prop_oneof![
        Just(Write::Pointer),
        any::<u32>().prop_map(Write::Object),
        Just(Write::Attach),
    ]
}

proptest! {
    #[test]
    fn deref_of_reference_returns_same_address_and_type(
        (pointer_size, endianness) in arb_platform(),
        value in any::<u8>(),
        depth in 1u32..=4,
    ) {
        let mut scope = Scope::new(heap_for(pointer_size, endianness)).unwrap();
        let r = region_at_depth(&mut scope, value, depth);
        let ty = scope.get_type(&r).clone();
        prop_assert_eq!(ty.indirection, depth);

        let p = scope.reference(&r).unwrap();
        let back = scope.deref(&p).unwrap().into_region().unwrap();
        prop_assert_eq!(back.address(), r.address());
        prop_assert_eq!(back.len(), r.len());
        prop_assert_eq!(scope.try_get_type(&back), Some(&ty));
        prop_assert_eq!(
            scope.memory().read_bytes(&back, 0, back.len()).unwrap(),
            scope.memory().read_bytes(&r, 0, r.len()).unwrap()
        );
    }

    #[test]
    fn indirection_moves_by_exactly_one(
        value in any::<u8>(),
        depth in 1u32..=6,
    ) {
        let mut scope = Scope::new(Heap::native()).unwrap();
        let r = region_at_depth(&mut scope, value, depth);
        let p = scope.reference(&r).unwrap();
        prop_assert_eq!(scope.get_type(&p).indirection, depth + 1);

        match scope.deref(&r).unwrap() {
            Target::Region(down) => {
                prop_assert!(depth > 1);
                prop_assert_eq!(scope.get_type(&down).indirection, depth - 1);
            }
            Target::Value(v) => {
                prop_assert_eq!(depth, 1);
                prop_assert_eq!(v, Value::UInt(u64::from(value)));
            }
        }
    }

    #[test]
    fn editing_a_derived_type_leaves_its_source_alone(
        depth in 1u32..=4,
        new_size in 0usize..64,
        new_indirection in 1u32..16,
    ) {
        let mut scope = Scope::new(Heap::native()).unwrap();
        let r = region_at_depth(&mut scope, 0, depth);
        let before = scope.get_type(&r).clone();

        let p = scope.reference(&r).unwrap();
        let ty = scope.type_mut(&p).unwrap();
        ty.size = new_size;
        ty.indirection = new_indirection;

        prop_assert_eq!(scope.try_get_type(&r), Some(&before));
    }

    #[test]
    fn untyped_regions_refuse_value_access(len in 0usize..64) {
        let mut scope = Scope::new(Heap::native()).unwrap();
        let r = scope.alloc(len).unwrap();
        prop_assert_eq!(scope.deref(&r).unwrap_err(), RefError::UnknownType { size: len });
        prop_assert_eq!(scope.load(&r, 0).unwrap_err(), RefError::UnknownType { size: len });
        prop_assert!(scope.get_type(&r).is_unknown());
    }

    #[test]
    fn retained_count_never_decreases(
        writes in proptest::collection::vec(arb_write(), 0..24),
    ) {
        let mut scope = Scope::new(Heap::native()).unwrap();
        let pointer_size = scope.platform().pointer_size();
        let slot = scope.alloc(pointer_size).unwrap();
        let mut previous = 0;
        for write in writes {
            match write {
                Write::Pointer => {
                    let target = scope.alloc(1).unwrap();
                    scope.write_pointer(&slot, 0, &target).unwrap();
                }
                Write::Object(n) => {
                    scope.write_object(&slot, 0, &host_object(n)).unwrap();
                }
                Write::Attach => {
                    scope.attach(&slot, Retained::Object(host_object(())));
                }
            }
            let now = scope.retained(&slot).len();
            prop_assert_eq!(now, previous + 1);
            previous = now;
        }
        scope.memory_mut().collect();
        for retained in scope.retained(&slot) {
            if let Some(region) = retained.as_region() {
                prop_assert!(scope.memory().is_live(region.address()));
            }
        }
    }
}
