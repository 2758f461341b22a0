//! Benchmark fixtures for memref.
//!
//! - [`pointer_chain`]: a value region plus `depth` stacked references
//! - [`object_slots`]: object-typed regions each retaining a host object

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use memref::prelude::*;

/// Build `int32` region holding `value`, then reference it `depth` times.
///
/// Returns every region in the chain, base first; the last element has
/// indirection `depth + 1`.
pub fn pointer_chain<M: NativeMemory>(
    scope: &mut Scope<M>,
    value: i32,
    depth: usize,
) -> Result<Vec<M::Region>, RefError> {
    let int32 = scope.types().int32.clone();
    let mut chain = Vec::with_capacity(depth + 1);
    let mut current = scope.alloc_value(&int32, value)?;
    chain.push(current.clone());
    for _ in 0..depth {
        current = scope.reference(&current)?;
        chain.push(current.clone());
    }
    Ok(chain)
}

/// Walk a pointer back to its base value with repeated derefs.
pub fn deref_to_value<M: NativeMemory>(
    scope: &mut Scope<M>,
    region: &M::Region,
) -> Result<Value, RefError> {
    let mut current = region.clone();
    loop {
        match scope.deref(&current)? {
            Target::Region(next) => current = next,
            Target::Value(value) => return Ok(value),
        }
    }
}

/// Allocate `count` object slots, each storing a fresh boxed integer.
pub fn object_slots<M: NativeMemory>(
    scope: &mut Scope<M>,
    count: usize,
) -> Result<Vec<M::Region>, RefError> {
    let object = scope.types().object.clone();
    (0..count)
        .map(|i| scope.alloc_value(&object, host_object(i)))
        .collect()
}
