//! The indirection engine.
//!
//! A [`Scope`] owns a native memory layer together with the bookkeeping the
//! layer does not do itself: the type bound to each region and the values
//! each region retains. [`Scope::reference`] adds one level of pointer
//! indirection; [`Scope::deref`] strips one, until the last hop decodes the
//! base value.
//!
//! # Indirection
//!
//! ```text
//! r        : char,   indirection 1, size 1      deref → Value
//! ref(r)   : char*,  indirection 2, size 1      deref → region of `size` bytes
//! ref²(r)  : char**, indirection 3, size 1      deref → region of pointer size
//! ```
//!
//! The read size of a deref depends on what the embedded pointer points at:
//! at indirection 2 it points at the base value, so `size` bytes are
//! mapped; above 2 it points at another pointer.

use memref_core::{Address, HostObject, MemoryRegion, NativeMemory, Platform, RefError, Value};
use tracing::{debug, warn};

use crate::binding::TypeBindings;
use crate::descriptor::{clone_type, Codec, TypeDescriptor};
use crate::ledger::{Retained, RetentionLedger};
use crate::tracker::{PruneStats, RegionTracker};
use crate::types::PrimitiveTypes;

/// Result of a [`Scope::deref`].
#[derive(Clone, Debug, PartialEq)]
pub enum Target<R> {
    /// One level of indirection was stripped; the result is still a pointer
    /// or the value's region.
    Region(R),
    /// Indirection was exhausted and the base type decoded a value.
    Value(Value),
}

impl<R> Target<R> {
    /// The region, if the deref produced one.
    pub fn into_region(self) -> Option<R> {
        match self {
            Self::Region(r) => Some(r),
            Self::Value(_) => None,
        }
    }

    /// The decoded value, if the deref produced one.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Region(_) => None,
            Self::Value(v) => Some(v),
        }
    }

    /// Whether the deref produced a region.
    pub fn is_region(&self) -> bool {
        matches!(self, Self::Region(_))
    }
}

/// Owner of a memory layer, its region type bindings and retention ledger.
///
/// Retained values live exactly as long as the scope's record of the region
/// that retains them. A record is dropped by [`Scope::release`], by
/// [`Scope::prune`] once every handle to the region is gone, or when the
/// scope is dropped. Pruning also runs on its own as records accumulate.
pub struct Scope<M: NativeMemory> {
    memory: M,
    types: PrimitiveTypes,
    bindings: TypeBindings,
    ledger: RetentionLedger<M::Region>,
    tracker: RegionTracker,
    /// `ref(NULL)`, built once in [`Scope::new`].
    null_pointer: M::Region,
}

impl<M: NativeMemory> Scope<M> {
    /// Wrap a memory layer and build the canonical null pointer.
    ///
    /// Fails only if the memory layer cannot allocate one pointer.
    pub fn new(memory: M) -> Result<Self, RefError> {
        let types = PrimitiveTypes::new(memory.platform());
        let null = memory.null();
        let mut scope = Self {
            memory,
            types,
            bindings: TypeBindings::new(),
            ledger: RetentionLedger::new(),
            tracker: RegionTracker::new(),
            null_pointer: null.clone(),
        };
        scope.null_pointer = scope.reference(&null)?;
        Ok(scope)
    }

    /// The underlying memory layer.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Mutable access to the memory layer.
    ///
    /// Writes made directly through the layer bypass the retention ledger.
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Size table and byte order of the memory layer.
    pub fn platform(&self) -> &Platform {
        self.memory.platform()
    }

    /// The primitive type registry for this scope's platform.
    pub fn types(&self) -> &PrimitiveTypes {
        &self.types
    }

    /// The type binding table.
    pub fn bindings(&self) -> &TypeBindings {
        &self.bindings
    }

    /// The retention ledger.
    pub fn ledger(&self) -> &RetentionLedger<M::Region> {
        &self.ledger
    }

    /// A pointer-sized region pointing at null, typed one level above the
    /// null region's default type. Treat as read-only.
    pub fn null_pointer(&self) -> &M::Region {
        &self.null_pointer
    }

    // ── Allocation ──────────────────────────────────────────────────

    /// Allocate an untyped region of `len` bytes.
    pub fn alloc(&mut self, len: usize) -> Result<M::Region, RefError> {
        Ok(self.memory.alloc(len)?)
    }

    /// Allocate a region able to hold one element of `ty` and bind a copy
    /// of `ty` to it.
    ///
    /// Pointer types (`indirection > 1`) get a pointer-sized region.
    pub fn alloc_type(&mut self, ty: &TypeDescriptor) -> Result<M::Region, RefError> {
        let len = if ty.indirection > 1 {
            self.platform().pointer_size()
        } else {
            ty.size
        };
        let region = self.memory.alloc(len)?;
        self.track(&region);
        self.bindings.bind(region.id(), clone_type(ty));
        Ok(region)
    }

    /// Allocate a region for `ty` and store `value` in it.
    pub fn alloc_value(
        &mut self,
        ty: &TypeDescriptor,
        value: impl Into<Value>,
    ) -> Result<M::Region, RefError> {
        let region = self.alloc_type(ty)?;
        self.store(&region, 0, value)?;
        Ok(region)
    }

    // ── Type bindings ───────────────────────────────────────────────

    /// The type bound to `region`, without binding anything.
    pub fn try_get_type(&self, region: &M::Region) -> Option<&TypeDescriptor> {
        self.bindings.get(region.id())
    }

    /// Bind the default unknown type to `region`, replacing any binding.
    ///
    /// The default's size is the region's length; reading through it fails
    /// with [`RefError::UnknownType`] until a real type is bound.
    pub fn bind_default_type(&mut self, region: &M::Region) -> &TypeDescriptor {
        warn!(region = ?region.id(), "binding default type to region");
        self.track(region);
        self.bindings
            .rebind(region.id(), TypeDescriptor::unknown(region.len()))
    }

    /// The type bound to `region`, binding the default type first if there
    /// is none. Idempotent after the first call.
    pub fn get_type(&mut self, region: &M::Region) -> &TypeDescriptor {
        let (id, len) = (region.id(), region.len());
        self.track(region);
        self.bindings.get_or_bind(id, || {
            warn!(region = ?id, "no type bound to region, binding default type");
            TypeDescriptor::unknown(len)
        })
    }

    /// Bind `ty` to `region`, returning the previous binding.
    pub fn set_type(&mut self, region: &M::Region, ty: TypeDescriptor) -> Option<TypeDescriptor> {
        self.track(region);
        self.bindings.bind(region.id(), ty)
    }

    /// Mutable access to the type bound to `region`.
    ///
    /// Edits affect this region only; no other region shares the value.
    pub fn type_mut(&mut self, region: &M::Region) -> Option<&mut TypeDescriptor> {
        self.bindings.get_mut(region.id())
    }

    // ── Indirection ─────────────────────────────────────────────────

    /// Create a pointer to `region`.
    ///
    /// The result is a new pointer-sized region holding `region`'s address,
    /// retaining `region`, and typed as a copy of `region`'s type with one
    /// more level of indirection. `region` gets the default type bound if
    /// it had none.
    pub fn reference(&mut self, region: &M::Region) -> Result<M::Region, RefError> {
        debug!(region = ?region.id(), address = %region.address(), "creating reference");
        let pointer_size = self.platform().pointer_size();
        let reference = self.memory.alloc(pointer_size)?;
        self.write_pointer(&reference, 0, region)?;
        let mut ty = clone_type(self.get_type(region));
        ty.indirection += 1;
        self.track(&reference);
        self.bindings.bind(reference.id(), ty);
        Ok(reference)
    }

    /// Strip one level of indirection from `region`.
    ///
    /// Above indirection 1, reads the embedded pointer into a new region
    /// typed one level lower: `size` bytes long when the result is the base
    /// value's region (indirection 2), pointer-sized otherwise. At
    /// indirection 1, decodes the base value with the type's `get`.
    pub fn deref(&mut self, region: &M::Region) -> Result<Target<M::Region>, RefError> {
        let ty = clone_type(self.get_type(region));
        debug!(region = ?region.id(), ty = %ty, indirection = ty.indirection, "dereferencing");
        if ty.indirection > 1 {
            let size = if ty.indirection == 2 {
                ty.size
            } else {
                self.platform().pointer_size()
            };
            let target = self.memory.read_pointer(region, 0, size)?;
            let mut target_ty = ty;
            target_ty.indirection -= 1;
            self.track(&target);
            self.bindings.bind(target.id(), target_ty);
            Ok(Target::Region(target))
        } else {
            Ok(Target::Value(ty.get(&self.memory, region, 0)?))
        }
    }

    /// Decode the base value at `offset` through `region`'s type.
    pub fn load(&mut self, region: &M::Region, offset: usize) -> Result<Value, RefError> {
        let ty = clone_type(self.get_type(region));
        ty.get(&self.memory, region, offset)
    }

    /// Encode `value` at `offset` through `region`'s type.
    ///
    /// Objects stored through an object type are retained by `region`.
    pub fn store(
        &mut self,
        region: &M::Region,
        offset: usize,
        value: impl Into<Value>,
    ) -> Result<(), RefError> {
        let value = value.into();
        let ty = clone_type(self.get_type(region));
        match (ty.codec, &value) {
            (Codec::Object, Value::Object(object)) => self.write_object(region, offset, object),
            _ => ty.set(&mut self.memory, region, offset, &value),
        }
    }

    // ── Retention ───────────────────────────────────────────────────

    /// Keep `value` alive for as long as `region` is recorded in this scope.
    pub fn attach(&mut self, region: &M::Region, value: Retained<M::Region>) {
        self.track(region);
        self.ledger.attach(region.id(), value);
    }

    /// Write `object` at `offset` and retain it on `region`.
    pub fn write_object(
        &mut self,
        region: &M::Region,
        offset: usize,
        object: &HostObject,
    ) -> Result<(), RefError> {
        debug!(region = ?region.id(), offset, "writing object");
        self.memory.write_object(region, offset, object)?;
        self.attach(region, Retained::Object(object.clone()));
        Ok(())
    }

    /// Write a pointer to `target` at `offset` and retain `target` on `region`.
    pub fn write_pointer(
        &mut self,
        region: &M::Region,
        offset: usize,
        target: &M::Region,
    ) -> Result<(), RefError> {
        debug!(region = ?region.id(), offset, target = %target.address(), "writing pointer");
        self.memory.write_pointer(region, offset, target)?;
        self.attach(region, Retained::Region(target.clone()));
        Ok(())
    }

    /// Values retained by `region`, oldest first.
    pub fn retained(&self, region: &M::Region) -> &[Retained<M::Region>] {
        self.ledger.retained(region.id())
    }

    /// Forget `region`: drop its type binding and everything it retains.
    ///
    /// Returns the number of retained values dropped.
    pub fn release(&mut self, region: &M::Region) -> usize {
        self.tracker.forget(region.id());
        self.bindings.unbind(region.id());
        let dropped = self.ledger.release(region.id());
        debug!(region = ?region.id(), dropped, "released region");
        dropped
    }

    /// Forget every region no handle refers to any more.
    ///
    /// Dropping a region's retention list can release the last handle to
    /// a target, so the sweep repeats until nothing else dies. Run before
    /// reclaiming native memory so retained targets of forgotten regions
    /// can be reclaimed too.
    pub fn prune(&mut self) -> PruneStats {
        let mut stats = PruneStats::default();
        loop {
            let dead = self.tracker.take_dead();
            if dead.is_empty() {
                break;
            }
            for id in dead {
                stats.regions += 1;
                if self.bindings.unbind(id).is_some() {
                    stats.bindings += 1;
                }
                stats.retained += self.ledger.release(id);
            }
        }
        self.tracker.rearm();
        debug!(
            regions = stats.regions,
            bindings = stats.bindings,
            retained = stats.retained,
            "pruned scope"
        );
        stats
    }

    fn track(&mut self, region: &M::Region) {
        if self.tracker.track(region) {
            self.prune();
        }
    }

    // ── Pass-through primitives ─────────────────────────────────────

    /// Decode the pointer at `offset` into a new, untyped region of `len` bytes.
    pub fn read_pointer(
        &self,
        region: &M::Region,
        offset: usize,
        len: usize,
    ) -> Result<M::Region, RefError> {
        Ok(self.memory.read_pointer(region, offset, len)?)
    }

    /// Resolve the object stored at `offset`.
    pub fn read_object(&self, region: &M::Region, offset: usize) -> Result<HostObject, RefError> {
        Ok(self.memory.read_object(region, offset)?)
    }

    /// Whether `region` sits at the null address. Delegates to
    /// [`MemoryRegion::is_null`].
    pub fn is_null(&self, region: &M::Region) -> bool {
        region.is_null()
    }

    /// Numeric address of `region`. Delegates to [`MemoryRegion::address`].
    pub fn address_of(&self, region: &M::Region) -> Address {
        region.address()
    }
}
