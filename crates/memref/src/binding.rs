//! Region → type bindings.
//!
//! Types are not stored on region handles. [`TypeBindings`] is a side table
//! keyed by [`RegionId`], so two handles aliasing the same bytes can carry
//! different types.

use indexmap::map::Entry;
use indexmap::IndexMap;
use memref_core::RegionId;

use crate::descriptor::TypeDescriptor;

/// Maps each region to the descriptor bound to it.
///
/// Uses `IndexMap` so iteration follows binding order.
#[derive(Clone, Debug, Default)]
pub struct TypeBindings {
    entries: IndexMap<RegionId, TypeDescriptor>,
}

impl TypeBindings {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The descriptor bound to `region`, if any.
    pub fn get(&self, region: RegionId) -> Option<&TypeDescriptor> {
        self.entries.get(&region)
    }

    /// Mutable access to the descriptor bound to `region`.
    pub fn get_mut(&mut self, region: RegionId) -> Option<&mut TypeDescriptor> {
        self.entries.get_mut(&region)
    }

    /// The descriptor bound to `region`, binding `default()` first if absent.
    pub fn get_or_bind(
        &mut self,
        region: RegionId,
        default: impl FnOnce() -> TypeDescriptor,
    ) -> &TypeDescriptor {
        match self.entries.entry(region) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(default()),
        }
    }

    /// Bind `ty` to `region`, returning the previous binding.
    pub fn bind(&mut self, region: RegionId, ty: TypeDescriptor) -> Option<TypeDescriptor> {
        self.entries.insert(region, ty)
    }

    /// Bind `ty` to `region`, replacing any previous binding, and return it.
    pub fn rebind(&mut self, region: RegionId, ty: TypeDescriptor) -> &TypeDescriptor {
        let (index, _) = self.entries.insert_full(region, ty);
        &self.entries[index]
    }

    /// Remove the binding of `region`.
    pub fn unbind(&mut self, region: RegionId) -> Option<TypeDescriptor> {
        self.entries.shift_remove(&region)
    }

    /// Whether `region` has a binding.
    pub fn contains(&self, region: RegionId) -> bool {
        self.entries.contains_key(&region)
    }

    /// Number of bound regions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no region is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over bindings in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&RegionId, &TypeDescriptor)> {
        self.entries.iter()
    }
}
