//! Handle liveness.
//!
//! Every clone of a region handle shares one [`RegionAnchor`]. Side tables
//! keyed by [`RegionId`] keep a [`RegionWatch`] instead, which observes the
//! anchor without keeping it alive, so they can tell when the last handle
//! is gone.

use std::sync::{Arc, Weak};

use crate::id::RegionId;

/// Identity shared by every clone of one region handle.
#[derive(Clone, Debug)]
pub struct RegionAnchor(Arc<RegionId>);

impl RegionAnchor {
    /// Allocate a fresh identity.
    pub fn new() -> Self {
        Self(Arc::new(RegionId::next()))
    }

    /// The region id this anchor carries.
    pub fn id(&self) -> RegionId {
        *self.0
    }

    /// A weak observer of this anchor.
    pub fn watch(&self) -> RegionWatch {
        RegionWatch(Arc::downgrade(&self.0))
    }
}

impl Default for RegionAnchor {
    fn default() -> Self {
        Self::new()
    }
}

/// Observes whether any handle sharing a [`RegionAnchor`] still exists.
#[derive(Clone, Debug)]
pub struct RegionWatch(Weak<RegionId>);

impl RegionWatch {
    /// Whether at least one handle is still alive.
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}
