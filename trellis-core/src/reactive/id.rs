//! Identifiers for reactive objects and effects.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a reactive effect.
///
/// The dependency tracker stores effect ids rather than the effects
/// themselves, so an effect can be dropped without touching every edge that
/// mentions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect id.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a reactive object.
///
/// Clones of a [`ReactiveObject`](super::ReactiveObject) share one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Generate a new unique object id.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// One dependency edge source: a property of a reactive object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepKey {
    pub object: ObjectId,
    pub key: String,
}

impl DepKey {
    pub fn new(object: ObjectId, key: impl Into<String>) -> Self {
        Self {
            object,
            key: key.into(),
        }
    }
}
