//! Dependency Tracker
//!
//! The tracker connects reactive objects to the effects that read them.
//!
//! # How It Works
//!
//! 1. An effect registers with the tracker when it is created and gets back
//!    a [`ReactiveHandle`]. Dropping the handle unregisters it; the effect
//!    releases the edges it recorded itself.
//!
//! 2. A tracked read of `(object, key)` while an effect is running adds that
//!    effect to the edge's dependent set. Edges are created lazily.
//!
//! 3. A write to `(object, key)` looks up the dependent set and re-runs each
//!    effect synchronously, in first-registration order.
//!
//! Memberships are not cleared when an effect stops reading a property; a
//! stale edge only costs an extra re-run. They are released when the effect
//! is disposed or dropped, and when the object itself is dropped.
//!
//! # Locking
//!
//! Locks are released before any effect runs, so effects are free to read
//! and write reactive state.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use indexmap::IndexSet;
use parking_lot::RwLock;
use tracing::trace;

use super::context::ReactiveContext;
use super::id::{DepKey, EffectId, ObjectId};
use crate::error::Result;

/// A computation that can be re-run by the tracker.
pub trait Reactive: Send + Sync {
    /// The id this computation tracks reads under.
    fn effect_id(&self) -> EffectId;

    /// Re-run the computation after a dependency changed.
    fn trigger(&self) -> Result<()>;
}

/// Handle to a registered computation.
///
/// Dropping this handle unregisters the computation. Edges are released by
/// the owner through [`Tracker::release_edges`].
#[derive(Debug)]
pub struct ReactiveHandle {
    effect_id: EffectId,
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        Tracker::unregister(self.effect_id);
    }
}

type DependentMap = HashMap<ObjectId, HashMap<String, IndexSet<EffectId>>>;

static REGISTRY: OnceLock<RwLock<HashMap<EffectId, Weak<dyn Reactive>>>> = OnceLock::new();
static DEPENDENTS: OnceLock<RwLock<DependentMap>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<EffectId, Weak<dyn Reactive>>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

fn dependents() -> &'static RwLock<DependentMap> {
    DEPENDENTS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The dependency tracker.
pub struct Tracker;

impl Tracker {
    /// Register a computation so it can be triggered.
    pub fn register(reactive: Arc<dyn Reactive>) -> ReactiveHandle {
        let id = reactive.effect_id();
        registry().write().insert(id, Arc::downgrade(&reactive));
        ReactiveHandle { effect_id: id }
    }

    /// Unregister a computation. A write can no longer reach it, but its
    /// edges stay until [`Tracker::release_edges`] drops them.
    pub fn unregister(id: EffectId) {
        registry().write().remove(&id);
    }

    /// Remove `id` from the dependent sets of the given edges.
    ///
    /// Only the listed edges are visited, so the cost is proportional to
    /// what the effect read rather than to the whole graph.
    pub fn release_edges<'a>(id: EffectId, edges: impl IntoIterator<Item = &'a DepKey>) {
        let mut deps = dependents().write();
        for edge in edges {
            let Some(keys) = deps.get_mut(&edge.object) else {
                continue;
            };
            if let Some(set) = keys.get_mut(&edge.key) {
                set.shift_remove(&id);
                if set.is_empty() {
                    keys.remove(&edge.key);
                }
            }
            if keys.is_empty() {
                deps.remove(&edge.object);
            }
        }
    }

    /// Drop every edge that starts at `object`.
    pub fn release_object(object: ObjectId) {
        dependents().write().remove(&object);
    }

    /// Record a read of `(object, key)` by the running effect, if any.
    pub fn track(object: ObjectId, key: &str) {
        let Some(effect) = ReactiveContext::current_effect() else {
            return;
        };

        ReactiveContext::track_dependency(DepKey::new(object, key));

        let inserted = dependents()
            .write()
            .entry(object)
            .or_default()
            .entry(key.to_string())
            .or_default()
            .insert(effect);

        if inserted {
            trace!(object = object.raw(), key, effect = effect.raw(), "track");
        }
    }

    /// Re-run every dependent of `(object, key)`.
    ///
    /// Stops at the first failing effect and returns its error.
    pub fn trigger(object: ObjectId, key: &str) -> Result<()> {
        let ids = Self::dependents(object, key);
        if ids.is_empty() {
            return Ok(());
        }

        let effects: Vec<Arc<dyn Reactive>> = {
            let registry = registry().read();
            ids.iter()
                .filter_map(|id| registry.get(id).and_then(Weak::upgrade))
                .collect()
        };

        trace!(
            object = object.raw(),
            key,
            count = effects.len(),
            "trigger"
        );

        for effect in effects {
            effect.trigger()?;
        }

        Ok(())
    }

    /// The effects depending on `(object, key)`, in registration order.
    pub fn dependents(object: ObjectId, key: &str) -> Vec<EffectId> {
        dependents()
            .read()
            .get(&object)
            .and_then(|keys| keys.get(key))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Check whether `id` is registered.
    pub fn is_registered(id: EffectId) -> bool {
        registry().read().contains_key(&id)
    }
}
