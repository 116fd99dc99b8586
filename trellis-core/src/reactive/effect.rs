//! Effect Implementation
//!
//! A [`ReactiveEffect`] is a re-runnable computation whose reads of reactive
//! state are recorded so it can be re-run when that state changes.
//!
//! # How Effects Work
//!
//! 1. [`ReactiveEffect::new`] runs the computation immediately to establish
//!    its dependencies; [`ReactiveEffect::new_lazy`] waits for the first
//!    explicit [`run`](ReactiveEffect::run).
//!
//! 2. While running, the effect is the current tracking target. The target
//!    is restored when the run ends, on every exit path.
//!
//! 3. When a dependency is written, the tracker re-runs the effect
//!    synchronously, before the write returns.
//!
//! # Re-entrancy
//!
//! An effect that is triggered while it is already running (its own
//! computation wrote state it reads) is not re-entered; the nested trigger
//! is dropped with a warning. Different effects may nest: a child component
//! mounting inside its parent's render runs its own effect on top of the
//! parent's.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{trace, warn};

use super::context::ReactiveContext;
use super::id::{DepKey, EffectId};
use super::tracker::{Reactive, ReactiveHandle, Tracker};
use crate::error::Result;

type EffectFn = dyn Fn() -> Result<()> + Send + Sync;

struct EffectInner {
    id: EffectId,
    run: Box<EffectFn>,
    running: AtomicBool,
    disposed: AtomicBool,
    run_count: AtomicUsize,
    /// Every edge this effect has joined.
    dependencies: Mutex<HashSet<DepKey>>,
}

/// Clears the running flag when a run ends, including by panic.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl EffectInner {
    fn execute(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Ok(());
        }

        if self.running.swap(true, Ordering::SeqCst) {
            warn!(effect = self.id.raw(), "effect triggered while running; skipping re-run");
            return Ok(());
        }
        let _running = RunGuard(&self.running);

        let ctx = ReactiveContext::enter(self.id);
        let result = (self.run)();
        let deps = ReactiveContext::dependencies();
        drop(ctx);

        self.dependencies.lock().extend(deps);
        let runs = self.run_count.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(effect = self.id.raw(), runs, ok = result.is_ok(), "effect ran");

        result
    }

    /// Drop every edge this effect has joined.
    fn release_edges(&self) {
        let deps = std::mem::take(&mut *self.dependencies.lock());
        Tracker::release_edges(self.id, &deps);
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        Tracker::release_edges(self.id, self.dependencies.get_mut().iter());
    }
}

impl Reactive for EffectInner {
    fn effect_id(&self) -> EffectId {
        self.id
    }

    fn trigger(&self) -> Result<()> {
        self.execute()
    }
}

/// A computation that re-runs when the reactive state it read changes.
///
/// Clones share the same computation and state. The effect stays
/// registered until it is disposed or its last clone is dropped; either
/// way it leaves exactly the edges it recorded.
///
/// # Example
///
/// ```rust,ignore
/// let state = ReactiveObject::new().with("count", 0);
///
/// let reader = state.clone();
/// let effect = ReactiveEffect::new(move || {
///     println!("count is {}", reader.get("count").unwrap_or_default());
///     Ok(())
/// })?;
///
/// state.set("count", 5)?; // prints "count is 5"
/// ```
#[derive(Clone)]
pub struct ReactiveEffect {
    inner: Arc<EffectInner>,
    _handle: Arc<ReactiveHandle>,
}

impl ReactiveEffect {
    /// Create an effect and run it once.
    pub fn new<F>(run: F) -> Result<Self>
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let effect = Self::new_lazy(run);
        effect.run()?;
        Ok(effect)
    }

    /// Create an effect without running it.
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let inner = Arc::new(EffectInner {
            id: EffectId::new(),
            run: Box::new(run),
            running: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
            dependencies: Mutex::new(HashSet::new()),
        });
        let handle = Tracker::register(inner.clone());

        Self {
            inner,
            _handle: Arc::new(handle),
        }
    }

    /// Get the effect's id.
    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    /// Run the computation as the active tracking target.
    pub fn run(&self) -> Result<()> {
        self.inner.execute()
    }

    /// Stop the effect and release its dependency edges.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        Tracker::unregister(self.inner.id);
        self.inner.release_edges();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Number of completed runs.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Number of distinct properties this effect depends on.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.lock().len()
    }
}

impl fmt::Debug for ReactiveEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveEffect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::reactive::ReactiveObject;

    /// A render-like effect that logs the `count` it saw on every run.
    fn render_log(state: &ReactiveObject) -> (ReactiveEffect, Arc<Mutex<Vec<Option<i64>>>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let reader = state.clone();
        let log = frames.clone();
        let effect = ReactiveEffect::new(move || {
            log.lock().push(reader.get("count").and_then(|v| v.as_i64()));
            Ok(())
        })
        .unwrap();
        (effect, frames)
    }

    #[test]
    fn first_render_records_its_reads() {
        let state = ReactiveObject::new().with("count", 0).with("label", "x");
        let reader = state.clone();

        let effect = ReactiveEffect::new(move || {
            reader.get("count");
            reader.get("label");
            reader.get("count");
            Ok(())
        })
        .unwrap();

        assert_eq!(effect.run_count(), 1);
        assert_eq!(effect.dependency_count(), 2);
        assert_eq!(Tracker::dependents(state.id(), "count"), vec![effect.id()]);
        assert_eq!(Tracker::dependents(state.id(), "label"), vec![effect.id()]);
    }

    #[test]
    fn lazy_render_subscribes_on_first_run() {
        let state = ReactiveObject::new().with("count", 0);
        let frames = Arc::new(Mutex::new(Vec::new()));
        let reader = state.clone();
        let log = frames.clone();

        let effect = ReactiveEffect::new_lazy(move || {
            log.lock().push(reader.get("count").and_then(|v| v.as_i64()));
            Ok(())
        });

        state.set("count", 1).unwrap();
        assert!(frames.lock().is_empty());
        assert_eq!(effect.run_count(), 0);

        effect.run().unwrap();
        state.set("count", 2).unwrap();
        assert_eq!(*frames.lock(), vec![Some(1), Some(2)]);
    }

    #[test]
    fn every_write_produces_one_frame() {
        let state = ReactiveObject::new().with("count", 0);
        let (effect, frames) = render_log(&state);

        state.set("count", 1).unwrap();
        state.set("count", 2).unwrap();

        assert_eq!(*frames.lock(), vec![Some(0), Some(1), Some(2)]);
        assert_eq!(effect.run_count(), 3);
        assert_eq!(effect.dependency_count(), 1);
    }

    #[test]
    fn unmounted_render_ignores_writes() {
        let state = ReactiveObject::new().with("count", 0);
        let (effect, frames) = render_log(&state);

        effect.dispose();
        state.set("count", 1).unwrap();
        effect.run().unwrap();

        assert!(effect.is_disposed());
        assert_eq!(*frames.lock(), vec![Some(0)]);
        assert_eq!(effect.dependency_count(), 0);
        assert!(Tracker::dependents(state.id(), "count").is_empty());
    }

    #[test]
    fn dropping_the_last_handle_releases_edges() {
        let state = ReactiveObject::new().with("count", 0);
        let (effect, _frames) = render_log(&state);
        let id = effect.id();
        let held_by_instance = effect.clone();

        drop(effect);
        assert!(Tracker::is_registered(id));
        assert_eq!(Tracker::dependents(state.id(), "count"), vec![id]);

        drop(held_by_instance);
        assert!(!Tracker::is_registered(id));
        assert!(Tracker::dependents(state.id(), "count").is_empty());
    }

    #[test]
    fn failed_render_leaves_no_tracking_target() {
        let state = ReactiveObject::new().with("count", 0);
        let reader = state.clone();

        let effect = ReactiveEffect::new(move || {
            if reader.get("count").and_then(|v| v.as_i64()) > Some(0) {
                return Err(Error::render("Counter", "negative space"));
            }
            Ok(())
        })
        .unwrap();

        let err = state.set("count", 1).unwrap_err();

        assert!(matches!(err, Error::Render { .. }));
        assert!(!ReactiveContext::is_active());
        assert!(!effect.is_running());
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn render_writing_its_own_state_is_not_reentered() {
        let state = ReactiveObject::new().with("count", 0);
        let writer = state.clone();

        let effect = ReactiveEffect::new(move || {
            let count = writer.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
            if count < 10 {
                writer.set("count", count + 1)?;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(effect.run_count(), 1);
        assert_eq!(state.get_untracked("count").and_then(|v| v.as_i64()), Some(1));
        assert!(!effect.is_running());
    }

    #[test]
    fn child_run_inside_parent_keeps_reads_apart() {
        let state = ReactiveObject::new().with("a", 0).with("b", 0);
        let child_slot: Arc<Mutex<Option<ReactiveEffect>>> = Arc::new(Mutex::new(None));

        let parent_reader = state.clone();
        let slot = child_slot.clone();
        let parent = ReactiveEffect::new(move || {
            let child_reader = parent_reader.clone();
            let child = ReactiveEffect::new(move || {
                child_reader.get("a");
                Ok(())
            })?;
            slot.lock().replace(child);
            parent_reader.get("b");
            Ok(())
        })
        .unwrap();

        let child = child_slot.lock().clone().unwrap();
        assert_eq!(Tracker::dependents(state.id(), "a"), vec![child.id()]);
        assert_eq!(Tracker::dependents(state.id(), "b"), vec![parent.id()]);
    }
}
