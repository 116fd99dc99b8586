//! Reactive Context
//!
//! The reactive context records which effect is currently running, so a
//! property read can register that effect as a dependent.
//!
//! # Implementation
//!
//! A thread-local stack. Running an effect pushes an entry and the returned
//! guard pops it, on every exit path including panics. A child component
//! mounting inside its parent's render pushes on top of the parent; when the
//! child finishes the parent's tracking resumes.
//!
//! An entry with no effect pauses tracking (see [`ReactiveContext::untracked`]).

use std::cell::RefCell;

use smallvec::SmallVec;

use super::id::{DepKey, EffectId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Clone)]
struct ContextEntry {
    /// The running effect, or `None` while tracking is paused.
    effect: Option<EffectId>,
    /// Properties read during this run, in read order.
    dependencies: SmallVec<[DepKey; 8]>,
}

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    effect: Option<EffectId>,
}

impl ReactiveContext {
    /// Enter a tracking context for the given effect.
    ///
    /// The context is exited when the returned guard is dropped.
    pub fn enter(effect: EffectId) -> Self {
        Self::push(Some(effect))
    }

    /// Run `f` with dependency tracking paused.
    pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
        let _paused = Self::push(None);
        f()
    }

    fn push(effect: Option<EffectId>) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                effect,
                dependencies: SmallVec::new(),
            });
        });

        Self { effect }
    }

    /// Check if an effect is currently being tracked.
    pub fn is_active() -> bool {
        Self::current_effect().is_some()
    }

    /// Get the effect currently being tracked, if any.
    pub fn current_effect() -> Option<EffectId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.effect))
    }

    /// Record a read in the current context.
    pub fn track_dependency(dep: DepKey) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                if entry.effect.is_some() && !entry.dependencies.contains(&dep) {
                    entry.dependencies.push(dep);
                }
            }
        });
    }

    /// The reads recorded in the current context so far.
    pub fn dependencies() -> Vec<DepKey> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.to_vec())
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.effect, self.effect,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.effect, entry.effect
                );
            }
        });
    }
}
