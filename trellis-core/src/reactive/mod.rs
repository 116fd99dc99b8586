//! Reactive Primitives
//!
//! This module implements the reactive half of Trellis: tracked records,
//! effects, and the dependency tracker that connects them.
//!
//! # Concepts
//!
//! ## Reactive objects
//!
//! A [`ReactiveObject`] is a key-value record. Reading a property inside a
//! running effect registers the effect as a dependent of that property;
//! writing the property re-runs its dependents.
//!
//! ## Effects
//!
//! A [`ReactiveEffect`] is a re-runnable computation. Component rendering is
//! an effect: the render reads component state, and a write to that state
//! re-renders and patches the component.
//!
//! ## Dependency tracker
//!
//! The [`Tracker`] maps `(object, property)` to the ordered set of effects
//! that read it.
//!
//! # Implementation Notes
//!
//! The running effect is kept on a thread-local context stack, so tracking
//! is per thread. Execution is synchronous: a write returns only after every
//! dependent has re-run. There is no batching.

mod context;
mod effect;
mod id;
mod object;
mod state;
mod tracker;

pub use context::ReactiveContext;
pub use effect::ReactiveEffect;
pub use id::{DepKey, EffectId, ObjectId};
pub use object::ReactiveObject;
pub use state::State;
pub use tracker::{Reactive, ReactiveHandle, Tracker};
