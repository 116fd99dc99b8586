//! Trellis Core
//!
//! This crate provides the runtime for the Trellis UI renderer. It implements:
//!
//! - Reactive records and effects with per-property dependency tracking
//! - Virtual nodes and a reconciler that patches a host tree
//! - Stateful components with setup, slots and a public instance view
//! - A pluggable host adapter, with an in-memory host for headless use
//!
//! # Architecture
//!
//! - `reactive`: reactive objects, effects and the dependency tracker
//! - `vnode`: the virtual node model and the `h` builder
//! - `component`: component definitions, instances and slots
//! - `renderer`: mounting, patching and unmounting against a host
//! - `host`: the host adapter trait and [`MemoryHost`]
//! - `app`: the application entry point
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trellis_core::{create_app, h, props, Component, MemoryHost, ReactiveObject, State};
//!
//! let count = ReactiveObject::new().with("count", 0);
//! let state = count.clone();
//!
//! let counter = Component::new("Counter", |this| {
//!     Ok(h("div", props! {}, this.text("count")))
//! })
//! .with_setup(move |_, _| Ok(State::from(state.clone())));
//!
//! let host = Arc::new(MemoryHost::new());
//! let container = host.create_root("div", "app");
//! let mut app = create_app(host.clone(), counter);
//! app.mount("#app")?;
//!
//! count.set("count", 1)?;
//! assert_eq!(host.inner_html(container), "<div>1</div>");
//! ```

pub mod app;
pub mod component;
pub mod config;
pub mod error;
pub mod host;
pub mod reactive;
pub mod renderer;
pub mod value;
pub mod vnode;

pub use app::{create_app, App, Container};
pub use component::{
    render_slots, Component, ComponentInstance, InstanceId, PublicInstance, SetupContext, Slots,
};
pub use config::RendererConfig;
pub use error::{Error, HostError, Result};
pub use host::{HostAdapter, HostNode, HostOp, MemoryHost};
pub use reactive::{
    DepKey, EffectId, ObjectId, Reactive, ReactiveContext, ReactiveEffect, ReactiveHandle,
    ReactiveObject, State, Tracker,
};
pub use renderer::Renderer;
pub use value::{Handler, Props, Value};
pub use vnode::{
    fragment, h, text, Children, ChildrenKind, InstanceRef, NodeKind, ShapeFlags, VNode, VNodeType,
};
