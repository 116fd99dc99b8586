//! Components
//!
//! A [`Component`] is a shared definition: a name, an optional setup
//! function and a render function. Each occurrence of a component in a
//! mounted tree gets its own [`ComponentInstance`].
//!
//! # Lifecycle
//!
//! `created → setup → mount → mounted → update → mounted → … → unmounted`
//!
//! - setup runs once with the resolved props and a [`SetupContext`]; its
//!   return value becomes the instance's `setup_state`.
//! - render receives a [`PublicInstance`] that resolves keys against the
//!   setup state, then the props, then the reserved `$el` and `$props`
//!   getters.
//! - mount and update are driven by the instance's render effect, owned by
//!   the [`Renderer`](crate::renderer::Renderer).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::warn;

use crate::error::Result;
use crate::host::HostNode;
use crate::reactive::{ReactiveContext, ReactiveEffect, State};
use crate::value::{Props, Value};
use crate::vnode::{fragment, Children, InstanceRef, VNode};

type SetupFn = dyn Fn(&Props, &SetupContext) -> Result<State> + Send + Sync;
type RenderFn = dyn Fn(&PublicInstance) -> Result<VNode> + Send + Sync;
type SlotFn = dyn Fn(&Props) -> Vec<VNode> + Send + Sync;

/// Named child-rendering functions passed to a component.
#[derive(Clone, Default)]
pub struct Slots(Arc<IndexMap<String, Arc<SlotFn>>>);

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style slot registration.
    pub fn with<F>(mut self, name: impl Into<String>, slot: F) -> Self
    where
        F: Fn(&Props) -> Vec<VNode> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.0).insert(name.into(), Arc::new(slot));
        self
    }

    /// Invoke the named slot, if present.
    pub fn render(&self, name: &str, props: &Props) -> Option<Vec<VNode>> {
        self.0.get(name).map(|slot| slot(props))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Project a slot into a fragment.
///
/// A missing slot yields an empty fragment, so callers can splice the
/// result into a children list unconditionally.
pub fn render_slots(slots: &Slots, name: &str, props: &Props) -> VNode {
    fragment(slots.render(name, props).unwrap_or_default())
}

#[derive(Clone)]
struct ComponentDef {
    name: String,
    setup: Option<Arc<SetupFn>>,
    render: Arc<RenderFn>,
}

/// A component definition.
///
/// Clones share identity: two nodes built from clones of one `Component`
/// are the same component type to the reconciler.
#[derive(Clone)]
pub struct Component(Arc<ComponentDef>);

impl Component {
    /// Define a component with a render function and no setup.
    pub fn new<R>(name: impl Into<String>, render: R) -> Self
    where
        R: Fn(&PublicInstance) -> Result<VNode> + Send + Sync + 'static,
    {
        Self(Arc::new(ComponentDef {
            name: name.into(),
            setup: None,
            render: Arc::new(render),
        }))
    }

    /// Attach a setup function.
    ///
    /// Call this while building the definition; it gives the definition a
    /// new identity if it has already been cloned.
    pub fn with_setup<S>(mut self, setup: S) -> Self
    where
        S: Fn(&Props, &SetupContext) -> Result<State> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.0).setup = Some(Arc::new(setup));
        self
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Whether both handles refer to the same definition.
    pub fn ptr_eq(&self, other: &Component) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.0.name)
    }
}

/// Context passed to a component's setup function.
#[derive(Clone, Debug)]
pub struct SetupContext {
    slots: Slots,
}

impl SetupContext {
    pub fn slots(&self) -> &Slots {
        &self.slots
    }
}

/// Unique identifier for a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Runtime state of one mounted component occurrence.
pub struct ComponentInstance {
    id: InstanceId,
    /// The node this instance was created for, detached from the parent
    /// tree. Its `el` tracks the subtree root.
    pub(crate) vnode: VNode,
    parent: Option<Weak<Mutex<ComponentInstance>>>,
    component: Component,
    pub(crate) props: Props,
    pub(crate) slots: Slots,
    setup_state: State,
    pub(crate) is_mounted: bool,
    pub(crate) subtree: Option<VNode>,
    pub(crate) effect: Option<ReactiveEffect>,
}

impl ComponentInstance {
    /// Create an instance for a component node.
    pub(crate) fn new(vnode: &VNode, component: &Component, parent: Option<&InstanceRef>) -> Self {
        let slots = match vnode.children() {
            Children::Slots(slots) => slots.clone(),
            _ => Slots::new(),
        };

        Self {
            id: InstanceId::next(),
            vnode: vnode.clone(),
            parent: parent.map(Arc::downgrade),
            component: component.clone(),
            props: vnode.props().clone(),
            slots,
            setup_state: State::plain(),
            is_mounted: false,
            subtree: None,
            effect: None,
        }
    }

    /// Run the component's setup function, if any.
    ///
    /// Setup runs with tracking paused: a child set up during its parent's
    /// render must not make the parent depend on what setup reads.
    pub(crate) fn setup(&mut self) -> Result<()> {
        let Some(setup) = self.component.0.setup.clone() else {
            return Ok(());
        };

        let ctx = SetupContext {
            slots: self.slots.clone(),
        };
        let props = &self.props;
        self.setup_state = ReactiveContext::untracked(|| setup(props, &ctx))?;
        Ok(())
    }

    pub(crate) fn render_fn(&self) -> Arc<RenderFn> {
        self.component.0.render.clone()
    }

    /// Build the public view handed to render.
    pub fn proxy(&self) -> PublicInstance {
        PublicInstance {
            name: self.component.name().to_string(),
            setup_state: self.setup_state.clone(),
            props: self.props.clone(),
            slots: self.slots.clone(),
            el: self.vnode.el,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.component.name()
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn setup_state(&self) -> &State {
        &self.setup_state
    }

    pub fn is_mounted(&self) -> bool {
        self.is_mounted
    }

    pub fn subtree(&self) -> Option<&VNode> {
        self.subtree.as_ref()
    }

    /// The host node of the rendered root.
    pub fn el(&self) -> Option<HostNode> {
        self.vnode.el
    }

    pub fn parent(&self) -> Option<InstanceRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn effect(&self) -> Option<&ReactiveEffect> {
        self.effect.as_ref()
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("component", &self.component)
            .field("props", &self.props)
            .field("is_mounted", &self.is_mounted)
            .field("el", &self.vnode.el)
            .finish()
    }
}

/// The view of an instance that render functions see.
///
/// Key lookup order: setup state, props, then reserved getters. Reads of a
/// reactive setup state are tracked by the running render effect.
#[derive(Clone, Debug)]
pub struct PublicInstance {
    name: String,
    setup_state: State,
    props: Props,
    slots: Slots,
    el: Option<HostNode>,
}

impl PublicInstance {
    /// Resolve a key. Unknown keys yield `None`.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.setup_state.get(key) {
            return Some(value);
        }
        if let Some(value) = self.props.get(key) {
            return Some(value.clone());
        }
        match key {
            "$el" => self.el.map(Value::Node),
            "$props" => Some(Value::Data(self.props.to_json())),
            _ => None,
        }
    }

    /// Resolve a key as text content; unknown keys render as empty.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(|value| value.to_text()).unwrap_or_default()
    }

    /// Write through to the setup state. Props are read-only.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        if !self.setup_state.contains_key(key) && self.props.contains_key(key) {
            warn!(component = %self.name, key, "attempted to write a read-only prop");
            return Ok(());
        }
        self.setup_state.set(key, value)
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn state(&self) -> &State {
        &self.setup_state
    }

    /// The mounted root element; `None` during the first render.
    pub fn el(&self) -> Option<HostNode> {
        self.el
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
