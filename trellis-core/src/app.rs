//! Application entry point.
//!
//! An [`App`] owns the root component node of one mounted tree.
//!
//! ```rust,ignore
//! let host = Arc::new(MemoryHost::new());
//! host.create_root("div", "app");
//!
//! let mut app = create_app(host, root_component);
//! app.mount("#app")?;
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::component::Component;
use crate::error::{Error, Result};
use crate::host::{HostAdapter, HostNode};
use crate::renderer::Renderer;
use crate::value::Props;
use crate::vnode::{h, InstanceRef, VNode};

/// Where to mount an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    /// A selector resolved by the host adapter.
    Selector(String),
    /// An existing host node.
    Node(HostNode),
}

impl From<&str> for Container {
    fn from(selector: &str) -> Self {
        Container::Selector(selector.to_string())
    }
}

impl From<String> for Container {
    fn from(selector: String) -> Self {
        Container::Selector(selector)
    }
}

impl From<HostNode> for Container {
    fn from(node: HostNode) -> Self {
        Container::Node(node)
    }
}

/// A root component bound to a renderer.
pub struct App {
    renderer: Renderer,
    root: Component,
    props: Props,
    vnode: Option<VNode>,
    container: Option<HostNode>,
}

impl App {
    pub(crate) fn new(renderer: Renderer, root: Component) -> Self {
        Self {
            renderer,
            root,
            props: Props::new(),
            vnode: None,
            container: None,
        }
    }

    /// Props passed to the root component.
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Resolve the container and render the root component into it.
    pub fn mount(&mut self, container: impl Into<Container>) -> Result<()> {
        if self.vnode.is_some() {
            return Err(Error::AlreadyMounted);
        }

        let container = match container.into() {
            Container::Node(node) => node,
            Container::Selector(selector) => self
                .renderer
                .host()
                .query_selector(&selector)
                .ok_or(Error::ContainerNotFound(selector))?,
        };

        debug!(root = self.root.name(), %container, "mount app");
        let mut vnode = h(&self.root, self.props.clone(), ());
        self.renderer.render(&mut vnode, container)?;

        self.vnode = Some(vnode);
        self.container = Some(container);
        Ok(())
    }

    /// Tear the tree down and stop every render effect.
    pub fn unmount(&mut self) -> Result<()> {
        let vnode = self.vnode.take().ok_or(Error::NotMounted)?;
        debug!(root = self.root.name(), "unmount app");
        self.container = None;
        self.renderer.unmount(&vnode)
    }

    pub fn is_mounted(&self) -> bool {
        self.vnode.is_some()
    }

    pub fn container(&self) -> Option<HostNode> {
        self.container
    }

    /// The root component's instance, once mounted.
    pub fn root_instance(&self) -> Option<InstanceRef> {
        self.vnode.as_ref().and_then(|vnode| vnode.component().cloned())
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
}

/// Create an application with a default renderer over `host`.
pub fn create_app(host: Arc<dyn HostAdapter>, root: Component) -> App {
    Renderer::new(host).create_app(root)
}
