//! Virtual Nodes
//!
//! A [`VNode`] describes one node of the UI tree for one render: an
//! element, a text node, a fragment, or a component occurrence. VNodes are
//! rebuilt on every render; the reconciler compares the new tree against the
//! previous one and copies the realized host node (`el`) across.
//!
//! # Shape
//!
//! Every node carries a [`ShapeFlags`] pair computed at construction time:
//! the node kind (from the type) and the children kind (from the children
//! argument). The reconciler dispatches on these rather than re-inspecting
//! the node.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::component::{Component, ComponentInstance, Slots};
use crate::host::HostNode;
use crate::value::Props;

/// Shared handle to a mounted component instance.
pub type InstanceRef = Arc<Mutex<ComponentInstance>>;

/// The type of a virtual node.
#[derive(Clone)]
pub enum VNodeType {
    /// A host element with the given tag.
    Element(String),
    /// A text node. Its content is the node's text children.
    Text,
    /// A transparent grouping node; only its children reach the host.
    Fragment,
    /// A component occurrence.
    Component(Component),
}

impl VNodeType {
    /// Whether two types can be patched into one another.
    ///
    /// Components match by definition identity, elements by tag.
    pub fn is_same_type(&self, other: &VNodeType) -> bool {
        match (self, other) {
            (VNodeType::Element(a), VNodeType::Element(b)) => a == b,
            (VNodeType::Text, VNodeType::Text) => true,
            (VNodeType::Fragment, VNodeType::Fragment) => true,
            (VNodeType::Component(a), VNodeType::Component(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    fn kind(&self) -> NodeKind {
        match self {
            VNodeType::Element(_) => NodeKind::Element,
            VNodeType::Text => NodeKind::Text,
            VNodeType::Fragment => NodeKind::Fragment,
            VNodeType::Component(_) => NodeKind::StatefulComponent,
        }
    }
}

impl fmt::Debug for VNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNodeType::Element(tag) => write!(f, "Element({tag})"),
            VNodeType::Text => f.write_str("Text"),
            VNodeType::Fragment => f.write_str("Fragment"),
            VNodeType::Component(component) => write!(f, "Component({})", component.name()),
        }
    }
}

impl From<&str> for VNodeType {
    fn from(tag: &str) -> Self {
        VNodeType::Element(tag.to_string())
    }
}

impl From<String> for VNodeType {
    fn from(tag: String) -> Self {
        VNodeType::Element(tag)
    }
}

impl From<Component> for VNodeType {
    fn from(component: Component) -> Self {
        VNodeType::Component(component)
    }
}

impl From<&Component> for VNodeType {
    fn from(component: &Component) -> Self {
        VNodeType::Component(component.clone())
    }
}

/// What a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    StatefulComponent,
    Text,
    Fragment,
}

/// What a node's children are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildrenKind {
    Empty,
    Text,
    Array,
    /// Named slots passed to a component.
    Slots,
}

/// The two orthogonal classification axes of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeFlags {
    pub node: NodeKind,
    pub children: ChildrenKind,
}

impl ShapeFlags {
    pub fn is_element(&self) -> bool {
        self.node == NodeKind::Element
    }

    pub fn is_component(&self) -> bool {
        self.node == NodeKind::StatefulComponent
    }

    pub fn has_text_children(&self) -> bool {
        self.children == ChildrenKind::Text
    }

    pub fn has_array_children(&self) -> bool {
        self.children == ChildrenKind::Array
    }
}

/// The children of a virtual node.
#[derive(Clone, Debug, Default)]
pub enum Children {
    #[default]
    Empty,
    Text(String),
    Nodes(Vec<VNode>),
    Slots(Slots),
}

impl Children {
    pub fn kind(&self) -> ChildrenKind {
        match self {
            Children::Empty => ChildrenKind::Empty,
            Children::Text(_) => ChildrenKind::Text,
            Children::Nodes(_) => ChildrenKind::Array,
            Children::Slots(_) => ChildrenKind::Slots,
        }
    }

    pub fn as_nodes(&self) -> &[VNode] {
        match self {
            Children::Nodes(nodes) => nodes,
            _ => &[],
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Children::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Children::Empty
    }
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Children::Text(text.to_string())
    }
}

impl From<String> for Children {
    fn from(text: String) -> Self {
        Children::Text(text)
    }
}

impl From<Vec<VNode>> for Children {
    fn from(nodes: Vec<VNode>) -> Self {
        Children::Nodes(nodes)
    }
}

impl From<VNode> for Children {
    fn from(node: VNode) -> Self {
        Children::Nodes(vec![node])
    }
}

impl From<Slots> for Children {
    fn from(slots: Slots) -> Self {
        Children::Slots(slots)
    }
}

/// One node of a virtual tree.
#[derive(Clone, Debug)]
pub struct VNode {
    ty: VNodeType,
    props: Props,
    children: Children,
    shape: ShapeFlags,
    pub(crate) el: Option<HostNode>,
    pub(crate) component: Option<InstanceRef>,
}

impl VNode {
    /// Build a node, classifying its shape.
    ///
    /// Fragment text children are wrapped in a text node so fragments only
    /// ever hold node sequences.
    pub fn new(ty: VNodeType, props: Props, children: Children) -> Self {
        let children = match (&ty, children) {
            (VNodeType::Fragment, Children::Text(content)) => Children::Nodes(vec![text(content)]),
            (_, children) => children,
        };
        let shape = ShapeFlags {
            node: ty.kind(),
            children: children.kind(),
        };

        Self {
            ty,
            props,
            children,
            shape,
            el: None,
            component: None,
        }
    }

    pub fn ty(&self) -> &VNodeType {
        &self.ty
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Children {
        &mut self.children
    }

    pub fn shape(&self) -> ShapeFlags {
        self.shape
    }

    /// The realized host node. `None` until mounted; fragments never have
    /// one, and a component's is its subtree root's.
    pub fn el(&self) -> Option<HostNode> {
        self.el
    }

    /// The instance behind a mounted component node.
    pub fn component(&self) -> Option<&InstanceRef> {
        self.component.as_ref()
    }

    /// The component definition, for component nodes.
    pub fn component_def(&self) -> Option<&Component> {
        match &self.ty {
            VNodeType::Component(component) => Some(component),
            _ => None,
        }
    }

    /// The tag name, for element nodes.
    pub fn tag(&self) -> Option<&str> {
        match &self.ty {
            VNodeType::Element(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Build a virtual node.
///
/// ```rust,ignore
/// h("div", props! { "id" => "app" }, vec![
///     h("p", props! {}, "hello"),
/// ]);
/// ```
pub fn h(ty: impl Into<VNodeType>, props: Props, children: impl Into<Children>) -> VNode {
    VNode::new(ty.into(), props, children.into())
}

/// Build a text node.
pub fn text(content: impl Into<String>) -> VNode {
    VNode::new(VNodeType::Text, Props::new(), Children::Text(content.into()))
}

/// Build a fragment.
pub fn fragment(children: Vec<VNode>) -> VNode {
    VNode::new(VNodeType::Fragment, Props::new(), Children::Nodes(children))
}
