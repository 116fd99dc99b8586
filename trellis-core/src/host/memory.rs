//! In-memory host.
//!
//! [`MemoryHost`] keeps an arena of element and text nodes and records every
//! operation the reconciler issues, which makes it the host of choice for
//! tests, benchmarks and headless rendering.

use std::collections::HashMap;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::{HostAdapter, HostNode};
use crate::error::{HostError, Result};
use crate::value::Value;

/// One recorded host operation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    CreateElement {
        node: HostNode,
        tag: String,
    },
    CreateText {
        node: HostNode,
        text: String,
    },
    SetText {
        node: HostNode,
        text: String,
    },
    PatchProp {
        node: HostNode,
        key: String,
        prev: Option<Value>,
        next: Option<Value>,
    },
    Insert {
        node: HostNode,
        parent: HostNode,
        anchor: Option<HostNode>,
    },
    Remove {
        node: HostNode,
    },
}

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attrs: IndexMap<String, Value>,
        children: Vec<HostNode>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct MemoryNode {
    data: NodeData,
    parent: Option<HostNode>,
}

/// A headless host tree.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Mutex<HashMap<HostNode, MemoryNode>>,
    ops: Mutex<Vec<HostOp>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached container element carrying an `id` attribute.
    ///
    /// Not recorded as an operation.
    pub fn create_root(&self, tag: &str, id: &str) -> HostNode {
        let node = HostNode::new();
        let mut attrs = IndexMap::new();
        attrs.insert("id".to_string(), Value::from(id));
        self.nodes.lock().insert(
            node,
            MemoryNode {
                data: NodeData::Element {
                    tag: tag.to_string(),
                    attrs,
                    children: Vec::new(),
                },
                parent: None,
            },
        );
        node
    }

    /// Operations recorded so far.
    pub fn ops(&self) -> Vec<HostOp> {
        self.ops.lock().clone()
    }

    /// Drain the recorded operations.
    pub fn take_ops(&self) -> Vec<HostOp> {
        std::mem::take(&mut *self.ops.lock())
    }

    pub fn tag(&self, node: HostNode) -> Option<String> {
        match &self.nodes.lock().get(&node)?.data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            NodeData::Text(_) => None,
        }
    }

    pub fn attribute(&self, node: HostNode, key: &str) -> Option<Value> {
        match &self.nodes.lock().get(&node)?.data {
            NodeData::Element { attrs, .. } => attrs.get(key).cloned(),
            NodeData::Text(_) => None,
        }
    }

    pub fn children(&self, node: HostNode) -> Vec<HostNode> {
        match self.nodes.lock().get(&node).map(|n| &n.data) {
            Some(NodeData::Element { children, .. }) => children.clone(),
            _ => Vec::new(),
        }
    }

    pub fn parent(&self, node: HostNode) -> Option<HostNode> {
        self.nodes.lock().get(&node)?.parent
    }

    /// Concatenated text of a node and its descendants.
    pub fn text_content(&self, node: HostNode) -> String {
        let nodes = self.nodes.lock();
        let mut out = String::new();
        collect_text(&nodes, node, &mut out);
        out
    }

    /// Serialize a node as HTML-like markup. Handler attributes are omitted.
    pub fn to_html(&self, node: HostNode) -> String {
        let nodes = self.nodes.lock();
        let mut out = String::new();
        write_html(&nodes, node, &mut out);
        out
    }

    /// Serialize the children of a node.
    pub fn inner_html(&self, node: HostNode) -> String {
        let nodes = self.nodes.lock();
        let mut out = String::new();
        if let Some(MemoryNode {
            data: NodeData::Element { children, .. },
            ..
        }) = nodes.get(&node)
        {
            for child in children {
                write_html(&nodes, *child, &mut out);
            }
        }
        out
    }

    /// Invoke the `on<Event>` handler of a node, e.g. `onClick` for
    /// `"click"`. Returns whether a handler was found.
    pub fn dispatch(&self, node: HostNode, event: &str) -> Result<bool> {
        let key = handler_key(event);
        let handler = match &self.nodes.lock().get(&node).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => {
                attrs.get(&key).and_then(Value::as_handler).cloned()
            }
            Some(NodeData::Text(_)) => None,
            None => return Err(HostError::UnknownNode(node).into()),
        };

        match handler {
            Some(handler) => {
                handler.call()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn record(&self, op: HostOp) {
        self.ops.lock().push(op);
    }

    fn insert_node(&self, data: NodeData) -> HostNode {
        let node = HostNode::new();
        self.nodes
            .lock()
            .insert(node, MemoryNode { data, parent: None });
        node
    }
}

fn handler_key(event: &str) -> String {
    let mut chars = event.chars();
    match chars.next() {
        Some(first) => format!("on{}{}", first.to_uppercase(), chars.as_str()),
        None => "on".to_string(),
    }
}

fn collect_text(nodes: &HashMap<HostNode, MemoryNode>, node: HostNode, out: &mut String) {
    match nodes.get(&node).map(|n| &n.data) {
        Some(NodeData::Text(text)) => out.push_str(text),
        Some(NodeData::Element { children, .. }) => {
            for child in children {
                collect_text(nodes, *child, out);
            }
        }
        None => {}
    }
}

fn write_html(nodes: &HashMap<HostNode, MemoryNode>, node: HostNode, out: &mut String) {
    match nodes.get(&node).map(|n| &n.data) {
        Some(NodeData::Text(text)) => out.push_str(text),
        Some(NodeData::Element {
            tag,
            attrs,
            children,
        }) => {
            out.push('<');
            out.push_str(tag);
            for (key, value) in attrs {
                if value.as_handler().is_none() {
                    out.push_str(&format!(" {key}=\"{}\"", value.to_text()));
                }
            }
            out.push('>');
            for child in children {
                write_html(nodes, *child, out);
            }
            out.push_str(&format!("</{tag}>"));
        }
        None => {}
    }
}

/// Unlink `node` from its parent's child list.
fn detach(nodes: &mut HashMap<HostNode, MemoryNode>, node: HostNode) {
    let Some(parent) = nodes.get_mut(&node).and_then(|n| n.parent.take()) else {
        return;
    };
    if let Some(MemoryNode {
        data: NodeData::Element { children, .. },
        ..
    }) = nodes.get_mut(&parent)
    {
        children.retain(|child| *child != node);
    }
}

impl HostAdapter for MemoryHost {
    fn create_element(&self, tag: &str) -> Result<HostNode, HostError> {
        let node = self.insert_node(NodeData::Element {
            tag: tag.to_string(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        });
        self.record(HostOp::CreateElement {
            node,
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn create_text(&self, text: &str) -> Result<HostNode, HostError> {
        let node = self.insert_node(NodeData::Text(text.to_string()));
        self.record(HostOp::CreateText {
            node,
            text: text.to_string(),
        });
        Ok(node)
    }

    fn set_text(&self, node: HostNode, text: &str) -> Result<(), HostError> {
        {
            let mut nodes = self.nodes.lock();
            let old_children = match nodes.get_mut(&node).map(|n| &mut n.data) {
                Some(NodeData::Text(content)) => {
                    *content = text.to_string();
                    Vec::new()
                }
                Some(NodeData::Element { children, .. }) => std::mem::take(children),
                None => return Err(HostError::UnknownNode(node)),
            };

            for child in old_children {
                if let Some(child) = nodes.get_mut(&child) {
                    child.parent = None;
                }
            }

            let is_element = matches!(
                nodes.get(&node).map(|n| &n.data),
                Some(NodeData::Element { .. })
            );
            if is_element && !text.is_empty() {
                let text_node = HostNode::new();
                nodes.insert(
                    text_node,
                    MemoryNode {
                        data: NodeData::Text(text.to_string()),
                        parent: Some(node),
                    },
                );
                if let Some(MemoryNode {
                    data: NodeData::Element { children, .. },
                    ..
                }) = nodes.get_mut(&node)
                {
                    children.push(text_node);
                }
            }
        }

        self.record(HostOp::SetText {
            node,
            text: text.to_string(),
        });
        Ok(())
    }

    fn patch_prop(
        &self,
        node: HostNode,
        key: &str,
        prev: Option<&Value>,
        next: Option<&Value>,
    ) -> Result<(), HostError> {
        {
            let mut nodes = self.nodes.lock();
            match nodes.get_mut(&node).map(|n| &mut n.data) {
                Some(NodeData::Element { attrs, .. }) => match next {
                    Some(value) => {
                        attrs.insert(key.to_string(), value.clone());
                    }
                    None => {
                        attrs.shift_remove(key);
                    }
                },
                Some(NodeData::Text(_)) => return Err(HostError::NotAnElement(node)),
                None => return Err(HostError::UnknownNode(node)),
            }
        }

        self.record(HostOp::PatchProp {
            node,
            key: key.to_string(),
            prev: prev.cloned(),
            next: next.cloned(),
        });
        Ok(())
    }

    fn insert(
        &self,
        node: HostNode,
        parent: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        {
            let mut nodes = self.nodes.lock();
            if !nodes.contains_key(&node) {
                return Err(HostError::UnknownNode(node));
            }
            match nodes.get(&parent).map(|n| &n.data) {
                Some(NodeData::Element { children, .. }) => {
                    if let Some(anchor) = anchor {
                        if !children.contains(&anchor) {
                            return Err(HostError::NotAChild { anchor, parent });
                        }
                    }
                }
                Some(NodeData::Text(_)) => return Err(HostError::NotAnElement(parent)),
                None => return Err(HostError::UnknownNode(parent)),
            }

            detach(&mut nodes, node);

            if let Some(MemoryNode {
                data: NodeData::Element { children, .. },
                ..
            }) = nodes.get_mut(&parent)
            {
                let index = anchor
                    .and_then(|anchor| children.iter().position(|c| *c == anchor))
                    .unwrap_or(children.len());
                children.insert(index, node);
            }
            if let Some(entry) = nodes.get_mut(&node) {
                entry.parent = Some(parent);
            }
        }

        self.record(HostOp::Insert {
            node,
            parent,
            anchor,
        });
        Ok(())
    }

    fn remove(&self, node: HostNode) -> Result<(), HostError> {
        {
            let mut nodes = self.nodes.lock();
            if !nodes.contains_key(&node) {
                return Err(HostError::UnknownNode(node));
            }
            detach(&mut nodes, node);
        }

        self.record(HostOp::Remove { node });
        Ok(())
    }

    fn next_sibling(&self, node: HostNode) -> Result<Option<HostNode>, HostError> {
        let nodes = self.nodes.lock();
        let entry = nodes.get(&node).ok_or(HostError::UnknownNode(node))?;
        let Some(parent) = entry.parent else {
            return Ok(None);
        };

        match nodes.get(&parent).map(|n| &n.data) {
            Some(NodeData::Element { children, .. }) => Ok(children
                .iter()
                .position(|c| *c == node)
                .and_then(|index| children.get(index + 1))
                .copied()),
            _ => Ok(None),
        }
    }

    fn query_selector(&self, selector: &str) -> Option<HostNode> {
        let nodes = self.nodes.lock();
        let matches = |data: &NodeData| match (data, selector.strip_prefix('#')) {
            (NodeData::Element { attrs, .. }, Some(id)) => {
                attrs.get("id").and_then(Value::as_str) == Some(id)
            }
            (NodeData::Element { tag, .. }, None) => tag == selector,
            (NodeData::Text(_), _) => false,
        };

        nodes
            .iter()
            .filter(|(_, entry)| matches(&entry.data))
            .map(|(node, _)| *node)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Handler;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn builds_and_serializes_a_tree() {
        let host = MemoryHost::new();
        let root = host.create_root("div", "app");

        let p = host.create_element("p").unwrap();
        host.patch_prop(p, "class", None, Some(&Value::from("lead")))
            .unwrap();
        host.set_text(p, "x").unwrap();
        host.insert(p, root, None).unwrap();

        assert_eq!(host.to_html(root), r#"<div id="app"><p class="lead">x</p></div>"#);
        assert_eq!(host.text_content(root), "x");
        assert_eq!(host.parent(p), Some(root));
    }

    #[test]
    fn insert_before_anchor() {
        let host = MemoryHost::new();
        let root = host.create_root("ul", "list");
        let a = host.create_text("a").unwrap();
        let c = host.create_text("c").unwrap();
        let b = host.create_text("b").unwrap();

        host.insert(a, root, None).unwrap();
        host.insert(c, root, None).unwrap();
        host.insert(b, root, Some(c)).unwrap();

        assert_eq!(host.children(root), vec![a, b, c]);
        assert_eq!(host.next_sibling(a).unwrap(), Some(b));
        assert_eq!(host.next_sibling(c).unwrap(), None);
    }

    #[test]
    fn insert_rejects_foreign_anchor() {
        let host = MemoryHost::new();
        let root = host.create_root("div", "app");
        let stray = host.create_element("span").unwrap();
        let node = host.create_element("p").unwrap();

        let err = host.insert(node, root, Some(stray)).unwrap_err();
        assert_eq!(err, HostError::NotAChild { anchor: stray, parent: root });
    }

    #[test]
    fn remove_detaches_node() {
        let host = MemoryHost::new();
        let root = host.create_root("div", "app");
        let p = host.create_element("p").unwrap();
        host.insert(p, root, None).unwrap();

        host.remove(p).unwrap();
        assert!(host.children(root).is_empty());
        assert_eq!(host.parent(p), None);
    }

    #[test]
    fn null_next_removes_prop() {
        let host = MemoryHost::new();
        let el = host.create_element("div").unwrap();
        host.patch_prop(el, "title", None, Some(&Value::from("t")))
            .unwrap();
        host.patch_prop(el, "title", Some(&Value::from("t")), None)
            .unwrap();

        assert_eq!(host.attribute(el, "title"), None);
    }

    #[test]
    fn query_selector_matches_id_and_tag() {
        let host = MemoryHost::new();
        let app = host.create_root("section", "app");

        assert_eq!(host.query_selector("#app"), Some(app));
        assert_eq!(host.query_selector("section"), Some(app));
        assert_eq!(host.query_selector("#missing"), None);
    }

    #[test]
    fn dispatch_invokes_handler() {
        let host = MemoryHost::new();
        let el = host.create_element("button").unwrap();
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = clicks.clone();
        let handler = Handler::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        host.patch_prop(el, "onClick", None, Some(&Value::from(handler)))
            .unwrap();

        assert!(host.dispatch(el, "click").unwrap());
        assert!(!host.dispatch(el, "keydown").unwrap());
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert_eq!(host.to_html(el), "<button></button>");
    }

    #[test]
    fn ops_are_recorded_in_order() {
        let host = MemoryHost::new();
        let root = host.create_root("div", "app");
        let el = host.create_element("p").unwrap();
        host.insert(el, root, None).unwrap();

        assert_eq!(
            host.take_ops(),
            vec![
                HostOp::CreateElement { node: el, tag: "p".to_string() },
                HostOp::Insert { node: el, parent: root, anchor: None },
            ]
        );
        assert!(host.ops().is_empty());
    }
}
