//! Reconciler
//!
//! The [`Renderer`] turns virtual trees into host-tree mutations. Given the
//! previous tree (or none) and a new one, [`Renderer::patch`] applies the
//! smallest set of host operations it can find without keys.
//!
//! # Algorithm
//!
//! `patch` dispatches on the new node's kind:
//!
//! - **Fragment**: only the children reach the host.
//! - **Text**: create a text node on mount; on update reuse it and rewrite
//!   the content only when it changed.
//! - **Element**: on mount create the element, apply every prop, mount the
//!   children and insert it. On update reuse the element, diff props, then
//!   diff children.
//! - **Component**: mount creates an instance and a render effect. After
//!   that the component updates itself whenever the state its render read
//!   changes; a parent re-render does not re-render it.
//!
//! Nodes of different types are never patched into one another: the new
//! node is mounted in place of the old one, which is then unmounted.
//!
//! # Children
//!
//! Children are diffed without keys: text is compared as a string; node
//! sequences are patched pairwise over their common length, surplus old
//! nodes are unmounted and extra new nodes mounted at the end. A child that
//! mounts new host nodes places them before the first host node of the
//! next old sibling, so an empty fragment that gains children keeps its
//! position.
//!
//! # Component props
//!
//! By default a mounted child keeps the props it was created with. With
//! [`RendererConfig::propagate_props`] set, a parent re-render that passes
//! different props writes them into the child instance and re-runs its
//! render effect.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::app::App;
use crate::component::{Component, ComponentInstance};
use crate::config::RendererConfig;
use crate::error::{Error, Result};
use crate::host::{HostAdapter, HostNode};
use crate::reactive::ReactiveEffect;
use crate::value::Props;
use crate::vnode::{Children, InstanceRef, NodeKind, VNode};

/// Mounts and patches virtual trees through a host adapter.
#[derive(Clone)]
pub struct Renderer {
    host: Arc<dyn HostAdapter>,
    config: RendererConfig,
}

impl Renderer {
    /// Create a renderer with the default configuration.
    pub fn new(host: Arc<dyn HostAdapter>) -> Self {
        Self::with_config(host, RendererConfig::default())
    }

    pub fn with_config(host: Arc<dyn HostAdapter>, config: RendererConfig) -> Self {
        Self { host, config }
    }

    pub fn host(&self) -> &Arc<dyn HostAdapter> {
        &self.host
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Create an application rooted at `root`.
    pub fn create_app(&self, root: Component) -> App {
        App::new(self.clone(), root)
    }

    /// Mount `vnode` into `container` with no previous tree.
    pub fn render(&self, vnode: &mut VNode, container: HostNode) -> Result<()> {
        self.patch(None, vnode, container, None, None)
    }

    /// Reconcile `old` into `new`.
    ///
    /// `new` receives the host nodes of `old` wherever they are reused.
    /// Fresh nodes are inserted into `container` before `anchor`, or at the
    /// end when `anchor` is `None`.
    pub fn patch(
        &self,
        old: Option<&VNode>,
        new: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&InstanceRef>,
    ) -> Result<()> {
        if let Some(prev) = old {
            if !prev.ty().is_same_type(new.ty()) {
                let anchor = first_host_node(prev).or(anchor);
                self.patch(None, new, container, anchor, parent)?;
                return self.unmount_node(prev, true);
            }
        }

        match new.shape().node {
            NodeKind::Fragment => self.process_fragment(old, new, container, anchor, parent),
            NodeKind::Text => self.process_text(old, new, container, anchor),
            NodeKind::Element => self.process_element(old, new, container, anchor, parent),
            NodeKind::StatefulComponent => {
                self.process_component(old, new, container, anchor, parent)
            }
        }
    }

    /// Remove a mounted tree from the host and stop its render effects.
    pub fn unmount(&self, vnode: &VNode) -> Result<()> {
        self.unmount_node(vnode, true)
    }

    fn process_fragment(
        &self,
        old: Option<&VNode>,
        new: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&InstanceRef>,
    ) -> Result<()> {
        // `anchor` is the host node that follows the fragment, so new
        // trailing children land before it even when the fragment was empty.
        match old {
            None => self.mount_children(new.children_mut(), container, anchor, parent),
            Some(prev) => {
                self.patch_children(prev.children(), new.children_mut(), container, anchor, parent)
            }
        }
    }

    fn process_text(
        &self,
        old: Option<&VNode>,
        new: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<()> {
        let content = new.children().as_text().unwrap_or_default();

        let el = match old {
            None => {
                let el = self.host.create_text(content)?;
                trace!(%el, "create text");
                self.host.insert(el, container, anchor)?;
                el
            }
            Some(prev) => {
                let el = prev.el.ok_or(Error::NotMounted)?;
                if prev.children().as_text().unwrap_or_default() != content {
                    trace!(%el, "set text");
                    self.host.set_text(el, content)?;
                }
                el
            }
        };

        new.el = Some(el);
        Ok(())
    }

    fn process_element(
        &self,
        old: Option<&VNode>,
        new: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&InstanceRef>,
    ) -> Result<()> {
        match old {
            None => self.mount_element(new, container, anchor, parent),
            Some(prev) => self.patch_element(prev, new, parent),
        }
    }

    fn mount_element(
        &self,
        vnode: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&InstanceRef>,
    ) -> Result<()> {
        let tag = vnode.tag().unwrap_or_default();
        let el = self.host.create_element(tag)?;
        trace!(%el, tag, "create element");
        vnode.el = Some(el);

        for (key, value) in vnode.props().iter() {
            self.host.patch_prop(el, key, None, Some(value))?;
        }

        match vnode.children_mut() {
            Children::Text(content) => self.host.set_text(el, content)?,
            Children::Nodes(nodes) => self.mount_children_slice(nodes, el, None, parent)?,
            Children::Empty | Children::Slots(_) => {}
        }

        self.host.insert(el, container, anchor)?;
        Ok(())
    }

    fn patch_element(
        &self,
        prev: &VNode,
        new: &mut VNode,
        parent: Option<&InstanceRef>,
    ) -> Result<()> {
        let el = prev.el.ok_or(Error::NotMounted)?;
        new.el = Some(el);

        self.patch_props(el, prev.props(), new.props())?;
        self.patch_children(prev.children(), new.children_mut(), el, None, parent)
    }

    /// Changed and added props first, then removals.
    fn patch_props(&self, el: HostNode, old: &Props, new: &Props) -> Result<()> {
        for (key, next) in new.iter() {
            let prev = old.get(key);
            if self.config.skip_equal_props && prev == Some(next) {
                continue;
            }
            trace!(%el, key, "patch prop");
            self.host.patch_prop(el, key, prev, Some(next))?;
        }

        for (key, prev) in old.iter() {
            if !new.contains_key(key) {
                trace!(%el, key, "remove prop");
                self.host.patch_prop(el, key, Some(prev), None)?;
            }
        }

        Ok(())
    }

    fn patch_children(
        &self,
        old: &Children,
        new: &mut Children,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&InstanceRef>,
    ) -> Result<()> {
        match (old, new) {
            (Children::Text(prev), Children::Text(next)) => {
                if prev != next {
                    trace!(%container, "set text");
                    self.host.set_text(container, next)?;
                }
            }
            (Children::Nodes(prev), Children::Nodes(next)) => {
                self.patch_unkeyed(prev, next, container, anchor, parent)?;
            }
            (Children::Nodes(prev), next) => {
                for child in prev {
                    self.unmount_node(child, true)?;
                }
                if let Children::Text(text) = next {
                    self.host.set_text(container, text)?;
                }
            }
            (Children::Text(_), Children::Nodes(next)) => {
                self.host.set_text(container, "")?;
                self.mount_children_slice(next, container, anchor, parent)?;
            }
            (Children::Text(_), _) => self.host.set_text(container, "")?,
            (_, Children::Text(next)) => self.host.set_text(container, next)?,
            (_, Children::Nodes(next)) => {
                self.mount_children_slice(next, container, anchor, parent)?;
            }
            _ => {}
        }

        Ok(())
    }

    fn patch_unkeyed(
        &self,
        prev: &[VNode],
        next: &mut [VNode],
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&InstanceRef>,
    ) -> Result<()> {
        let common = prev.len().min(next.len());

        // Each child is anchored on the first host node of a later old
        // sibling, falling back to the caller's anchor.
        let mut anchors = vec![anchor; prev.len()];
        for i in (0..prev.len().saturating_sub(1)).rev() {
            anchors[i] = first_host_node(&prev[i + 1]).or(anchors[i + 1]);
        }

        for ((old_child, new_child), child_anchor) in prev.iter().zip(next.iter_mut()).zip(anchors) {
            self.patch(Some(old_child), new_child, container, child_anchor, parent)?;
        }

        if prev.len() > common {
            for child in &prev[common..] {
                self.unmount_node(child, true)?;
            }
        } else {
            self.mount_children_slice(&mut next[common..], container, anchor, parent)?;
        }

        Ok(())
    }

    fn mount_children(
        &self,
        children: &mut Children,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&InstanceRef>,
    ) -> Result<()> {
        match children {
            Children::Nodes(nodes) => self.mount_children_slice(nodes, container, anchor, parent),
            _ => Ok(()),
        }
    }

    fn mount_children_slice(
        &self,
        nodes: &mut [VNode],
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&InstanceRef>,
    ) -> Result<()> {
        for child in nodes {
            self.patch(None, child, container, anchor, parent)?;
        }
        Ok(())
    }

    fn process_component(
        &self,
        old: Option<&VNode>,
        new: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&InstanceRef>,
    ) -> Result<()> {
        match old {
            None => self.mount_component(new, container, anchor, parent),
            Some(prev) => self.adopt_component(prev, new),
        }
    }

    fn mount_component(
        &self,
        vnode: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&InstanceRef>,
    ) -> Result<()> {
        let Some(component) = vnode.component_def().cloned() else {
            return Ok(());
        };

        let mut instance = ComponentInstance::new(vnode, &component, parent);
        debug!(
            component = component.name(),
            instance = instance.id().raw(),
            "setup"
        );
        instance.setup()?;

        let instance = Arc::new(Mutex::new(instance));
        self.setup_render_effect(&instance, container, anchor)?;

        vnode.el = instance.lock().vnode.el;
        vnode.component = Some(instance);
        Ok(())
    }

    /// Carry a mounted instance over to the new node of the same component.
    fn adopt_component(&self, prev: &VNode, new: &mut VNode) -> Result<()> {
        let instance = prev.component.clone().ok_or(Error::NotMounted)?;
        new.el = prev.el;
        new.component = Some(instance.clone());

        if !self.config.propagate_props {
            return Ok(());
        }

        let effect = {
            let mut inst = instance.lock();
            if inst.props == *new.props() {
                return Ok(());
            }
            inst.props = new.props().clone();
            if let Children::Slots(slots) = new.children() {
                inst.slots = slots.clone();
            }
            debug!(component = inst.name(), "props changed");
            inst.effect.clone()
        };

        if let Some(effect) = effect {
            effect.run()?;
        }
        new.el = instance.lock().vnode.el;
        Ok(())
    }

    fn setup_render_effect(
        &self,
        instance: &InstanceRef,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<()> {
        let renderer = self.clone();
        let weak = Arc::downgrade(instance);

        let effect = ReactiveEffect::new_lazy(move || match weak.upgrade() {
            Some(instance) => renderer.render_component(&instance, container, anchor),
            None => Ok(()),
        });

        instance.lock().effect = Some(effect.clone());
        effect.run()
    }

    /// Body of a component's render effect.
    fn render_component(
        &self,
        instance: &InstanceRef,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<()> {
        let (proxy, render, mounted) = {
            let inst = instance.lock();
            (inst.proxy(), inst.render_fn(), inst.is_mounted)
        };

        let mut next = render(&proxy)?;

        if !mounted {
            debug!(component = proxy.name(), "mount");
            self.patch(None, &mut next, container, anchor, Some(instance))?;

            let mut inst = instance.lock();
            inst.vnode.el = next.el;
            inst.subtree = Some(next);
            inst.is_mounted = true;
        } else {
            debug!(component = proxy.name(), "update");
            let prev = instance.lock().subtree.take();

            // Mounts go after the current subtree; an empty subtree falls
            // back to the mount-time anchor.
            let end = match prev.as_ref().and_then(last_host_node) {
                Some(last) => self.host.next_sibling(last).map_err(Error::from),
                None => Ok(anchor),
            };
            let result = end.and_then(|end| {
                self.patch(prev.as_ref(), &mut next, container, end, Some(instance))
            });

            if let Err(err) = result {
                instance.lock().subtree = prev;
                return Err(err);
            }

            let mut inst = instance.lock();
            inst.vnode.el = next.el;
            inst.subtree = Some(next);
        }

        Ok(())
    }

    fn unmount_node(&self, vnode: &VNode, remove: bool) -> Result<()> {
        match vnode.shape().node {
            NodeKind::StatefulComponent => {
                let Some(instance) = vnode.component() else {
                    return Ok(());
                };
                let (effect, subtree) = {
                    let mut inst = instance.lock();
                    debug!(component = inst.name(), "unmount");
                    inst.is_mounted = false;
                    (inst.effect.take(), inst.subtree.take())
                };

                if let Some(effect) = effect {
                    effect.dispose();
                }
                if let Some(subtree) = subtree {
                    self.unmount_node(&subtree, remove)?;
                }
            }
            NodeKind::Fragment => {
                for child in vnode.children().as_nodes() {
                    self.unmount_node(child, remove)?;
                }
            }
            NodeKind::Element => {
                // Only the element itself leaves the host; descendants go
                // with it but their components still need stopping.
                for child in vnode.children().as_nodes() {
                    self.unmount_node(child, false)?;
                }
                if let (true, Some(el)) = (remove, vnode.el) {
                    trace!(%el, "remove");
                    self.host.remove(el)?;
                }
            }
            NodeKind::Text => {
                if let (true, Some(el)) = (remove, vnode.el) {
                    trace!(%el, "remove");
                    self.host.remove(el)?;
                }
            }
        }

        Ok(())
    }
}

/// The first host node a mounted tree occupies.
fn first_host_node(vnode: &VNode) -> Option<HostNode> {
    match vnode.shape().node {
        NodeKind::Element | NodeKind::Text => vnode.el,
        NodeKind::Fragment => vnode.children().as_nodes().iter().find_map(first_host_node),
        NodeKind::StatefulComponent => vnode
            .component()
            .and_then(|instance| instance.lock().subtree().and_then(first_host_node)),
    }
}

/// The last host node a mounted tree occupies.
fn last_host_node(vnode: &VNode) -> Option<HostNode> {
    match vnode.shape().node {
        NodeKind::Element | NodeKind::Text => vnode.el,
        NodeKind::Fragment => vnode.children().as_nodes().iter().rev().find_map(last_host_node),
        NodeKind::StatefulComponent => vnode
            .component()
            .and_then(|instance| instance.lock().subtree().and_then(last_host_node)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostOp, MemoryHost};
    use crate::props;
    use crate::reactive::{ReactiveObject, State};
    use crate::value::Value;
    use crate::vnode::{fragment, h, text};

    fn setup(config: RendererConfig) -> (Arc<MemoryHost>, Renderer, HostNode) {
        let host = Arc::new(MemoryHost::new());
        let root = host.create_root("div", "app");
        let renderer = Renderer::with_config(host.clone(), config);
        (host, renderer, root)
    }

    fn prop_ops(ops: &[HostOp]) -> Vec<(String, Option<Value>, Option<Value>)> {
        ops.iter()
            .filter_map(|op| match op {
                HostOp::PatchProp { key, prev, next, .. } => {
                    Some((key.clone(), prev.clone(), next.clone()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn mounts_nested_elements() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let mut vnode = h("div", props! {}, vec![h("p", props! {}, "x")]);

        renderer.render(&mut vnode, root).unwrap();

        assert_eq!(host.inner_html(root), "<div><p>x</p></div>");
        let el = vnode.el().unwrap();
        assert_eq!(host.parent(el), Some(root));
        assert_eq!(vnode.children().as_nodes()[0].el().map(|p| host.parent(p)), Some(Some(el)));
    }

    #[test]
    fn mount_applies_every_prop() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let mut vnode = h("a", props! { "href" => "/", "title" => "home" }, "go");

        renderer.render(&mut vnode, root).unwrap();

        assert_eq!(prop_ops(&host.ops()).len(), 2);
        assert_eq!(host.inner_html(root), r#"<a href="/" title="home">go</a>"#);
    }

    #[test]
    fn prop_diff_is_minimal() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let mut old = h("div", props! { "a" => 1, "b" => 2 }, ());
        renderer.render(&mut old, root).unwrap();
        host.take_ops();

        let mut new = h("div", props! { "a" => 1, "c" => 3 }, ());
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        assert_eq!(
            prop_ops(&host.take_ops()),
            vec![
                ("c".to_string(), None, Some(Value::from(3))),
                ("b".to_string(), Some(Value::from(2)), None),
            ]
        );
        assert_eq!(new.el(), old.el());
    }

    #[test]
    fn identical_rerender_issues_no_ops() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let tree = || h("ul", props! { "class" => "list" }, vec![
            h("li", props! {}, "one"),
            h("li", props! {}, "two"),
        ]);
        let mut old = tree();
        renderer.render(&mut old, root).unwrap();
        host.take_ops();

        let mut new = tree();
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        assert!(host.take_ops().is_empty());
    }

    #[test]
    fn equal_props_are_repatched_when_skipping_is_off() {
        let config = RendererConfig {
            skip_equal_props: false,
            ..RendererConfig::default()
        };
        let (host, renderer, root) = setup(config);
        let mut old = h("div", props! { "a" => 1 }, ());
        renderer.render(&mut old, root).unwrap();
        host.take_ops();

        let mut new = h("div", props! { "a" => 1 }, ());
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        assert_eq!(prop_ops(&host.take_ops()).len(), 1);
    }

    #[test]
    fn text_children_update_in_place() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let mut old = h("p", props! {}, "before");
        renderer.render(&mut old, root).unwrap();
        host.take_ops();

        let mut new = h("p", props! {}, "after");
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        let el = old.el().unwrap();
        assert_eq!(
            host.take_ops(),
            vec![HostOp::SetText { node: el, text: "after".to_string() }]
        );
    }

    #[test]
    fn text_node_reused_across_updates() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let mut old = h("p", props! {}, vec![text("a")]);
        renderer.render(&mut old, root).unwrap();
        host.take_ops();

        let mut new = h("p", props! {}, vec![text("b")]);
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        let node = new.children().as_nodes()[0].el().unwrap();
        assert_eq!(old.children().as_nodes()[0].el(), Some(node));
        assert_eq!(
            host.take_ops(),
            vec![HostOp::SetText { node, text: "b".to_string() }]
        );
    }

    #[test]
    fn children_switch_between_text_and_nodes() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let mut first = h("div", props! {}, "plain");
        renderer.render(&mut first, root).unwrap();

        let mut second = h("div", props! {}, vec![h("b", props! {}, "bold")]);
        renderer.patch(Some(&first), &mut second, root, None, None).unwrap();
        assert_eq!(host.inner_html(root), "<div><b>bold</b></div>");

        let mut third = h("div", props! {}, "plain again");
        renderer.patch(Some(&second), &mut third, root, None, None).unwrap();
        assert_eq!(host.inner_html(root), "<div>plain again</div>");

        let mut fourth = h("div", props! {}, ());
        renderer.patch(Some(&third), &mut fourth, root, None, None).unwrap();
        assert_eq!(host.inner_html(root), "<div></div>");
    }

    #[test]
    fn unkeyed_children_shrink_and_grow() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let list = |items: &[&str]| {
            h(
                "ul",
                props! {},
                items.iter().map(|item| h("li", props! {}, *item)).collect::<Vec<_>>(),
            )
        };

        let mut old = list(&["a", "b", "c"]);
        renderer.render(&mut old, root).unwrap();

        let mut shorter = list(&["a", "x"]);
        renderer.patch(Some(&old), &mut shorter, root, None, None).unwrap();
        assert_eq!(host.inner_html(root), "<ul><li>a</li><li>x</li></ul>");

        let mut longer = list(&["a", "x", "y", "z"]);
        renderer.patch(Some(&shorter), &mut longer, root, None, None).unwrap();
        assert_eq!(
            host.inner_html(root),
            "<ul><li>a</li><li>x</li><li>y</li><li>z</li></ul>"
        );
    }

    #[test]
    fn type_change_replaces_in_place() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let mut old = h("div", props! {}, vec![h("p", props! {}, ()), h("i", props! {}, ())]);
        renderer.render(&mut old, root).unwrap();
        host.take_ops();

        let mut new = h("div", props! {}, vec![h("span", props! {}, ()), h("i", props! {}, ())]);
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        let div = old.el().unwrap();
        let p = old.children().as_nodes()[0].el().unwrap();
        let span = new.children().as_nodes()[0].el().unwrap();
        assert_eq!(
            host.take_ops(),
            vec![
                HostOp::CreateElement { node: span, tag: "span".to_string() },
                HostOp::Insert { node: span, parent: div, anchor: Some(p) },
                HostOp::Remove { node: p },
            ]
        );
        assert_eq!(host.inner_html(root), "<div><span></span><i></i></div>");
    }

    #[test]
    fn fragment_children_land_in_the_container() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let mut vnode = fragment(vec![h("p", props! {}, "a"), text("b")]);

        renderer.render(&mut vnode, root).unwrap();

        assert_eq!(vnode.el(), None);
        assert_eq!(host.inner_html(root), "<p>a</p>b");
    }

    #[test]
    fn growing_fragment_keeps_sibling_order() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let tree = |items: Vec<VNode>| {
            h("div", props! {}, vec![fragment(items), h("i", props! {}, "end")])
        };

        let mut old = tree(vec![text("a")]);
        renderer.render(&mut old, root).unwrap();

        let mut new = tree(vec![text("a"), text("b")]);
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        assert_eq!(host.inner_html(root), "<div>ab<i>end</i></div>");
    }

    #[test]
    fn empty_fragment_gains_children_before_its_sibling() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let tree = |items: Vec<VNode>| {
            h("div", props! {}, vec![fragment(items), h("i", props! {}, "end")])
        };

        let mut old = tree(vec![]);
        renderer.render(&mut old, root).unwrap();
        host.take_ops();

        let mut new = tree(vec![text("a")]);
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        let div = old.el().unwrap();
        let end = old.children().as_nodes()[1].el();
        let a = new.children().as_nodes()[0].children().as_nodes()[0].el().unwrap();
        assert_eq!(
            host.take_ops(),
            vec![
                HostOp::CreateText { node: a, text: "a".to_string() },
                HostOp::Insert { node: a, parent: div, anchor: end },
            ]
        );
        assert_eq!(host.inner_html(root), "<div>a<i>end</i></div>");
    }

    #[test]
    fn nested_empty_fragments_keep_their_position() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let tree = |items: Vec<VNode>| {
            h(
                "div",
                props! {},
                vec![
                    h("h1", props! {}, "top"),
                    fragment(vec![fragment(items)]),
                    h("i", props! {}, "end"),
                ],
            )
        };

        let mut old = tree(vec![]);
        renderer.render(&mut old, root).unwrap();
        let mut new = tree(vec![text("a"), text("b")]);
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        assert_eq!(host.inner_html(root), "<div><h1>top</h1>ab<i>end</i></div>");
    }

    #[test]
    fn empty_fragment_replaced_by_element_in_place() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let mut old = h("div", props! {}, vec![fragment(vec![]), h("i", props! {}, "end")]);
        renderer.render(&mut old, root).unwrap();

        let mut new = h("div", props! {}, vec![h("b", props! {}, "x"), h("i", props! {}, "end")]);
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        assert_eq!(host.inner_html(root), "<div><b>x</b><i>end</i></div>");
    }

    fn label_component() -> Component {
        Component::new("Label", |this| Ok(h("span", props! {}, this.text("label"))))
    }

    #[test]
    fn rerendered_component_adopts_its_instance() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let label = label_component();

        let mut old = h(&label, props! { "label" => "a" }, ());
        renderer.render(&mut old, root).unwrap();
        let mut new = h(&label, props! { "label" => "b" }, ());
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        let (before, after) = (old.component().unwrap(), new.component().unwrap());
        assert!(Arc::ptr_eq(before, after));
        assert_eq!(new.el(), old.el());
        assert_eq!(host.inner_html(root), "<span>a</span>");
    }

    #[test]
    fn propagated_props_rerender_the_child() {
        let config = RendererConfig {
            propagate_props: true,
            ..RendererConfig::default()
        };
        let (host, renderer, root) = setup(config);
        let label = label_component();

        let mut old = h(&label, props! { "label" => "a" }, ());
        renderer.render(&mut old, root).unwrap();
        let mut new = h(&label, props! { "label" => "b" }, ());
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        assert_eq!(host.inner_html(root), "<span>b</span>");
        let instance = new.component().unwrap().lock();
        assert_eq!(instance.props().get("label"), Some(&Value::from("b")));
    }

    #[test]
    fn different_components_replace_each_other() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let first = label_component();
        let second = Component::new("Other", |_| Ok(h("em", props! {}, "other")));

        let mut old = h(&first, props! { "label" => "a" }, ());
        renderer.render(&mut old, root).unwrap();
        let effect = old.component().unwrap().lock().effect().cloned().unwrap();

        let mut new = h(&second, props! {}, ());
        renderer.patch(Some(&old), &mut new, root, None, None).unwrap();

        assert!(effect.is_disposed());
        assert_eq!(host.inner_html(root), "<em>other</em>");
    }

    #[test]
    fn component_rerenders_on_state_write() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let state = ReactiveObject::new().with("count", 0);
        let shared = state.clone();
        let counter = Component::new("Counter", |this| Ok(h("div", props! {}, this.text("count"))))
            .with_setup(move |_, _| Ok(State::from(shared.clone())));

        let mut vnode = h(&counter, props! {}, ());
        renderer.render(&mut vnode, root).unwrap();
        host.take_ops();

        state.set("count", 1).unwrap();

        let el = vnode.el().unwrap();
        assert_eq!(
            host.take_ops(),
            vec![HostOp::SetText { node: el, text: "1".to_string() }]
        );
        assert_eq!(host.inner_html(root), "<div>1</div>");
    }

    #[test]
    fn unmount_removes_nodes_and_disposes_effects() {
        let (host, renderer, root) = setup(RendererConfig::default());
        let label = label_component();
        let mut vnode = h("section", props! {}, vec![h(&label, props! { "label" => "x" }, ())]);
        renderer.render(&mut vnode, root).unwrap();

        let instance = vnode.children().as_nodes()[0].component().cloned().unwrap();
        let effect = instance.lock().effect().cloned().unwrap();

        renderer.unmount(&vnode).unwrap();

        assert!(effect.is_disposed());
        assert!(!instance.lock().is_mounted());
        assert_eq!(host.inner_html(root), "");
    }

    #[test]
    fn patching_an_unmounted_element_fails() {
        let (_host, renderer, root) = setup(RendererConfig::default());
        let old = h("div", props! {}, ());
        let mut new = h("div", props! {}, ());

        let err = renderer.patch(Some(&old), &mut new, root, None, None).unwrap_err();
        assert!(matches!(err, Error::NotMounted));
    }
}
