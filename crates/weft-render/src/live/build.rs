//! Construction of live elements from nodes.

use super::{Guard, LiveElement, LiveKind, Own};
use crate::component::Component;
use crate::context::RenderContext;
use crate::node::{Element, Node, Tag};
use std::sync::Arc;

impl LiveElement {
    /// Evaluates `node` under `ctx`.
    ///
    /// `root` marks the element that reports unrecovered failures.
    pub(crate) fn build(node: Node, ctx: &RenderContext, root: bool) -> Self {
        match node {
            Node::Literal(lit) => Self::leaf(LiveKind::Text(lit.to_text()), ctx, root),
            Node::Fragment(nodes) => Self::container(LiveKind::Fragment, nodes, ctx, root),
            Node::Element(el) => Self::build_element(&el, ctx, root),
        }
    }

    /// Evaluates a non-root node, honoring the partial-render predicate.
    pub(crate) fn build_child(node: Node, ctx: &RenderContext) -> Self {
        if let Node::Element(el) = &node {
            if el.spliced().is_none() && ctx.should_stop(el) {
                return Self::leaf(LiveKind::Stopped(el.clone()), ctx, false);
            }
        }
        Self::build(node, ctx, false)
    }

    fn build_element(el: &Element, ctx: &RenderContext, root: bool) -> Self {
        if let Some(live) = el.spliced() {
            return live.clone();
        }
        match el.tag() {
            Tag::Intrinsic(tag) => Self::container(
                LiveKind::Intrinsic {
                    tag: Arc::clone(tag),
                    props: el.props().clone(),
                },
                el.props().children().to_vec(),
                ctx,
                root,
            ),
            Tag::Component(c) => Self::invoke_component(el, Arc::clone(c), ctx, root),
        }
    }

    fn leaf(kind: LiveKind, ctx: &RenderContext, root: bool) -> Self {
        let live = Self::new(kind, ctx, root, None, Own::Done);
        live.refresh(live.id(), false);
        live
    }

    fn container(kind: LiveKind, nodes: Vec<Node>, ctx: &RenderContext, root: bool) -> Self {
        let mut flat = Vec::with_capacity(nodes.len());
        for node in nodes {
            node.flatten_into(&mut flat);
        }
        let children = flat
            .into_iter()
            .map(|node| Self::build_child(node, ctx))
            .collect();
        let live = Self::new(kind, ctx, root, None, Own::Done);
        live.set_children(children);
        live.refresh(live.id(), false);
        live
    }

    fn invoke_component(
        el: &Element,
        component: Arc<dyn Component>,
        ctx: &RenderContext,
        root: bool,
    ) -> Self {
        let props = el.props().clone();
        let name: Arc<str> = Arc::from(component.name());
        let guard = Guard {
            component: Arc::clone(&component),
            props: props.clone(),
        };
        let live = Self::new(
            LiveKind::Component {
                name: Arc::clone(&name),
                props: props.clone(),
            },
            ctx,
            root,
            Some(guard),
            Own::Running,
        );
        tracing::trace!(component = %name, live_id = %live.id(), "invoking component");
        match component.render(&props, ctx) {
            Ok(renderable) => live.accept(renderable),
            Err(err) => live.fail(err),
        }
        live
    }
}
