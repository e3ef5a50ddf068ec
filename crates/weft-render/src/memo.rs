//! Memoized nodes.
//!
//! [`memo`] wraps a node so its evaluation runs exactly once, no matter
//! how many times or under how many contexts the returned node is
//! rendered:
//!
//! ```text
//! let shared = memo(<Completion/>);
//!
//! ctx_a.render(shared.clone()) ──► Memo ──┐
//!                                         ├──► one LiveElement (Completion)
//! ctx_b.render(shared.clone()) ──► Memo ──┘         evaluated under ctx_a
//! ```
//!
//! The context of the first render is captured; later renders splice the
//! same evaluation. Subscribers that arrive late see the current snapshot
//! first, then live frames.
//!
//! Identity is per `memo` call. Two calls on structurally equal nodes are
//! independent evaluations; clones of one returned node share one.

use crate::component::{Component, Renderable};
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::live::LiveElement;
use crate::node::{Element, Node, Props, Tag};
use std::sync::{Arc, OnceLock};

/// Shared evaluation slot of one memoized node.
struct MemoRecord {
    node: Node,
    live: OnceLock<LiveElement>,
}

struct Memo {
    record: Arc<MemoRecord>,
}

impl Component for Memo {
    fn name(&self) -> &str {
        "Memo"
    }

    fn render(&self, _props: &Props, ctx: &RenderContext) -> Result<Renderable, RenderError> {
        let live = self.record.live.get_or_init(|| {
            tracing::debug!(render_id = ?ctx.render_id(), "evaluating memoized node");
            LiveElement::build(self.record.node.clone(), ctx, false)
        });
        Ok(Renderable::Evaluator(live.clone()))
    }
}

/// Wraps `node` so that every render of the result shares one evaluation.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use weft_render::{component, create_element, memo, Node, Props, RenderContext, Renderable};
///
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&calls);
/// let expensive = component("Expensive", move |_, _| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(Renderable::from("result"))
/// });
/// let shared = memo(create_element(expensive, Props::new(), vec![]));
///
/// let a = RenderContext::new().render(shared.clone());
/// let b = RenderContext::new().render(Node::fragment(vec![shared.clone(), shared]));
/// assert_eq!(a.to_string(), "result");
/// assert_eq!(b.to_string(), "resultresult");
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
#[must_use]
pub fn memo(node: impl Into<Node>) -> Node {
    let record = Arc::new(MemoRecord {
        node: node.into(),
        live: OnceLock::new(),
    });
    Node::Element(Element::new(
        Tag::Component(Arc::new(Memo { record })),
        Props::new(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{component, create_element, intrinsic};
    use crate::ContextKey;

    #[test]
    fn first_context_is_captured() {
        let key = ContextKey::new("who", "default".to_string());
        let reader_key = key.clone();
        let reader = component("Reader", move |_, ctx| {
            Ok(Renderable::from(ctx.get_context(&reader_key)))
        });
        let shared = memo(create_element(reader, Props::new(), vec![]));

        let first = RenderContext::new().set_context(&key, "first".to_string());
        let second = RenderContext::new().set_context(&key, "second".to_string());
        assert_eq!(first.render(shared.clone()).to_string(), "first");
        assert_eq!(second.render(shared).to_string(), "first");
    }

    #[test]
    fn separate_memo_calls_are_independent() {
        let el = create_element(intrinsic("x"), Props::new(), vec![Node::from("v")]);
        let a = memo(el.clone());
        let b = memo(el);
        let ctx = RenderContext::new();
        let live_a = ctx.render(a);
        let live_b = ctx.render(b);
        assert_ne!(live_a.children()[0], live_b.children()[0]);
    }

    #[test]
    fn clones_share_the_evaluation() {
        let shared = memo(Node::from("v"));
        let ctx = RenderContext::new();
        let a = ctx.render(shared.clone());
        let b = ctx.render(shared);
        assert_eq!(a.children()[0], b.children()[0]);
    }
}
