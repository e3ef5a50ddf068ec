//! Structural replacement of live trees.
//!
//! [`replace`] builds a new live element whose children are the source's
//! children, passed through a replacer as they arrive. Replacements are
//! kept in the source's order regardless of arrival order:
//!
//! ```text
//! source:   [ a (slow) , b , c ]      arrival: b, c, a
//! replaced: [ r(a)     , r(b), r(c) ]
//! ```
//!
//! A replacer returning [`LiveElement::as_node`] keeps a child as-is, so
//! untouched siblings are reused rather than evaluated again.

use crate::error::RenderError;
use crate::live::{LiveElement, Own, Status};
use crate::node::Node;
use futures_util::StreamExt;
use std::sync::Arc;

type Replacer = Arc<dyn Fn(&LiveElement) -> Node + Send + Sync>;

/// Returns a new evaluation of `source` with each child passed through
/// `replacer`.
///
/// Must be called inside a tokio runtime unless `source` is already
/// complete.
///
/// # Example
///
/// ```
/// use weft_render::{replace, Node, RenderContext};
///
/// let live = RenderContext::new().render(Node::fragment(vec!["a", "b"]));
/// let upper = replace(&live, |child| Node::from(child.to_string().to_uppercase()));
/// assert_eq!(upper.to_string(), "AB");
/// ```
pub fn replace<F>(source: &LiveElement, replacer: F) -> LiveElement
where
    F: Fn(&LiveElement) -> Node + Send + Sync + 'static,
{
    replace_with(source, Arc::new(replacer))
}

fn replace_with(source: &LiveElement, replacer: Replacer) -> LiveElement {
    let kind = source.kind().clone();
    let ctx = source.context().clone();

    if source.is_settled() {
        let out = LiveElement::new(kind, &ctx, false, None, Own::Done);
        let children = source
            .children()
            .iter()
            .map(|child| LiveElement::build_child(replacer(child), &ctx))
            .collect();
        out.set_children(children);
        out.refresh(out.id(), false);
        return out;
    }

    let out = LiveElement::new(kind, &ctx, false, None, Own::Running);
    let weak = out.downgrade();
    let source = source.clone();
    let task = async move {
        let mut arrivals = source.async_children();
        let mut placed: Vec<(usize, LiveElement)> = Vec::new();
        while let Some(child) = arrivals.next().await {
            let Some(out) = LiveElement::upgrade(&weak) else {
                return;
            };
            let index = source
                .children()
                .iter()
                .position(|c| c.id() == child.id())
                .unwrap_or(usize::MAX);
            let replacement = LiveElement::build_child(replacer(&child), out.context());
            let at = placed.partition_point(|(i, _)| *i <= index);
            placed.insert(at, (index, replacement));
            out.set_children(placed.iter().map(|(_, el)| el.clone()).collect());
            out.refresh(out.id(), true);
        }
        if let Some(out) = LiveElement::upgrade(&weak) {
            let own = match source.status() {
                Status::Aborted => Own::Aborted,
                _ => Own::Done,
            };
            if out.settle(own) {
                out.refresh(out.id(), false);
            }
        }
    };
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(task);
        }
        Err(_) => out.fail(RenderError::Internal(
            "replace of a pending element requires a tokio runtime".into(),
        )),
    }
    out
}

/// Replaces only `target`, located by its ancestor path from the root.
///
/// `ancestors` is the path yielded by [`traverse`](crate::traverse) for
/// `target`. Every element on the path is rebuilt; all siblings are
/// reused untouched. With an empty path the target is the root itself.
pub fn replace_subtree<F>(ancestors: &[LiveElement], target: &LiveElement, replacer: F) -> LiveElement
where
    F: Fn(&LiveElement) -> Node + Send + Sync + 'static,
{
    let replacer: Replacer = Arc::new(replacer);
    retarget(ancestors, target, &replacer)
}

fn retarget(ancestors: &[LiveElement], target: &LiveElement, replacer: &Replacer) -> LiveElement {
    let Some((root, rest)) = ancestors.split_first() else {
        return LiveElement::build(replacer(target), target.context(), false);
    };
    let next = rest.first().unwrap_or(target).id();
    let rest: Vec<LiveElement> = rest.to_vec();
    let target = target.clone();
    let replacer = Arc::clone(replacer);
    replace(root, move |child| {
        if child.id() == next {
            retarget(&rest, &target, &replacer).as_node()
        } else {
            child.as_node()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RenderContext;
    use crate::live::Scope;
    use crate::node::{create_element, intrinsic, Props};
    use crate::traverse::{traverse, TraverseOptions};

    #[test]
    fn complete_source_is_replaced_synchronously() {
        let live = RenderContext::new().render(Node::fragment(vec!["keep", "drop"]));
        let out = replace(&live, |child| {
            if child.to_string() == "drop" {
                Node::from("swapped")
            } else {
                child.as_node()
            }
        });
        assert_eq!(out.to_string(), "keepswapped");
        assert_eq!(out.children()[0], live.children()[0]);
        assert!(out.is_complete(Scope::Tree));
    }

    #[tokio::test]
    async fn subtree_replacement_reuses_siblings() {
        let para = create_element(intrinsic("p"), Props::new(), vec![Node::from("old")]);
        let doc = create_element(
            intrinsic("doc"),
            Props::new(),
            vec![Node::from("intro "), Node::from(para)],
        );
        let root = RenderContext::new().render(doc);

        let visits: Vec<_> = traverse(&root, TraverseOptions::new().yield_pre(|el| el.to_string() == "old"))
            .collect()
            .await;
        let (target, path) = visits
            .into_iter()
            .find(|(el, _)| el.tag().is_none())
            .unwrap();

        let out = replace_subtree(&path, &target, |_| Node::from("new"));
        assert_eq!(out.text().await.unwrap(), "intro new");
        assert_eq!(out.children()[0], root.children()[0]);
        assert_eq!(out.tag(), Some("doc"));
        assert_eq!(root.to_string(), "intro old");
    }
}
