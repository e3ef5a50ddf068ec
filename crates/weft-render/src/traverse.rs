//! Lazy traversal of a live tree.
//!
//! [`traverse`] walks a live element depth-first, visiting children in
//! arrival order as they settle. It yields each visited element with its
//! ancestor path (root first), which is exactly the input
//! [`replace_subtree`](crate::replace_subtree) expects.
//!
//! ```text
//! root                yield_pre(root)       -> (root, [])
//! ├── a               yield_pre(a)          -> (a, [root])
//! │   └── a1          yield_pre(a1)         -> (a1, [root, a])
//! │                   yield_post(a)         -> (a, [root])      if enabled
//! └── b  (pending)    ... waits for b to settle
//! ```

use crate::live::{ChildStream, LiveElement};
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&LiveElement) -> bool + Send + Sync>;

/// A visited element and its ancestors, root first.
pub type Visit = (LiveElement, Vec<LiveElement>);

/// Traversal filters.
#[derive(Clone)]
pub struct TraverseOptions {
    yield_pre: Predicate,
    yield_post: Option<Predicate>,
    descend: Predicate,
}

impl Default for TraverseOptions {
    fn default() -> Self {
        Self {
            yield_pre: Arc::new(|_| true),
            yield_post: None,
            descend: Arc::new(|_| true),
        }
    }
}

impl TraverseOptions {
    /// Visits every element pre-order and descends everywhere.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Yields an element before its children when `f` holds.
    #[must_use]
    pub fn yield_pre<F>(mut self, f: F) -> Self
    where
        F: Fn(&LiveElement) -> bool + Send + Sync + 'static,
    {
        self.yield_pre = Arc::new(f);
        self
    }

    /// Yields an element after its children when `f` holds.
    #[must_use]
    pub fn yield_post<F>(mut self, f: F) -> Self
    where
        F: Fn(&LiveElement) -> bool + Send + Sync + 'static,
    {
        self.yield_post = Some(Arc::new(f));
        self
    }

    /// Descends into an element's children only when `f` holds.
    #[must_use]
    pub fn descend<F>(mut self, f: F) -> Self
    where
        F: Fn(&LiveElement) -> bool + Send + Sync + 'static,
    {
        self.descend = Arc::new(f);
        self
    }
}

struct Frame {
    element: LiveElement,
    path: Vec<LiveElement>,
    entered: bool,
    children: Option<ChildStream>,
}

impl Frame {
    fn new(element: LiveElement, path: Vec<LiveElement>) -> Self {
        Self {
            element,
            path,
            entered: false,
            children: None,
        }
    }
}

struct Walk {
    options: TraverseOptions,
    stack: Vec<Frame>,
}

impl Walk {
    /// Pops the finished top frame, returning its post-order visit if wanted.
    fn leave(&mut self) -> Option<Visit> {
        let frame = self.stack.pop()?;
        match &self.options.yield_post {
            Some(post) if post(&frame.element) => Some((frame.element, frame.path)),
            _ => None,
        }
    }
}

/// Walks `root` lazily. Each call starts a fresh walk from the root.
///
/// # Example
///
/// ```
/// use futures_util::StreamExt;
/// use weft_render::{create_element, intrinsic, traverse, Node, Props, RenderContext, TraverseOptions};
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// rt.block_on(async {
///     let tree = create_element(intrinsic("doc"), Props::new(), vec![
///         Node::from(create_element(intrinsic("p"), Props::new(), vec![Node::from("x")])),
///     ]);
///     let live = RenderContext::new().render(tree);
///     let options = TraverseOptions::new().yield_pre(|el| el.tag().is_some());
///     let tags: Vec<String> = traverse(&live, options)
///         .map(|(el, _)| el.tag().unwrap_or_default().to_string())
///         .collect()
///         .await;
///     assert_eq!(tags, vec!["doc", "p"]);
/// });
/// ```
#[must_use]
pub fn traverse(root: &LiveElement, options: TraverseOptions) -> BoxStream<'static, Visit> {
    let walk = Walk {
        options,
        stack: vec![Frame::new(root.clone(), Vec::new())],
    };
    stream::unfold(walk, |mut walk| async move {
        loop {
            let options = walk.options.clone();
            let top = walk.stack.last_mut()?;

            if !top.entered {
                top.entered = true;
                if (options.yield_pre)(&top.element) {
                    let visit = (top.element.clone(), top.path.clone());
                    return Some((visit, walk));
                }
                continue;
            }

            if top.children.is_none() {
                if !(options.descend)(&top.element) {
                    if let Some(visit) = walk.leave() {
                        return Some((visit, walk));
                    }
                    continue;
                }
                top.children = Some(top.element.async_children());
            }

            let next = match top.children.as_mut() {
                Some(children) => children.next().await,
                None => None,
            };
            match next {
                Some(child) => {
                    let mut path = top.path.clone();
                    path.push(top.element.clone());
                    walk.stack.push(Frame::new(child, path));
                }
                None => {
                    if let Some(visit) = walk.leave() {
                        return Some((visit, walk));
                    }
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RenderContext;
    use crate::node::{create_element, intrinsic, Node, Props};

    fn tree() -> LiveElement {
        let inner = create_element(intrinsic("inner"), Props::new(), vec![Node::from("leaf")]);
        let outer = create_element(intrinsic("outer"), Props::new(), vec![Node::from(inner)]);
        RenderContext::new().render(outer)
    }

    #[tokio::test]
    async fn no_descent_yields_only_root() {
        let root = tree();
        let visits: Vec<Visit> = traverse(&root, TraverseOptions::new().descend(|_| false))
            .collect()
            .await;
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].0, root);
        assert!(visits[0].1.is_empty());
    }

    #[tokio::test]
    async fn paths_lead_from_root() {
        let root = tree();
        let visits: Vec<Visit> = traverse(&root, TraverseOptions::new()).collect().await;
        assert_eq!(visits.len(), 3);
        let (leaf, path) = &visits[2];
        assert_eq!(leaf.to_string(), "leaf");
        let tags: Vec<_> = path.iter().map(|el| el.tag().unwrap_or_default()).collect();
        assert_eq!(tags, vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn post_order_follows_children() {
        let root = tree();
        let options = TraverseOptions::new()
            .yield_pre(|_| false)
            .yield_post(|el| el.tag().is_some());
        let tags: Vec<String> = traverse(&root, options)
            .map(|(el, _)| el.tag().unwrap_or_default().to_string())
            .collect()
            .await;
        assert_eq!(tags, vec!["inner", "outer"]);
    }

    #[tokio::test]
    async fn restarts_from_root_on_each_call() {
        let root = tree();
        let first = traverse(&root, TraverseOptions::new()).count().await;
        let second = traverse(&root, TraverseOptions::new()).count().await;
        assert_eq!(first, second);
    }
}
