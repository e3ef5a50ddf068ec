//! Render context.
//!
//! A [`RenderContext`] is an immutable, dynamically scoped configuration
//! carrier. Components receive it on invocation and derive new contexts
//! for their subtree. Deriving never mutates the parent:
//!
//! ```text
//! root ctx ──set_context(THEME, "dark")──► ctx A ──set_context(THEME, "light")──► ctx B
//!    │                                       │                                     │
//! get(THEME) = default                  get = "dark"                          get = "light"
//! ```
//!
//! # What a context carries
//!
//! | Field | Inherited by | Derive with |
//! |-------|--------------|-------------|
//! | Context bindings | All descendants | [`set_context`](RenderContext::set_context) |
//! | Logger | All descendants | [`with_logger`](RenderContext::with_logger) |
//! | Abort signal | All descendants | [`with_abort`](RenderContext::with_abort) |
//! | Render id | The whole top-level render | assigned by [`render`](RenderContext::render) |
//! | Stop predicate | The partial render | [`render_partial`](RenderContext::render_partial) |
//!
//! Bindings are a persistent linked list: deriving adds one link and
//! shares the rest, and the nearest binding for a key wins.

use crate::component::{Component, Renderable};
use crate::config::WeftConfig;
use crate::error::RenderError;
use crate::live::LiveElement;
use crate::logger::{ComponentLogger, Logger, TracingLogger};
use crate::node::{Element, Node, Props, Tag};
use futures_util::future::{pending, select_all};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use weft_types::RenderId;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Typed key for a context binding, with a default value.
///
/// Every key is unique, even when two keys share a name and type.
///
/// # Example
///
/// ```
/// use weft_render::{ContextKey, RenderContext};
///
/// let model = ContextKey::new("model", "small".to_string());
/// let root = RenderContext::new();
/// let child = root.set_context(&model, "large".to_string());
///
/// assert_eq!(root.get_context(&model), "small");
/// assert_eq!(child.get_context(&model), "large");
/// ```
pub struct ContextKey<T> {
    id: u64,
    name: &'static str,
    default: Arc<T>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Clone + Send + Sync + 'static> ContextKey<T> {
    /// Creates a new unique key.
    #[must_use]
    pub fn new(name: &'static str, default: T) -> Self {
        Self {
            id: NEXT_KEY.fetch_add(1, Ordering::Relaxed),
            name,
            default: Arc::new(default),
            _marker: PhantomData,
        }
    }

    /// Returns the key name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the default value.
    #[must_use]
    pub fn default_value(&self) -> T {
        T::clone(&self.default)
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name,
            default: Arc::clone(&self.default),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextKey({}#{})", self.name, self.id)
    }
}

struct Binding {
    key: u64,
    value: Arc<dyn Any + Send + Sync>,
    next: Option<Arc<Binding>>,
}

/// Predicate deciding which elements a partial render leaves unexpanded.
pub type StopPredicate = Arc<dyn Fn(&Element) -> bool + Send + Sync>;

/// Combined abort state of a context.
///
/// Holds every cancellation token bound along the context chain; the signal
/// fires when any of them is cancelled.
#[derive(Clone, Default)]
pub struct AbortSignal {
    tokens: Vec<CancellationToken>,
}

impl AbortSignal {
    /// Returns `true` once any bound token is cancelled.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.tokens.iter().any(CancellationToken::is_cancelled)
    }

    /// Resolves when any bound token is cancelled; never resolves if none
    /// is bound.
    pub async fn aborted(&self) {
        if self.tokens.is_empty() {
            return pending().await;
        }
        select_all(self.tokens.iter().map(|t| Box::pin(t.cancelled()))).await;
    }

    fn with(&self, token: CancellationToken) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token);
        Self { tokens }
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("tokens", &self.tokens.len())
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

#[derive(Clone)]
struct ContextInner {
    bindings: Option<Arc<Binding>>,
    logger: Arc<dyn Logger>,
    abort: AbortSignal,
    render_id: Option<RenderId>,
    stop: Option<StopPredicate>,
    dedupe_frames: bool,
}

/// Immutable render configuration, shared by reference.
#[derive(Clone)]
pub struct RenderContext {
    inner: Arc<ContextInner>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext {
    /// Creates a root context with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&WeftConfig::default())
    }

    /// Creates a root context honoring `config`.
    #[must_use]
    pub fn from_config(config: &WeftConfig) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                bindings: None,
                logger: Arc::new(TracingLogger::new(config.logging.level)),
                abort: AbortSignal::default(),
                render_id: None,
                stop: None,
                dedupe_frames: config.render.dedupe_frames,
            }),
        }
    }

    fn derive(&self, f: impl FnOnce(&mut ContextInner)) -> Self {
        let mut inner = ContextInner::clone(&self.inner);
        f(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Evaluates `node` under this context.
    ///
    /// A context without a render id starts a new top-level render with a
    /// fresh [`RenderId`]; unrecovered failures of that render are logged
    /// once at `Error`.
    pub fn render(&self, node: impl Into<Node>) -> LiveElement {
        match self.inner.render_id {
            Some(_) => LiveElement::build(node.into(), self, false),
            None => {
                let id = RenderId::new();
                let ctx = self.derive(|c| c.render_id = Some(id));
                tracing::debug!(render_id = %id, "starting top-level render");
                LiveElement::build(node.into(), &ctx, true)
            }
        }
    }

    /// Evaluates `node` with an additional abort token.
    pub fn render_with_abort(&self, node: impl Into<Node>, token: CancellationToken) -> LiveElement {
        self.with_abort(token).render(node)
    }

    /// Evaluates `node`, leaving every non-root element that matches `stop`
    /// unexpanded.
    ///
    /// # Example
    ///
    /// ```
    /// use weft_render::{create_element, intrinsic, Node, PartialItem, Props, RenderContext};
    ///
    /// let tool = create_element(intrinsic("tool"), Props::new(), vec![Node::from("x")]);
    /// let doc = Node::fragment(vec![Node::from("before "), Node::from(tool), Node::from(" after")]);
    ///
    /// let live = RenderContext::new().render_partial(doc, |el| el.tag().name() == "tool");
    /// let items = live.partial();
    /// assert_eq!(items.len(), 3);
    /// assert!(matches!(&items[1], PartialItem::Element(el) if el.tag().name() == "tool"));
    /// ```
    pub fn render_partial<F>(&self, node: impl Into<Node>, stop: F) -> LiveElement
    where
        F: Fn(&Element) -> bool + Send + Sync + 'static,
    {
        let stop: StopPredicate = Arc::new(stop);
        self.derive(|c| c.stop = Some(stop)).render(node)
    }

    /// Binds `node` to this context without evaluating it.
    ///
    /// Wherever the returned node is rendered, `node` is evaluated under
    /// this context instead of the ambient one.
    #[must_use]
    pub fn attach(&self, node: impl Into<Node>) -> Node {
        let attached = Attached {
            context: self.clone(),
            node: node.into(),
        };
        Node::Element(Element::new(Tag::Component(Arc::new(attached)), Props::new()))
    }

    /// Returns the nearest binding for `key`, or its default.
    #[must_use]
    pub fn get_context<T: Clone + Send + Sync + 'static>(&self, key: &ContextKey<T>) -> T {
        let mut link = self.inner.bindings.as_ref();
        while let Some(binding) = link {
            if binding.key == key.id {
                if let Some(value) = binding.value.downcast_ref::<T>() {
                    return value.clone();
                }
            }
            link = binding.next.as_ref();
        }
        key.default_value()
    }

    /// Returns a derived context binding `key` to `value`.
    #[must_use]
    pub fn set_context<T: Clone + Send + Sync + 'static>(&self, key: &ContextKey<T>, value: T) -> Self {
        let binding = Arc::new(Binding {
            key: key.id,
            value: Arc::new(value),
            next: self.inner.bindings.clone(),
        });
        self.derive(|c| c.bindings = Some(binding))
    }

    /// Returns a derived context with a different logger sink.
    #[must_use]
    pub fn with_logger(&self, logger: Arc<dyn Logger>) -> Self {
        self.derive(|c| c.logger = logger)
    }

    /// Returns the logger sink.
    #[must_use]
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.inner.logger
    }

    /// Returns a logger bound to a component's identity and this render.
    #[must_use]
    pub fn component_logger(&self, component: &str, props: &Props) -> ComponentLogger {
        ComponentLogger::new(
            Arc::clone(&self.inner.logger),
            component,
            props.to_value(),
            self.inner.render_id.unwrap_or_default(),
        )
    }

    /// Returns a derived context that also aborts when `token` is cancelled.
    ///
    /// Tokens already bound by ancestors keep aborting the derived context.
    #[must_use]
    pub fn with_abort(&self, token: CancellationToken) -> Self {
        let abort = self.inner.abort.with(token);
        self.derive(|c| c.abort = abort)
    }

    /// Returns the abort signal.
    #[must_use]
    pub fn abort_signal(&self) -> &AbortSignal {
        &self.inner.abort
    }

    /// Returns `true` once the abort signal has fired.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.inner.abort.is_aborted()
    }

    /// Returns the correlation id of the top-level render, if inside one.
    #[must_use]
    pub fn render_id(&self) -> Option<RenderId> {
        self.inner.render_id
    }

    pub(crate) fn should_stop(&self, element: &Element) -> bool {
        self.inner.stop.as_ref().is_some_and(|stop| stop(element))
    }

    pub(crate) fn dedupe_frames(&self) -> bool {
        self.inner.dedupe_frames
    }

    /// Joins the render of `ambient` when this context has no render id yet.
    pub(crate) fn joined(&self, ambient: &RenderContext) -> Self {
        match (self.inner.render_id, ambient.inner.render_id) {
            (None, Some(id)) => self.derive(|c| c.render_id = Some(id)),
            _ => self.clone(),
        }
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("render_id", &self.inner.render_id)
            .field("abort", &self.inner.abort)
            .field("partial", &self.inner.stop.is_some())
            .finish()
    }
}

/// Node bound to a captured context by [`RenderContext::attach`].
struct Attached {
    context: RenderContext,
    node: Node,
}

impl Component for Attached {
    fn name(&self) -> &str {
        "Attached"
    }

    fn render(&self, _props: &Props, ctx: &RenderContext) -> Result<Renderable, RenderError> {
        let ctx = self.context.joined(ctx);
        Ok(Renderable::Evaluator(LiveElement::build(self.node.clone(), &ctx, false)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_context_does_not_touch_parent() {
        let key = ContextKey::new("depth", 0u32);
        let parent = RenderContext::new().set_context(&key, 1);
        let child = parent.set_context(&key, 2);
        assert_eq!(parent.get_context(&key), 1);
        assert_eq!(child.get_context(&key), 2);
    }

    #[test]
    fn keys_are_unique_even_with_equal_names() {
        let a = ContextKey::new("k", "a");
        let b = ContextKey::new("k", "b");
        let ctx = RenderContext::new().set_context(&a, "bound");
        assert_eq!(ctx.get_context(&a), "bound");
        assert_eq!(ctx.get_context(&b), "b");
    }

    #[test]
    fn nearest_binding_wins_and_others_are_shared() {
        let x = ContextKey::new("x", 0);
        let y = ContextKey::new("y", 0);
        let ctx = RenderContext::new()
            .set_context(&x, 1)
            .set_context(&y, 2)
            .set_context(&x, 3);
        assert_eq!(ctx.get_context(&x), 3);
        assert_eq!(ctx.get_context(&y), 2);
    }

    #[test]
    fn abort_tokens_accumulate() {
        let outer = CancellationToken::new();
        let inner = CancellationToken::new();
        let ctx = RenderContext::new().with_abort(outer.clone()).with_abort(inner);
        assert!(!ctx.is_aborted());
        outer.cancel();
        assert!(ctx.is_aborted());
    }

    #[test]
    fn render_assigns_id_once() {
        let ctx = RenderContext::new();
        assert!(ctx.render_id().is_none());
        let live = ctx.render("x");
        let id = live.context().render_id();
        assert!(id.is_some());
        let nested = live.context().render("y");
        assert_eq!(nested.context().render_id(), id);
        assert!(live.is_root());
        assert!(!nested.is_root());
    }

    #[test]
    fn joined_keeps_existing_id() {
        let a = RenderContext::new().render("a").context().clone();
        let b = RenderContext::new().render("b").context().clone();
        assert_eq!(a.joined(&b).render_id(), a.render_id());
        assert_eq!(RenderContext::new().joined(&b).render_id(), b.render_id());
    }

    #[tokio::test]
    async fn aborted_resolves_after_cancel() {
        let token = CancellationToken::new();
        let ctx = RenderContext::new().with_abort(token.clone());
        token.cancel();
        ctx.abort_signal().aborted().await;
        assert!(ctx.is_aborted());
    }
}
