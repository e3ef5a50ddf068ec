//! Component trait and renderable values.
//!
//! A [`Component`] is invoked once per render, synchronously, and returns a
//! [`Renderable`]. Asynchrony lives inside the renderable: a future or a
//! stream is driven by the engine on a tokio task.
//!
//! # Renderable Contract
//!
//! | Variant | Meaning | Completion |
//! |---------|---------|------------|
//! | [`Node`](Renderable::Node) | Immediate content | When the node's subtree completes |
//! | [`Value`](Renderable::Value) | Dynamic JSON, validated at render time | As `Node` |
//! | [`Future`](Renderable::Future) | One deferred node | When settled, then as `Node` |
//! | [`Stream`](Renderable::Stream) | Successive refinements | When the stream ends |
//! | [`Evaluator`](Renderable::Evaluator) | Existing live element | When it completes |
//!
//! JSON objects are not renderable and fail the element with
//! [`RenderError::InvalidRenderable`].

use crate::context::RenderContext;
use crate::error::RenderError;
use crate::live::LiveElement;
use crate::node::{Node, Props};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, Stream, StreamExt};
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// A user-defined render function with an optional error hook.
///
/// # Example
///
/// ```
/// use weft_render::{Component, Props, RenderContext, RenderError, Renderable};
///
/// struct Shout;
///
/// impl Component for Shout {
///     fn name(&self) -> &str {
///         "Shout"
///     }
///
///     fn render(&self, props: &Props, _ctx: &RenderContext) -> Result<Renderable, RenderError> {
///         let text = props.get_str("text").unwrap_or_default().to_uppercase();
///         Ok(Renderable::from(text))
///     }
/// }
/// ```
pub trait Component: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Produces the component's content.
    ///
    /// # Errors
    ///
    /// A returned error fails this component's live element.
    fn render(&self, props: &Props, ctx: &RenderContext) -> Result<Renderable, RenderError>;

    /// Called when a descendant fails.
    ///
    /// Returning `Some` replaces this component's subtree with the returned
    /// fallback. The default propagates the failure.
    fn on_error(&self, _error: &RenderError, _props: &Props, _ctx: &RenderContext) -> Option<Node> {
        None
    }
}

type RenderFn = dyn Fn(&Props, &RenderContext) -> Result<Renderable, RenderError> + Send + Sync;

/// Closure-backed component, created by [`component`](crate::component()).
pub struct FnComponent {
    name: String,
    render: Box<RenderFn>,
}

impl FnComponent {
    /// Wraps a render closure.
    pub fn new<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Props, &RenderContext) -> Result<Renderable, RenderError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            render: Box::new(render),
        }
    }
}

impl Component for FnComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, props: &Props, ctx: &RenderContext) -> Result<Renderable, RenderError> {
        (self.render)(props, ctx)
    }
}

/// What a component returns.
pub enum Renderable {
    /// Immediate content.
    Node(Node),
    /// Dynamic value; objects are rejected at render time.
    Value(Value),
    /// Deferred content, awaited on a spawned task.
    Future(BoxFuture<'static, Result<Node, RenderError>>),
    /// Successive refinements; each item supersedes the previous one.
    Stream(BoxStream<'static, Result<Node, RenderError>>),
    /// An already-running evaluation to splice in.
    Evaluator(LiveElement),
}

impl Renderable {
    /// Wraps a future.
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = Result<Node, RenderError>> + Send + 'static,
    {
        Self::Future(future.boxed())
    }

    /// Wraps a stream.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Node, RenderError>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }
}

impl fmt::Debug for Renderable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Future(_) => f.write_str("Future(..)"),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Evaluator(live) => f.debug_tuple("Evaluator").field(live).finish(),
        }
    }
}

impl From<Node> for Renderable {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Renderable {
    fn from(s: &str) -> Self {
        Self::Node(Node::from(s))
    }
}

impl From<String> for Renderable {
    fn from(s: String) -> Self {
        Self::Node(Node::from(s))
    }
}

impl From<Value> for Renderable {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<LiveElement> for Renderable {
    fn from(live: LiveElement) -> Self {
        Self::Evaluator(live)
    }
}
