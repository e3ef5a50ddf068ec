//! Error boundaries.
//!
//! An [`ErrorBoundary`] renders its children unchanged. When a descendant
//! fails, the boundary swaps its whole subtree for fallback content and
//! logs the recovery at `Warn`:
//!
//! ```text
//! ErrorBoundary(fallback = "unavailable")
//! └── Fragment
//!     ├── "Weather: "
//!     └── <Forecast/>  ✗ failed
//!
//!                 ▼  recovered
//!
//! ErrorBoundary
//! └── "unavailable"
//! ```
//!
//! A boundary recovers at most once. A failing fallback propagates to the
//! boundary's ancestors like any other failure.

use crate::component::{Component, Renderable};
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::node::{Element, Node, Props, Tag};
use std::sync::Arc;

type FallbackFn = dyn Fn(&RenderError) -> Node + Send + Sync;

/// Component that replaces a failed subtree with fallback content.
///
/// # Example
///
/// ```
/// use weft_render::{component, create_element, ErrorBoundary, Node, Props, RenderContext, RenderError};
///
/// let broken = component("Broken", |_, _| Err(RenderError::component("Broken", "offline")));
/// let guarded = ErrorBoundary::new("fallback")
///     .wrap(vec![Node::from(create_element(broken, Props::new(), vec![]))]);
///
/// let live = RenderContext::new().render(guarded);
/// assert_eq!(live.to_string(), "fallback");
/// ```
#[derive(Clone)]
pub struct ErrorBoundary {
    fallback: Arc<FallbackFn>,
}

impl ErrorBoundary {
    /// Creates a boundary with fixed fallback content.
    #[must_use]
    pub fn new(fallback: impl Into<Node>) -> Self {
        let fallback = fallback.into();
        Self {
            fallback: Arc::new(move |_| fallback.clone()),
        }
    }

    /// Creates a boundary whose fallback depends on the error.
    #[must_use]
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&RenderError) -> Node + Send + Sync + 'static,
    {
        Self {
            fallback: Arc::new(handler),
        }
    }

    /// Returns an element guarding `children`.
    #[must_use]
    pub fn wrap<I>(self, children: I) -> Element
    where
        I: IntoIterator<Item = Node>,
    {
        Element::new(
            Tag::Component(Arc::new(self)),
            Props::new().with_children(children),
        )
    }
}

impl Component for ErrorBoundary {
    fn name(&self) -> &str {
        "ErrorBoundary"
    }

    fn render(&self, props: &Props, _ctx: &RenderContext) -> Result<Renderable, RenderError> {
        Ok(Renderable::Node(Node::Fragment(props.children().to_vec())))
    }

    fn on_error(&self, error: &RenderError, _props: &Props, _ctx: &RenderContext) -> Option<Node> {
        Some((self.fallback)(error))
    }
}
