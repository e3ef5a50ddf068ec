//! Test helpers for render trees.
//!
//! Provides small leaf components with controllable timing, so tests can
//! exercise ordering, streaming, abort and failure paths.
//!
//! # Example
//!
//! ```
//! use weft_render::testing::{collect_frames, stream_of};
//! use weft_render::RenderContext;
//!
//! let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
//! rt.block_on(async {
//!     let live = RenderContext::new().render(stream_of(vec!["a", "ab"]));
//!     let frames = collect_frames(&live).await.unwrap();
//!     assert_eq!(frames.last().map(String::as_str), Some("ab"));
//! });
//! ```

use crate::component::Renderable;
use crate::error::RenderError;
use crate::live::LiveElement;
use crate::node::{component, create_element, Node, Props};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub use crate::logger::MemoryLogger;

fn leaf<F>(name: &str, render: F) -> Node
where
    F: Fn() -> Renderable + Send + Sync + 'static,
{
    let tag = component(name, move |_, _| Ok(render()));
    Node::Element(create_element(tag, Props::new(), Vec::new()))
}

/// A component that sleeps `ms` milliseconds, then renders `node`.
pub fn sleep_then(ms: u64, node: impl Into<Node>) -> Node {
    let node = node.into();
    leaf("SleepThen", move || {
        let node = node.clone();
        Renderable::future(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(node)
        })
    })
}

/// A component streaming `items`, yielding to the scheduler between them.
pub fn stream_of<N: Into<Node> + Clone + Send + Sync + 'static>(items: Vec<N>) -> Node {
    leaf("StreamOf", move || {
        let items = items.clone();
        Renderable::stream(futures_util::stream::iter(items).then(|item| async move {
            tokio::task::yield_now().await;
            Ok(item.into())
        }))
    })
}

/// Releases the second half of a [`gated_stream`].
#[derive(Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    /// Opens the gate. Opening twice is a no-op.
    pub fn open(&self) {
        self.tx.send_replace(true);
    }
}

/// A component streaming `before`, then waiting for the gate, then
/// streaming `after`.
pub fn gated_stream<N>(before: Vec<N>, after: Vec<N>) -> (Node, Gate)
where
    N: Into<Node> + Clone + Send + Sync + 'static,
{
    let (tx, rx) = watch::channel(false);
    let node = leaf("GatedStream", move || {
        let before = futures_util::stream::iter(before.clone()).map(|n| Ok(n.into()));
        let mut rx = rx.clone();
        let wait = futures_util::stream::once(async move {
            let _ = rx.wait_for(|open| *open).await;
        })
        .filter_map(|()| async { None::<Result<Node, RenderError>> });
        let after = futures_util::stream::iter(after.clone()).map(|n| Ok(n.into()));
        Renderable::stream(before.chain(wait).chain(after))
    });
    (node, Gate { tx: Arc::new(tx) })
}

/// A component that fails synchronously with `message`.
pub fn failing(message: &str) -> Node {
    let message = message.to_string();
    let tag = component("Failing", move |_, _| {
        Err(RenderError::component("Failing", message.clone()))
    });
    Node::Element(create_element(tag, Props::new(), Vec::new()))
}

/// A component that fails with `message` after `ms` milliseconds.
pub fn failing_after(ms: u64, message: &str) -> Node {
    let message = message.to_string();
    leaf("FailingAfter", move || {
        let message = message.clone();
        Renderable::future(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Err(RenderError::component("FailingAfter", message))
        })
    })
}

/// Collects every frame of `live` until its stream ends.
///
/// # Errors
///
/// Returns the first error frame.
pub async fn collect_frames(live: &LiveElement) -> Result<Vec<String>, RenderError> {
    let mut frames = live.frames();
    let mut out = Vec::new();
    while let Some(frame) = frames.next().await {
        out.push(frame?);
    }
    Ok(out)
}
