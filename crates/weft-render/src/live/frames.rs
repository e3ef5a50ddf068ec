//! Frame streams.
//!
//! A frame is one total flattening of a live element. Each call to
//! [`LiveElement::frames`] registers its own sink; every refresh of the
//! element pushes the current flattening into every sink.
//!
//! Frames are computed under the sink's lock, so one consumer always sees
//! frames in commit order even when refreshes race on several threads.

use super::{LiveElement, Status};
use crate::error::RenderError;
use futures_util::Stream;
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

type FrameResult = Result<String, RenderError>;

pub(crate) struct FrameSink {
    state: Mutex<SinkState>,
}

struct SinkState {
    tx: Option<mpsc::UnboundedSender<FrameResult>>,
    last: Option<String>,
    dedupe: bool,
}

impl FrameSink {
    fn new(tx: mpsc::UnboundedSender<FrameResult>, dedupe: bool) -> Self {
        Self {
            state: Mutex::new(SinkState {
                tx: Some(tx),
                last: None,
                dedupe,
            }),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state
            .lock()
            .tx
            .as_ref()
            .map_or(true, mpsc::UnboundedSender::is_closed)
    }

    /// Sends the element's current frame. Closes after a terminal status.
    pub(crate) fn push(&self, live: &LiveElement) {
        let mut state = self.state.lock();
        let Some(tx) = state.tx.as_ref() else {
            return;
        };
        match live.status() {
            Status::Failed(err) => {
                let _ = tx.send(Err(err));
                state.tx = None;
            }
            status => {
                let text = live.to_string();
                let unchanged = state.dedupe && state.last.as_deref() == Some(text.as_str());
                if !unchanged {
                    let _ = tx.send(Ok(text.clone()));
                    state.last = Some(text);
                }
                if status.is_terminal() {
                    state.tx = None;
                }
            }
        }
    }
}

/// Stream of frames from [`LiveElement::frames`].
///
/// Yields the current snapshot first, then one frame per change. Ends
/// after the completing frame, or after the first error.
pub struct FrameStream {
    rx: mpsc::UnboundedReceiver<FrameResult>,
}

impl Stream for FrameStream {
    type Item = FrameResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl LiveElement {
    /// Subscribes to frames.
    ///
    /// # Example
    ///
    /// ```
    /// use futures_util::StreamExt;
    /// use weft_render::RenderContext;
    ///
    /// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    /// rt.block_on(async {
    ///     let live = RenderContext::new().render("static");
    ///     let frames: Vec<_> = live.frames().collect().await;
    ///     assert_eq!(frames, vec![Ok("static".to_string())]);
    /// });
    /// ```
    #[must_use]
    pub fn frames(&self) -> FrameStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Arc::new(FrameSink::new(tx, self.context().dedupe_frames()));
        self.inner.state.lock().sinks.push(Arc::clone(&sink));
        sink.push(self);
        FrameStream { rx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeftConfig;
    use crate::context::RenderContext;
    use crate::node::{component, create_element, Node, Props};
    use crate::Renderable;
    use futures_util::StreamExt;

    fn repeating() -> Node {
        let tag = component("Repeat", |_, _| {
            Ok(Renderable::stream(futures_util::stream::iter(vec![
                Ok(Node::from("a")),
                Ok(Node::from("a")),
                Ok(Node::from("ab")),
            ])))
        });
        Node::from(create_element(tag, Props::new(), vec![]))
    }

    #[tokio::test]
    async fn consecutive_duplicates_are_suppressed() {
        let live = RenderContext::new().render(repeating());
        let frames: Vec<String> = live.frames().map(|f| f.unwrap()).collect().await;
        assert_eq!(frames, vec!["", "a", "ab"]);
    }

    #[tokio::test]
    async fn dedupe_can_be_disabled() {
        let mut config = WeftConfig::default();
        config.render.dedupe_frames = false;
        let live = RenderContext::from_config(&config).render(repeating());
        let frames: Vec<String> = live.frames().map(|f| f.unwrap()).collect().await;
        // one frame per item, plus the initial snapshot and the completing frame
        assert_eq!(frames, vec!["", "a", "a", "ab", "ab"]);
    }

    #[tokio::test]
    async fn error_ends_the_stream() {
        let tag = component("Boom", |_, _| {
            Ok(Renderable::stream(futures_util::stream::iter(vec![
                Ok(Node::from("x")),
                Err(crate::RenderError::component("Boom", "bang")),
            ])))
        });
        let live = RenderContext::new().render(create_element(tag, Props::new(), vec![]));
        let frames: Vec<_> = live.frames().collect().await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1], Ok("x".to_string()));
        assert!(frames[2].is_err());
    }
}
