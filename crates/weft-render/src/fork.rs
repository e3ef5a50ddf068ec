//! Forking one multiplexed stream into per-fork views.
//!
//! A producer emits a single stream of [`ForkMessage`]s, each tagged with
//! the fork it belongs to. A [`ForkHub`] splits that stream:
//!
//! ```text
//!                     ┌──► hub.stream(A)  "a1", "a2"      (ends on Close(A))
//! source ─► ForkHub ──┤
//!  (pulled once)      └──► hub.node(B)    frames "b1", "b1b2"
//! ```
//!
//! The source is pulled at most once per message, no matter how many forks
//! read it. Pulled messages are buffered, so a fork subscribed late still
//! sees its payloads from the start. Untagged messages and messages for
//! other forks are invisible to a fork.

use crate::component::{Component, Renderable};
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::node::{Element, Node, Props, Tag};
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use weft_types::ForkId;

/// Body of a [`ForkMessage`].
#[derive(Debug, Clone)]
pub enum ForkPayload {
    /// Content for the fork.
    Node(Node),
    /// Ends the fork.
    Close,
}

/// One message of a multiplexed fork stream.
#[derive(Debug, Clone)]
pub struct ForkMessage {
    /// Target fork; `None` for untagged messages.
    pub fork: Option<ForkId>,
    /// Content or close marker.
    pub payload: ForkPayload,
}

impl ForkMessage {
    /// Content for `fork`.
    #[must_use]
    pub fn item(fork: ForkId, node: impl Into<Node>) -> Self {
        Self {
            fork: Some(fork),
            payload: ForkPayload::Node(node.into()),
        }
    }

    /// Close marker for `fork`.
    #[must_use]
    pub fn close(fork: ForkId) -> Self {
        Self {
            fork: Some(fork),
            payload: ForkPayload::Close,
        }
    }

    /// Content addressed to no fork.
    #[must_use]
    pub fn untagged(node: impl Into<Node>) -> Self {
        Self {
            fork: None,
            payload: ForkPayload::Node(node.into()),
        }
    }
}

type Source = BoxStream<'static, Result<ForkMessage, RenderError>>;

struct HubInner {
    source: tokio::sync::Mutex<Option<Source>>,
    /// Every pulled message, never pruned; see [`ForkHub`].
    log: Mutex<Vec<Result<ForkMessage, RenderError>>>,
}

/// Splits one fork-tagged stream into per-fork streams and nodes.
///
/// # Memory
///
/// Every pulled message stays buffered for as long as the hub (or any
/// stream or node created from it) is alive, closed forks included, so
/// a fork subscribed at any point replays from the first message. Memory
/// is therefore bounded by the length of the source, not by the number
/// of open forks. Drop the hub to release the buffer; for an unbounded
/// source, use one hub per conversation turn or batch.
#[derive(Clone)]
pub struct ForkHub {
    inner: Arc<HubInner>,
}

impl ForkHub {
    /// Creates a hub over `source`.
    pub fn new<S>(source: S) -> Self
    where
        S: futures_util::Stream<Item = Result<ForkMessage, RenderError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(HubInner {
                source: tokio::sync::Mutex::new(Some(source.boxed())),
                log: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns the message at `cursor`, pulling the source if needed.
    ///
    /// `None` once the source is exhausted.
    async fn message_at(&self, cursor: usize) -> Option<Result<ForkMessage, RenderError>> {
        let buffered = self.inner.log.lock().get(cursor).cloned();
        if buffered.is_some() {
            return buffered;
        }
        let mut source = self.inner.source.lock().await;
        // another reader may have pulled while we waited
        let buffered = self.inner.log.lock().get(cursor).cloned();
        if buffered.is_some() {
            return buffered;
        }
        let next = source.as_mut()?.next().await;
        match next {
            Some(msg) => {
                self.inner.log.lock().push(msg.clone());
                Some(msg)
            }
            None => {
                *source = None;
                None
            }
        }
    }

    /// Returns the payloads of `fork`, ending on its close marker.
    ///
    /// A source error is yielded once and ends the stream.
    #[must_use]
    pub fn stream(&self, fork: ForkId) -> BoxStream<'static, Result<Node, RenderError>> {
        stream::unfold(
            (self.clone(), 0usize, false),
            move |(hub, mut cursor, done)| async move {
                if done {
                    return None;
                }
                loop {
                    let msg = hub.message_at(cursor).await?;
                    cursor += 1;
                    match msg {
                        Err(err) => return Some((Err(err), (hub, cursor, true))),
                        Ok(ForkMessage { fork: Some(id), payload }) if id == fork => match payload {
                            ForkPayload::Node(node) => return Some((Ok(node), (hub, cursor, false))),
                            ForkPayload::Close => return None,
                        },
                        Ok(_) => {}
                    }
                }
            },
        )
        .boxed()
    }

    /// Returns a node rendering `fork` as the accumulation of its payloads.
    #[must_use]
    pub fn node(&self, fork: ForkId) -> Node {
        let view = ForkView {
            hub: self.clone(),
            fork,
        };
        Node::Element(Element::new(Tag::Component(Arc::new(view)), Props::new()))
    }
}

struct ForkView {
    hub: ForkHub,
    fork: ForkId,
}

impl Component for ForkView {
    fn name(&self) -> &str {
        "Fork"
    }

    fn render(&self, _props: &Props, _ctx: &RenderContext) -> Result<Renderable, RenderError> {
        let accumulated = self.hub.stream(self.fork).scan(Vec::new(), |acc, item| {
            let out = item.map(|node| {
                acc.push(node);
                Node::Fragment(acc.clone())
            });
            futures_util::future::ready(Some(out))
        });
        Ok(Renderable::stream(accumulated))
    }
}

/// Sending half of [`fork_channel`].
#[derive(Clone)]
pub struct ForkSender {
    tx: mpsc::UnboundedSender<Result<ForkMessage, RenderError>>,
    closed: Arc<Mutex<HashSet<ForkId>>>,
}

impl ForkSender {
    /// Sends content to `fork`.
    ///
    /// # Errors
    ///
    /// [`RenderError::ForkClosed`] if `fork` was closed through this sender.
    pub fn send(&self, fork: ForkId, node: impl Into<Node>) -> Result<(), RenderError> {
        if self.closed.lock().contains(&fork) {
            return Err(RenderError::ForkClosed(fork));
        }
        self.deliver(Ok(ForkMessage::item(fork, node)));
        Ok(())
    }

    /// Sends content addressed to no fork.
    pub fn send_untagged(&self, node: impl Into<Node>) {
        self.deliver(Ok(ForkMessage::untagged(node)));
    }

    /// Closes `fork`. Closing twice is a no-op.
    pub fn close(&self, fork: ForkId) {
        if self.closed.lock().insert(fork) {
            self.deliver(Ok(ForkMessage::close(fork)));
        }
    }

    /// Fails every fork that has not been closed yet.
    pub fn fail(&self, err: RenderError) {
        self.deliver(Err(err));
    }

    fn deliver(&self, msg: Result<ForkMessage, RenderError>) {
        if self.tx.send(msg).is_err() {
            tracing::debug!("fork hub dropped, message discarded");
        }
    }
}

/// Creates a connected sender and hub.
///
/// # Example
///
/// ```
/// use futures_util::StreamExt;
/// use weft_render::fork_channel;
/// use weft_types::ForkId;
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// rt.block_on(async {
///     let (tx, hub) = fork_channel();
///     let (a, b) = (ForkId::new(), ForkId::new());
///     tx.send(a, "a1").unwrap();
///     tx.send(b, "b1").unwrap();
///     tx.close(a);
///
///     let items: Vec<String> = hub
///         .stream(a)
///         .map(|n| weft_render::RenderContext::new().render(n.unwrap()).to_string())
///         .collect()
///         .await;
///     assert_eq!(items, vec!["a1"]);
/// });
/// ```
#[must_use]
pub fn fork_channel() -> (ForkSender, ForkHub) {
    let (tx, rx) = mpsc::unbounded_channel();
    let source = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|msg| (msg, rx)) });
    let sender = ForkSender {
        tx,
        closed: Arc::new(Mutex::new(HashSet::new())),
    };
    (sender, ForkHub::new(source))
}
