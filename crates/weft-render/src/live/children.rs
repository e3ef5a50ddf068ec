//! Arrival-order child sequence.

use super::{LiveElement, LiveKind, Scope};
use futures_util::stream::{self, BoxStream};
use futures_util::Stream;
use std::collections::{HashSet, VecDeque};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use weft_types::LiveId;

/// Stream of direct children in the order they settle.
///
/// A child is yielded once its subtree leaves the pending state. Children
/// of a still-running component are held back until the component
/// finishes, because a running producer may still supersede them.
pub struct ChildStream {
    inner: BoxStream<'static, LiveElement>,
}

impl Stream for ChildStream {
    type Item = LiveElement;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

struct Cursor {
    parent: LiveElement,
    changes: mpsc::UnboundedReceiver<()>,
    seen: HashSet<LiveId>,
    ready: VecDeque<LiveElement>,
}

impl Cursor {
    fn collect_settled(&mut self) {
        let holds_back = matches!(self.parent.kind(), LiveKind::Component { .. })
            && !self.parent.is_complete(Scope::Node);
        if holds_back {
            return;
        }
        for child in self.parent.children() {
            if !self.seen.contains(&child.id()) && child.status().is_terminal() {
                self.seen.insert(child.id());
                self.ready.push_back(child);
            }
        }
    }
}

impl LiveElement {
    /// Returns the direct children as they settle (arrival order).
    ///
    /// The stream ends once the element's own producer is done and every
    /// child has settled and been yielded, even when a failed child has
    /// already made the element's status terminal.
    #[must_use]
    pub fn async_children(&self) -> ChildStream {
        let cursor = Cursor {
            parent: self.clone(),
            changes: self.watch(),
            seen: HashSet::new(),
            ready: VecDeque::new(),
        };
        let inner = stream::unfold(cursor, |mut cursor| async move {
            loop {
                if let Some(child) = cursor.ready.pop_front() {
                    return Some((child, cursor));
                }
                cursor.collect_settled();
                if !cursor.ready.is_empty() {
                    continue;
                }
                if cursor.parent.is_settled() {
                    return None;
                }
                cursor.changes.recv().await?;
            }
        });
        ChildStream {
            inner: Box::pin(inner),
        }
    }
}
