//! Driving component renderables.
//!
//! Immediate renderables are installed synchronously. Futures and streams
//! run on a spawned tokio task that holds only a weak reference to the
//! element: once every consumer drops the tree, the task stops pulling.
//!
//! Both drivers race the producer against the context's abort signal with
//! a biased `select!`, so an abort observed before the next item wins and
//! the element keeps whatever content it already had.

use super::{LiveElement, LiveInner, LiveKind, Own, Status};
use crate::component::Renderable;
use crate::context::AbortSignal;
use crate::error::RenderError;
use crate::node::Node;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::future::Future;
use std::sync::Weak;

impl LiveElement {
    /// Consumes a component's renderable.
    pub(crate) fn accept(&self, renderable: Renderable) {
        match renderable {
            Renderable::Node(node) => self.complete_with(node),
            Renderable::Value(value) => match Node::from_value(value) {
                Ok(node) => self.complete_with(node),
                Err(found) => self.fail(RenderError::InvalidRenderable {
                    component: self.component_name(),
                    found,
                }),
            },
            Renderable::Evaluator(live) => {
                self.set_children(vec![live]);
                self.settle(Own::Done);
                self.refresh(self.id(), true);
            }
            Renderable::Future(future) => {
                let task = drive_future(self.downgrade(), self.context().abort_signal().clone(), future);
                self.spawn(task);
            }
            Renderable::Stream(stream) => {
                let task = drive_stream(self.downgrade(), self.context().abort_signal().clone(), stream);
                self.spawn(task);
            }
        }
    }

    fn component_name(&self) -> String {
        match self.kind() {
            LiveKind::Component { name, .. } => name.to_string(),
            _ => String::from("unknown"),
        }
    }

    /// Replaces the content with `node` without finishing the producer.
    fn advance_with(&self, node: Node) {
        let child = Self::build_child(node, self.context());
        self.set_children(vec![child]);
        self.refresh(self.id(), true);
    }

    /// Replaces the content with `node` and finishes the producer.
    fn complete_with(&self, node: Node) {
        let child = Self::build_child(node, self.context());
        self.set_children(vec![child]);
        self.settle(Own::Done);
        self.refresh(self.id(), true);
    }

    fn finish(&self, own: Own) {
        if self.settle(own) {
            self.refresh(self.id(), false);
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => self.fail(RenderError::Internal(format!(
                "component '{}' returned asynchronous content outside a tokio runtime",
                self.component_name()
            ))),
        }
    }
}

async fn drive_future(
    weak: Weak<LiveInner>,
    abort: AbortSignal,
    future: BoxFuture<'static, Result<Node, RenderError>>,
) {
    let outcome = tokio::select! {
        biased;
        () = abort.aborted() => None,
        result = future => Some(result),
    };
    let Some(live) = LiveElement::upgrade(&weak) else {
        return;
    };
    match outcome {
        None => {
            tracing::debug!(live_id = %live.id(), "future aborted");
            live.finish(Own::Aborted);
        }
        Some(Ok(node)) => live.complete_with(node),
        Some(Err(err)) => live.fail(err),
    }
}

async fn drive_stream(
    weak: Weak<LiveInner>,
    abort: AbortSignal,
    mut stream: BoxStream<'static, Result<Node, RenderError>>,
) {
    loop {
        let next = tokio::select! {
            biased;
            () = abort.aborted() => {
                if let Some(live) = LiveElement::upgrade(&weak) {
                    tracing::debug!(live_id = %live.id(), "stream aborted");
                    live.finish(Own::Aborted);
                }
                return;
            }
            item = stream.next() => item,
        };
        let Some(live) = LiveElement::upgrade(&weak) else {
            return;
        };
        match next {
            None => {
                live.finish(Own::Done);
                return;
            }
            Some(Ok(node)) => {
                live.advance_with(node);
                if matches!(live.status(), Status::Failed(_)) {
                    // Latest content failed; the element is settled by its child.
                    live.finish(Own::Done);
                    return;
                }
            }
            Some(Err(err)) => {
                live.fail(err);
                return;
            }
        }
    }
}
