//! Live elements: the running evaluation of a node.
//!
//! Rendering a [`Node`] under a [`RenderContext`] produces a tree of
//! [`LiveElement`]s, one per evaluated node:
//!
//! ```text
//! Node                               LiveElement tree
//! ────                               ────────────────
//! Fragment[                          Fragment ─┬─ Text "Hi "
//!   "Hi ",                                     └─ Component(Answer) ── Text "4"
//!   <Answer/>   ──render──►                        (stream task replaces this
//! ]                                                 child on every item)
//! ```
//!
//! # Status
//!
//! Each element has an *own* state (its producer) and a *deep* status that
//! also accounts for its descendants:
//!
//! | Deep status | When |
//! |-------------|------|
//! | `Failed` | Own producer failed, or the first failing descendant in source order |
//! | `Pending` | Own producer or any descendant still running |
//! | `Aborted` | Nothing running, and the abort signal cut something short |
//! | `Complete` | Everything finished normally |
//!
//! # Change propagation
//!
//! A mutation (a stream item, a settled future, a failure) is committed
//! under the element's lock, then announced with no lock held:
//!
//! ```text
//! leaf commit ──► leaf.refresh ──► listeners, watchers, frame sinks
//!                      │
//!                      └──► parent.refresh ──► ... ──► root.refresh
//! ```
//!
//! Locks are only ever taken top-down (parent before child) while reading,
//! and never held across a refresh, so propagation cannot deadlock.

mod build;
mod children;
mod drive;
mod frames;

pub use children::ChildStream;
pub use frames::FrameStream;

use crate::context::RenderContext;
use crate::component::Component;
use crate::error::RenderError;
use crate::listener::{Listener, ListenerRegistry};
use crate::node::{Element, Node, Props, Tag};
use frames::FrameSink;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use weft_event::{EventKind, ListenerId, RenderEvent};
use weft_types::LiveId;

/// What a live element evaluates.
#[derive(Debug, Clone)]
pub enum LiveKind {
    /// Literal text.
    Text(String),
    /// Flattened fragment.
    Fragment,
    /// Intrinsic element.
    Intrinsic {
        /// Tag name.
        tag: Arc<str>,
        /// Element props.
        props: Props,
    },
    /// Component element.
    Component {
        /// Component name.
        name: Arc<str>,
        /// Element props.
        props: Props,
    },
    /// Element left unexpanded by a partial render.
    Stopped(Element),
}

/// Deep status of a live element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Something in the subtree is still running.
    Pending,
    /// Everything finished normally.
    Complete,
    /// Finished, with some producer cut short by the abort signal.
    Aborted,
    /// An unrecovered failure in the subtree.
    Failed(RenderError),
}

impl Status {
    /// Returns `true` for every status except `Pending`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Completion query scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The element's own producer only.
    Node,
    /// The element and all of its descendants.
    Tree,
}

/// One item of a partial flattening.
#[derive(Debug, Clone)]
pub enum PartialItem {
    /// A run of resolved text.
    Text(String),
    /// An element the partial render left unexpanded.
    Element(Element),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Own {
    Running,
    Done,
    Aborted,
    Failed(RenderError),
}

/// Component and props retained for the `on_error` hook.
pub(crate) struct Guard {
    component: Arc<dyn Component>,
    props: Props,
}

pub(crate) struct LiveInner {
    id: LiveId,
    kind: LiveKind,
    context: RenderContext,
    root: bool,
    guard: Option<Guard>,
    state: Mutex<LiveState>,
    listeners: ListenerRegistry,
}

struct LiveState {
    own: Own,
    children: Vec<LiveElement>,
    parents: Vec<Weak<LiveInner>>,
    sinks: Vec<Arc<FrameSink>>,
    watchers: Vec<mpsc::UnboundedSender<()>>,
    arrived: HashSet<LiveId>,
    terminal_announced: bool,
    recovery_attempted: bool,
    error_reported: bool,
}

/// Handle to a running evaluation. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct LiveElement {
    inner: Arc<LiveInner>,
}

impl LiveElement {
    pub(crate) fn new(
        kind: LiveKind,
        context: &RenderContext,
        root: bool,
        guard: Option<Guard>,
        own: Own,
    ) -> Self {
        Self {
            inner: Arc::new(LiveInner {
                id: LiveId::new(),
                kind,
                context: context.clone(),
                root,
                guard,
                state: Mutex::new(LiveState {
                    own,
                    children: Vec::new(),
                    parents: Vec::new(),
                    sinks: Vec::new(),
                    watchers: Vec::new(),
                    arrived: HashSet::new(),
                    terminal_announced: false,
                    recovery_attempted: false,
                    error_reported: false,
                }),
                listeners: ListenerRegistry::default(),
            }),
        }
    }

    pub(crate) fn upgrade(weak: &Weak<LiveInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn downgrade(&self) -> Weak<LiveInner> {
        Arc::downgrade(&self.inner)
    }

    /// Returns the element's identity.
    #[must_use]
    pub fn id(&self) -> LiveId {
        self.inner.id
    }

    /// Returns what this element evaluates.
    #[must_use]
    pub fn kind(&self) -> &LiveKind {
        &self.inner.kind
    }

    /// Returns the intrinsic tag or component name.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match &self.inner.kind {
            LiveKind::Intrinsic { tag, .. } => Some(tag),
            LiveKind::Component { name, .. } => Some(name),
            LiveKind::Stopped(el) => Some(el.tag().name()),
            LiveKind::Text(_) | LiveKind::Fragment => None,
        }
    }

    /// Returns the element's props, for intrinsic and component elements.
    #[must_use]
    pub fn attributes(&self) -> Option<&Props> {
        match &self.inner.kind {
            LiveKind::Intrinsic { props, .. } | LiveKind::Component { props, .. } => Some(props),
            LiveKind::Stopped(el) => Some(el.props()),
            LiveKind::Text(_) | LiveKind::Fragment => None,
        }
    }

    /// Returns the context this element was rendered under.
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.inner.context
    }

    /// Returns `true` for the element that started a top-level render.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.inner.root
    }

    /// Returns the current children, in source order.
    #[must_use]
    pub fn children(&self) -> Vec<LiveElement> {
        self.inner.state.lock().children.clone()
    }

    /// Returns whether the element (or its whole subtree) has finished.
    #[must_use]
    pub fn is_complete(&self, scope: Scope) -> bool {
        match scope {
            Scope::Node => self.inner.state.lock().own != Own::Running,
            Scope::Tree => self.status().is_terminal(),
        }
    }

    /// Returns `true` once the own producer is done and every child has
    /// settled. Unlike a terminal status, a failed child does not cut
    /// this short while siblings are still running.
    pub(crate) fn is_settled(&self) -> bool {
        self.is_complete(Scope::Node)
            && self
                .children()
                .iter()
                .all(|child| child.status().is_terminal())
    }

    /// Returns the deep status.
    #[must_use]
    pub fn status(&self) -> Status {
        let (own, children) = {
            let state = self.inner.state.lock();
            (state.own.clone(), state.children.clone())
        };
        if let Own::Failed(err) = own {
            return Status::Failed(err);
        }
        let mut pending = own == Own::Running;
        let mut aborted = own == Own::Aborted;
        for child in &children {
            match child.status() {
                Status::Failed(err) => return Status::Failed(err),
                Status::Pending => pending = true,
                Status::Aborted => aborted = true,
                Status::Complete => {}
            }
        }
        if pending {
            Status::Pending
        } else if aborted {
            Status::Aborted
        } else {
            Status::Complete
        }
    }

    /// Flattens the current snapshot into items, keeping stopped elements.
    #[must_use]
    pub fn partial(&self) -> Vec<PartialItem> {
        let mut items = Vec::new();
        self.collect_partial(&mut items);
        items
    }

    fn collect_partial(&self, items: &mut Vec<PartialItem>) {
        match &self.inner.kind {
            LiveKind::Text(text) => match items.last_mut() {
                Some(PartialItem::Text(run)) => run.push_str(text),
                _ => items.push(PartialItem::Text(text.clone())),
            },
            LiveKind::Stopped(el) => items.push(PartialItem::Element(el.clone())),
            _ => {
                for child in self.children() {
                    child.collect_partial(items);
                }
            }
        }
    }

    fn write_text(&self, out: &mut String) {
        match &self.inner.kind {
            LiveKind::Text(text) => out.push_str(text),
            LiveKind::Stopped(_) => {}
            _ => {
                for child in self.children() {
                    child.write_text(out);
                }
            }
        }
    }

    /// Waits until the subtree leaves `Pending`.
    ///
    /// # Errors
    ///
    /// Returns the subtree's unrecovered failure.
    pub async fn wait(&self) -> Result<Status, RenderError> {
        let mut changes = self.watch();
        loop {
            match self.status() {
                Status::Pending => {
                    if changes.recv().await.is_none() {
                        return Err(RenderError::Internal(
                            "live element stopped notifying while pending".into(),
                        ));
                    }
                }
                Status::Failed(err) => return Err(err),
                status => return Ok(status),
            }
        }
    }

    /// Waits for completion and returns the final flattening.
    ///
    /// An aborted render resolves with the text it had reached.
    ///
    /// # Errors
    ///
    /// Returns the subtree's unrecovered failure.
    pub async fn text(&self) -> Result<String, RenderError> {
        self.wait().await?;
        Ok(self.to_string())
    }

    /// Registers an event listener.
    pub fn add_event_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&RenderEvent) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.inner.listeners.register(listener)
    }

    /// Removes an event listener. Returns `true` if it was registered.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.unregister(id)
    }

    /// Returns a node that splices this evaluation into another tree.
    ///
    /// The spliced element is reused as-is; it is not evaluated again.
    #[must_use]
    pub fn as_node(&self) -> Node {
        let tag = Tag::Intrinsic(Arc::from(self.tag().unwrap_or("live")));
        Node::Element(Element::splice(tag, self.clone()))
    }

    pub(crate) fn watch(&self) -> mpsc::UnboundedReceiver<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.state.lock().watchers.push(tx);
        rx
    }

    /// Replaces the children list, maintaining parent links.
    pub(crate) fn set_children(&self, children: Vec<LiveElement>) {
        let old = {
            let mut state = self.inner.state.lock();
            std::mem::replace(&mut state.children, children.clone())
        };
        for stale in &old {
            if !children.iter().any(|c| c.id() == stale.id()) {
                stale.remove_parent(self.id());
            }
        }
        for fresh in &children {
            if !old.iter().any(|c| c.id() == fresh.id()) {
                fresh.add_parent(self);
            }
        }
    }

    fn add_parent(&self, parent: &LiveElement) {
        self.inner.state.lock().parents.push(parent.downgrade());
    }

    fn remove_parent(&self, parent: LiveId) {
        self.inner
            .state
            .lock()
            .parents
            .retain(|p| p.upgrade().is_some_and(|p| p.id != parent));
    }

    /// Sets the own state if still running. Returns `true` on transition.
    pub(crate) fn settle(&self, own: Own) -> bool {
        let mut state = self.inner.state.lock();
        if state.own == Own::Running {
            state.own = own;
            true
        } else {
            false
        }
    }

    pub(crate) fn fail(&self, err: RenderError) {
        tracing::debug!(
            live_id = %self.id(),
            render_id = ?self.context().render_id(),
            error = %err,
            "live element failed"
        );
        if self.settle(Own::Failed(err)) {
            self.refresh(self.id(), false);
        }
    }

    /// Announces a committed change and propagates it to parents.
    ///
    /// `advanced` marks a content change originating at `origin`.
    pub(crate) fn refresh(&self, origin: LiveId, advanced: bool) {
        self.recover_failed_child();

        let status = self.status();
        let children = self.children();
        let own_running = !self.is_complete(Scope::Node);
        // A running component may still replace its child.
        let settled: Vec<(usize, LiveId)> =
            if own_running && matches!(self.inner.kind, LiveKind::Component { .. }) {
                Vec::new()
            } else {
                children
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.status().is_terminal())
                    .map(|(i, c)| (i, c.id()))
                    .collect()
            };

        let mut events = Vec::new();
        let (sinks, watchers, parents, report) = {
            let mut state = self.inner.state.lock();
            for (index, id) in settled {
                if state.arrived.insert(id) {
                    events.push(RenderEvent::new(id, EventKind::ChildArrived { index }));
                }
            }
            if events.is_empty() && advanced {
                events.push(RenderEvent::new(origin, EventKind::ChildAdvanced));
            }
            if status.is_terminal() && !state.terminal_announced {
                state.terminal_announced = true;
                let kind = match &status {
                    Status::Failed(err) => EventKind::Failed {
                        message: err.to_string(),
                    },
                    Status::Aborted => EventKind::Aborted,
                    _ => EventKind::Completed,
                };
                events.push(RenderEvent::new(self.id(), kind));
            }
            let report = match &status {
                Status::Failed(err) if self.inner.root && !state.error_reported => {
                    state.error_reported = true;
                    Some(err.clone())
                }
                _ => None,
            };
            state.watchers.retain(|w| !w.is_closed());
            state.sinks.retain(|s| !s.is_closed());
            state.parents.retain(|p| p.strong_count() > 0);
            (
                state.sinks.clone(),
                state.watchers.clone(),
                state.parents.clone(),
                report,
            )
        };

        for event in &events {
            self.inner.listeners.emit(event);
        }
        for watcher in watchers {
            let _ = watcher.send(());
        }
        for sink in sinks {
            sink.push(self);
        }
        if let Some(err) = report {
            self.report_error(&err);
        }
        for parent in parents.iter().filter_map(Self::upgrade) {
            parent.refresh(origin, true);
        }
    }

    /// Lets an `on_error` hook replace a failed subtree, at most once.
    fn recover_failed_child(&self) {
        let Some(guard) = &self.inner.guard else {
            return;
        };
        if self.inner.state.lock().recovery_attempted {
            return;
        }
        let failure = self.children().iter().find_map(|c| match c.status() {
            Status::Failed(err) => Some(err),
            _ => None,
        });
        let Some(err) = failure else {
            return;
        };
        self.inner.state.lock().recovery_attempted = true;

        let Some(fallback) = guard.component.on_error(&err, &guard.props, self.context()) else {
            return;
        };
        let name = guard.component.name();
        tracing::warn!(
            component = name,
            live_id = %self.id(),
            render_id = ?self.context().render_id(),
            error = %err,
            "recovered from descendant failure"
        );
        self.context()
            .component_logger(name, &guard.props)
            .warn(format!("recovered from error: {err}"));
        let replacement = Self::build_child(fallback, self.context());
        self.set_children(vec![replacement]);
    }

    fn report_error(&self, err: &RenderError) {
        let name = self.tag().unwrap_or("render");
        tracing::error!(
            live_id = %self.id(),
            render_id = ?self.context().render_id(),
            error = %err,
            "render failed"
        );
        let props = self.attributes().cloned().unwrap_or_default();
        self.context()
            .component_logger(name, &props)
            .error(format!("unrecovered render error: {err}"));
    }
}

impl fmt::Display for LiveElement {
    /// Writes the current flattening.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_text(&mut out);
        f.write_str(&out)
    }
}

impl fmt::Debug for LiveElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveElement")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("root", &self.inner.root)
            .finish_non_exhaustive()
    }
}

impl PartialEq for LiveElement {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{component, create_element, intrinsic};
    use crate::Renderable;

    #[test]
    fn literal_is_complete_immediately() {
        let live = RenderContext::new().render("hello");
        assert_eq!(live.status(), Status::Complete);
        assert!(live.is_complete(Scope::Node));
        assert_eq!(live.to_string(), "hello");
        assert!(matches!(live.kind(), LiveKind::Text(t) if t == "hello"));
    }

    #[test]
    fn intrinsic_exposes_tag_and_attributes() {
        let el = create_element(
            intrinsic("message"),
            Props::new().attr("role", "system"),
            vec![Node::from("be brief")],
        );
        let live = RenderContext::new().render(el);
        assert_eq!(live.tag(), Some("message"));
        assert_eq!(live.attributes().and_then(|p| p.get_str("role")), Some("system"));
        assert_eq!(live.children().len(), 1);
        assert_eq!(live.to_string(), "be brief");
    }

    #[test]
    fn sync_failure_is_reported_by_status() {
        let broken = component("Broken", |_, _| Err(RenderError::component("Broken", "nope")));
        let live = RenderContext::new().render(Node::fragment(vec![
            Node::from("a"),
            Node::from(create_element(broken, Props::new(), vec![])),
        ]));
        assert_eq!(
            live.status(),
            Status::Failed(RenderError::component("Broken", "nope"))
        );
    }

    #[test]
    fn first_failure_in_source_order_wins() {
        let fail = |msg: &'static str| {
            let tag = component("F", move |_, _| Err(RenderError::component("F", msg)));
            Node::from(create_element(tag, Props::new(), vec![]))
        };
        let live = RenderContext::new().render(Node::fragment(vec![fail("first"), fail("second")]));
        assert_eq!(live.status(), Status::Failed(RenderError::component("F", "first")));
    }

    #[test]
    fn partial_merges_adjacent_text() {
        let live = RenderContext::new().render(Node::fragment(vec!["a", "b", "c"]));
        let items = live.partial();
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], PartialItem::Text(t) if t == "abc"));
    }

    #[test]
    fn as_node_splices_without_reevaluating() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let counted = component("Counted", move |_, _| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(Renderable::from("once"))
        });
        let ctx = RenderContext::new();
        let live = ctx.render(create_element(counted, Props::new(), vec![]));
        let wrapper = ctx.render(Node::fragment(vec![live.as_node(), live.as_node()]));
        assert_eq!(wrapper.to_string(), "onceonce");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(wrapper.children()[0], live);
    }

    #[test]
    fn terminal_event_is_not_repeated() {
        let live = RenderContext::new().render("x");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = live.add_event_listener(move |e| sink.lock().push(e.kind.clone()));
        live.refresh(live.id(), false);
        assert!(seen.lock().is_empty());
        assert!(live.remove_event_listener(id));
    }
}
