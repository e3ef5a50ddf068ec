//! Integration tests for rendering a tree end to end.
//!
//! Tests the complete flow of:
//! - Synchronous literals and fragment flattening
//! - Async children arriving out of source order
//! - Frame streams, abort and memoized evaluation
//! - Error boundaries and root failure logging
//! - Context isolation and render events

use futures_util::StreamExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weft_render::testing::{
    collect_frames, failing, failing_after, gated_stream, sleep_then, stream_of, MemoryLogger,
};
use weft_render::{
    component, create_element, memo, CancellationToken, ContextKey, ErrorBoundary, EventKind,
    Literal, LogLevel, Node, Props, RenderContext, RenderError, Renderable, Scope, Status,
};

// =============================================================================
// Test Fixtures
// =============================================================================

fn counting_stream(counter: Arc<AtomicUsize>) -> Node {
    let tag = component("Counted", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Renderable::stream(futures_util::stream::iter(vec![
            Ok(Node::from("x")),
            Ok(Node::from("xy")),
        ])))
    });
    Node::from(create_element(tag, Props::new(), vec![]))
}

fn reads_key(key: ContextKey<String>) -> Node {
    let tag = component("ReadsKey", move |_, ctx| {
        Ok(Renderable::from(ctx.get_context(&key)))
    });
    Node::from(create_element(tag, Props::new(), vec![]))
}

// =============================================================================
// Literals and Fragments
// =============================================================================

#[test]
fn literals_complete_without_a_runtime() {
    let live = RenderContext::new().render(Node::fragment(vec![
        Node::from("n="),
        Node::from(3),
        Node::from(true),
        Node::from(()),
    ]));
    assert!(live.is_complete(Scope::Tree));
    assert_eq!(live.status(), Status::Complete);
    assert_eq!(live.to_string(), "n=3");

    let empties = RenderContext::new().render(Node::fragment(vec![
        Node::from("["),
        Node::Literal(Literal::Null),
        Node::Literal(Literal::Undefined),
        Node::from(None::<&str>),
        Node::from("]"),
    ]));
    assert_eq!(empties.to_string(), "[]");
    assert_eq!(empties.children().len(), 5);
}

#[tokio::test]
async fn fragment_keeps_source_order_while_children_arrive_out_of_order() {
    let live = RenderContext::new().render(Node::fragment(vec![sleep_then(20, "b"), Node::from("a")]));
    assert_eq!(live.to_string(), "a");

    let mut arrivals = live.async_children();
    let first = arrivals.next().await.expect("first arrival");
    assert_eq!(first.to_string(), "a");
    let second = arrivals.next().await.expect("second arrival");
    assert_eq!(second.to_string(), "b");
    assert!(arrivals.next().await.is_none());

    assert_eq!(live.text().await.unwrap(), "ba");
}

#[tokio::test]
async fn stream_frames_grow_and_end() {
    let live = RenderContext::new().render(stream_of(vec!["a", "ab", "abc"]));
    let frames = collect_frames(&live).await.unwrap();
    assert_eq!(frames.last().map(String::as_str), Some("abc"));
    assert!(frames.windows(2).all(|w| w[0] != w[1]));
    assert!(live.is_complete(Scope::Tree));
}

// =============================================================================
// Abort
// =============================================================================

#[tokio::test]
async fn abort_keeps_last_content() {
    let (node, gate) = gated_stream(vec!["a", "ab"], vec!["abc"]);
    let token = CancellationToken::new();
    let live = RenderContext::new().render_with_abort(node, token.clone());

    let mut frames = live.frames();
    while let Some(frame) = frames.next().await {
        if frame.unwrap() == "ab" {
            break;
        }
    }
    token.cancel();
    gate.open();

    assert_eq!(live.text().await.unwrap(), "ab");
    assert_eq!(live.status(), Status::Aborted);
}

#[tokio::test]
async fn abort_before_render_settles_immediately() {
    let token = CancellationToken::new();
    token.cancel();
    let live = RenderContext::new().render_with_abort(sleep_then(1_000, "never"), token);
    assert_eq!(live.text().await.unwrap(), "");
    assert_eq!(live.status(), Status::Aborted);
}

// =============================================================================
// Memo
// =============================================================================

#[tokio::test]
async fn memo_evaluates_once_across_contexts() {
    let counter = Arc::new(AtomicUsize::new(0));
    let shared = memo(counting_stream(Arc::clone(&counter)));

    let first = RenderContext::new().render(shared.clone());
    let second = RenderContext::new().render(shared.clone());
    assert_eq!(first.text().await.unwrap(), "xy");
    assert_eq!(second.text().await.unwrap(), "xy");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn memo_consumers_see_equal_frames() {
    let shared = memo(stream_of(vec!["m", "me", "mem"]));
    let first = RenderContext::new().render(shared.clone());
    let second = RenderContext::new().render(shared);

    let (a, b) = futures_util::future::join(collect_frames(&first), collect_frames(&second)).await;
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a, b);
    assert_eq!(a.last().map(String::as_str), Some("mem"));
}

#[tokio::test]
async fn late_memo_subscriber_sees_snapshot_first() {
    let shared = memo(stream_of(vec!["x", "xy"]));
    let early = RenderContext::new().render(shared.clone());
    early.text().await.unwrap();

    let late = RenderContext::new().render(shared);
    let frames = collect_frames(&late).await.unwrap();
    assert_eq!(frames, vec!["xy"]);
}

// =============================================================================
// Error Boundaries
// =============================================================================

#[tokio::test]
async fn boundary_swaps_in_fallback_and_warns() {
    let logger = Arc::new(MemoryLogger::new());
    let ctx = RenderContext::new().with_logger(logger.clone());
    let guarded = ErrorBoundary::new("fallback").wrap(vec![Node::from("ok "), failing_after(5, "boom")]);

    let live = ctx.render(guarded);
    assert_eq!(live.text().await.unwrap(), "fallback");
    assert_eq!(logger.at_level(LogLevel::Warn).len(), 1);
    assert!(logger.at_level(LogLevel::Error).is_empty());
}

#[tokio::test]
async fn unguarded_failure_fails_root_and_logs_once() {
    let logger = Arc::new(MemoryLogger::new());
    let ctx = RenderContext::new().with_logger(logger.clone());
    let live = ctx.render(Node::fragment(vec![Node::from("a"), failing("boom")]));

    let err = live.text().await.unwrap_err();
    assert!(matches!(err, RenderError::Component { .. }));
    assert!(live.wait().await.is_err());

    let errors = logger.at_level(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(Some(errors[0].render_id), live.context().render_id());
}

#[tokio::test]
async fn handler_boundary_sees_the_error() {
    let guarded = ErrorBoundary::with_handler(|err| Node::from(format!("caught: {err}")))
        .wrap(vec![failing("bad input")]);
    let text = RenderContext::new().render(guarded).text().await.unwrap();
    assert!(text.starts_with("caught: "));
    assert!(text.contains("bad input"));
}

// =============================================================================
// Context
// =============================================================================

#[tokio::test]
async fn set_context_does_not_leak_into_parent() {
    let key = ContextKey::new("model", String::from("default"));
    let base = RenderContext::new();
    let derived = base.set_context(&key, String::from("custom"));

    let from_base = base.render(reads_key(key.clone())).text().await.unwrap();
    let from_derived = derived.render(reads_key(key)).text().await.unwrap();
    assert_eq!(from_base, "default");
    assert_eq!(from_derived, "custom");
}

#[tokio::test]
async fn attached_node_uses_its_own_context() {
    let key = ContextKey::new("lang", String::from("en"));
    let french = RenderContext::new().set_context(&key, String::from("fr"));
    let tree = Node::fragment(vec![reads_key(key.clone()), Node::from("/"), french.attach(reads_key(key))]);
    let text = RenderContext::new().render(tree).text().await.unwrap();
    assert_eq!(text, "en/fr");
}

// =============================================================================
// Events
// =============================================================================

#[tokio::test]
async fn listeners_see_arrival_and_one_terminal_event() {
    let live = RenderContext::new().render(Node::fragment(vec![sleep_then(5, "b"), Node::from("a")]));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    live.add_event_listener(move |event| sink.lock().push(event.kind.clone()));

    live.text().await.unwrap();
    tokio::task::yield_now().await;

    let kinds = seen.lock().clone();
    assert!(kinds.contains(&EventKind::ChildArrived { index: 0 }));
    assert_eq!(kinds.iter().filter(|k| k.is_terminal()).count(), 1);
    assert_eq!(kinds.last(), Some(&EventKind::Completed));
}

#[tokio::test]
async fn sibling_streams_announce_progress_in_commit_order() {
    let live = RenderContext::new().render(Node::fragment(vec![
        stream_of(vec!["a", "ab"]),
        stream_of(vec!["x", "xy"]),
    ]));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    live.add_event_listener(move |event| sink.lock().push(event.kind.clone()));

    assert_eq!(live.text().await.unwrap(), "abxy");
    let kinds = seen.lock().clone();

    for index in [0, 1] {
        let arrived = EventKind::ChildArrived { index };
        assert_eq!(kinds.iter().filter(|k| **k == arrived).count(), 1);
        let at = kinds.iter().position(|k| *k == arrived).unwrap();
        assert!(kinds[..at].contains(&EventKind::ChildAdvanced));
    }
    assert_eq!(kinds.iter().filter(|k| k.is_terminal()).count(), 1);
    assert_eq!(kinds.last(), Some(&EventKind::Completed));
}

#[tokio::test]
async fn removed_listener_is_silent() {
    let live = RenderContext::new().render(sleep_then(5, "done"));
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let id = live.add_event_listener(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(live.remove_event_listener(id));
    assert!(!live.remove_event_listener(id));

    live.text().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
