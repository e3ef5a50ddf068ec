//! Incremental render engine for streaming component trees.
//!
//! Components return text now, text later (a future), or successively
//! better text (a stream). The engine evaluates a tree of them
//! concurrently and exposes the result as a live element that can be
//! awaited once or consumed as a stream of ever more complete frames.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SDK Layer                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  weft-types  : ID types, ErrorCode                           │
//! │  weft-event  : LogRecord, RenderEvent                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Engine Layer                             │
//! │  weft-render : Node, RenderContext, LiveElement  ◄── HERE    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Overview
//!
//! ```text
//! Node tree ──render(ctx)──► LiveElement ──┬── text().await      one-shot
//!                                          ├── frames()          Stream<Frame>
//!                                          ├── children()        snapshot
//!                                          └── async_children()  arrival order
//! ```
//!
//! | Concept | Type |
//! |---------|------|
//! | Tree description | [`Node`], [`Element`], [`Props`] |
//! | User code | [`Component`], [`component()`], [`Renderable`] |
//! | Scoped configuration | [`RenderContext`], [`ContextKey`] |
//! | Running evaluation | [`LiveElement`], [`Status`], [`Scope`] |
//! | Shared evaluation | [`memo`] |
//! | Failure recovery | [`ErrorBoundary`] |
//! | Tree utilities | [`traverse`], [`replace`], [`replace_subtree`], [`ForkHub`] |
//! | Logging | [`Logger`], [`TracingLogger`], [`MemoryLogger`], [`ComponentLogger`] |
//!
//! # Example
//!
//! ```
//! use weft_render::{component, create_element, Node, Props, RenderContext, Renderable};
//!
//! let answer = component("Answer", |_, _| {
//!     Ok(Renderable::stream(futures_util::stream::iter(vec![
//!         Ok(Node::from("4")),
//!         Ok(Node::from("42")),
//!     ])))
//! });
//! let tree = Node::fragment(vec![
//!     Node::from("The answer is "),
//!     Node::from(create_element(answer, Props::new(), vec![])),
//! ]);
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let text = rt
//!     .block_on(async { RenderContext::new().render(tree).text().await })
//!     .unwrap();
//! assert_eq!(text, "The answer is 42");
//! ```
//!
//! # Concurrency
//!
//! Component bodies run synchronously at render time. Futures and streams
//! they return run on spawned tokio tasks, so rendering asynchronous
//! content requires a tokio runtime. Aborting (through a
//! [`CancellationToken`] bound with [`RenderContext::with_abort`]) stops
//! further pulls and keeps the last content; it is not an error.

mod boundary;
mod component;
pub mod config;
mod context;
mod error;
mod fork;
mod listener;
mod live;
mod logger;
mod memo;
mod node;
mod replace;
pub mod testing;
mod traverse;

pub use boundary::ErrorBoundary;
pub use component::{Component, FnComponent, Renderable};
pub use context::{AbortSignal, ContextKey, RenderContext, StopPredicate};
pub use error::RenderError;
pub use fork::{fork_channel, ForkHub, ForkMessage, ForkPayload, ForkSender};
pub use live::{ChildStream, FrameStream, LiveElement, LiveKind, PartialItem, Scope, Status};
pub use logger::{
    init_tracing, ComponentLogger, Logger, MemoryLogger, TracingInitError, TracingLogger,
};
pub use memo::memo;
pub use node::{component, create_element, intrinsic, Element, Literal, Node, Props, Tag};
pub use replace::{replace, replace_subtree};
pub use traverse::{traverse, TraverseOptions, Visit};

pub use tokio_util::sync::CancellationToken;
pub use weft_event::{EventKind, ListenerId, LogLevel, LogPayload, LogRecord, RenderEvent};
